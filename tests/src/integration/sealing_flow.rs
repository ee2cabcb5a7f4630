//! # Local Sealing Flows
//!
//! The sealer against an in-memory chain and pool, across more than one
//! block and with the attempt interrupted.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use shared_types::{Address, Withdrawal, U256};
    use ss_01_account_state::AccountBackend;
    use ss_03_block_assembly::ports::ChainReader;
    use ss_03_block_assembly::{
        CancellationSignal, GenerateParams, InterruptReason, SealerConfig, SealingError,
    };

    use crate::fixtures::{local_sealer, sender, transfer, GWEI};

    fn params(timestamp: u64) -> GenerateParams {
        GenerateParams {
            timestamp,
            coinbase: Address::repeat_byte(0xcc),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_second_block_builds_on_imported_state() {
        let (sealer, pool, chain) = local_sealer(&[1], SealerConfig::default(), 30_000_000);
        pool.add(transfer(1, 0, 2)).unwrap();
        pool.add(transfer(1, 1, 2)).unwrap();

        let first = sealer
            .generate_work(&params(1_012), Arc::new(CancellationSignal::new()))
            .await
            .unwrap();
        assert_eq!(first.block.transactions.len(), 2);
        chain
            .import(&first.block, first.state.into_changes())
            .unwrap();
        assert_eq!(chain.current_header().number, 1);

        // Already-included nonces stay in the pool and are skipped.
        pool.add(transfer(1, 2, 2)).unwrap();
        let second = sealer
            .generate_work(&params(1_024), Arc::new(CancellationSignal::new()))
            .await
            .unwrap();
        assert_eq!(second.block.header.number, 2);
        assert_eq!(second.block.header.parent_hash, first.block.hash());
        assert_eq!(second.block.transactions.len(), 1);
        assert_eq!(second.block.transactions[0].nonce(), 2);
        assert_eq!(sealer.metrics().get_blocks_sealed(), 2);
    }

    #[tokio::test]
    async fn test_fired_signal_still_seals_empty_block() {
        let (sealer, pool, _chain) = local_sealer(&[1], SealerConfig::default(), 30_000_000);
        pool.add(transfer(1, 0, 2)).unwrap();

        let signal = Arc::new(CancellationSignal::new());
        assert!(signal.fire(InterruptReason::NewHead));
        let result = sealer.generate_work(&params(1_012), signal).await.unwrap();

        assert_eq!(result.interrupted, Some(InterruptReason::NewHead));
        assert!(result.block.transactions.is_empty());
        assert_eq!(result.block.header.number, 1);
        assert!(matches!(
            result.complete(),
            Err(SealingError::Interrupted(InterruptReason::NewHead))
        ));
    }

    #[tokio::test]
    async fn test_locals_precede_better_paying_remotes() {
        let (sealer, pool, _chain) = local_sealer(&[1, 2], SealerConfig::default(), 30_000_000);
        pool.add(transfer(1, 0, 50)).unwrap();
        pool.add_local(transfer(2, 0, 1)).unwrap();

        let result = sealer
            .generate_work(&params(1_012), Arc::new(CancellationSignal::new()))
            .await
            .unwrap();
        let senders: Vec<Address> = result
            .block
            .transactions
            .iter()
            .map(|tx| tx.recover_sender().unwrap())
            .collect();
        assert_eq!(senders, vec![sender(2), sender(1)]);
        assert_eq!(result.fees, U256::from(21_000 * 51 * GWEI));
    }

    #[tokio::test]
    async fn test_withdrawals_credited_in_gwei() {
        let (sealer, _pool, chain) = local_sealer(&[1], SealerConfig::default(), 30_000_000);
        let recipient = Address::repeat_byte(0xee);
        let params = GenerateParams {
            withdrawals: vec![Withdrawal {
                index: 0,
                validator_index: 7,
                address: recipient,
                amount: 3,
            }],
            ..params(1_012)
        };

        let result = sealer
            .generate_work(&params, Arc::new(CancellationSignal::new()))
            .await
            .unwrap();
        let root = result.block.header.state_root;
        chain
            .import(&result.block, result.state.into_changes())
            .unwrap();

        let state = chain.state_at(&root).unwrap();
        let account = state.account(&recipient).unwrap().unwrap();
        assert_eq!(account.balance, U256::from(3 * GWEI));
    }
}
