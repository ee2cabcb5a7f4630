//! # Remote Sealing Flows
//!
//! A sealer in remote mode against an executor served in-process over
//! plain HTTP on an ephemeral port.
//!
//! 1. **Happy path**: every submitted transaction comes back and is merged
//! 2. **Equivalence**: the remote block matches the locally built one
//! 3. **Attestation**: a report with the wrong signer stops the batch
//!    before anything is posted
//! 4. **Budget**: the header gas limit caps what is staged for the executor

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use shared_types::Address;
    use ss_03_block_assembly::adapters::TransferEngine;
    use ss_03_block_assembly::{ExecutorService, FailureKind, SealingError};
    use ss_04_attested_channel::{
        executor_router, AttestationError, BatchExecutor, BatchRequest, BatchResponse,
        ChannelError, ExecutorError, ExecutorState, SimulatedReportIssuer,
    };
    use ss_node::{seal_block, SealOptions};
    use ss_telemetry::NoopTrafficCollector;

    use crate::fixtures::{node_config, remote, spawn_executor, spawn_router, transfer, SIGNER_ID};

    fn options() -> SealOptions {
        SealOptions {
            timestamp: 1_012,
            coinbase: Address::repeat_byte(0xcc),
            local: false,
        }
    }

    /// Counts batches before delegating.
    struct CountingExecutor {
        inner: ExecutorService,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl BatchExecutor for CountingExecutor {
        async fn execute(&self, request: BatchRequest) -> Result<BatchResponse, ExecutorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.execute(request).await
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_remote_seal_over_http() {
        let config = node_config(&[1, 2]);
        let endpoint = spawn_executor(&config).await;

        let txs = vec![transfer(1, 0, 2), transfer(1, 1, 2), transfer(2, 0, 3)];
        let summary = seal_block(&remote(config, &endpoint, SIGNER_ID), txs, &options())
            .await
            .unwrap();

        assert_eq!(summary.number, 1);
        assert_eq!(summary.transactions, 3);
        assert_eq!(summary.gas_used, 63_000);
        assert_eq!(summary.remote_submitted, 3);
        assert_eq!(summary.remote_committed, 3);
        assert!(summary.interrupted.is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_local_and_remote_blocks_match() {
        let config = node_config(&[1, 2, 3]);
        let endpoint = spawn_executor(&config).await;
        let txs = vec![
            transfer(1, 0, 5),
            transfer(2, 0, 1),
            transfer(2, 1, 9),
            transfer(3, 0, 3),
        ];

        let local = seal_block(&config, txs.clone(), &options()).await.unwrap();
        let remote = seal_block(&remote(config, &endpoint, SIGNER_ID), txs, &options())
            .await
            .unwrap();

        assert_eq!(local.transactions, 4);
        assert_eq!(remote.transactions, local.transactions);
        assert_eq!(remote.gas_used, local.gas_used);
        assert_eq!(remote.fees, local.fees);
        assert_eq!(remote.state_root, local.state_root);
        assert_eq!(remote.hash, local.hash);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_wrong_signer_sends_no_batch() {
        let config = node_config(&[1]);
        let calls = Arc::new(AtomicUsize::new(0));
        let executor = CountingExecutor {
            inner: ExecutorService::new(
                Arc::new(config.genesis.ledger()),
                Arc::new(TransferEngine::new(config.sealer.chain.clone())),
                config.sealer.chain.clone(),
                Duration::from_secs(2),
            ),
            calls: calls.clone(),
        };
        let state = ExecutorState::new(
            Arc::new(executor),
            b"cert".to_vec(),
            &SimulatedReportIssuer::new(vec![0xaa; 4]),
            Arc::new(NoopTrafficCollector),
        )
        .unwrap();
        let endpoint = spawn_router(executor_router(state)).await;

        let result = seal_block(
            &remote(config, &endpoint, "0xbbbbbbbb"),
            vec![transfer(1, 0, 2)],
            &options(),
        )
        .await;

        let err = result.unwrap_err();
        let err = err.downcast_ref::<SealingError>().unwrap();
        assert_eq!(err.kind(), FailureKind::RemoteChannel);
        assert!(matches!(
            err,
            SealingError::RemoteChannel(ChannelError::Attestation(AttestationError::SignerMismatch))
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_unreachable_executor_fails_attempt() {
        // Nothing listens on the discard port.
        let config = remote(node_config(&[1]), "http://127.0.0.1:9", SIGNER_ID);
        let err = seal_block(&config, vec![transfer(1, 0, 2)], &options())
            .await
            .unwrap_err();
        let err = err.downcast_ref::<SealingError>().unwrap();
        assert_eq!(err.kind(), FailureKind::RemoteChannel);
        assert!(matches!(err, SealingError::RemoteChannel(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_gas_limit_caps_staged_batch() {
        let mut config = node_config(&[1]);
        // Child limit of a 50_000 parent moves up by at most 50_000 / 1024.
        config.genesis.gas_limit = 50_000;
        let endpoint = spawn_executor(&config).await;

        let txs = (0..5).map(|nonce| transfer(1, nonce, 2)).collect();
        let summary = seal_block(&remote(config, &endpoint, SIGNER_ID), txs, &options())
            .await
            .unwrap();

        assert_eq!(summary.remote_submitted, 2);
        assert_eq!(summary.transactions, 2);
        assert_eq!(summary.gas_used, 42_000);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_executor_exposes_traffic_metrics() {
        let config = node_config(&[1]);
        let endpoint = spawn_executor(&config).await;
        seal_block(
            &remote(config, &endpoint, SIGNER_ID),
            vec![transfer(1, 0, 2)],
            &options(),
        )
        .await
        .unwrap();

        let body = reqwest::get(format!("{endpoint}/metrics"))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(body.contains("ss_sealer_ingress_bytes_total"));
        assert!(body.contains("ss_sealer_egress_bytes_total"));
    }
}
