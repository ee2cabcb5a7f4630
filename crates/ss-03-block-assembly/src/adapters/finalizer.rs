//! Deterministic finaliser for in-process chains.
//!
//! The state commitment is keccak256 over the parent hash followed by every
//! dirty account in address order; the transactions commitment is keccak256
//! over the transaction hashes. Neither is a trie root.

use shared_types::codec::CanonicalEncoder;
use shared_types::{keccak256, Hash, Header, Receipt, SignedTransaction, Withdrawal, U256};
use ss_01_account_state::{AccountStore, StateDb};

use crate::error::SealingError;
use crate::ports::{BlockFinalizer, SealedBlock};

const GWEI: u64 = 1_000_000_000;

#[derive(Debug, Clone, Copy, Default)]
pub struct BasicFinalizer;

impl BasicFinalizer {
    pub fn state_commitment(header: &Header, state: &StateDb) -> Hash {
        let mut enc = CanonicalEncoder::new();
        enc.h256(&header.parent_hash);
        for (address, account) in state.changes() {
            enc.h160(address).opt(account.as_ref(), |e, account| {
                e.u256(&account.balance)
                    .u64(account.nonce)
                    .h256(&account.code_hash)
                    .u64(account.storage.len() as u64);
                for (key, value) in &account.storage {
                    e.h256(key).h256(value);
                }
            });
        }
        keccak256(&enc.finish())
    }

    pub fn transactions_commitment(txs: &[SignedTransaction]) -> Hash {
        let mut enc = CanonicalEncoder::new();
        enc.u64(txs.len() as u64);
        for tx in txs {
            enc.h256(&tx.hash());
        }
        keccak256(&enc.finish())
    }
}

impl BlockFinalizer for BasicFinalizer {
    fn finalize(
        &self,
        header: &Header,
        state: &mut StateDb,
        txs: &[SignedTransaction],
        receipts: &[Receipt],
        withdrawals: &[Withdrawal],
    ) -> Result<SealedBlock, SealingError> {
        if txs.len() != receipts.len() {
            return Err(SealingError::Finalize(format!(
                "{} transactions but {} receipts",
                txs.len(),
                receipts.len()
            )));
        }
        for withdrawal in withdrawals {
            let amount = U256::from(withdrawal.amount).saturating_mul(U256::from(GWEI));
            state.add_balance(&withdrawal.address, amount)?;
        }

        let mut sealed = header.clone();
        sealed.state_root = Self::state_commitment(header, state);
        sealed.transactions_root = Self::transactions_commitment(txs);
        Ok(SealedBlock {
            header: sealed,
            transactions: txs.to_vec(),
            receipts: receipts.to_vec(),
            withdrawals: withdrawals.to_vec(),
        })
    }
}
