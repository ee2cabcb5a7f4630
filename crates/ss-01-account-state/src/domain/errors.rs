use shared_types::{Address, U256};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("Unknown snapshot {id}: journal holds {journal_len} entries")]
    InvalidSnapshot { id: usize, journal_len: usize },

    #[error("Insufficient balance for {address:?}: balance {balance}, debit {amount}")]
    BalanceUnderflow {
        address: Address,
        balance: U256,
        amount: U256,
    },

    #[error("Balance overflow for {address:?}")]
    BalanceOverflow { address: Address },

    #[error("Ledger backend error: {0}")]
    Backend(String),

    #[error("Lock poisoned")]
    LockPoisoned,
}
