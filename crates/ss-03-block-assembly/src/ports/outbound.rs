//! Outbound ports (driven side - SPI)

use std::collections::BTreeMap;
use std::sync::Arc;

use shared_types::{
    Address, Hash, Header, LazyTransaction, Receipt, SignedTransaction, Withdrawal, U256,
};
use ss_01_account_state::{AccountBackend, AccountStore, StateDb};

use crate::error::{ExecutionError, SealingError};

/// What the engine reports for one applied transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExecutionResult {
    pub gas_used: u64,
    pub blob_gas_used: u64,
    /// Receipt status code
    pub status: u64,
    pub contract_address: Option<Address>,
}

/// Port: run one transaction against account state.
///
/// On `Err` the caller reverts the state; implementations need not clean up.
pub trait ExecutionEngine: Send + Sync {
    fn run(
        &self,
        state: &mut dyn AccountStore,
        header: &Header,
        tx: &SignedTransaction,
        sender: Address,
    ) -> Result<ExecutionResult, ExecutionError>;
}

/// Pool query for pending transactions.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PendingFilter {
    /// Minimum effective tip
    pub min_tip: Option<U256>,
    /// Base fee the tip is measured against
    pub base_fee: Option<U256>,
    /// Current blob fee; blob transactions must cover it
    pub blob_fee: Option<U256>,
    pub only_plain_txs: bool,
    pub only_blob_txs: bool,
}

impl PendingFilter {
    pub fn plain(mut self) -> Self {
        self.only_plain_txs = true;
        self.only_blob_txs = false;
        self
    }

    pub fn blobs(mut self) -> Self {
        self.only_plain_txs = false;
        self.only_blob_txs = true;
        self
    }
}

/// Pending transactions by sender, nonce ascending.
pub type PendingSet = BTreeMap<Address, Vec<LazyTransaction>>;

/// Port: the transaction pool.
pub trait TransactionPool: Send + Sync {
    fn pending(&self, filter: &PendingFilter) -> PendingSet;

    /// Senders whose transactions were submitted locally.
    fn locals(&self) -> Vec<Address>;
}

/// Port: chain head, ancestry and state.
pub trait ChainReader: Send + Sync {
    fn current_header(&self) -> Header;

    fn header_by_hash(&self, hash: &Hash) -> Option<Header>;

    /// Ledger state with the given root.
    fn state_at(&self, root: &Hash) -> Result<Arc<dyn AccountBackend>, SealingError>;
}

/// A finished block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SealedBlock {
    pub header: Header,
    pub transactions: Vec<SignedTransaction>,
    pub receipts: Vec<Receipt>,
    pub withdrawals: Vec<Withdrawal>,
}

impl SealedBlock {
    pub fn hash(&self) -> Hash {
        self.header.hash()
    }
}

/// Port: turn an assembled attempt into a block.
///
/// Withdrawals are credited to `state` before the state commitment is taken.
pub trait BlockFinalizer: Send + Sync {
    fn finalize(
        &self,
        header: &Header,
        state: &mut StateDb,
        txs: &[SignedTransaction],
        receipts: &[Receipt],
        withdrawals: &[Withdrawal],
    ) -> Result<SealedBlock, SealingError>;
}
