//! # Execution Backends
//!
//! One interface, two implementations, chosen once per attempt:
//!
//! - [`LocalBackend`]: runs each transaction against the context's state
//!   immediately (optionally recording a pre/post trace per transaction).
//! - [`RemoteBackend`]: stages transactions and executes the whole batch in
//!   a single attested round trip from [`ExecutionBackend::finalize`].

pub mod local;
pub mod merge;
pub mod remote;

pub use local::LocalBackend;
pub use remote::RemoteBackend;

use async_trait::async_trait;
use shared_types::{Address, Receipt, SignedTransaction};
use ss_04_attested_channel::StateModification;

use crate::domain::SealingContext;
use crate::error::{ExecutionError, SealingError};

/// Result of handing one transaction to a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Applied to the context.
    Committed {
        receipt: Receipt,
        trace: Option<StateModification>,
    },
    /// Accepted for later execution in [`ExecutionBackend::finalize`].
    Deferred,
}

/// Counters of one backend finalisation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Transactions sent to the executor
    pub submitted: usize,
    /// Records merged into the context
    pub committed: usize,
    /// Records without a receipt
    pub missing_receipt: usize,
    /// Records dropped by the gas limit policy
    pub rejected_over_gas_limit: usize,
    /// Records dropped for lack of blob capacity
    pub rejected_over_blob_limit: usize,
    /// Submitted transactions the executor did not return
    pub unanswered: usize,
    /// Gas merged beyond the header limit; only non-zero under
    /// [`GasLimitPolicy::Unchecked`](crate::GasLimitPolicy::Unchecked)
    pub gas_over_limit: u64,
}

#[async_trait]
pub trait ExecutionBackend: Send {
    /// Apply `tx` or stage it.
    ///
    /// On `Err` the context's state and gas pool are as they were before
    /// the call.
    fn apply(
        &mut self,
        ctx: &mut SealingContext,
        tx: &SignedTransaction,
        sender: Address,
    ) -> Result<ApplyOutcome, ExecutionError>;

    /// Complete any deferred work. Called once after the commit loops of an
    /// attempt, including interrupted ones.
    async fn finalize(&mut self, ctx: &mut SealingContext) -> Result<BatchSummary, SealingError>;
}
