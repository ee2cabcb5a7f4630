//! Error types for block assembly

use shared_types::Address;
use ss_01_account_state::StateError;
use ss_04_attested_channel::ChannelError;
use thiserror::Error;

/// Result type alias for sealing operations
pub type Result<T> = std::result::Result<T, SealingError>;

/// Why a commit loop stopped early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptReason {
    NewHead,
    Resubmit,
    Timeout,
}

impl std::fmt::Display for InterruptReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            InterruptReason::NewHead => "new head arrived while building block",
            InterruptReason::Resubmit => "recommit interrupt while building block",
            InterruptReason::Timeout => "timeout while building block",
        })
    }
}

/// Transaction-level failures. The commit loop recovers from all of them by
/// shifting or popping the sender's queue.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    #[error("nonce too low: address {address:?}, tx {tx}, state {state}")]
    NonceTooLow { address: Address, tx: u64, state: u64 },

    #[error("nonce too high: address {address:?}, tx {tx}, state {state}")]
    NonceTooHigh { address: Address, tx: u64, state: u64 },

    #[error("insufficient funds for gas * price + value: address {address:?}")]
    InsufficientFunds { address: Address },

    #[error("intrinsic gas too low: have {have}, want {want}")]
    IntrinsicGas { have: u64, want: u64 },

    #[error("gas limit reached")]
    GasLimitReached,

    #[error("max fee per gas less than block base fee")]
    FeeCapBelowBaseFee,

    #[error("max priority fee per gas higher than max fee per gas")]
    TipAboveFeeCap,

    #[error("max fee per blob gas less than block blob gas fee")]
    BlobFeeCapTooLow,

    #[error("max data blobs reached")]
    MaxBlobsReached,

    #[error("blob transaction without sidecar")]
    MissingBlobSidecar,

    #[error("sender recovery failed: {0}")]
    SenderRecovery(String),

    #[error("state access failed: {0}")]
    State(#[from] StateError),
}

impl ExecutionError {
    /// Stale view of the sender's nonce; its later transactions stay valid.
    pub fn is_nonce_too_low(&self) -> bool {
        matches!(self, ExecutionError::NonceTooLow { .. })
    }
}

/// Caller-visible failure class of an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Cancellation,
    RemoteChannel,
    Internal,
}

/// Attempt-level failures.
#[derive(Debug, Error)]
pub enum SealingError {
    #[error("{0}")]
    Interrupted(InterruptReason),

    #[error("remote execution failed: {0}")]
    RemoteChannel(#[from] ChannelError),

    #[error("malformed remote result: {0}")]
    Decode(String),

    #[error("missing parent")]
    MissingParent,

    #[error("invalid timestamp, parent {parent} given {given}")]
    InvalidTimestamp { parent: u64, given: u64 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("state error: {0}")]
    State(#[from] StateError),

    #[error("failed to finalize block: {0}")]
    Finalize(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl SealingError {
    pub fn kind(&self) -> FailureKind {
        match self {
            SealingError::Interrupted(_) => FailureKind::Cancellation,
            SealingError::RemoteChannel(_) | SealingError::Decode(_) => FailureKind::RemoteChannel,
            _ => FailureKind::Internal,
        }
    }
}
