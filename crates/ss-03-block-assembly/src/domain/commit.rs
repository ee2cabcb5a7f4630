//! # Commit Loop
//!
//! Greedy packing of the plain and blob orderers into one
//! [`SealingContext`] until the block is full, the queues run dry or the
//! attempt is cancelled.
//!
//! ## Per-candidate Rules
//!
//! | Outcome                         | Orderer action |
//! |---------------------------------|----------------|
//! | applied / staged                | `shift`        |
//! | nonce too low                   | `shift`        |
//! | over gas or blob budget         | `pop`          |
//! | evicted from pool               | `pop`          |
//! | replay-protected before EIP-155 | `pop`          |
//! | any other execution failure     | `pop`          |

use shared_types::params::TX_GAS;
use shared_types::ChainConfig;
use ss_02_transaction_ordering::{pick, QueueKind, TransactionOrderer};
use ss_04_attested_channel::StateModification;
use tracing::{debug, trace};

use super::context::SealingContext;
use super::signal::CancellationSignal;
use crate::backend::{ApplyOutcome, ExecutionBackend};
use crate::error::{ExecutionError, InterruptReason, SealingError};

/// Why the loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Interrupted(InterruptReason),
    /// Less than one plain transfer's gas left.
    GasExhausted,
    /// Both orderers drained.
    Done,
}

#[derive(Debug, Default)]
pub struct CommitOutcome {
    pub state: Option<LoopState>,
    /// Transactions applied to the context
    pub applied: usize,
    /// Transactions staged for later execution
    pub deferred: usize,
    /// Senders dropped from the orderers
    pub skipped: usize,
    /// Per-transaction traces, when the backend records them
    pub traces: Vec<StateModification>,
}

impl CommitOutcome {
    pub fn interrupted(&self) -> Option<InterruptReason> {
        match self.state {
            Some(LoopState::Interrupted(reason)) => Some(reason),
            _ => None,
        }
    }
}

fn orderer<'a>(
    kind: QueueKind,
    plain: &'a mut TransactionOrderer,
    blob: &'a mut TransactionOrderer,
) -> &'a mut TransactionOrderer {
    match kind {
        QueueKind::Plain => plain,
        QueueKind::Blob => blob,
    }
}

/// Pack transactions from both orderers into `ctx`.
///
/// Only state access failures abort the loop with an error; every other
/// per-transaction failure drops the offending sender and moves on.
pub fn commit_transactions(
    ctx: &mut SealingContext,
    plain: &mut TransactionOrderer,
    blob: &mut TransactionOrderer,
    backend: &mut dyn ExecutionBackend,
    signal: &CancellationSignal,
    chain: &ChainConfig,
) -> Result<CommitOutcome, SealingError> {
    let mut outcome = CommitOutcome::default();

    let state = loop {
        if let Some(reason) = signal.reason() {
            break LoopState::Interrupted(reason);
        }
        if ctx.gas_pool.gas() < TX_GAS {
            trace!(have = ctx.gas_pool.gas(), want = TX_GAS, "Not enough gas for further transactions");
            break LoopState::GasExhausted;
        }
        if !blob.is_empty() && ctx.blob_gas_left() == 0 {
            trace!("Not enough blob space for further blob transactions");
            blob.clear();
        }

        let Some(kind) = pick(plain.peek(), blob.peek()) else {
            break LoopState::Done;
        };
        let queue = orderer(kind, plain, blob);
        let Some(ltx) = queue.peek().map(|(tx, _)| tx.clone()) else {
            break LoopState::Done;
        };

        if ctx.gas_pool.gas() < ltx.gas {
            trace!(hash = %ltx.hash, left = ctx.gas_pool.gas(), needed = ltx.gas, "Not enough gas left for transaction");
            queue.pop();
            outcome.skipped += 1;
            continue;
        }
        if ctx.blob_gas_left() < ltx.blob_gas {
            trace!(hash = %ltx.hash, left = ctx.blob_gas_left(), needed = ltx.blob_gas, "Not enough blob gas left for transaction");
            queue.pop();
            outcome.skipped += 1;
            continue;
        }

        let Some(tx) = ltx.resolve() else {
            trace!(hash = %ltx.hash, "Ignoring evicted transaction");
            queue.pop();
            outcome.skipped += 1;
            continue;
        };

        if tx.is_protected() && !chain.is_eip155(ctx.header.number) {
            trace!(hash = %ltx.hash, eip155 = chain.eip155_block, "Ignoring replay protected transaction");
            queue.pop();
            outcome.skipped += 1;
            continue;
        }

        match backend.apply(ctx, &tx, ltx.sender) {
            Ok(ApplyOutcome::Committed { trace, .. }) => {
                outcome.applied += 1;
                outcome.traces.extend(trace);
                queue.shift();
            }
            Ok(ApplyOutcome::Deferred) => {
                outcome.deferred += 1;
                queue.shift();
            }
            Err(e) if e.is_nonce_too_low() => {
                trace!(sender = ?ltx.sender, nonce = ltx.nonce, "Skipping transaction with low nonce");
                queue.shift();
            }
            Err(ExecutionError::State(e)) => return Err(SealingError::State(e)),
            Err(e) => {
                debug!(hash = %ltx.hash, error = %e, "Transaction failed, account skipped");
                queue.pop();
                outcome.skipped += 1;
            }
        }
    };

    outcome.state = Some(state);
    Ok(outcome)
}
