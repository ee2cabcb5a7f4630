//! Remote execution over the attested channel.
//!
//! `apply` only reserves gas and blob capacity and stages the transaction;
//! the whole batch goes out in one round trip from `finalize`. Nothing is
//! sent if the executor's attestation does not satisfy the policy.

use std::sync::Arc;

use async_trait::async_trait;
use shared_types::{Address, SignedTransaction};
use ss_04_attested_channel::{AttestedChannel, BatchRequest};
use tracing::{debug, info};

use super::merge::merge_response;
use super::{ApplyOutcome, BatchSummary, ExecutionBackend};
use crate::config::GasLimitPolicy;
use crate::domain::SealingContext;
use crate::error::{ExecutionError, SealingError};

#[derive(Debug)]
pub struct RemoteBackend {
    channel: Arc<AttestedChannel>,
    policy: GasLimitPolicy,
    staged: Vec<SignedTransaction>,
}

impl RemoteBackend {
    pub fn new(channel: Arc<AttestedChannel>, policy: GasLimitPolicy) -> Self {
        Self {
            channel,
            policy,
            staged: Vec::new(),
        }
    }

    /// Transactions staged so far, in commit order.
    pub fn staged(&self) -> &[SignedTransaction] {
        &self.staged
    }
}

#[async_trait]
impl ExecutionBackend for RemoteBackend {
    fn apply(
        &mut self,
        ctx: &mut SealingContext,
        tx: &SignedTransaction,
        _sender: Address,
    ) -> Result<ApplyOutcome, ExecutionError> {
        let blobs = if tx.is_blob() {
            let sidecar = tx.sidecar.as_ref().ok_or(ExecutionError::MissingBlobSidecar)?;
            if !ctx.blobs_fit(sidecar.len()) {
                return Err(ExecutionError::MaxBlobsReached);
            }
            sidecar.len()
        } else {
            0
        };

        ctx.gas_pool.sub_gas(tx.gas_limit())?;
        ctx.reserved_blobs += blobs;
        self.staged.push(tx.clone());
        Ok(ApplyOutcome::Deferred)
    }

    async fn finalize(&mut self, ctx: &mut SealingContext) -> Result<BatchSummary, SealingError> {
        if self.staged.is_empty() {
            return Ok(BatchSummary::default());
        }

        let staged = std::mem::take(&mut self.staged);
        // Reservations are replaced by the actual merged usage.
        ctx.gas_pool
            .set_gas(ctx.header.gas_limit.saturating_sub(ctx.header.gas_used));
        ctx.reserved_blobs = 0;

        let request = BatchRequest {
            transactions: staged.clone(),
            env: ctx.header_context(),
        };
        debug!(txs = staged.len(), number = ctx.header.number, "[ss-03] Submitting batch to remote executor");
        let response = self.channel.round_trip(&request).await?;

        let summary = merge_response(ctx, staged, response, self.policy)?;
        info!(
            submitted = summary.submitted,
            committed = summary.committed,
            missing_receipt = summary.missing_receipt,
            over_gas = summary.rejected_over_gas_limit,
            unanswered = summary.unanswered,
            "[ss-03] Merged remote execution results"
        );
        Ok(summary)
    }
}
