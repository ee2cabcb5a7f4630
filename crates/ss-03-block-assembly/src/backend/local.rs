//! Local execution against the context's own state.

use std::sync::Arc;

use async_trait::async_trait;
use shared_types::{Address, Receipt, SignedTransaction};
use ss_01_account_state::AccountStore;
use ss_04_attested_channel::StateModification;
use tracing::trace;

use super::{ApplyOutcome, BatchSummary, ExecutionBackend};
use crate::domain::SealingContext;
use crate::error::{ExecutionError, SealingError};
use crate::ports::ExecutionEngine;

pub struct LocalBackend {
    engine: Arc<dyn ExecutionEngine>,
    trace: bool,
}

impl std::fmt::Debug for LocalBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalBackend")
            .field("trace", &self.trace)
            .finish_non_exhaustive()
    }
}

impl LocalBackend {
    pub fn new(engine: Arc<dyn ExecutionEngine>) -> Self {
        Self {
            engine,
            trace: false,
        }
    }

    /// Backend that also reports pre/post snapshots of every touched account.
    pub fn traced(engine: Arc<dyn ExecutionEngine>) -> Self {
        Self {
            engine,
            trace: true,
        }
    }

    fn execute(
        &self,
        ctx: &mut SealingContext,
        tx: &SignedTransaction,
        sender: Address,
    ) -> Result<Receipt, ExecutionError> {
        let gas_limit = tx.gas_limit();
        ctx.gas_pool.sub_gas(gas_limit)?;
        let result = self.engine.run(&mut ctx.state, &ctx.header, tx, sender)?;
        ctx.gas_pool.add_gas(gas_limit.saturating_sub(result.gas_used));
        ctx.header.gas_used = ctx.header.gas_used.saturating_add(result.gas_used);

        Ok(Receipt {
            tx_hash: tx.hash(),
            status: result.status,
            gas_used: result.gas_used,
            cumulative_gas_used: ctx.header.gas_used,
            blob_gas_used: result.blob_gas_used,
            effective_gas_price: tx.fees().effective_gas_price(ctx.header.base_fee),
            contract_address: result.contract_address,
            transaction_index: ctx.tcount as u64,
        })
    }
}

#[async_trait]
impl ExecutionBackend for LocalBackend {
    fn apply(
        &mut self,
        ctx: &mut SealingContext,
        tx: &SignedTransaction,
        sender: Address,
    ) -> Result<ApplyOutcome, ExecutionError> {
        if tx.is_blob() {
            let sidecar = tx.sidecar.as_ref().ok_or(ExecutionError::MissingBlobSidecar)?;
            if !ctx.blobs_fit(sidecar.len()) {
                return Err(ExecutionError::MaxBlobsReached);
            }
        }

        let snapshot = ctx.state.snapshot();
        let gas_header = ctx.header.gas_used;
        let gas_pool = ctx.gas_pool.gas();

        let receipt = match self.execute(ctx, tx, sender) {
            Ok(receipt) => receipt,
            Err(e) => {
                ctx.state.revert(snapshot)?;
                ctx.gas_pool.set_gas(gas_pool);
                ctx.header.gas_used = gas_header;
                return Err(e);
            }
        };

        let trace = if self.trace {
            let (pre, post) = ctx.state.changes_since(snapshot)?;
            Some(StateModification {
                pre,
                post,
                tx: tx.without_sidecar(),
                receipt: Some(receipt.clone()),
            })
        } else {
            None
        };

        trace!(hash = %receipt.tx_hash, gas_used = receipt.gas_used, "Transaction applied");
        ctx.commit(tx, receipt.clone());
        Ok(ApplyOutcome::Committed { receipt, trace })
    }

    async fn finalize(&mut self, ctx: &mut SealingContext) -> Result<BatchSummary, SealingError> {
        Ok(BatchSummary {
            committed: ctx.tcount,
            ..Default::default()
        })
    }
}
