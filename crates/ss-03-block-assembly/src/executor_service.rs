//! # Executor Service
//!
//! The remote side of split sealing. Runs a received batch through the same
//! commit loop the sealer uses, in trace mode, over the executor's own
//! ledger, and reports one [`StateModification`] per applied transaction.
//!
//! The ledger is never written: each batch works on a throwaway overlay.
//!
//! [`StateModification`]: ss_04_attested_channel::StateModification

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use shared_types::{group_by_sender, ChainConfig, Header};
use ss_01_account_state::{AccountBackend, StateDb};
use ss_02_transaction_ordering::TransactionOrderer;
use ss_04_attested_channel::{
    BatchExecutor, BatchRequest, BatchResponse, ExecutorError, ExecutorHeaderView,
};
use tracing::{debug, info, warn};

use crate::backend::LocalBackend;
use crate::domain::{commit_transactions, CancellationSignal, DeadlineTimer, SealingContext};
use crate::error::InterruptReason;
use crate::ports::ExecutionEngine;

pub struct ExecutorService {
    ledger: Arc<dyn AccountBackend>,
    engine: Arc<dyn ExecutionEngine>,
    chain: ChainConfig,
    recommit: Duration,
}

impl ExecutorService {
    pub fn new(
        ledger: Arc<dyn AccountBackend>,
        engine: Arc<dyn ExecutionEngine>,
        chain: ChainConfig,
        recommit: Duration,
    ) -> Self {
        Self {
            ledger,
            engine,
            chain,
            recommit,
        }
    }
}

#[async_trait]
impl BatchExecutor for ExecutorService {
    async fn execute(&self, request: BatchRequest) -> Result<BatchResponse, ExecutorError> {
        let env = request.env;
        if env.gas_limit == 0 {
            return Err(ExecutorError::InvalidBatch("zero gas limit".into()));
        }
        let header = Header {
            parent_hash: env.parent_hash,
            number: env.number,
            timestamp: env.timestamp,
            coinbase: env.coinbase,
            gas_limit: env.gas_limit,
            base_fee: env.base_fee,
            excess_blob_gas: env.excess_blob_gas,
            blob_gas_used: env.excess_blob_gas.map(|_| 0),
            ..Default::default()
        };
        let mut ctx = SealingContext::new(header, StateDb::new(Arc::clone(&self.ledger)), env.coinbase);

        let submitted = request.transactions.len();
        let (blobs, plain): (Vec<_>, Vec<_>) =
            request.transactions.into_iter().partition(|tx| tx.is_blob());
        let mut plain = TransactionOrderer::new(group_by_sender(plain), env.base_fee);
        let mut blobs = TransactionOrderer::new(group_by_sender(blobs), env.base_fee);

        let signal = Arc::new(CancellationSignal::new());
        let timer = DeadlineTimer::arm(Arc::clone(&signal), self.recommit);
        let mut backend = LocalBackend::traced(Arc::clone(&self.engine));
        let outcome = commit_transactions(
            &mut ctx,
            &mut plain,
            &mut blobs,
            &mut backend,
            &signal,
            &self.chain,
        )
        .map_err(|e| ExecutorError::Execution(e.to_string()))?;
        timer.disarm();

        match outcome.interrupted() {
            Some(InterruptReason::Timeout) => {
                warn!(allowance = ?self.recommit, "Batch execution is interrupted");
            }
            Some(reason) => debug!(%reason, "Batch execution is interrupted"),
            None => {}
        }
        info!(
            number = ctx.header.number,
            submitted,
            applied = outcome.applied,
            gas_used = ctx.header.gas_used,
            "Executed batch"
        );

        Ok(BatchResponse {
            results: outcome.traces,
            header: ExecutorHeaderView {
                gas_used: ctx.header.gas_used,
                blob_gas_used: ctx.header.blob_gas_used.unwrap_or(0),
            },
        })
    }
}
