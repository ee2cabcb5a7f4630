//! # Sealing Worker
//!
//! Drives one block-building attempt end to end:
//!
//! ```text
//! prepare_work ──→ fill_transactions ──→ backend.finalize ──→ BlockFinalizer
//!  (parent, header     (locals, then        (no-op locally,     (state and
//!   calculus, state)    remotes; deadline)   one round trip       tx commitments)
//!                                            remotely)
//! ```
//!
//! An interrupted attempt still produces a block from whatever was
//! committed; [`PayloadResult::interrupted`] carries the reason.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use shared_types::{Address, BlobSidecar, Hash, Header, Receipt, Withdrawal, U256};
use ss_01_account_state::StateDb;
use ss_02_transaction_ordering::TransactionOrderer;
use ss_04_attested_channel::{AttestedChannel, HttpsTransport, ReportVerifier};
use ss_telemetry::TrafficCollector;
use tracing::{debug, info, warn};

use crate::backend::{BatchSummary, ExecutionBackend, LocalBackend, RemoteBackend};
use crate::config::{ExecutionMode, RemoteExecutorConfig, SealerConfig};
use crate::domain::{
    calc_base_fee, calc_blob_fee, calc_excess_blob_gas, calc_gas_limit, commit_transactions,
    total_fees, CancellationSignal, DeadlineTimer, SealingContext,
};
use crate::error::{InterruptReason, Result, SealingError};
use crate::metrics::SealerMetrics;
use crate::ports::{
    BlockFinalizer, ChainReader, ExecutionEngine, PendingFilter, PendingSet, SealedBlock,
    TransactionPool,
};

/// Inputs of one attempt.
#[derive(Clone, Debug, Default)]
pub struct GenerateParams {
    /// Requested timestamp
    pub timestamp: u64,
    /// Fail instead of bumping a timestamp not after the parent's
    pub force_time: bool,
    /// Parent block; zero selects the current head
    pub parent_hash: Hash,
    pub coinbase: Address,
    /// Mix digest of the new header
    pub random: Hash,
    pub withdrawals: Vec<Withdrawal>,
    pub beacon_root: Option<Hash>,
    /// Build an empty block
    pub no_txs: bool,
}

/// Outcome of [`Sealer::generate_work`].
#[derive(Debug)]
pub struct PayloadResult {
    pub block: SealedBlock,
    /// Priority fees paid to the coinbase
    pub fees: U256,
    pub sidecars: Vec<BlobSidecar>,
    /// State after the block, uncommitted
    pub state: StateDb,
    pub interrupted: Option<InterruptReason>,
    pub batch: BatchSummary,
}

impl PayloadResult {
    pub fn receipts(&self) -> &[Receipt] {
        &self.block.receipts
    }

    /// Treat an interrupted attempt as an error.
    pub fn complete(self) -> Result<Self> {
        match self.interrupted {
            Some(reason) => Err(SealingError::Interrupted(reason)),
            None => Ok(self),
        }
    }
}

/// Open an attested channel to the configured executor.
pub fn connect_executor(
    remote: &RemoteExecutorConfig,
    verifier: Arc<dyn ReportVerifier>,
    collector: Arc<dyn TrafficCollector>,
) -> Result<AttestedChannel> {
    remote.validate()?;
    let transport = HttpsTransport::new(remote.endpoint.clone(), remote.timeout())?;
    Ok(AttestedChannel::new(
        Arc::new(transport),
        verifier,
        remote.policy()?,
        collector,
        remote.timeout(),
    ))
}

pub struct Sealer {
    config: SealerConfig,
    chain: Arc<dyn ChainReader>,
    pool: Arc<dyn TransactionPool>,
    engine: Arc<dyn ExecutionEngine>,
    finalizer: Arc<dyn BlockFinalizer>,
    channel: Option<Arc<AttestedChannel>>,
    metrics: Arc<SealerMetrics>,
}

impl std::fmt::Debug for Sealer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sealer")
            .field("config", &self.config)
            .field("remote", &self.channel.is_some())
            .finish_non_exhaustive()
    }
}

impl Sealer {
    pub fn new(
        config: SealerConfig,
        chain: Arc<dyn ChainReader>,
        pool: Arc<dyn TransactionPool>,
        engine: Arc<dyn ExecutionEngine>,
        finalizer: Arc<dyn BlockFinalizer>,
    ) -> Result<Self> {
        config.validate()?;
        info!("[ss-03] Initializing sealer");
        info!("  Execution: {:?}", config.execution);
        info!("  Gas ceil: {}", config.gas_ceil);
        info!("  Recommit: {:?}", config.recommit());
        Ok(Self {
            config,
            chain,
            pool,
            engine,
            finalizer,
            channel: None,
            metrics: Arc::new(SealerMetrics::new()),
        })
    }

    /// Attach the attested channel used in remote mode.
    pub fn with_channel(mut self, channel: Arc<AttestedChannel>) -> Self {
        self.channel = Some(channel);
        self
    }

    pub fn config(&self) -> &SealerConfig {
        &self.config
    }

    pub fn metrics(&self) -> Arc<SealerMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Backend for one attempt, per the configured execution mode.
    fn backend(&self) -> Result<Box<dyn ExecutionBackend>> {
        match self.config.execution {
            ExecutionMode::Local => Ok(Box::new(LocalBackend::new(Arc::clone(&self.engine)))),
            ExecutionMode::Remote => {
                let channel = self.channel.as_ref().ok_or_else(|| {
                    SealingError::InvalidConfig("remote execution without an attested channel".into())
                })?;
                Ok(Box::new(RemoteBackend::new(
                    Arc::clone(channel),
                    self.config.remote.gas_limit_policy,
                )))
            }
        }
    }

    /// Build the sealing context for the child of the requested parent.
    pub fn prepare_work(&self, params: &GenerateParams) -> Result<SealingContext> {
        let parent = if params.parent_hash.is_zero() {
            self.chain.current_header()
        } else {
            self.chain
                .header_by_hash(&params.parent_hash)
                .ok_or(SealingError::MissingParent)?
        };

        let mut timestamp = params.timestamp;
        if parent.timestamp >= timestamp {
            if params.force_time {
                return Err(SealingError::InvalidTimestamp {
                    parent: parent.timestamp,
                    given: timestamp,
                });
            }
            timestamp = parent.timestamp + 1;
        }

        let chain = &self.config.chain;
        let number = parent.number + 1;
        let mut header = Header {
            parent_hash: parent.hash(),
            number,
            timestamp,
            coinbase: params.coinbase,
            gas_limit: calc_gas_limit(parent.gas_limit, self.config.gas_ceil),
            extra_data: self.config.extra_data.clone(),
            mix_digest: params.random,
            ..Default::default()
        };

        if chain.is_london(number) {
            header.base_fee = Some(calc_base_fee(chain, &parent));
            if !chain.is_london(parent.number) {
                let parent_gas_limit = parent.gas_limit.saturating_mul(chain.elasticity_multiplier);
                header.gas_limit = calc_gas_limit(parent_gas_limit, self.config.gas_ceil);
            }
        }

        if chain.is_cancun(number, timestamp) {
            let excess = if chain.is_cancun(parent.number, parent.timestamp) {
                calc_excess_blob_gas(
                    parent.excess_blob_gas.unwrap_or(0),
                    parent.blob_gas_used.unwrap_or(0),
                )
            } else {
                0
            };
            header.excess_blob_gas = Some(excess);
            header.blob_gas_used = Some(0);
            header.parent_beacon_root = params.beacon_root;
        }

        let state = self.chain.state_at(&parent.state_root)?;
        debug!(
            number,
            timestamp,
            gas_limit = header.gas_limit,
            base_fee = ?header.base_fee,
            "[ss-03] Prepared sealing context"
        );
        Ok(SealingContext::new(header, StateDb::new(state), params.coinbase))
    }

    /// Pack pending pool transactions into `ctx`: locals first, then remotes.
    ///
    /// Returns the interruption reason if the signal fired.
    pub fn fill_transactions(
        &self,
        signal: &CancellationSignal,
        ctx: &mut SealingContext,
        backend: &mut dyn ExecutionBackend,
    ) -> Result<Option<InterruptReason>> {
        let base_fee = ctx.header.base_fee;
        let filter = PendingFilter {
            min_tip: Some(self.config.min_tip.as_u256()),
            base_fee,
            blob_fee: ctx.header.excess_blob_gas.map(calc_blob_fee),
            ..Default::default()
        };
        let plain = self.pool.pending(&filter.clone().plain());
        let blobs = self.pool.pending(&filter.blobs());

        let locals: HashSet<Address> = self.pool.locals().into_iter().collect();
        let (local_plain, remote_plain) = split_locals(plain, &locals);
        let (local_blobs, remote_blobs) = split_locals(blobs, &locals);

        for (plain, blobs) in [(local_plain, local_blobs), (remote_plain, remote_blobs)] {
            if plain.is_empty() && blobs.is_empty() {
                continue;
            }
            let mut plain = TransactionOrderer::new(plain, base_fee);
            let mut blobs = TransactionOrderer::new(blobs, base_fee);
            let outcome =
                commit_transactions(ctx, &mut plain, &mut blobs, backend, signal, &self.config.chain)?;
            self.metrics.record_skipped(outcome.skipped);
            if let Some(reason) = outcome.interrupted() {
                return Ok(Some(reason));
            }
        }
        Ok(None)
    }

    /// Run one full attempt and seal its block.
    pub async fn generate_work(
        &self,
        params: &GenerateParams,
        signal: Arc<CancellationSignal>,
    ) -> Result<PayloadResult> {
        let start = Instant::now();
        self.metrics.record_attempt();

        let mut ctx = self.prepare_work(params)?;
        let mut backend = self.backend()?;

        let mut interrupted = None;
        let mut batch = BatchSummary::default();
        if !params.no_txs {
            let timer = DeadlineTimer::arm(Arc::clone(&signal), self.config.recommit());
            let filled = self.fill_transactions(&signal, &mut ctx, backend.as_mut());
            timer.disarm();
            interrupted = filled?;

            batch = backend.finalize(&mut ctx).await?;
            self.metrics.record_batch(&batch);

            match interrupted {
                Some(InterruptReason::Timeout) => warn!(
                    allowance = ?self.config.recommit(),
                    "[ss-03] Block building is interrupted"
                ),
                Some(reason) => debug!(%reason, "[ss-03] Block building is interrupted"),
                None => {}
            }
            if let Some(reason) = interrupted {
                self.metrics.record_interruption(reason);
            }
        }

        let block = self.finalizer.finalize(
            &ctx.header,
            &mut ctx.state,
            &ctx.txs,
            &ctx.receipts,
            &params.withdrawals,
        )?;
        let fees = total_fees(&block.transactions, &block.receipts, block.header.base_fee);
        self.metrics.record_block_sealed(block.transactions.len());
        info!(
            number = block.header.number,
            hash = %block.hash(),
            txs = block.transactions.len(),
            gas_used = block.header.gas_used,
            fees = %fees,
            elapsed = ?start.elapsed(),
            "[ss-03] Sealed block"
        );

        Ok(PayloadResult {
            block,
            fees,
            sidecars: ctx.sidecars,
            state: ctx.state,
            interrupted,
            batch,
        })
    }
}

fn split_locals(set: PendingSet, locals: &HashSet<Address>) -> (PendingSet, PendingSet) {
    set.into_iter()
        .partition::<BTreeMap<_, _>, _>(|(sender, _)| locals.contains(sender))
}
