//! The two node roles, usable from the binary and from integration tests.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde::Serialize;
use shared_types::{Address, Hash, SignedTransaction, U256};
use ss_03_block_assembly::adapters::{BasicFinalizer, InMemoryChain, InMemoryTxPool, TransferEngine};
use ss_03_block_assembly::{
    connect_executor, CancellationSignal, ExecutionMode, ExecutorService, GenerateParams, Sealer,
};
use ss_04_attested_channel::{
    executor_router, ExecutorState, SimulatedReportIssuer, SimulatedReportVerifier,
};
use ss_telemetry::{NoopTrafficCollector, PrometheusTrafficCollector, TrafficCollector};
use tokio::net::TcpListener;
use tracing::info;

use crate::config::NodeConfig;

/// Router of the executor role: the attested protocol plus `GET /metrics`.
pub fn executor_app(config: &NodeConfig) -> anyhow::Result<Router> {
    let signer = config.executor.signer_bytes()?;
    if signer.is_empty() {
        bail!("executor.signer_id must be set");
    }

    let collector = Arc::new(PrometheusTrafficCollector::new()?);
    let service = ExecutorService::new(
        Arc::new(config.genesis.ledger()),
        Arc::new(TransferEngine::new(config.sealer.chain.clone())),
        config.sealer.chain.clone(),
        Duration::from_millis(config.executor.recommit_ms),
    );
    let state = ExecutorState::new(
        Arc::new(service),
        config.executor.certificate()?,
        &SimulatedReportIssuer::new(signer),
        collector.clone(),
    )
    .context("issuing executor report")?;

    let metrics = Router::new()
        .route("/metrics", get(render_metrics))
        .with_state(collector);
    Ok(executor_router(state).merge(metrics))
}

async fn render_metrics(State(collector): State<Arc<PrometheusTrafficCollector>>) -> Response {
    match collector.render() {
        Ok(text) => text.into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

/// Bind `executor.listen` and serve until the process stops.
pub async fn serve_executor(config: &NodeConfig) -> anyhow::Result<()> {
    let app = executor_app(config)?;
    let listener = TcpListener::bind(&config.executor.listen)
        .await
        .with_context(|| format!("binding {}", config.executor.listen))?;
    info!("[ss-node] Executor listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

/// Signed transactions from a JSON array file.
pub fn load_transactions(path: &Path) -> anyhow::Result<Vec<SignedTransaction>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

/// Options of one `seal` run.
#[derive(Clone, Debug, Default)]
pub struct SealOptions {
    pub timestamp: u64,
    pub coinbase: Address,
    /// Submit transactions as locals
    pub local: bool,
}

/// What the `seal` role prints.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SealSummary {
    pub number: u64,
    pub hash: Hash,
    pub parent_hash: Hash,
    pub state_root: Hash,
    pub transactions: usize,
    pub gas_used: u64,
    pub base_fee: Option<U256>,
    pub fees: U256,
    pub interrupted: Option<String>,
    pub remote_submitted: usize,
    pub remote_committed: usize,
}

/// Build one block on genesis from `txs` and import it.
pub async fn seal_block(
    config: &NodeConfig,
    txs: Vec<SignedTransaction>,
    options: &SealOptions,
) -> anyhow::Result<SealSummary> {
    let chain = Arc::new(InMemoryChain::new(
        config.genesis.header(),
        config.genesis.ledger(),
    ));
    let pool = Arc::new(InMemoryTxPool::new());
    for tx in txs {
        if options.local {
            pool.add_local(tx)?;
        } else {
            pool.add(tx)?;
        }
    }
    info!("[ss-node] Pool holds {} transactions", pool.len());

    let mut sealer = Sealer::new(
        config.sealer.clone(),
        chain.clone(),
        pool,
        Arc::new(TransferEngine::new(config.sealer.chain.clone())),
        Arc::new(BasicFinalizer),
    )?;
    if config.sealer.execution == ExecutionMode::Remote {
        let collector: Arc<dyn TrafficCollector> = Arc::new(NoopTrafficCollector);
        let channel = connect_executor(
            &config.sealer.remote,
            Arc::new(SimulatedReportVerifier),
            collector,
        )?;
        sealer = sealer.with_channel(Arc::new(channel));
    }

    let params = GenerateParams {
        timestamp: options.timestamp,
        coinbase: options.coinbase,
        ..Default::default()
    };
    let result = sealer
        .generate_work(&params, Arc::new(CancellationSignal::new()))
        .await?;

    let header = &result.block.header;
    let summary = SealSummary {
        number: header.number,
        hash: result.block.hash(),
        parent_hash: header.parent_hash,
        state_root: header.state_root,
        transactions: result.block.transactions.len(),
        gas_used: header.gas_used,
        base_fee: header.base_fee,
        fees: result.fees,
        interrupted: result.interrupted.map(|r| r.to_string()),
        remote_submitted: result.batch.submitted,
        remote_committed: result.batch.committed,
    };
    chain.import(&result.block, result.state.into_changes())?;
    Ok(summary)
}
