//! Shared fixtures for the integration flows and the benchmarks.

use std::sync::Arc;

use k256::ecdsa::SigningKey;
use shared_types::{
    address_from_key, Address, FeeFields, Header, Quantity, SignedTransaction,
    UnsignedTransaction, U256,
};
use ss_03_block_assembly::adapters::{BasicFinalizer, InMemoryChain, InMemoryTxPool, TransferEngine};
use ss_03_block_assembly::{ExecutionMode, Sealer, SealerConfig};
use ss_node::{executor_app, GenesisAccount, NodeConfig};
use tokio::net::TcpListener;

/// Signer id the in-process executors attest with.
pub const SIGNER_ID: &str = "0x5349474e4552";

pub const GWEI: u64 = 1_000_000_000;

pub fn key(seed: u8) -> SigningKey {
    // Zero is not a valid scalar.
    SigningKey::from_slice(&[seed.max(1); 32]).expect("non-zero scalar")
}

pub fn sender(seed: u8) -> Address {
    address_from_key(key(seed).verifying_key())
}

/// Plain value transfer paying `tip_gwei` on top of a 1 gwei base fee.
pub fn transfer(seed: u8, nonce: u64, tip_gwei: u64) -> SignedTransaction {
    let unsigned = UnsignedTransaction {
        chain_id: Some(1337),
        nonce,
        gas_limit: 21_000,
        fees: FeeFields::Dynamic {
            max_fee_per_gas: U256::from(100 * GWEI),
            max_priority_fee_per_gas: U256::from(tip_gwei * GWEI),
        },
        to: Some(Address::repeat_byte(0x77)),
        value: U256::from(1_000),
        data: vec![],
        blob_hashes: vec![],
        max_fee_per_blob_gas: None,
    };
    SignedTransaction::sign(unsigned, &key(seed)).expect("signing")
}

/// Node config with every `seeds` sender funded and an executor signer set.
pub fn node_config(seeds: &[u8]) -> NodeConfig {
    let mut config = NodeConfig::default();
    config.executor.signer_id = SIGNER_ID.to_string();
    config.genesis.timestamp = 1_000;
    config.genesis.alloc = seeds
        .iter()
        .map(|seed| GenesisAccount {
            address: sender(*seed),
            balance: Quantity::from(U256::exp10(21)),
            nonce: 0,
        })
        .collect();
    config
}

/// Point `config` at a remote executor expecting `signer_id`.
pub fn remote(mut config: NodeConfig, endpoint: &str, signer_id: &str) -> NodeConfig {
    config.sealer.execution = ExecutionMode::Remote;
    config.sealer.remote.endpoint = endpoint.to_string();
    config.sealer.remote.signer_id = signer_id.to_string();
    config
}

/// Serve `router` on an ephemeral local port; returns its base URL.
pub async fn spawn_router(router: axum::Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    format!("http://{addr}")
}

/// Executor role of `config`, served in-process.
pub async fn spawn_executor(config: &NodeConfig) -> String {
    spawn_router(executor_app(config).expect("executor app")).await
}

pub fn genesis(gas_limit: u64) -> Header {
    Header {
        gas_limit,
        timestamp: 1_000,
        base_fee: Some(U256::from(GWEI)),
        excess_blob_gas: Some(0),
        blob_gas_used: Some(0),
        ..Default::default()
    }
}

/// Local sealer over a fresh chain funding `seeds`.
pub fn local_sealer(
    seeds: &[u8],
    config: SealerConfig,
    gas_limit: u64,
) -> (Sealer, Arc<InMemoryTxPool>, Arc<InMemoryChain>) {
    let ledger = node_config(seeds).genesis.ledger();
    let chain = Arc::new(InMemoryChain::new(genesis(gas_limit), ledger));
    let pool = Arc::new(InMemoryTxPool::new());
    let sealer = Sealer::new(
        config.clone(),
        chain.clone(),
        pool.clone(),
        Arc::new(TransferEngine::new(config.chain)),
        Arc::new(BasicFinalizer),
    )
    .expect("valid sealer config");
    (sealer, pool, chain)
}
