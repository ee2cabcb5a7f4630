//! # Split-Sealer Node
//!
//! Wiring for the `ss-node` binary.
//!
//! ## Roles
//!
//! - **executor**: serves [`ss_04_attested_channel::executor_router`] over
//!   an [`ss_03_block_assembly::ExecutorService`] backed by the genesis
//!   ledger, plus `GET /metrics` with the traffic counters.
//! - **seal**: loads signed transactions from a JSON file into an in-memory
//!   pool and builds one block on top of genesis, locally or through the
//!   configured remote executor.

pub mod config;
pub mod roles;

pub use config::{
    parse_address, ConfigError, ExecutorNodeConfig, GenesisAccount, GenesisConfig, NodeConfig,
};
pub use roles::{executor_app, seal_block, serve_executor, SealOptions, SealSummary};
