//! Node configuration: TOML file plus `SS_*` environment overrides.
//!
//! ```toml
//! [sealer]
//! recommit_ms = 2000
//! gas_ceil = 30000000
//! execution = "remote"
//!
//! [sealer.remote]
//! endpoint = "http://127.0.0.1:8443"
//! signer_id = "0x5349474e4552"
//!
//! [executor]
//! listen = "127.0.0.1:8443"
//! signer_id = "0x5349474e4552"
//!
//! [genesis]
//! gas_limit = 30000000
//! base_fee = "0x3b9aca00"
//! alloc = [{ address = "0x...", balance = "1000000000000000000" }]
//! ```
//!
//! | Variable | Overrides |
//! |----------|-----------|
//! | `SS_EXECUTION` | `sealer.execution` (`local` / `remote`) |
//! | `SS_REMOTE_ENDPOINT` | `sealer.remote.endpoint` |
//! | `SS_SIGNER_ID` | `sealer.remote.signer_id` and `executor.signer_id` |
//! | `SS_EXECUTOR_LISTEN` | `executor.listen` |
//! | `SS_GAS_CEIL` | `sealer.gas_ceil` |
//! | `SS_RECOMMIT_MS` | `sealer.recommit_ms` |

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use shared_types::codec::{decode_fixed, decode_hex};
use shared_types::{Address, Header, Quantity};
use ss_01_account_state::{Account, InMemoryAccountBackend};
use ss_03_block_assembly::{ExecutionMode, SealerConfig};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {error}")]
    Io { path: String, error: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid value for {key}: {value}")]
    Env { key: String, value: String },

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Executor role settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorNodeConfig {
    /// Listen address of the attested channel
    pub listen: String,

    /// DER certificate served on `/cert`; a placeholder is served if unset
    pub certificate_path: Option<PathBuf>,

    /// Signer id embedded in the simulated report (hex)
    pub signer_id: String,

    /// Commit deadline for one batch
    pub recommit_ms: u64,
}

impl Default for ExecutorNodeConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:8443".to_string(),
            certificate_path: None,
            signer_id: String::new(),
            recommit_ms: ss_03_block_assembly::config::DEFAULT_RECOMMIT_MS,
        }
    }
}

impl ExecutorNodeConfig {
    pub fn signer_bytes(&self) -> Result<Vec<u8>, ConfigError> {
        decode_hex(&self.signer_id).map_err(|e| ConfigError::Invalid(format!("executor.signer_id: {e}")))
    }

    /// Certificate bytes to serve.
    pub fn certificate(&self) -> Result<Vec<u8>, ConfigError> {
        match &self.certificate_path {
            Some(path) => fs::read(path).map_err(|e| ConfigError::Io {
                path: path.display().to_string(),
                error: e.to_string(),
            }),
            None => {
                warn!("No executor certificate configured; serving a placeholder (plain HTTP only)");
                Ok(b"split-sealer development certificate".to_vec())
            }
        }
    }
}

/// Funded account at genesis.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisAccount {
    pub address: Address,
    pub balance: Quantity,
    #[serde(default)]
    pub nonce: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenesisConfig {
    pub gas_limit: u64,
    pub timestamp: u64,
    pub base_fee: Option<Quantity>,
    pub alloc: Vec<GenesisAccount>,
}

impl Default for GenesisConfig {
    fn default() -> Self {
        Self {
            gas_limit: ss_03_block_assembly::config::DEFAULT_GAS_CEIL,
            timestamp: 0,
            base_fee: Some(Quantity::from(shared_types::params::INITIAL_BASE_FEE)),
            alloc: Vec::new(),
        }
    }
}

impl GenesisConfig {
    pub fn header(&self) -> Header {
        Header {
            gas_limit: self.gas_limit,
            timestamp: self.timestamp,
            base_fee: self.base_fee.map(|q| q.as_u256()),
            excess_blob_gas: Some(0),
            blob_gas_used: Some(0),
            ..Default::default()
        }
    }

    pub fn ledger(&self) -> InMemoryAccountBackend {
        InMemoryAccountBackend::with_accounts(self.alloc.iter().map(|a| {
            (
                a.address,
                Account::with_balance(a.balance.as_u256()).with_nonce(a.nonce),
            )
        }))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub sealer: SealerConfig,
    pub executor: ExecutorNodeConfig,
    pub genesis: GenesisConfig,
}

impl NodeConfig {
    /// Load from `path` (defaults if `None`) and apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
                    path: path.display().to_string(),
                    error: e.to_string(),
                })?;
                info!("Loaded configuration from {}", path.display());
                Self::parse(&content)?
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(mode) = lookup("SS_EXECUTION") {
            self.sealer.execution = match mode.to_lowercase().as_str() {
                "local" => ExecutionMode::Local,
                "remote" => ExecutionMode::Remote,
                _ => return Err(env_error("SS_EXECUTION", &mode)),
            };
        }
        if let Some(endpoint) = lookup("SS_REMOTE_ENDPOINT") {
            self.sealer.remote.endpoint = endpoint;
        }
        if let Some(signer) = lookup("SS_SIGNER_ID") {
            self.sealer.remote.signer_id = signer.clone();
            self.executor.signer_id = signer;
        }
        if let Some(listen) = lookup("SS_EXECUTOR_LISTEN") {
            self.executor.listen = listen;
        }
        if let Some(value) = lookup("SS_GAS_CEIL") {
            self.sealer.gas_ceil = value.parse().map_err(|_| env_error("SS_GAS_CEIL", &value))?;
        }
        if let Some(value) = lookup("SS_RECOMMIT_MS") {
            self.sealer.recommit_ms = value
                .parse()
                .map_err(|_| env_error("SS_RECOMMIT_MS", &value))?;
        }
        Ok(())
    }
}

/// `0x`-prefixed 20-byte hex address.
pub fn parse_address(text: &str) -> Result<Address, ConfigError> {
    decode_fixed::<20>(text)
        .map(Address::from)
        .map_err(|e| ConfigError::Invalid(format!("address {text}: {e}")))
}

fn env_error(key: &str, value: &str) -> ConfigError {
    ConfigError::Env {
        key: key.to_string(),
        value: value.to_string(),
    }
}
