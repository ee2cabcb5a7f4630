//! Configuration types for block assembly

use std::time::Duration;

use serde::{Deserialize, Serialize};
use shared_types::codec::{decode_hex, encode_hex};
use shared_types::{ChainConfig, Quantity};
use ss_04_attested_channel::AttestationPolicy;

use crate::error::SealingError;

/// Default recommit interval (milliseconds).
pub const DEFAULT_RECOMMIT_MS: u64 = 2_000;
/// Default gas ceiling the gas limit moves toward.
pub const DEFAULT_GAS_CEIL: u64 = 30_000_000;
/// Default minimum tip accepted from the pool (wei).
pub const DEFAULT_MIN_TIP: u64 = 1_000_000;
/// Default bound on one remote round trip (milliseconds).
pub const DEFAULT_REMOTE_TIMEOUT_MS: u64 = 10_000;

/// Where transactions are executed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    #[default]
    Local,
    Remote,
}

/// What to do when remote receipts overrun the header gas limit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GasLimitPolicy {
    /// Drop only the record that overruns; earlier records stand.
    #[default]
    RejectTransaction,
    /// Drop the whole batch if its total overruns.
    RejectBatch,
    /// Accept every record. `gas_used` may end up above the header's gas
    /// limit, producing a block peers reject; the overrun is logged with
    /// `warn!` and counted in `BatchSummary::gas_over_limit`.
    Unchecked,
}

/// Runtime configuration of the sealer
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SealerConfig {
    /// Commit deadline per attempt
    pub recommit_ms: u64,

    /// Target block gas limit
    pub gas_ceil: u64,

    /// Minimum effective tip for pool transactions
    pub min_tip: Quantity,

    /// Header extra data (hex)
    #[serde(with = "shared_types::codec::hex_bytes")]
    pub extra_data: Vec<u8>,

    pub execution: ExecutionMode,

    pub remote: RemoteExecutorConfig,

    pub chain: ChainConfig,
}

impl Default for SealerConfig {
    fn default() -> Self {
        Self {
            recommit_ms: DEFAULT_RECOMMIT_MS,
            gas_ceil: DEFAULT_GAS_CEIL,
            min_tip: Quantity::from(DEFAULT_MIN_TIP),
            extra_data: Vec::new(),
            execution: ExecutionMode::Local,
            remote: RemoteExecutorConfig::default(),
            chain: ChainConfig::default(),
        }
    }
}

impl SealerConfig {
    pub fn recommit(&self) -> Duration {
        Duration::from_millis(self.recommit_ms)
    }

    pub fn validate(&self) -> Result<(), SealingError> {
        if self.recommit_ms == 0 {
            return Err(SealingError::InvalidConfig("recommit_ms must be positive".into()));
        }
        if self.chain.elasticity_multiplier == 0 || self.chain.base_fee_change_denominator == 0 {
            return Err(SealingError::InvalidConfig(
                "elasticity multiplier and base fee change denominator must be positive".into(),
            ));
        }
        if self.execution == ExecutionMode::Remote {
            self.remote.validate()?;
        }
        Ok(())
    }
}

/// Remote executor endpoint and the attestation it must present
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteExecutorConfig {
    /// Base URL, e.g. `https://executor:8443`
    pub endpoint: String,

    /// Bound on the whole round trip
    pub timeout_ms: u64,

    pub min_security_version: u16,

    pub product_id: u16,

    /// Expected signer id (hex)
    pub signer_id: String,

    pub allow_debug: bool,

    pub allow_out_of_date_tcb: bool,

    pub gas_limit_policy: GasLimitPolicy,
}

impl Default for RemoteExecutorConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            timeout_ms: DEFAULT_REMOTE_TIMEOUT_MS,
            min_security_version: ss_04_attested_channel::attestation::policy::DEFAULT_MIN_SECURITY_VERSION,
            product_id: ss_04_attested_channel::attestation::policy::DEFAULT_PRODUCT_ID,
            signer_id: String::new(),
            allow_debug: false,
            allow_out_of_date_tcb: false,
            gas_limit_policy: GasLimitPolicy::RejectTransaction,
        }
    }
}

impl RemoteExecutorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn validate(&self) -> Result<(), SealingError> {
        if self.endpoint.is_empty() {
            return Err(SealingError::InvalidConfig(
                "remote execution needs an executor endpoint".into(),
            ));
        }
        if self.timeout_ms == 0 {
            return Err(SealingError::InvalidConfig("remote timeout_ms must be positive".into()));
        }
        let signer = self.signer_bytes()?;
        if signer.is_empty() {
            return Err(SealingError::InvalidConfig("remote signer_id is empty".into()));
        }
        Ok(())
    }

    pub fn signer_bytes(&self) -> Result<Vec<u8>, SealingError> {
        decode_hex(&self.signer_id)
            .map_err(|e| SealingError::InvalidConfig(format!("signer_id: {e}")))
    }

    /// Attestation policy described by this config.
    pub fn policy(&self) -> Result<AttestationPolicy, SealingError> {
        Ok(AttestationPolicy {
            min_security_version: self.min_security_version,
            product_id: self.product_id,
            signer_id: self.signer_bytes()?,
            allow_debug: self.allow_debug,
            allow_out_of_date_tcb: self.allow_out_of_date_tcb,
        })
    }

    pub fn set_signer(&mut self, signer: &[u8]) {
        self.signer_id = encode_hex(signer);
    }
}
