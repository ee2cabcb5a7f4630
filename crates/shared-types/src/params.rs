//! # Protocol Parameters
//!
//! Gas, blob and fee-market constants plus the fork schedule of the chain
//! being sealed.

use primitive_types::H256;
use serde::{Deserialize, Serialize};

/// keccak256 of the empty byte string; code hash of accounts without code.
pub const EMPTY_CODE_HASH: H256 = H256([
    0xc5, 0xd2, 0x46, 0x01, 0x86, 0xf7, 0x23, 0x3c, 0x92, 0x7e, 0x7d, 0xb2, 0xdc, 0xc7, 0x03, 0xc0,
    0xe5, 0x00, 0xb6, 0x53, 0xca, 0x82, 0x27, 0x3b, 0x7b, 0xfa, 0xd8, 0x04, 0x5d, 0x85, 0xa4, 0x70,
]);

/// Minimum gas any transaction can consume.
pub const TX_GAS: u64 = 21_000;
/// Intrinsic gas of a contract-creating transaction.
pub const TX_GAS_CONTRACT_CREATION: u64 = 53_000;
/// Gas per zero byte of calldata.
pub const TX_DATA_ZERO_GAS: u64 = 4;
/// Gas per non-zero byte of calldata.
pub const TX_DATA_NON_ZERO_GAS: u64 = 16;

/// Blob gas consumed by a single blob.
pub const BLOB_TX_BLOB_GAS_PER_BLOB: u64 = 131_072;
/// Maximum blob gas per block.
pub const MAX_BLOB_GAS_PER_BLOCK: u64 = 786_432;
/// Target blob gas per block.
pub const TARGET_BLOB_GAS_PER_BLOCK: u64 = 393_216;
/// Floor of the blob base fee.
pub const MIN_BLOB_GASPRICE: u64 = 1;
/// Controls the rate of change of the blob base fee.
pub const BLOB_BASE_FEE_UPDATE_FRACTION: u64 = 3_338_477;
/// Blob capacity of one block.
pub const MAX_BLOBS_PER_BLOCK: usize = (MAX_BLOB_GAS_PER_BLOCK / BLOB_TX_BLOB_GAS_PER_BLOB) as usize;

/// Bound divisor of the per-block gas limit adjustment.
pub const GAS_LIMIT_BOUND_DIVISOR: u64 = 1024;
/// Lowest gas limit a block may have.
pub const MIN_GAS_LIMIT: u64 = 5000;
/// Base fee of the first London block (1 gwei).
pub const INITIAL_BASE_FEE: u64 = 1_000_000_000;
/// Default bound on the base fee change between blocks.
pub const BASE_FEE_CHANGE_DENOMINATOR: u64 = 8;
/// Default gas target elasticity.
pub const ELASTICITY_MULTIPLIER: u64 = 2;

/// Fork schedule and fee-market parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    pub chain_id: u64,
    /// First block enforcing replay-protected signatures.
    pub eip155_block: u64,
    /// First block with a base fee. `None` = never.
    pub london_block: Option<u64>,
    /// First timestamp with blob transactions. `None` = never.
    pub cancun_time: Option<u64>,
    pub elasticity_multiplier: u64,
    pub base_fee_change_denominator: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            chain_id: 1337,
            eip155_block: 0,
            london_block: Some(0),
            cancun_time: Some(0),
            elasticity_multiplier: ELASTICITY_MULTIPLIER,
            base_fee_change_denominator: BASE_FEE_CHANGE_DENOMINATOR,
        }
    }
}

impl ChainConfig {
    pub fn is_eip155(&self, number: u64) -> bool {
        number >= self.eip155_block
    }

    pub fn is_london(&self, number: u64) -> bool {
        self.london_block.is_some_and(|b| number >= b)
    }

    pub fn is_cancun(&self, number: u64, time: u64) -> bool {
        self.is_london(number) && self.cancun_time.is_some_and(|t| time >= t)
    }
}
