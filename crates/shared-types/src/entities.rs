//! # Core Domain Entities
//!
//! Headers, receipts and withdrawals. Transactions live in
//! [`crate::transaction`].

use serde::{Deserialize, Serialize};

use crate::codec::{hex_bytes, CanonicalEncoder};
use crate::crypto::keccak256;

// Re-export the fixed-width primitives used across all crates
pub use primitive_types::{H160, H256, U256};

/// A 32-byte keccak digest.
pub type Hash = H256;

/// A 20-byte account address.
pub type Address = H160;

/// Storage slot key.
pub type StorageKey = H256;

/// Storage slot value.
pub type StorageValue = H256;

/// Header of a block under construction or sealed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Header {
    pub parent_hash: Hash,
    pub number: u64,
    pub timestamp: u64,
    pub coinbase: Address,
    pub gas_limit: u64,
    pub gas_used: u64,
    /// Present once the fee market is active.
    pub base_fee: Option<U256>,
    /// Present once blob transactions are active.
    pub excess_blob_gas: Option<u64>,
    pub blob_gas_used: Option<u64>,
    #[serde(with = "hex_bytes")]
    pub extra_data: Vec<u8>,
    pub mix_digest: Hash,
    pub parent_beacon_root: Option<Hash>,
    pub state_root: Hash,
    pub transactions_root: Hash,
}

impl Header {
    /// keccak256 over the canonical encoding of every header field.
    pub fn hash(&self) -> Hash {
        let mut enc = CanonicalEncoder::new();
        enc.h256(&self.parent_hash)
            .u64(self.number)
            .u64(self.timestamp)
            .h160(&self.coinbase)
            .u64(self.gas_limit)
            .u64(self.gas_used)
            .opt(self.base_fee.as_ref(), |e, v| {
                e.u256(v);
            })
            .opt(self.excess_blob_gas.as_ref(), |e, v| {
                e.u64(*v);
            })
            .opt(self.blob_gas_used.as_ref(), |e, v| {
                e.u64(*v);
            })
            .bytes(&self.extra_data)
            .h256(&self.mix_digest)
            .opt(self.parent_beacon_root.as_ref(), |e, v| {
                e.h256(v);
            })
            .h256(&self.state_root)
            .h256(&self.transactions_root);
        keccak256(&enc.finish())
    }
}

/// Outcome status written into a receipt.
pub const RECEIPT_STATUS_SUCCESS: u64 = 1;
pub const RECEIPT_STATUS_FAILED: u64 = 0;

/// Result of applying one transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub tx_hash: Hash,
    pub status: u64,
    pub gas_used: u64,
    pub cumulative_gas_used: u64,
    #[serde(default)]
    pub blob_gas_used: u64,
    /// Price per gas actually paid (base fee + effective tip).
    pub effective_gas_price: U256,
    #[serde(default)]
    pub contract_address: Option<Address>,
    pub transaction_index: u64,
}

impl Receipt {
    pub fn succeeded(&self) -> bool {
        self.status == RECEIPT_STATUS_SUCCESS
    }
}

/// Consensus-layer withdrawal credited during finalisation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Withdrawal {
    pub index: u64,
    pub validator_index: u64,
    pub address: Address,
    /// Amount in gwei.
    pub amount: u64,
}
