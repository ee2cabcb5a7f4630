//! # Transactions
//!
//! Signed transactions, blob sidecars and the lazily-resolved handles the
//! pool hands to the sealer.
//!
//! ## Hashing
//!
//! - signing hash = keccak256(canonical unsigned encoding)
//! - transaction hash = keccak256(canonical unsigned encoding ‖ r ‖ s ‖ v)
//!
//! The blob sidecar is never part of either hash, so a transaction keeps its
//! identity when the sidecar is stripped for the block body.

use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

use k256::ecdsa::SigningKey;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::codec::{hex_bytes, hex_bytes_vec, CanonicalEncoder};
use crate::crypto::{keccak256, recover_prehash, sign_prehash};
use crate::entities::{Address, Hash, U256};
use crate::errors::SignatureError;
use crate::params::{
    BLOB_TX_BLOB_GAS_PER_BLOB, TX_DATA_NON_ZERO_GAS, TX_DATA_ZERO_GAS, TX_GAS,
    TX_GAS_CONTRACT_CREATION,
};

/// Fee fields of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum FeeFields {
    /// Single gas price; the whole excess over the base fee is tip.
    Legacy { gas_price: U256 },
    /// Fee-market caps.
    Dynamic {
        max_fee_per_gas: U256,
        max_priority_fee_per_gas: U256,
    },
}

impl FeeFields {
    /// Maximum total price per gas.
    pub fn fee_cap(&self) -> U256 {
        match self {
            FeeFields::Legacy { gas_price } => *gas_price,
            FeeFields::Dynamic {
                max_fee_per_gas, ..
            } => *max_fee_per_gas,
        }
    }

    /// Maximum tip per gas.
    pub fn tip_cap(&self) -> U256 {
        match self {
            FeeFields::Legacy { gas_price } => *gas_price,
            FeeFields::Dynamic {
                max_priority_fee_per_gas,
                ..
            } => *max_priority_fee_per_gas,
        }
    }

    /// `min(tip_cap, fee_cap - base_fee)`, zero when the fee cap is below the
    /// base fee. For legacy fees this is `gas_price - base_fee`.
    pub fn effective_tip(&self, base_fee: Option<U256>) -> U256 {
        let headroom = self
            .fee_cap()
            .saturating_sub(base_fee.unwrap_or_default());
        self.tip_cap().min(headroom)
    }

    /// Price per gas actually paid: base fee plus effective tip.
    pub fn effective_gas_price(&self, base_fee: Option<U256>) -> U256 {
        base_fee
            .unwrap_or_default()
            .saturating_add(self.effective_tip(base_fee))
    }

    fn encode(&self, enc: &mut CanonicalEncoder) {
        match self {
            FeeFields::Legacy { gas_price } => {
                enc.u8(0).u256(gas_price);
            }
            FeeFields::Dynamic {
                max_fee_per_gas,
                max_priority_fee_per_gas,
            } => {
                enc.u8(2).u256(max_fee_per_gas).u256(max_priority_fee_per_gas);
            }
        }
    }
}

/// Blob payload travelling next to (never inside) a blob transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BlobSidecar {
    #[serde(with = "hex_bytes_vec")]
    pub blobs: Vec<Vec<u8>>,
    #[serde(with = "hex_bytes_vec")]
    pub commitments: Vec<Vec<u8>>,
    #[serde(with = "hex_bytes_vec")]
    pub proofs: Vec<Vec<u8>>,
}

impl BlobSidecar {
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

/// Transaction fields covered by the signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsignedTransaction {
    /// Replay protection domain. `None` = unprotected.
    #[serde(default)]
    pub chain_id: Option<u64>,
    pub nonce: u64,
    pub gas_limit: u64,
    pub fees: FeeFields,
    /// Recipient; `None` creates a contract.
    #[serde(default)]
    pub to: Option<Address>,
    #[serde(default)]
    pub value: U256,
    #[serde(default, with = "hex_bytes")]
    pub data: Vec<u8>,
    /// Versioned hashes of carried blobs.
    #[serde(default)]
    pub blob_hashes: Vec<Hash>,
    #[serde(default)]
    pub max_fee_per_blob_gas: Option<U256>,
}

impl UnsignedTransaction {
    fn encode(&self) -> CanonicalEncoder {
        let mut enc = CanonicalEncoder::new();
        enc.opt(self.chain_id.as_ref(), |e, v| {
            e.u64(*v);
        })
        .u64(self.nonce)
        .u64(self.gas_limit);
        self.fees.encode(&mut enc);
        enc.opt(self.to.as_ref(), |e, v| {
            e.h160(v);
        })
        .u256(&self.value)
        .bytes(&self.data)
        .u64(self.blob_hashes.len() as u64);
        for blob_hash in &self.blob_hashes {
            enc.h256(blob_hash);
        }
        enc.opt(self.max_fee_per_blob_gas.as_ref(), |e, v| {
            e.u256(v);
        });
        enc
    }

    /// Hash signed by the sender.
    pub fn signing_hash(&self) -> Hash {
        keccak256(&self.encode().finish())
    }
}

/// Recoverable secp256k1 signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxSignature {
    pub r: Hash,
    pub s: Hash,
    pub v: u8,
}

/// A transaction with its signature and optional blob sidecar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub tx: UnsignedTransaction,
    pub signature: TxSignature,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sidecar: Option<BlobSidecar>,
}

impl SignedTransaction {
    /// Sign `tx` with `key`.
    pub fn sign(tx: UnsignedTransaction, key: &SigningKey) -> Result<Self, SignatureError> {
        let (r, s, v) = sign_prehash(key, &tx.signing_hash())?;
        Ok(Self {
            tx,
            signature: TxSignature {
                r: Hash::from(r),
                s: Hash::from(s),
                v,
            },
            sidecar: None,
        })
    }

    /// Attach a blob sidecar.
    pub fn with_sidecar(mut self, sidecar: BlobSidecar) -> Self {
        self.sidecar = Some(sidecar);
        self
    }

    /// Copy of the transaction without its blob sidecar.
    pub fn without_sidecar(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            signature: self.signature,
            sidecar: None,
        }
    }

    pub fn hash(&self) -> Hash {
        let mut enc = self.tx.encode();
        enc.h256(&self.signature.r)
            .h256(&self.signature.s)
            .u8(self.signature.v);
        keccak256(&enc.finish())
    }

    pub fn signing_hash(&self) -> Hash {
        self.tx.signing_hash()
    }

    /// Recover the sender address from the signature.
    pub fn recover_sender(&self) -> Result<Address, SignatureError> {
        recover_prehash(
            &self.signing_hash(),
            &self.signature.r.0,
            &self.signature.s.0,
            self.signature.v,
        )
    }

    pub fn nonce(&self) -> u64 {
        self.tx.nonce
    }

    pub fn gas_limit(&self) -> u64 {
        self.tx.gas_limit
    }

    pub fn to(&self) -> Option<Address> {
        self.tx.to
    }

    pub fn value(&self) -> U256 {
        self.tx.value
    }

    pub fn fees(&self) -> &FeeFields {
        &self.tx.fees
    }

    /// Whether the signature commits to a chain id.
    pub fn is_protected(&self) -> bool {
        self.tx.chain_id.is_some()
    }

    pub fn is_blob(&self) -> bool {
        !self.tx.blob_hashes.is_empty()
    }

    pub fn blob_count(&self) -> usize {
        self.tx.blob_hashes.len()
    }

    pub fn blob_gas(&self) -> u64 {
        self.blob_count() as u64 * BLOB_TX_BLOB_GAS_PER_BLOB
    }

    pub fn effective_tip(&self, base_fee: Option<U256>) -> U256 {
        self.tx.fees.effective_tip(base_fee)
    }

    /// Gas charged before any execution: base cost plus calldata.
    pub fn intrinsic_gas(&self) -> u64 {
        let base = if self.tx.to.is_none() {
            TX_GAS_CONTRACT_CREATION
        } else {
            TX_GAS
        };
        self.tx.data.iter().fold(base, |acc, byte| {
            acc.saturating_add(if *byte == 0 {
                TX_DATA_ZERO_GAS
            } else {
                TX_DATA_NON_ZERO_GAS
            })
        })
    }
}

#[derive(Debug, Clone)]
enum LazyBody {
    Resolved(Arc<SignedTransaction>),
    Pooled(Weak<SignedTransaction>),
}

/// Pool handle to a pending transaction.
///
/// Carries everything the orderer and the budget checks need. The body is
/// only materialised by [`LazyTransaction::resolve`], which returns `None`
/// once the pool has evicted a pooled entry.
#[derive(Debug, Clone)]
pub struct LazyTransaction {
    pub hash: Hash,
    /// Cached sender, recovered once on admission.
    pub sender: Address,
    pub nonce: u64,
    pub gas: u64,
    pub blob_gas: u64,
    pub fees: FeeFields,
    /// Arrival sequence; lower arrived earlier.
    pub arrival: u64,
    body: LazyBody,
}

impl LazyTransaction {
    fn with_body(tx: &SignedTransaction, sender: Address, arrival: u64, body: LazyBody) -> Self {
        Self {
            hash: tx.hash(),
            sender,
            nonce: tx.nonce(),
            gas: tx.gas_limit(),
            blob_gas: tx.blob_gas(),
            fees: tx.tx.fees,
            arrival,
            body,
        }
    }

    /// Handle that owns its body.
    pub fn resolved(tx: Arc<SignedTransaction>, sender: Address, arrival: u64) -> Self {
        let body = LazyBody::Resolved(Arc::clone(&tx));
        Self::with_body(&tx, sender, arrival, body)
    }

    /// Handle that borrows its body from the pool.
    pub fn pooled(tx: &Arc<SignedTransaction>, sender: Address, arrival: u64) -> Self {
        Self::with_body(tx, sender, arrival, LazyBody::Pooled(Arc::downgrade(tx)))
    }

    /// Materialise the body; `None` if the pool evicted it.
    pub fn resolve(&self) -> Option<Arc<SignedTransaction>> {
        match &self.body {
            LazyBody::Resolved(tx) => Some(Arc::clone(tx)),
            LazyBody::Pooled(weak) => weak.upgrade(),
        }
    }

    pub fn is_blob(&self) -> bool {
        self.blob_gas > 0
    }

    pub fn effective_tip(&self, base_fee: Option<U256>) -> U256 {
        self.fees.effective_tip(base_fee)
    }
}

/// Sort transactions into nonce-ascending per-sender queues.
///
/// Arrival order is the position in `txs`. Transactions whose sender cannot
/// be recovered are dropped.
pub fn group_by_sender(
    txs: impl IntoIterator<Item = SignedTransaction>,
) -> BTreeMap<Address, Vec<LazyTransaction>> {
    let mut grouped: BTreeMap<Address, Vec<LazyTransaction>> = BTreeMap::new();
    for (arrival, tx) in txs.into_iter().enumerate() {
        match tx.recover_sender() {
            Ok(sender) => grouped.entry(sender).or_default().push(LazyTransaction::resolved(
                Arc::new(tx),
                sender,
                arrival as u64,
            )),
            Err(e) => warn!(hash = %tx.hash(), error = %e, "Dropping transaction with unrecoverable sender"),
        }
    }
    for queue in grouped.values_mut() {
        queue.sort_by_key(|tx| (tx.nonce, tx.arrival));
    }
    grouped
}
