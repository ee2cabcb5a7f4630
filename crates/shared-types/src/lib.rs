//! # Shared Types Crate
//!
//! Chain primitives used by every split-sealer crate.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: transactions, receipts and headers are defined
//!   once here and travel unchanged between the sealer and the remote executor.
//! - **Explicit Numbers**: arbitrary-precision values cross text boundaries only
//!   through [`Quantity`], which parses hex (`0x` prefixed) or decimal and
//!   reports malformed input instead of coercing it.
//! - **Lazy Bodies**: the pool hands out [`LazyTransaction`] handles; the body
//!   is resolved only when the commit loop is about to execute it.

pub mod codec;
pub mod crypto;
pub mod entities;
pub mod errors;
pub mod params;
pub mod quantity;
pub mod transaction;

pub use crypto::{address_from_key, keccak256, signing_key_from_bytes};
pub use entities::*;
pub use errors::*;
pub use params::ChainConfig;
pub use quantity::Quantity;
pub use transaction::{
    group_by_sender, BlobSidecar, FeeFields, LazyTransaction, SignedTransaction, TxSignature,
    UnsignedTransaction,
};
