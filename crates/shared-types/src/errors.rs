//! # Error Types
//!
//! Errors shared by the primitive types.

use thiserror::Error;

/// Errors produced when parsing a [`crate::Quantity`] from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuantityError {
    /// Input was empty (or only a `0x` prefix).
    #[error("empty quantity")]
    Empty,

    /// Input contained a character that is not a digit of its radix.
    #[error("invalid digit {digit:?} in quantity {input:?}")]
    InvalidDigit { input: String, digit: char },

    /// Value does not fit in 256 bits.
    #[error("quantity {0:?} exceeds 256 bits")]
    Overflow(String),
}

/// Errors produced while signing or recovering a transaction sender.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    /// Recovery id outside {0, 1, 27, 28}.
    #[error("invalid recovery id: {0}")]
    InvalidRecoveryId(u8),

    /// r/s do not form a valid secp256k1 signature.
    #[error("malformed signature")]
    InvalidFormat,

    /// Public key recovery failed.
    #[error("sender recovery failed")]
    RecoveryFailed,

    /// Signing with the supplied key failed.
    #[error("signing failed: {0}")]
    SigningFailed(String),
}

/// Errors produced by the hex byte codec.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}
