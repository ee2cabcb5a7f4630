//! # Hashing and secp256k1 helpers
//!
//! Keccak-256 digests and Ethereum-style address derivation.

use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use sha3::{Digest, Keccak256};

use crate::entities::{Address, Hash};
use crate::errors::SignatureError;

/// Keccak-256 of `data`.
pub fn keccak256(data: &[u8]) -> Hash {
    Hash::from_slice(&Keccak256::digest(data))
}

/// Derive the 20-byte address of a public key.
pub fn address_from_key(key: &VerifyingKey) -> Address {
    let encoded = key.to_encoded_point(false);
    // Skip the 0x04 SEC1 tag, keep the last 20 bytes of the digest.
    let digest = keccak256(&encoded.as_bytes()[1..]);
    Address::from_slice(&digest.as_bytes()[12..])
}

/// Build a signing key from 32 raw secret bytes.
pub fn signing_key_from_bytes(bytes: &[u8]) -> Result<SigningKey, SignatureError> {
    SigningKey::from_slice(bytes).map_err(|e| SignatureError::SigningFailed(e.to_string()))
}

/// Sign a prehashed message, returning `(r, s, v)` with `v` in {0, 1}.
pub(crate) fn sign_prehash(
    key: &SigningKey,
    hash: &Hash,
) -> Result<([u8; 32], [u8; 32], u8), SignatureError> {
    let (sig, recid) = key
        .sign_prehash_recoverable(hash.as_bytes())
        .map_err(|e| SignatureError::SigningFailed(e.to_string()))?;
    let bytes = sig.to_bytes();
    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&bytes[..32]);
    s.copy_from_slice(&bytes[32..]);
    Ok((r, s, recid.to_byte()))
}

/// Recover the signer address of a prehashed message.
///
/// Valid `v` values: 0, 1, 27, 28.
pub(crate) fn recover_prehash(
    hash: &Hash,
    r: &[u8; 32],
    s: &[u8; 32],
    v: u8,
) -> Result<Address, SignatureError> {
    let id = match v {
        0 | 27 => 0,
        1 | 28 => 1,
        _ => return Err(SignatureError::InvalidRecoveryId(v)),
    };
    let recovery_id =
        RecoveryId::try_from(id).map_err(|_| SignatureError::InvalidRecoveryId(v))?;

    let mut sig_bytes = [0u8; 64];
    sig_bytes[..32].copy_from_slice(r);
    sig_bytes[32..].copy_from_slice(s);
    let sig = Signature::from_slice(&sig_bytes).map_err(|_| SignatureError::InvalidFormat)?;

    let key = VerifyingKey::recover_from_prehash(hash.as_bytes(), &sig, recovery_id)
        .map_err(|_| SignatureError::RecoveryFailed)?;
    Ok(address_from_key(&key))
}
