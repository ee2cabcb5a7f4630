//! Byte codecs: the canonical encoding fed to keccak, and hex for JSON.
//!
//! JSON byte payloads are written as `0x`-prefixed lowercase hex; the prefix
//! is optional on input.

use primitive_types::{H160, H256, U256};

use crate::errors::CodecError;

/// Deterministic, length-prefixed byte encoding used for hashing.
///
/// Fixed-width fields are written big-endian; variable-length fields carry a
/// u64 length prefix so distinct field sequences never collide.
#[derive(Debug, Default)]
pub struct CanonicalEncoder {
    buf: Vec<u8>,
}

impl CanonicalEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn u8(&mut self, v: u8) -> &mut Self {
        self.buf.push(v);
        self
    }

    pub fn u64(&mut self, v: u64) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn u256(&mut self, v: &U256) -> &mut Self {
        let mut word = [0u8; 32];
        v.to_big_endian(&mut word);
        self.buf.extend_from_slice(&word);
        self
    }

    pub fn h160(&mut self, v: &H160) -> &mut Self {
        self.buf.extend_from_slice(v.as_bytes());
        self
    }

    pub fn h256(&mut self, v: &H256) -> &mut Self {
        self.buf.extend_from_slice(v.as_bytes());
        self
    }

    pub fn bytes(&mut self, v: &[u8]) -> &mut Self {
        self.u64(v.len() as u64);
        self.buf.extend_from_slice(v);
        self
    }

    /// Presence tag followed by the value when present.
    pub fn opt<T>(&mut self, v: Option<&T>, write: impl FnOnce(&mut Self, &T)) -> &mut Self {
        match v {
            Some(inner) => {
                self.u8(1);
                write(self, inner);
            }
            None => {
                self.u8(0);
            }
        }
        self
    }

    pub fn finish(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buf)
    }
}

/// Encode bytes as `0x`-prefixed hex.
pub fn encode_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Decode hex with an optional `0x` prefix.
pub fn decode_hex(text: &str) -> Result<Vec<u8>, CodecError> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    hex::decode(digits).map_err(|e| CodecError::InvalidHex(e.to_string()))
}

/// Decode hex into a fixed-width array.
pub fn decode_fixed<const N: usize>(text: &str) -> Result<[u8; N], CodecError> {
    let bytes = decode_hex(text)?;
    let actual = bytes.len();
    bytes.try_into().map_err(|_| CodecError::InvalidLength {
        expected: N,
        actual,
    })
}

/// `#[serde(with = "shared_types::codec::hex_bytes")]` for `Vec<u8>`.
pub mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::encode_hex(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        super::decode_hex(&text).map_err(serde::de::Error::custom)
    }
}

/// `#[serde(with = "shared_types::codec::hex_bytes_vec")]` for `Vec<Vec<u8>>`.
pub mod hex_bytes_vec {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(items: &[Vec<u8>], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(items.iter().map(|b| super::encode_hex(b)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<Vec<u8>>, D::Error> {
        let texts = Vec::<String>::deserialize(deserializer)?;
        texts
            .iter()
            .map(|t| super::decode_hex(t).map_err(serde::de::Error::custom))
            .collect()
    }
}

/// `#[serde(with = "shared_types::codec::opt_hex_bytes")]` for `Option<Vec<u8>>`.
pub mod opt_hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        bytes: &Option<Vec<u8>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match bytes {
            Some(b) => serializer.serialize_some(&super::encode_hex(b)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Vec<u8>>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|t| super::decode_hex(&t).map_err(serde::de::Error::custom))
            .transpose()
    }
}
