//! # Quantity
//!
//! Arbitrary-precision (256-bit) non-negative integer with explicit text
//! parsing. Accepts `0x`-prefixed hex or plain decimal; anything else is a
//! [`QuantityError`]. Serialises as `0x` hex and deserialises from either a
//! string (hex or decimal) or a JSON integer.

use std::fmt;
use std::str::FromStr;

use primitive_types::U256;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::QuantityError;

/// A 256-bit unsigned quantity (balances, fees, values).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Quantity(pub U256);

impl Quantity {
    pub const ZERO: Quantity = Quantity(U256([0; 4]));

    /// Parse `0x` hex or decimal text.
    pub fn parse(input: &str) -> Result<Self, QuantityError> {
        let trimmed = input.trim();
        if let Some(digits) = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
        {
            return parse_radix(input, digits, 16);
        }
        parse_radix(input, trimmed, 10)
    }

    pub fn as_u256(&self) -> U256 {
        self.0
    }

    /// `0x` hex rendering with no leading zeros (`0x0` for zero).
    pub fn to_hex(&self) -> String {
        format!("0x{:x}", self.0)
    }
}

fn parse_radix(input: &str, digits: &str, radix: u32) -> Result<Quantity, QuantityError> {
    if digits.is_empty() {
        return Err(QuantityError::Empty);
    }
    if let Some(bad) = digits.chars().find(|c| !c.is_digit(radix)) {
        return Err(QuantityError::InvalidDigit {
            input: input.to_string(),
            digit: bad,
        });
    }
    // Leading zeros never change the value but count against the width check.
    let significant = digits.trim_start_matches('0');
    if significant.is_empty() {
        return Ok(Quantity::ZERO);
    }
    let value = if radix == 16 {
        U256::from_str_radix(significant, 16)
            .map_err(|_| QuantityError::Overflow(input.to_string()))?
    } else {
        U256::from_dec_str(significant).map_err(|_| QuantityError::Overflow(input.to_string()))?
    };
    Ok(Quantity(value))
}

impl FromStr for Quantity {
    type Err = QuantityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Quantity::parse(s)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<U256> for Quantity {
    fn from(value: U256) -> Self {
        Quantity(value)
    }
}

impl From<u64> for Quantity {
    fn from(value: u64) -> Self {
        Quantity(U256::from(value))
    }
}

impl From<Quantity> for U256 {
    fn from(value: Quantity) -> Self {
        value.0
    }
}

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

struct QuantityVisitor;

impl<'de> Visitor<'de> for QuantityVisitor {
    type Value = Quantity;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a hex (0x) or decimal quantity")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Quantity, E> {
        Ok(Quantity::from(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Quantity, E> {
        u64::try_from(v)
            .map(Quantity::from)
            .map_err(|_| E::custom(format!("negative quantity {v}")))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Quantity, E> {
        Quantity::parse(v).map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(QuantityVisitor)
    }
}
