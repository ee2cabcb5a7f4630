//! # Account Entities
//!
//! ## Serialization
//!
//! Accounts travel over the wire as [`AccountRecord`]: every field optional,
//! balance as a [`Quantity`] (hex or decimal text), code as hex. Missing
//! fields decode to their empty values.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use shared_types::codec::opt_hex_bytes;
use shared_types::params::EMPTY_CODE_HASH;
use shared_types::{keccak256, Address, Hash, Quantity, StorageKey, StorageValue, U256};

/// Ledger entry of one address.
///
/// Storage never holds zero values; writing zero removes the slot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "AccountRecord", into = "AccountRecord")]
pub struct Account {
    pub balance: U256,
    /// Increments by exactly 1 per applied transaction from this address.
    pub nonce: u64,
    /// keccak256 of `code`, [`EMPTY_CODE_HASH`] without code.
    pub code_hash: Hash,
    pub code: Option<Vec<u8>>,
    pub storage: BTreeMap<StorageKey, StorageValue>,
}

impl Default for Account {
    fn default() -> Self {
        Self {
            balance: U256::zero(),
            nonce: 0,
            code_hash: EMPTY_CODE_HASH,
            code: None,
            storage: BTreeMap::new(),
        }
    }
}

impl Account {
    pub fn with_balance(balance: U256) -> Self {
        Self {
            balance,
            ..Default::default()
        }
    }

    pub fn with_nonce(mut self, nonce: u64) -> Self {
        self.nonce = nonce;
        self
    }

    /// Install code, keeping `code_hash` in sync. Empty code clears it.
    pub fn set_code(&mut self, code: Vec<u8>) {
        if code.is_empty() {
            self.code = None;
            self.code_hash = EMPTY_CODE_HASH;
        } else {
            self.code_hash = keccak256(&code);
            self.code = Some(code);
        }
    }

    /// Write a storage slot; zero removes it.
    pub fn set_storage(&mut self, key: StorageKey, value: StorageValue) {
        if value.is_zero() {
            self.storage.remove(&key);
        } else {
            self.storage.insert(key, value);
        }
    }

    pub fn has_code(&self) -> bool {
        self.code.as_ref().is_some_and(|c| !c.is_empty())
    }

    /// No nonce, no balance, no code.
    pub fn is_empty(&self) -> bool {
        self.nonce == 0 && self.balance.is_zero() && !self.has_code()
    }
}

/// Accounts of a set of addresses at one point in time.
pub type AccountSnapshot = BTreeMap<Address, Account>;

/// Wire form of an [`Account`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<Quantity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<u64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "opt_hex_bytes"
    )]
    pub code: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub storage: BTreeMap<StorageKey, StorageValue>,
}

impl From<AccountRecord> for Account {
    fn from(record: AccountRecord) -> Self {
        let mut account = Account {
            balance: record.balance.map(U256::from).unwrap_or_default(),
            nonce: record.nonce.unwrap_or_default(),
            ..Default::default()
        };
        if let Some(code) = record.code {
            account.set_code(code);
        }
        for (key, value) in record.storage {
            account.set_storage(key, value);
        }
        account
    }
}

impl From<Account> for AccountRecord {
    fn from(account: Account) -> Self {
        Self {
            balance: Some(Quantity::from(account.balance)),
            nonce: Some(account.nonce),
            code: account.code,
            storage: account.storage,
        }
    }
}
