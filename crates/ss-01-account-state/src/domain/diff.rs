//! # Account Diffs
//!
//! Sparse description of how one account changed between two snapshots.
//! Absent fields are left untouched when the diff is applied.

use std::collections::BTreeMap;

use shared_types::{StorageKey, StorageValue, U256};

use super::account::Account;

/// Changed fields of one account.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccountDiff {
    pub balance: Option<U256>,
    pub nonce: Option<u64>,
    /// New code; an empty vector clears it.
    pub code: Option<Vec<u8>>,
    /// Slot writes; a zero value removes the slot.
    pub storage: BTreeMap<StorageKey, StorageValue>,
    /// Account was removed: balance, code and storage are reset.
    pub deleted: bool,
}

impl AccountDiff {
    /// Diff describing an account that did not exist before.
    pub fn creation(post: &Account) -> Self {
        Self {
            balance: Some(post.balance),
            nonce: Some(post.nonce),
            code: post.code.clone(),
            storage: post.storage.clone(),
            deleted: false,
        }
    }

    /// Diff describing a removed account.
    pub fn deletion() -> Self {
        Self {
            balance: Some(U256::zero()),
            nonce: Some(0),
            code: Some(Vec::new()),
            storage: BTreeMap::new(),
            deleted: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.balance.is_none()
            && self.nonce.is_none()
            && self.code.is_none()
            && self.storage.is_empty()
            && !self.deleted
    }

    /// Field-by-field application onto `base`.
    ///
    /// This is the pure shape of the patch; stores layer their own
    /// constraints (such as the nonce floor) on top.
    pub fn patch(&self, base: &Account) -> Account {
        let mut account = if self.deleted {
            Account::default()
        } else {
            base.clone()
        };
        if let Some(balance) = self.balance {
            account.balance = balance;
        }
        if let Some(nonce) = self.nonce {
            account.nonce = nonce;
        }
        if let Some(code) = &self.code {
            account.set_code(code.clone());
        }
        for (key, value) in &self.storage {
            account.set_storage(*key, *value);
        }
        account
    }
}
