//! # State Reconciler
//!
//! Turns per-transaction pre/post snapshots produced by a remote executor
//! into [`AccountDiff`]s and writes them into a local [`AccountStore`].
//!
//! ## Diff Rules
//!
//! For every address in `post`:
//! - absent from `pre`: the full post record (creation)
//! - otherwise only the fields whose values differ; storage slots present in
//!   `pre` but gone from `post` are written as zero (removal)
//!
//! For every address only in `pre`: a [`AccountDiff::deletion`].

use std::collections::BTreeMap;

use shared_types::{Address, StorageValue};
use tracing::trace;

use super::account::{Account, AccountSnapshot};
use super::diff::AccountDiff;
use super::errors::StateError;
use crate::ports::AccountStore;

/// Non-empty diffs keyed by address.
pub type StateDiff = BTreeMap<Address, AccountDiff>;

/// Compute the diff that turns `pre` into `post`.
pub fn diff(pre: &AccountSnapshot, post: &AccountSnapshot) -> StateDiff {
    let mut out = StateDiff::new();

    for (address, after) in post {
        let account_diff = match pre.get(address) {
            None => AccountDiff::creation(after),
            Some(before) => diff_account(before, after),
        };
        if !account_diff.is_empty() {
            out.insert(*address, account_diff);
        }
    }

    for address in pre.keys().filter(|a| !post.contains_key(*a)) {
        out.insert(*address, AccountDiff::deletion());
    }

    out
}

fn diff_account(before: &Account, after: &Account) -> AccountDiff {
    let mut d = AccountDiff::default();
    if before.balance != after.balance {
        d.balance = Some(after.balance);
    }
    if before.nonce != after.nonce {
        d.nonce = Some(after.nonce);
    }
    if before.code != after.code {
        d.code = Some(after.code.clone().unwrap_or_default());
    }
    for (key, value) in &after.storage {
        if before.storage.get(key) != Some(value) {
            d.storage.insert(*key, *value);
        }
    }
    for key in before.storage.keys() {
        if !after.storage.contains_key(key) {
            d.storage.insert(*key, StorageValue::zero());
        }
    }
    d
}

/// Write every diff into `store`.
pub fn apply<S: AccountStore + ?Sized>(store: &mut S, diffs: &StateDiff) -> Result<(), StateError> {
    for (address, account_diff) in diffs {
        trace!(address = ?address, deleted = account_diff.deleted, "Applying account diff");
        store.apply_diff(address, account_diff)?;
    }
    Ok(())
}

/// `diff` followed by `apply`; returns the applied diffs.
pub fn reconcile<S: AccountStore + ?Sized>(
    store: &mut S,
    pre: &AccountSnapshot,
    post: &AccountSnapshot,
) -> Result<StateDiff, StateError> {
    let diffs = diff(pre, post);
    apply(store, &diffs)?;
    Ok(diffs)
}
