//! # StateDb
//!
//! Journaled overlay over an [`AccountBackend`]. Each sealing attempt owns
//! one; writes land in the overlay and every write pushes a journal entry
//! holding the overlay value it replaced, so [`AccountStore::revert`] can
//! unwind to any earlier [`SnapshotId`].
//!
//! ## Invariants
//!
//! - The backend is never written; [`StateDb::into_changes`] hands the dirty
//!   set to whoever commits it.
//! - A diff never lowers a nonce: a diff nonce below the current one is
//!   ignored with a warning.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use shared_types::Address;
use tracing::warn;

use super::account::{Account, AccountSnapshot};
use super::diff::AccountDiff;
use super::errors::StateError;
use crate::ports::{AccountBackend, AccountStore};

/// Position in the journal a store can be reverted to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct SnapshotId(usize);

#[derive(Clone, Debug)]
struct JournalEntry {
    address: Address,
    /// Overlay slot before the write; `None` = address was not in the overlay.
    previous: Option<Option<Account>>,
}

/// Dirty accounts; `None` marks a removed account.
pub type StateChanges = BTreeMap<Address, Option<Account>>;

pub struct StateDb {
    backend: Arc<dyn AccountBackend>,
    overlay: StateChanges,
    journal: Vec<JournalEntry>,
}

impl fmt::Debug for StateDb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateDb")
            .field("dirty", &self.overlay.len())
            .field("journal", &self.journal.len())
            .finish()
    }
}

impl StateDb {
    pub fn new(backend: Arc<dyn AccountBackend>) -> Self {
        Self {
            backend,
            overlay: BTreeMap::new(),
            journal: Vec::new(),
        }
    }

    /// Overlay-then-backend lookup of a committed slot value.
    fn slot(&self, address: &Address) -> Result<Option<Account>, StateError> {
        match self.overlay.get(address) {
            Some(entry) => Ok(entry.clone()),
            None => self.backend.account(address),
        }
    }

    fn put(&mut self, address: Address, value: Option<Account>) {
        let previous = self.overlay.insert(address, value);
        self.journal.push(JournalEntry { address, previous });
    }

    /// Remove an account entirely.
    pub fn remove(&mut self, address: &Address) {
        self.put(*address, None);
    }

    /// Pre and post snapshots of every address written since `id`.
    ///
    /// Accounts that did not exist on one side are absent from that side's
    /// snapshot.
    pub fn changes_since(
        &self,
        id: SnapshotId,
    ) -> Result<(AccountSnapshot, AccountSnapshot), StateError> {
        let entries = self
            .journal
            .get(id.0..)
            .ok_or(StateError::InvalidSnapshot {
                id: id.0,
                journal_len: self.journal.len(),
            })?;

        let mut pre = AccountSnapshot::new();
        let mut post = AccountSnapshot::new();
        let mut seen = BTreeMap::new();
        for entry in entries {
            if seen.insert(entry.address, ()).is_some() {
                continue;
            }
            let before = match &entry.previous {
                Some(value) => value.clone(),
                None => self.backend.account(&entry.address)?,
            };
            if let Some(account) = before {
                pre.insert(entry.address, account);
            }
            if let Some(account) = self.slot(&entry.address)? {
                post.insert(entry.address, account);
            }
        }
        Ok((pre, post))
    }

    /// Dirty set accumulated by this attempt.
    pub fn changes(&self) -> &StateChanges {
        &self.overlay
    }

    pub fn into_changes(self) -> StateChanges {
        self.overlay
    }

    pub fn journal_len(&self) -> usize {
        self.journal.len()
    }
}

impl AccountStore for StateDb {
    fn read(&self, address: &Address) -> Result<Option<Account>, StateError> {
        self.slot(address)
    }

    fn snapshot(&mut self) -> SnapshotId {
        SnapshotId(self.journal.len())
    }

    fn revert(&mut self, id: SnapshotId) -> Result<(), StateError> {
        if id.0 > self.journal.len() {
            return Err(StateError::InvalidSnapshot {
                id: id.0,
                journal_len: self.journal.len(),
            });
        }
        while self.journal.len() > id.0 {
            let Some(entry) = self.journal.pop() else {
                break;
            };
            match entry.previous {
                Some(value) => {
                    self.overlay.insert(entry.address, value);
                }
                None => {
                    self.overlay.remove(&entry.address);
                }
            }
        }
        Ok(())
    }

    fn apply_diff(&mut self, address: &Address, diff: &AccountDiff) -> Result<(), StateError> {
        if diff.is_empty() {
            return Ok(());
        }
        let current = self.read(address)?;
        let current_nonce = current.as_ref().map_or(0, |a| a.nonce);
        let mut patched = diff.patch(&current.unwrap_or_default());

        if patched.nonce < current_nonce {
            if !diff.deleted {
                warn!(
                    address = ?address,
                    current = current_nonce,
                    proposed = patched.nonce,
                    "Ignoring diff nonce below current nonce"
                );
            }
            patched.nonce = current_nonce;
        }
        self.put(*address, Some(patched));
        Ok(())
    }

    fn write(&mut self, address: Address, account: Account) -> Result<(), StateError> {
        self.put(address, Some(account));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryAccountBackend;
    use shared_types::{StorageKey, StorageValue, U256};

    fn addr(n: u8) -> Address {
        Address::repeat_byte(n)
    }

    fn store_with(accounts: Vec<(Address, Account)>) -> StateDb {
        StateDb::new(Arc::new(InMemoryAccountBackend::with_accounts(accounts)))
    }

    #[test]
    fn test_read_falls_through_to_backend() {
        let db = store_with(vec![(addr(1), Account::with_balance(U256::from(5)))]);
        assert_eq!(db.balance(&addr(1)).unwrap(), U256::from(5));
        assert!(db.read(&addr(2)).unwrap().is_none());
    }

    #[test]
    fn test_revert_restores_previous_values() {
        let mut db = store_with(vec![(addr(1), Account::with_balance(U256::from(5)))]);
        let snap = db.snapshot();
        db.add_balance(&addr(1), U256::from(10)).unwrap();
        db.set_nonce(&addr(2), 4).unwrap();
        assert_eq!(db.balance(&addr(1)).unwrap(), U256::from(15));

        db.revert(snap).unwrap();
        assert_eq!(db.balance(&addr(1)).unwrap(), U256::from(5));
        assert!(db.read(&addr(2)).unwrap().is_none());
        assert!(db.changes().is_empty());
    }

    #[test]
    fn test_nested_snapshots() {
        let mut db = store_with(vec![]);
        db.set_nonce(&addr(1), 1).unwrap();
        let outer = db.snapshot();
        db.set_nonce(&addr(1), 2).unwrap();
        let inner = db.snapshot();
        db.set_nonce(&addr(1), 3).unwrap();

        db.revert(inner).unwrap();
        assert_eq!(db.nonce(&addr(1)).unwrap(), 2);
        db.revert(outer).unwrap();
        assert_eq!(db.nonce(&addr(1)).unwrap(), 1);
    }

    #[test]
    fn test_revert_rejects_future_snapshot() {
        let mut db = store_with(vec![]);
        let err = db.revert(SnapshotId(3)).unwrap_err();
        assert_eq!(
            err,
            StateError::InvalidSnapshot {
                id: 3,
                journal_len: 0
            }
        );
    }

    #[test]
    fn test_sub_balance_underflow_leaves_state() {
        let mut db = store_with(vec![(addr(1), Account::with_balance(U256::from(5)))]);
        let err = db.sub_balance(&addr(1), U256::from(6)).unwrap_err();
        assert!(matches!(err, StateError::BalanceUnderflow { .. }));
        assert_eq!(db.balance(&addr(1)).unwrap(), U256::from(5));
    }

    #[test]
    fn test_apply_diff_never_lowers_nonce() {
        let mut db = store_with(vec![(addr(1), Account::default().with_nonce(6))]);
        let diff = AccountDiff {
            nonce: Some(5),
            balance: Some(U256::from(1)),
            ..Default::default()
        };
        db.apply_diff(&addr(1), &diff).unwrap();
        assert_eq!(db.nonce(&addr(1)).unwrap(), 6);
        assert_eq!(db.balance(&addr(1)).unwrap(), U256::from(1));
    }

    #[test]
    fn test_apply_deletion_resets_but_keeps_nonce_floor() {
        let mut account = Account::with_balance(U256::from(9)).with_nonce(2);
        account.set_code(vec![1]);
        account.set_storage(StorageKey::repeat_byte(1), StorageValue::repeat_byte(1));
        let mut db = store_with(vec![(addr(1), account)]);

        db.apply_diff(&addr(1), &AccountDiff::deletion()).unwrap();
        let after = db.account(&addr(1)).unwrap();
        assert!(after.balance.is_zero());
        assert!(after.code.is_none());
        assert!(after.storage.is_empty());
        assert_eq!(after.nonce, 2);
    }

    #[test]
    fn test_apply_empty_diff_is_noop() {
        let mut db = store_with(vec![]);
        db.apply_diff(&addr(1), &AccountDiff::default()).unwrap();
        assert_eq!(db.journal_len(), 0);
        assert!(db.read(&addr(1)).unwrap().is_none());
    }

    #[test]
    fn test_changes_since_reports_pre_and_post() {
        let mut db = store_with(vec![
            (addr(1), Account::with_balance(U256::from(100))),
            (addr(3), Account::with_balance(U256::from(1))),
        ]);
        db.set_nonce(&addr(9), 1).unwrap();
        let snap = db.snapshot();
        db.sub_balance(&addr(1), U256::from(40)).unwrap();
        db.add_balance(&addr(2), U256::from(40)).unwrap();
        db.remove(&addr(3));

        let (pre, post) = db.changes_since(snap).unwrap();
        assert_eq!(pre.len(), 2);
        assert_eq!(pre[&addr(1)].balance, U256::from(100));
        assert!(!pre.contains_key(&addr(2)));
        assert_eq!(pre[&addr(3)].balance, U256::from(1));
        assert_eq!(post[&addr(1)].balance, U256::from(60));
        assert_eq!(post[&addr(2)].balance, U256::from(40));
        assert!(!post.contains_key(&addr(3)));
        assert!(!pre.contains_key(&addr(9)) && !post.contains_key(&addr(9)));
    }
}
