use std::collections::HashMap;
use std::sync::RwLock;

use shared_types::Address;

use crate::domain::{Account, StateChanges, StateError};
use crate::ports::AccountBackend;

/// In-memory ledger for the executor node and tests.
#[derive(Debug)]
pub struct InMemoryAccountBackend {
    accounts: RwLock<HashMap<Address, Account>>,
}

impl InMemoryAccountBackend {
    pub fn new() -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_accounts(accounts: impl IntoIterator<Item = (Address, Account)>) -> Self {
        Self {
            accounts: RwLock::new(accounts.into_iter().collect()),
        }
    }

    pub fn insert(&self, address: Address, account: Account) -> Result<(), StateError> {
        let mut accounts = self
            .accounts
            .write()
            .map_err(|_| StateError::LockPoisoned)?;
        accounts.insert(address, account);
        Ok(())
    }

    /// Persist the dirty set of a finished attempt.
    pub fn commit(&self, changes: StateChanges) -> Result<(), StateError> {
        let mut accounts = self
            .accounts
            .write()
            .map_err(|_| StateError::LockPoisoned)?;
        for (address, change) in changes {
            match change {
                Some(account) => {
                    accounts.insert(address, account);
                }
                None => {
                    accounts.remove(&address);
                }
            }
        }
        Ok(())
    }

    /// Independent copy of the current accounts.
    pub fn fork(&self) -> Result<Self, StateError> {
        let accounts = self
            .accounts
            .read()
            .map_err(|_| StateError::LockPoisoned)?;
        Ok(Self::with_accounts(accounts.clone()))
    }

    pub fn len(&self) -> usize {
        self.accounts.read().map(|a| a.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryAccountBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AccountBackend for InMemoryAccountBackend {
    fn account(&self, address: &Address) -> Result<Option<Account>, StateError> {
        let accounts = self
            .accounts
            .read()
            .map_err(|_| StateError::LockPoisoned)?;
        Ok(accounts.get(address).cloned())
    }
}
