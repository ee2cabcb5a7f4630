use shared_types::{Address, StorageKey, StorageValue, U256};

use crate::domain::{Account, AccountDiff, SnapshotId, StateError};

/// Mutable account state of one sealing attempt.
pub trait AccountStore {
    // === Reads ===

    fn read(&self, address: &Address) -> Result<Option<Account>, StateError>;

    /// Account at `address`, or an empty one.
    fn account(&self, address: &Address) -> Result<Account, StateError> {
        Ok(self.read(address)?.unwrap_or_default())
    }

    fn balance(&self, address: &Address) -> Result<U256, StateError> {
        Ok(self.account(address)?.balance)
    }

    fn nonce(&self, address: &Address) -> Result<u64, StateError> {
        Ok(self.account(address)?.nonce)
    }

    // === Snapshots ===

    fn snapshot(&mut self) -> SnapshotId;

    /// Undo every write made after `id` was taken.
    fn revert(&mut self, id: SnapshotId) -> Result<(), StateError>;

    // === Writes ===

    /// Sparse, idempotent patch. Never lowers a nonce.
    fn apply_diff(&mut self, address: &Address, diff: &AccountDiff) -> Result<(), StateError>;

    /// Replace the whole account.
    fn write(&mut self, address: Address, account: Account) -> Result<(), StateError>;

    fn set_nonce(&mut self, address: &Address, nonce: u64) -> Result<(), StateError> {
        let mut account = self.account(address)?;
        account.nonce = nonce;
        self.write(*address, account)
    }

    fn set_code(&mut self, address: &Address, code: Vec<u8>) -> Result<(), StateError> {
        let mut account = self.account(address)?;
        account.set_code(code);
        self.write(*address, account)
    }

    fn set_storage(
        &mut self,
        address: &Address,
        key: StorageKey,
        value: StorageValue,
    ) -> Result<(), StateError> {
        let mut account = self.account(address)?;
        account.set_storage(key, value);
        self.write(*address, account)
    }

    fn add_balance(&mut self, address: &Address, amount: U256) -> Result<(), StateError> {
        let mut account = self.account(address)?;
        account.balance = account
            .balance
            .checked_add(amount)
            .ok_or(StateError::BalanceOverflow { address: *address })?;
        self.write(*address, account)
    }

    fn sub_balance(&mut self, address: &Address, amount: U256) -> Result<(), StateError> {
        let mut account = self.account(address)?;
        account.balance =
            account
                .balance
                .checked_sub(amount)
                .ok_or(StateError::BalanceUnderflow {
                    address: *address,
                    balance: account.balance,
                    amount,
                })?;
        self.write(*address, account)
    }
}
