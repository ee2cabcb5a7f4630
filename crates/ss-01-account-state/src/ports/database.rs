use shared_types::Address;

use crate::domain::{Account, StateError};

/// Durable ledger the overlay reads through to.
///
/// Read-only from the sealer's point of view; durability and the trie
/// behind it belong to the node.
pub trait AccountBackend: Send + Sync {
    fn account(&self, address: &Address) -> Result<Option<Account>, StateError>;
}
