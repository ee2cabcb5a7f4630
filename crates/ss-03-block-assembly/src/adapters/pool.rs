//! In-memory transaction pool.
//!
//! The pool owns every body behind an `Arc`; [`LazyTransaction`]s handed
//! out by [`TransactionPool::pending`] hold weak references, so an evicted
//! transaction stops resolving mid-attempt.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;
use shared_types::{Address, Hash, LazyTransaction, SignatureError, SignedTransaction, U256};
use tracing::debug;

use crate::ports::{PendingFilter, PendingSet, TransactionPool};

#[derive(Debug)]
struct PoolEntry {
    tx: Arc<SignedTransaction>,
    sender: Address,
    arrival: u64,
}

#[derive(Debug, Default)]
struct PoolInner {
    entries: HashMap<Hash, PoolEntry>,
    locals: HashSet<Address>,
    next_arrival: u64,
}

#[derive(Debug, Default)]
pub struct InMemoryTxPool {
    inner: RwLock<PoolInner>,
}

impl InMemoryTxPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit a remotely received transaction.
    pub fn add(&self, tx: SignedTransaction) -> Result<Hash, SignatureError> {
        self.insert(tx, false)
    }

    /// Admit a locally submitted transaction; its sender becomes a local.
    pub fn add_local(&self, tx: SignedTransaction) -> Result<Hash, SignatureError> {
        self.insert(tx, true)
    }

    fn insert(&self, tx: SignedTransaction, local: bool) -> Result<Hash, SignatureError> {
        let sender = tx.recover_sender()?;
        let hash = tx.hash();
        let mut inner = self.inner.write();
        let arrival = inner.next_arrival;
        inner.next_arrival += 1;
        if local {
            inner.locals.insert(sender);
        }
        inner.entries.insert(
            hash,
            PoolEntry {
                tx: Arc::new(tx),
                sender,
                arrival,
            },
        );
        debug!(hash = %hash, sender = ?sender, local, "Transaction admitted");
        Ok(hash)
    }

    /// Drop a transaction. Outstanding lazy handles stop resolving.
    pub fn evict(&self, hash: &Hash) -> bool {
        self.inner.write().entries.remove(hash).is_some()
    }

    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn admits(filter: &PendingFilter, tx: &SignedTransaction, local: bool) -> bool {
    if filter.only_plain_txs && tx.is_blob() {
        return false;
    }
    if filter.only_blob_txs && !tx.is_blob() {
        return false;
    }
    if let Some(base_fee) = filter.base_fee {
        if tx.fees().fee_cap() < base_fee {
            return false;
        }
    }
    // Locals bypass the tip floor.
    if let Some(min_tip) = filter.min_tip {
        if !local && tx.effective_tip(filter.base_fee) < min_tip {
            return false;
        }
    }
    if tx.is_blob() {
        if let Some(blob_fee) = filter.blob_fee {
            if tx.tx.max_fee_per_blob_gas.unwrap_or_default() < blob_fee {
                return false;
            }
        }
    }
    true
}

impl TransactionPool for InMemoryTxPool {
    fn pending(&self, filter: &PendingFilter) -> PendingSet {
        let inner = self.inner.read();
        let mut by_sender: BTreeMap<Address, Vec<&PoolEntry>> = BTreeMap::new();
        for entry in inner.entries.values() {
            by_sender.entry(entry.sender).or_default().push(entry);
        }

        let mut pending = PendingSet::new();
        for (sender, mut entries) in by_sender {
            entries.sort_by_key(|e| (e.tx.nonce(), e.arrival));
            let local = inner.locals.contains(&sender);
            // A rejected nonce gates every later one.
            let queue: Vec<LazyTransaction> = entries
                .into_iter()
                .take_while(|e| admits(filter, &e.tx, local))
                .map(|e| LazyTransaction::pooled(&e.tx, e.sender, e.arrival))
                .collect();
            if !queue.is_empty() {
                pending.insert(sender, queue);
            }
        }
        pending
    }

    fn locals(&self) -> Vec<Address> {
        self.inner.read().locals.iter().copied().collect()
    }
}

/// Blob fee floor for a pool query, if blob transactions are active.
pub fn blob_fee_floor(excess_blob_gas: Option<u64>) -> Option<U256> {
    excess_blob_gas.map(crate::domain::calc_blob_fee)
}
