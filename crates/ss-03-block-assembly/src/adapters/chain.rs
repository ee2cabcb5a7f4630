//! In-memory chain: headers by hash, a head pointer and one ledger per
//! state root.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use shared_types::{Hash, Header};
use ss_01_account_state::{AccountBackend, InMemoryAccountBackend, StateChanges};
use tracing::info;

use crate::error::SealingError;
use crate::ports::{ChainReader, SealedBlock};

#[derive(Debug)]
struct ChainInner {
    headers: HashMap<Hash, Header>,
    head: Hash,
    states: HashMap<Hash, Arc<InMemoryAccountBackend>>,
}

#[derive(Debug)]
pub struct InMemoryChain {
    inner: RwLock<ChainInner>,
}

impl InMemoryChain {
    pub fn new(genesis: Header, state: InMemoryAccountBackend) -> Self {
        let hash = genesis.hash();
        let root = genesis.state_root;
        Self {
            inner: RwLock::new(ChainInner {
                headers: HashMap::from([(hash, genesis)]),
                head: hash,
                states: HashMap::from([(root, Arc::new(state))]),
            }),
        }
    }

    /// Append a sealed block and the state it produced; it becomes the head.
    pub fn import(&self, block: &SealedBlock, changes: StateChanges) -> Result<Hash, SealingError> {
        let mut inner = self.inner.write();
        let parent = inner
            .headers
            .get(&block.header.parent_hash)
            .ok_or(SealingError::MissingParent)?;
        let parent_state = inner
            .states
            .get(&parent.state_root)
            .ok_or_else(|| SealingError::Internal(format!("no state for root {:?}", parent.state_root)))?;

        let state = parent_state.fork()?;
        state.commit(changes)?;

        let hash = block.hash();
        inner.states.insert(block.header.state_root, Arc::new(state));
        inner.headers.insert(hash, block.header.clone());
        inner.head = hash;
        info!(number = block.header.number, hash = %hash, txs = block.transactions.len(), "[ss-03] Imported block");
        Ok(hash)
    }
}

impl ChainReader for InMemoryChain {
    fn current_header(&self) -> Header {
        let inner = self.inner.read();
        inner.headers.get(&inner.head).cloned().unwrap_or_default()
    }

    fn header_by_hash(&self, hash: &Hash) -> Option<Header> {
        self.inner.read().headers.get(hash).cloned()
    }

    fn state_at(&self, root: &Hash) -> Result<Arc<dyn AccountBackend>, SealingError> {
        let inner = self.inner.read();
        let state = inner
            .states
            .get(root)
            .ok_or_else(|| SealingError::Internal(format!("no state for root {root:?}")))?;
        Ok(Arc::clone(state) as Arc<dyn AccountBackend>)
    }
}
