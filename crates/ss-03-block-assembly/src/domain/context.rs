//! # Sealing Context
//!
//! Everything one block-building attempt accumulates. Owned by exactly one
//! attempt and never shared.

use shared_types::params::{BLOB_TX_BLOB_GAS_PER_BLOB, MAX_BLOB_GAS_PER_BLOCK};
use shared_types::{Address, BlobSidecar, Header, Receipt, SignedTransaction};
use ss_01_account_state::StateDb;
use ss_04_attested_channel::HeaderContext;

use crate::error::ExecutionError;

/// Gas still available for packing transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasPool {
    gas: u64,
}

impl GasPool {
    pub fn new(gas: u64) -> Self {
        Self { gas }
    }

    pub fn gas(&self) -> u64 {
        self.gas
    }

    pub fn sub_gas(&mut self, amount: u64) -> Result<(), ExecutionError> {
        self.gas = self
            .gas
            .checked_sub(amount)
            .ok_or(ExecutionError::GasLimitReached)?;
        Ok(())
    }

    pub fn add_gas(&mut self, amount: u64) {
        self.gas = self.gas.saturating_add(amount);
    }

    pub fn set_gas(&mut self, gas: u64) {
        self.gas = gas;
    }
}

#[derive(Debug)]
pub struct SealingContext {
    pub header: Header,
    /// Fee recipient requested by the caller.
    pub coinbase: Address,
    pub state: StateDb,
    pub gas_pool: GasPool,
    /// Committed transactions, sidecars stripped.
    pub txs: Vec<SignedTransaction>,
    pub receipts: Vec<Receipt>,
    pub sidecars: Vec<BlobSidecar>,
    /// Blobs committed so far.
    pub blobs: usize,
    /// Blobs staged for a remote batch and not yet merged.
    pub reserved_blobs: usize,
    pub tcount: usize,
}

impl SealingContext {
    pub fn new(header: Header, state: StateDb, coinbase: Address) -> Self {
        let gas_pool = GasPool::new(header.gas_limit.saturating_sub(header.gas_used));
        Self {
            header,
            coinbase,
            state,
            gas_pool,
            txs: Vec::new(),
            receipts: Vec::new(),
            sidecars: Vec::new(),
            blobs: 0,
            reserved_blobs: 0,
            tcount: 0,
        }
    }

    /// Blob gas still available, counting staged blobs.
    pub fn blob_gas_left(&self) -> u64 {
        let used = (self.blobs + self.reserved_blobs) as u64 * BLOB_TX_BLOB_GAS_PER_BLOB;
        MAX_BLOB_GAS_PER_BLOCK.saturating_sub(used)
    }

    /// Whether `count` more blobs fit this block.
    pub fn blobs_fit(&self, count: usize) -> bool {
        (self.blobs + self.reserved_blobs + count) as u64 * BLOB_TX_BLOB_GAS_PER_BLOB
            <= MAX_BLOB_GAS_PER_BLOCK
    }

    /// Record an applied transaction and its receipt.
    ///
    /// The bare transaction goes into the body; a blob sidecar is kept
    /// separately and the blob counters advance.
    pub fn commit(&mut self, tx: &SignedTransaction, receipt: Receipt) {
        if let Some(sidecar) = &tx.sidecar {
            self.blobs += sidecar.len();
            self.sidecars.push(sidecar.clone());
        }
        if tx.is_blob() {
            let used = self.header.blob_gas_used.get_or_insert(0);
            *used = used.saturating_add(receipt.blob_gas_used);
        }
        self.txs.push(tx.without_sidecar());
        self.receipts.push(receipt);
        self.tcount += 1;
    }

    /// Header fields sent to a remote executor.
    pub fn header_context(&self) -> HeaderContext {
        HeaderContext {
            parent_hash: self.header.parent_hash,
            number: self.header.number,
            timestamp: self.header.timestamp,
            coinbase: self.coinbase,
            gas_limit: self.header.gas_limit,
            base_fee: self.header.base_fee,
            excess_blob_gas: self.header.excess_blob_gas,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ss_01_account_state::InMemoryAccountBackend;
    use std::sync::Arc;

    fn context(gas_limit: u64) -> SealingContext {
        let header = Header {
            gas_limit,
            ..Default::default()
        };
        SealingContext::new(
            header,
            StateDb::new(Arc::new(InMemoryAccountBackend::new())),
            Address::zero(),
        )
    }

    #[test]
    fn test_gas_pool_refuses_overdraw() {
        let mut pool = GasPool::new(30_000);
        pool.sub_gas(21_000).unwrap();
        assert_eq!(pool.sub_gas(21_000), Err(ExecutionError::GasLimitReached));
        assert_eq!(pool.gas(), 9_000);
        pool.add_gas(1_000);
        assert_eq!(pool.gas(), 10_000);
    }

    #[test]
    fn test_blob_capacity_counts_reserved() {
        let mut ctx = context(1_000_000);
        assert!(ctx.blobs_fit(6));
        assert!(!ctx.blobs_fit(7));
        ctx.blobs = 2;
        ctx.reserved_blobs = 3;
        assert!(ctx.blobs_fit(1));
        assert!(!ctx.blobs_fit(2));
        assert_eq!(ctx.blob_gas_left(), BLOB_TX_BLOB_GAS_PER_BLOB);
    }

    #[test]
    fn test_header_context_carries_coinbase() {
        let mut ctx = context(8_000_000);
        ctx.coinbase = Address::repeat_byte(7);
        ctx.header.number = 12;
        let env = ctx.header_context();
        assert_eq!(env.coinbase, Address::repeat_byte(7));
        assert_eq!(env.number, 12);
        assert_eq!(env.gas_limit, 8_000_000);
    }
}
