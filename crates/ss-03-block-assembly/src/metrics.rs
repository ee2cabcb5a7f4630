//! Metrics collection for the sealer

use std::sync::atomic::{AtomicU64, Ordering};

use crate::backend::BatchSummary;
use crate::error::InterruptReason;

#[derive(Debug, Default)]
pub struct SealerMetrics {
    /// Block-building attempts started
    pub attempts: AtomicU64,

    /// Blocks finalised
    pub blocks_sealed: AtomicU64,

    /// Transactions included across all sealed blocks
    pub transactions_included: AtomicU64,

    /// Senders dropped by the commit loop
    pub transactions_skipped: AtomicU64,

    /// Completed attested round trips
    pub remote_round_trips: AtomicU64,

    /// Remote records excluded by the gas limit policy
    pub remote_records_rejected: AtomicU64,

    /// Attempts cut short by a cancellation signal
    pub interruptions: AtomicU64,
}

impl SealerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_attempt(&self) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_block_sealed(&self, tx_count: usize) {
        self.blocks_sealed.fetch_add(1, Ordering::Relaxed);
        self.transactions_included
            .fetch_add(tx_count as u64, Ordering::Relaxed);
    }

    pub fn record_skipped(&self, count: usize) {
        self.transactions_skipped
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Record a remote batch; empty batches never left the sealer.
    pub fn record_batch(&self, summary: &BatchSummary) {
        if summary.submitted == 0 {
            return;
        }
        self.remote_round_trips.fetch_add(1, Ordering::Relaxed);
        self.remote_records_rejected
            .fetch_add(summary.rejected_over_gas_limit as u64, Ordering::Relaxed);
    }

    pub fn record_interruption(&self, _reason: InterruptReason) {
        self.interruptions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_blocks_sealed(&self) -> u64 {
        self.blocks_sealed.load(Ordering::Relaxed)
    }

    pub fn get_remote_round_trips(&self) -> u64 {
        self.remote_round_trips.load(Ordering::Relaxed)
    }

    /// Average transactions per sealed block
    pub fn get_avg_transactions_per_block(&self) -> f64 {
        let blocks = self.blocks_sealed.load(Ordering::Relaxed);
        if blocks == 0 {
            return 0.0;
        }
        let txs = self.transactions_included.load(Ordering::Relaxed);
        txs as f64 / blocks as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_recording() {
        let metrics = SealerMetrics::new();

        metrics.record_block_sealed(100);
        metrics.record_block_sealed(150);

        assert_eq!(metrics.get_blocks_sealed(), 2);
        assert_eq!(metrics.get_avg_transactions_per_block(), 125.0);
    }

    #[test]
    fn test_empty_batch_is_not_a_round_trip() {
        let metrics = SealerMetrics::new();
        metrics.record_batch(&BatchSummary::default());
        assert_eq!(metrics.get_remote_round_trips(), 0);

        metrics.record_batch(&BatchSummary {
            submitted: 3,
            rejected_over_gas_limit: 1,
            ..Default::default()
        });
        assert_eq!(metrics.get_remote_round_trips(), 1);
        assert_eq!(metrics.remote_records_rejected.load(Ordering::Relaxed), 1);
    }
}
