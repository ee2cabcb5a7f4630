//! # Result Merge
//!
//! Folds an executor's [`BatchResponse`] into the local [`SealingContext`].
//! Records are taken in the executor's order; each one's state effect is
//! re-derived from its pre/post snapshots and written into local state.
//!
//! The executor is trusted for execution results but not for the block's
//! budget: the gas limit is re-checked here under [`GasLimitPolicy`].
//! [`GasLimitPolicy::Unchecked`] skips that check, so the merged block can
//! exceed its limit; the overrun is logged and reported in
//! [`BatchSummary::gas_over_limit`].

use std::collections::HashMap;

use shared_types::{Hash, SignedTransaction};
use ss_01_account_state::reconciler::reconcile;
use ss_04_attested_channel::BatchResponse;
use tracing::warn;

use super::BatchSummary;
use crate::config::GasLimitPolicy;
use crate::domain::SealingContext;
use crate::error::SealingError;

/// Merge `response` for the batch `staged` into `ctx`.
///
/// Fails with [`SealingError::Decode`] before touching any state if a record
/// names a transaction that was not submitted, or names one twice.
pub fn merge_response(
    ctx: &mut SealingContext,
    staged: Vec<SignedTransaction>,
    response: BatchResponse,
    policy: GasLimitPolicy,
) -> Result<BatchSummary, SealingError> {
    let mut summary = BatchSummary {
        submitted: staged.len(),
        ..Default::default()
    };

    let mut submitted: HashMap<Hash, SignedTransaction> =
        staged.into_iter().map(|tx| (tx.hash(), tx)).collect();
    let mut records = Vec::with_capacity(response.results.len());
    for record in response.results {
        let hash = record.tx.hash();
        let tx = submitted.remove(&hash).ok_or_else(|| {
            SealingError::Decode(format!("executor returned unknown or duplicate transaction {hash:?}"))
        })?;
        records.push((tx, record));
    }
    summary.unanswered = submitted.len();

    let gas_before = ctx.header.gas_used;
    let limit = ctx.header.gas_limit;

    if policy == GasLimitPolicy::RejectBatch {
        let total = records
            .iter()
            .filter_map(|(_, r)| r.receipt.as_ref())
            .fold(gas_before, |acc, r| acc.saturating_add(r.gas_used));
        if total > limit {
            warn!(total, limit, "[ss-03] Remote batch exceeds the gas limit; discarding it");
            summary.rejected_over_gas_limit = records.len();
            reset_pool(ctx);
            return Ok(summary);
        }
    }

    for (tx, record) in records {
        let Some(mut receipt) = record.receipt else {
            warn!(hash = %tx.hash(), "[ss-03] Receipt missing; skipping transaction");
            summary.missing_receipt += 1;
            continue;
        };

        let gas_used = ctx.header.gas_used.saturating_add(receipt.gas_used);
        if policy == GasLimitPolicy::RejectTransaction && gas_used > limit {
            warn!(
                hash = %tx.hash(),
                gas_used,
                limit,
                "[ss-03] Gas limit exceeded; excluding transaction"
            );
            summary.rejected_over_gas_limit += 1;
            continue;
        }

        let blobs = tx.sidecar.as_ref().map_or(0, |s| s.len());
        if !ctx.blobs_fit(blobs) {
            warn!(hash = %tx.hash(), blobs, "[ss-03] No blob capacity left; excluding transaction");
            summary.rejected_over_blob_limit += 1;
            continue;
        }

        reconcile(&mut ctx.state, &record.pre, &record.post)?;
        ctx.header.gas_used = gas_used;
        receipt.cumulative_gas_used = gas_used;
        receipt.transaction_index = ctx.tcount as u64;
        ctx.commit(&tx, receipt);
        summary.committed += 1;
    }

    if ctx.header.gas_used > limit {
        summary.gas_over_limit = ctx.header.gas_used - limit;
        warn!(
            gas_used = ctx.header.gas_used,
            limit,
            "[ss-03] Unchecked merge left the block over its gas limit"
        );
    }

    let merged = ctx.header.gas_used - gas_before;
    if response.header.gas_used != merged {
        warn!(
            executor = response.header.gas_used,
            merged,
            "[ss-03] Executor gas accounting differs from merged receipts"
        );
    }

    reset_pool(ctx);
    Ok(summary)
}

fn reset_pool(ctx: &mut SealingContext) {
    ctx.gas_pool
        .set_gas(ctx.header.gas_limit.saturating_sub(ctx.header.gas_used));
}

#[cfg(test)]
mod tests {
    use super::*;
    use k256::ecdsa::SigningKey;
    use shared_types::{
        Address, FeeFields, Header, Receipt, UnsignedTransaction, RECEIPT_STATUS_SUCCESS, U256,
    };
    use ss_01_account_state::{Account, AccountSnapshot, AccountStore, InMemoryAccountBackend, StateDb};
    use ss_04_attested_channel::{ExecutorHeaderView, StateModification};
    use std::sync::Arc;

    fn addr(n: u8) -> Address {
        Address::repeat_byte(n)
    }

    fn tx(nonce: u64) -> SignedTransaction {
        let unsigned = UnsignedTransaction {
            chain_id: Some(1337),
            nonce,
            gas_limit: 21_000,
            fees: FeeFields::Legacy {
                gas_price: U256::from(10),
            },
            to: Some(addr(2)),
            value: U256::from(1),
            data: vec![],
            blob_hashes: vec![],
            max_fee_per_blob_gas: None,
        };
        SignedTransaction::sign(unsigned, &SigningKey::from_slice(&[7u8; 32]).unwrap()).unwrap()
    }

    fn context(gas_limit: u64) -> SealingContext {
        let backend = InMemoryAccountBackend::with_accounts(vec![
            (addr(1), Account::with_balance(U256::from(100))),
            (addr(3), Account::with_balance(U256::from(100))),
        ]);
        SealingContext::new(
            Header {
                gas_limit,
                ..Default::default()
            },
            StateDb::new(Arc::new(backend)),
            addr(0xcc),
        )
    }

    fn record(tx: &SignedTransaction, who: u8, after: u64, gas_used: Option<u64>) -> StateModification {
        let pre: AccountSnapshot = [(addr(who), Account::with_balance(U256::from(100)))].into();
        let post: AccountSnapshot = [(addr(who), Account::with_balance(U256::from(after)).with_nonce(1))].into();
        StateModification {
            pre,
            post,
            tx: tx.without_sidecar(),
            receipt: gas_used.map(|gas_used| Receipt {
                tx_hash: tx.hash(),
                status: RECEIPT_STATUS_SUCCESS,
                gas_used,
                cumulative_gas_used: 0,
                effective_gas_price: U256::from(10),
                ..Default::default()
            }),
        }
    }

    fn response(results: Vec<StateModification>, gas_used: u64) -> BatchResponse {
        BatchResponse {
            results,
            header: ExecutorHeaderView {
                gas_used,
                blob_gas_used: 0,
            },
        }
    }

    #[test]
    fn test_missing_receipt_is_skipped_without_state_change() {
        let mut ctx = context(1_000_000);
        let (a, b) = (tx(0), tx(1));
        let reply = response(vec![record(&a, 1, 60, Some(21_000)), record(&b, 3, 50, None)], 21_000);
        let summary = merge_response(&mut ctx, vec![a, b], reply, GasLimitPolicy::RejectTransaction).unwrap();

        assert_eq!(summary.committed, 1);
        assert_eq!(summary.missing_receipt, 1);
        assert_eq!(ctx.txs.len(), 1);
        assert_eq!(ctx.header.gas_used, 21_000);
        assert_eq!(ctx.state.balance(&addr(1)).unwrap(), U256::from(60));
        assert_eq!(ctx.state.balance(&addr(3)).unwrap(), U256::from(100));
    }

    #[test]
    fn test_over_limit_record_is_excluded() {
        let mut ctx = context(50_000);
        let (a, b) = (tx(0), tx(1));
        let reply = response(vec![record(&a, 1, 60, Some(30_000)), record(&b, 3, 50, Some(30_000))], 60_000);
        let summary = merge_response(&mut ctx, vec![a, b], reply, GasLimitPolicy::RejectTransaction).unwrap();

        assert_eq!(summary.committed, 1);
        assert_eq!(summary.rejected_over_gas_limit, 1);
        assert_eq!(ctx.header.gas_used, 30_000);
        assert_eq!(ctx.receipts[0].cumulative_gas_used, 30_000);
        assert_eq!(ctx.state.balance(&addr(3)).unwrap(), U256::from(100));
        assert_eq!(ctx.gas_pool.gas(), 20_000);
    }

    #[test]
    fn test_reject_batch_discards_everything() {
        let mut ctx = context(50_000);
        let (a, b) = (tx(0), tx(1));
        let reply = response(vec![record(&a, 1, 60, Some(30_000)), record(&b, 3, 50, Some(30_000))], 60_000);
        let summary = merge_response(&mut ctx, vec![a, b], reply, GasLimitPolicy::RejectBatch).unwrap();

        assert_eq!(summary.committed, 0);
        assert_eq!(summary.rejected_over_gas_limit, 2);
        assert!(ctx.txs.is_empty());
        assert_eq!(ctx.state.balance(&addr(1)).unwrap(), U256::from(100));
    }

    #[test]
    fn test_unchecked_policy_keeps_executor_results() {
        let mut ctx = context(50_000);
        let (a, b) = (tx(0), tx(1));
        let reply = response(vec![record(&a, 1, 60, Some(30_000)), record(&b, 3, 50, Some(30_000))], 60_000);
        let summary = merge_response(&mut ctx, vec![a, b], reply, GasLimitPolicy::Unchecked).unwrap();
        assert_eq!(summary.committed, 2);
        assert_eq!(summary.gas_over_limit, 10_000);
        assert_eq!(ctx.header.gas_used, 60_000);
        assert_eq!(ctx.gas_pool.gas(), 0);
    }

    #[test]
    fn test_checked_policies_never_report_overrun() {
        for policy in [GasLimitPolicy::RejectTransaction, GasLimitPolicy::RejectBatch] {
            let mut ctx = context(50_000);
            let (a, b) = (tx(0), tx(1));
            let reply = response(vec![record(&a, 1, 60, Some(30_000)), record(&b, 3, 50, Some(30_000))], 60_000);
            let summary = merge_response(&mut ctx, vec![a, b], reply, policy).unwrap();
            assert_eq!(summary.gas_over_limit, 0);
            assert!(ctx.header.gas_used <= ctx.header.gas_limit);
        }
    }

    #[test]
    fn test_unknown_transaction_is_decode_error() {
        let mut ctx = context(1_000_000);
        let reply = response(vec![record(&tx(5), 1, 60, Some(21_000))], 21_000);
        let err = merge_response(&mut ctx, vec![tx(0)], reply, GasLimitPolicy::RejectTransaction).unwrap_err();
        assert!(matches!(err, SealingError::Decode(_)));
        assert_eq!(ctx.state.balance(&addr(1)).unwrap(), U256::from(100));
    }

    #[test]
    fn test_unanswered_transactions_are_counted() {
        let mut ctx = context(1_000_000);
        let (a, b) = (tx(0), tx(1));
        let reply = response(vec![record(&a, 1, 60, Some(21_000))], 21_000);
        let summary = merge_response(&mut ctx, vec![a, b], reply, GasLimitPolicy::RejectTransaction).unwrap();
        assert_eq!(summary.submitted, 2);
        assert_eq!(summary.unanswered, 1);
        assert_eq!(ctx.receipts[0].transaction_index, 0);
    }
}
