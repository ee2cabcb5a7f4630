use shared_types::{Receipt, SignedTransaction, U256};

/// Fees paid to the coinbase: sum of `gas_used * effective_tip`.
///
/// `txs` and `receipts` must be in the same order.
pub fn total_fees(txs: &[SignedTransaction], receipts: &[Receipt], base_fee: Option<U256>) -> U256 {
    txs.iter()
        .zip(receipts)
        .fold(U256::zero(), |acc, (tx, receipt)| {
            let tip = tx.effective_tip(base_fee);
            acc.saturating_add(tip.saturating_mul(U256::from(receipt.gas_used)))
        })
}
