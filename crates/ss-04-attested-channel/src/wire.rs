//! Wire format of the attested exchange (JSON).
//!
//! The request carries the batch and only the header fields needed to
//! execute it; no local account state is ever sent. The response carries
//! one [`StateModification`] per executed transaction, in execution order,
//! plus the executor's own view of the header counters.

use serde::{Deserialize, Serialize};
use shared_types::{Address, Hash, Receipt, SignedTransaction, U256};
use ss_01_account_state::AccountSnapshot;

use crate::error::ChannelError;

/// Header fields the executor needs to run the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct HeaderContext {
    pub parent_hash: Hash,
    pub number: u64,
    pub timestamp: u64,
    pub coinbase: Address,
    pub gas_limit: u64,
    #[serde(default)]
    pub base_fee: Option<U256>,
    #[serde(default)]
    pub excess_blob_gas: Option<u64>,
}

/// Ordered batch of candidate transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRequest {
    pub transactions: Vec<SignedTransaction>,
    pub env: HeaderContext,
}

/// Effect of one transaction as observed by the executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateModification {
    /// Touched accounts before the transaction (absent = did not exist).
    pub pre: AccountSnapshot,
    /// Touched accounts after the transaction (absent = removed).
    pub post: AccountSnapshot,
    pub tx: SignedTransaction,
    /// `None` when the executor could not produce a receipt.
    #[serde(default)]
    pub receipt: Option<Receipt>,
}

/// Header counters as consumed on the executor. Advisory only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ExecutorHeaderView {
    pub gas_used: u64,
    #[serde(default)]
    pub blob_gas_used: u64,
}

/// Executor reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BatchResponse {
    pub results: Vec<StateModification>,
    #[serde(default)]
    pub header: ExecutorHeaderView,
}

pub fn encode_request(request: &BatchRequest) -> Result<Vec<u8>, ChannelError> {
    serde_json::to_vec(request).map_err(|e| ChannelError::Encode(e.to_string()))
}

pub fn decode_request(bytes: &[u8]) -> Result<BatchRequest, ChannelError> {
    serde_json::from_slice(bytes).map_err(|e| ChannelError::Decode(e.to_string()))
}

pub fn encode_response(response: &BatchResponse) -> Result<Vec<u8>, ChannelError> {
    serde_json::to_vec(response).map_err(|e| ChannelError::Encode(e.to_string()))
}

pub fn decode_response(bytes: &[u8]) -> Result<BatchResponse, ChannelError> {
    serde_json::from_slice(bytes).map_err(|e| ChannelError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use k256::ecdsa::SigningKey;
    use shared_types::{FeeFields, UnsignedTransaction};
    use ss_01_account_state::Account;

    fn sample_tx() -> SignedTransaction {
        let unsigned = UnsignedTransaction {
            chain_id: Some(1337),
            nonce: 3,
            gas_limit: 21_000,
            fees: FeeFields::Legacy {
                gas_price: U256::from(10),
            },
            to: Some(Address::repeat_byte(2)),
            value: U256::from(5),
            data: vec![],
            blob_hashes: vec![],
            max_fee_per_blob_gas: None,
        };
        SignedTransaction::sign(unsigned, &SigningKey::from_slice(&[9u8; 32]).unwrap()).unwrap()
    }

    #[test]
    fn test_response_keeps_record_order() {
        let tx = sample_tx();
        let record = StateModification {
            pre: [(Address::repeat_byte(1), Account::with_balance(U256::from(100)))].into(),
            post: [(Address::repeat_byte(1), Account::with_balance(U256::from(95)))].into(),
            tx: tx.clone(),
            receipt: None,
        };
        let mut second = record.clone();
        second.tx.tx.nonce = 4;
        let response = BatchResponse {
            results: vec![record, second],
            header: ExecutorHeaderView {
                gas_used: 42_000,
                blob_gas_used: 0,
            },
        };
        let decoded = decode_response(&encode_response(&response).unwrap()).unwrap();
        assert_eq!(decoded.results[0].tx.nonce(), 3);
        assert_eq!(decoded.results[1].tx.nonce(), 4);
        assert_eq!(decoded, response);
    }

    #[test]
    fn test_missing_receipt_and_header_default() {
        let tx = sample_tx();
        let json = serde_json::json!({
            "results": [{ "pre": {}, "post": {}, "tx": tx }]
        });
        let decoded = decode_response(json.to_string().as_bytes()).unwrap();
        assert!(decoded.results[0].receipt.is_none());
        assert_eq!(decoded.header, ExecutorHeaderView::default());
    }

    #[test]
    fn test_garbage_is_decode_error() {
        assert!(matches!(
            decode_response(b"not json"),
            Err(ChannelError::Decode(_))
        ));
        assert!(matches!(
            decode_request(b"{\"transactions\": 5}"),
            Err(ChannelError::Decode(_))
        ));
    }
}
