//! # Transaction Orderer
//!
//! A max-heap holding the head transaction of every sender, with the rest
//! of each sender's queue parked behind it.
//!
//! ## Operations
//!
//! - `peek`: current best head, not advancing
//! - `shift`: replace the best head with the same sender's next nonce
//! - `pop`: drop the best head's sender entirely
//! - `clear` / `is_empty`: bulk drop and emptiness check

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, VecDeque};

use shared_types::{Address, LazyTransaction, U256};
use tracing::trace;

#[derive(Debug, Clone)]
struct Head {
    tx: LazyTransaction,
    tip: U256,
}

impl PartialEq for Head {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Head {}

impl PartialOrd for Head {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Head {
    /// Greater = better: higher tip, then earlier arrival, then lower sender.
    fn cmp(&self, other: &Self) -> Ordering {
        self.tip
            .cmp(&other.tip)
            .then_with(|| other.tx.arrival.cmp(&self.tx.arrival))
            .then_with(|| other.tx.sender.cmp(&self.tx.sender))
    }
}

/// Price-and-nonce ordered view over pending transactions.
#[derive(Debug, Default)]
pub struct TransactionOrderer {
    heads: BinaryHeap<Head>,
    queues: HashMap<Address, VecDeque<LazyTransaction>>,
    base_fee: Option<U256>,
}

impl TransactionOrderer {
    /// Build from per-sender queues.
    ///
    /// Queues are sorted by nonce. A sender whose next transaction cannot pay
    /// `base_fee` is dropped.
    pub fn new(
        by_sender: impl IntoIterator<Item = (Address, Vec<LazyTransaction>)>,
        base_fee: Option<U256>,
    ) -> Self {
        let mut orderer = Self {
            heads: BinaryHeap::new(),
            queues: HashMap::new(),
            base_fee,
        };
        for (sender, mut txs) in by_sender {
            txs.sort_by_key(|tx| tx.nonce);
            orderer.queues.insert(sender, txs.into());
            orderer.advance(sender);
        }
        orderer
    }

    fn affordable(&self, tx: &LazyTransaction) -> bool {
        self.base_fee.map_or(true, |base| tx.fees.fee_cap() >= base)
    }

    /// Promote `sender`'s next queued transaction to a head.
    fn advance(&mut self, sender: Address) {
        let next = self.queues.get_mut(&sender).and_then(VecDeque::pop_front);
        match next {
            Some(tx) if self.affordable(&tx) => {
                let tip = tx.effective_tip(self.base_fee);
                self.heads.push(Head { tx, tip });
            }
            Some(tx) => {
                trace!(sender = ?sender, hash = %tx.hash, "Fee cap below base fee, dropping sender");
                self.queues.remove(&sender);
            }
            None => {
                self.queues.remove(&sender);
            }
        }
    }

    /// Best candidate and its effective tip.
    pub fn peek(&self) -> Option<(&LazyTransaction, U256)> {
        self.heads.peek().map(|head| (&head.tx, head.tip))
    }

    /// Move past the best candidate, keeping its sender's later nonces.
    pub fn shift(&mut self) {
        if let Some(head) = self.heads.pop() {
            self.advance(head.tx.sender);
        }
    }

    /// Drop the best candidate together with its sender's remaining queue.
    pub fn pop(&mut self) {
        if let Some(head) = self.heads.pop() {
            self.queues.remove(&head.tx.sender);
        }
    }

    pub fn clear(&mut self) {
        self.heads.clear();
        self.queues.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.heads.is_empty()
    }

    /// Number of senders with a pending candidate.
    pub fn len(&self) -> usize {
        self.heads.len()
    }
}

/// Which of the two orderers a candidate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueKind {
    Plain,
    Blob,
}

/// Choose between the plain and blob heads.
///
/// Same comparator as within an orderer; a full tie favours the plain queue.
pub fn pick(
    plain: Option<(&LazyTransaction, U256)>,
    blob: Option<(&LazyTransaction, U256)>,
) -> Option<QueueKind> {
    match (plain, blob) {
        (None, None) => None,
        (Some(_), None) => Some(QueueKind::Plain),
        (None, Some(_)) => Some(QueueKind::Blob),
        (Some((p, p_tip)), Some((b, b_tip))) => {
            let blob_better = b_tip > p_tip || (b_tip == p_tip && b.arrival < p.arrival);
            Some(if blob_better {
                QueueKind::Blob
            } else {
                QueueKind::Plain
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k256::ecdsa::SigningKey;
    use proptest::prelude::*;
    use shared_types::{FeeFields, SignedTransaction, UnsignedTransaction};
    use std::sync::Arc;

    fn lazy(sender: u8, nonce: u64, tip: u64, arrival: u64) -> LazyTransaction {
        let unsigned = UnsignedTransaction {
            chain_id: Some(1),
            nonce,
            gas_limit: 21_000,
            fees: FeeFields::Dynamic {
                max_fee_per_gas: U256::from(1_000 + tip),
                max_priority_fee_per_gas: U256::from(tip),
            },
            to: Some(Address::repeat_byte(0xee)),
            value: U256::zero(),
            data: vec![],
            blob_hashes: vec![],
            max_fee_per_blob_gas: None,
        };
        let key = SigningKey::from_slice(&[sender.max(1); 32]).unwrap();
        let tx = SignedTransaction::sign(unsigned, &key).unwrap();
        LazyTransaction::resolved(Arc::new(tx), Address::repeat_byte(sender), arrival)
    }

    fn drain(mut orderer: TransactionOrderer) -> Vec<(u8, u64)> {
        let mut out = Vec::new();
        while let Some((tx, _)) = orderer.peek() {
            out.push((tx.sender.0[0], tx.nonce));
            orderer.shift();
        }
        out
    }

    #[test]
    fn test_higher_tip_first_and_nonce_order_kept() {
        let orderer = TransactionOrderer::new(
            vec![
                (Address::repeat_byte(1), vec![lazy(1, 1, 50, 1), lazy(1, 0, 5, 0)]),
                (Address::repeat_byte(2), vec![lazy(2, 0, 10, 2)]),
            ],
            Some(U256::from(100)),
        );
        // Sender 1's nonce 0 (tip 5) gates its nonce 1 (tip 50).
        assert_eq!(drain(orderer), vec![(2, 0), (1, 0), (1, 1)]);
    }

    #[test]
    fn test_equal_tip_earlier_arrival_wins() {
        let orderer = TransactionOrderer::new(
            vec![
                (Address::repeat_byte(1), vec![lazy(1, 0, 10, 7)]),
                (Address::repeat_byte(2), vec![lazy(2, 0, 10, 3)]),
            ],
            None,
        );
        assert_eq!(orderer.peek().unwrap().0.sender, Address::repeat_byte(2));
    }

    #[test]
    fn test_pop_drops_sender_queue() {
        let mut orderer = TransactionOrderer::new(
            vec![
                (Address::repeat_byte(1), vec![lazy(1, 0, 20, 0), lazy(1, 1, 20, 1)]),
                (Address::repeat_byte(2), vec![lazy(2, 0, 10, 2)]),
            ],
            None,
        );
        orderer.pop();
        assert_eq!(drain(orderer), vec![(2, 0)]);
    }

    #[test]
    fn test_clear_empties() {
        let mut orderer = TransactionOrderer::new(
            vec![(Address::repeat_byte(1), vec![lazy(1, 0, 1, 0)])],
            None,
        );
        assert!(!orderer.is_empty());
        assert_eq!(orderer.len(), 1);
        orderer.clear();
        assert!(orderer.is_empty());
        assert!(orderer.peek().is_none());
        orderer.shift();
        orderer.pop();
    }

    #[test]
    fn test_underpriced_sender_dropped() {
        // fee cap = 1000 + tip; base fee 1005 prices out tip 1.
        let orderer = TransactionOrderer::new(
            vec![
                (Address::repeat_byte(1), vec![lazy(1, 0, 1, 0)]),
                (Address::repeat_byte(2), vec![lazy(2, 0, 10, 1)]),
            ],
            Some(U256::from(1_005)),
        );
        let (head, tip) = orderer.peek().unwrap();
        assert_eq!(head.sender, Address::repeat_byte(2));
        assert_eq!(tip, U256::from(5));
        assert_eq!(orderer.len(), 1);
    }

    #[test]
    fn test_pick_between_queues() {
        let plain = lazy(1, 0, 10, 5);
        let blob = lazy(2, 0, 10, 4);
        let ten = U256::from(10);
        assert_eq!(pick(None, None), None);
        assert_eq!(pick(Some((&plain, ten)), None), Some(QueueKind::Plain));
        assert_eq!(pick(None, Some((&blob, ten))), Some(QueueKind::Blob));
        assert_eq!(pick(Some((&plain, ten)), Some((&blob, ten))), Some(QueueKind::Blob));
        assert_eq!(
            pick(Some((&plain, U256::from(11))), Some((&blob, ten))),
            Some(QueueKind::Plain)
        );
        let same_arrival = lazy(3, 0, 10, 5);
        assert_eq!(
            pick(Some((&plain, ten)), Some((&same_arrival, ten))),
            Some(QueueKind::Plain)
        );
    }

    proptest! {
        #[test]
        fn prop_fairness(tip_a in 0u64..100, tip_b in 0u64..100, a_first in any::<bool>()) {
            let (arr_a, arr_b) = if a_first { (0, 1) } else { (1, 0) };
            let orderer = TransactionOrderer::new(
                vec![
                    (Address::repeat_byte(1), vec![lazy(1, 0, tip_a, arr_a)]),
                    (Address::repeat_byte(2), vec![lazy(2, 0, tip_b, arr_b)]),
                ],
                Some(U256::from(500)),
            );
            let first = orderer.peek().unwrap().0.sender;
            let expected = if tip_a > tip_b || (tip_a == tip_b && a_first) { 1 } else { 2 };
            prop_assert_eq!(first, Address::repeat_byte(expected));
        }

        #[test]
        fn prop_nonces_delivered_in_order(tips in proptest::collection::vec(0u64..50, 1..6)) {
            let txs: Vec<_> = tips
                .iter()
                .enumerate()
                .map(|(i, tip)| lazy(1, i as u64, *tip, i as u64))
                .rev()
                .collect();
            let order = drain(TransactionOrderer::new(vec![(Address::repeat_byte(1), txs)], None));
            let nonces: Vec<u64> = order.iter().map(|(_, n)| *n).collect();
            prop_assert_eq!(nonces, (0..tips.len() as u64).collect::<Vec<_>>());
        }
    }
}
