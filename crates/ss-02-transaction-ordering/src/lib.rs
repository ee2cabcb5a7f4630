//! # ss-02: Transaction Ordering
//!
//! Merges per-sender, nonce-ascending transaction queues into one stream
//! ordered by effective tip.
//!
//! ## Ordering Rules
//!
//! 1. Only the lowest pending nonce of each sender is ever a candidate.
//! 2. Among candidates the strictly higher effective tip wins.
//! 3. Equal tips: the earlier arrival wins; equal arrivals fall back to the
//!    lower sender address so the order is always deterministic.
//!
//! Two orderers run side by side during sealing, one for plain and one for
//! blob-carrying transactions; [`pick`] chooses between their heads.

pub mod domain;

pub use domain::orderer::{pick, QueueKind, TransactionOrderer};
