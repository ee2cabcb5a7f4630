//! # ss-01-account-state
//!
//! Account state for split sealing.
//!
//! ## Role in System
//!
//! - **AccountState Store**: [`StateDb`], a journaled overlay over a durable
//!   ledger ([`AccountBackend`]) with snapshot/revert and sparse diff patches.
//! - **State Reconciler**: [`reconciler::diff`] turns pre/post account
//!   snapshots into [`AccountDiff`]s, [`reconciler::apply`] writes them into a
//!   store.
//!
//! ```text
//!   pre snapshot ──┐
//!                  ├─→ reconciler::diff ─→ AccountDiff ─→ reconciler::apply ─→ StateDb
//!   post snapshot ─┘                                                         (overlay)
//!                                                                               │
//!                                                                  AccountBackend (ledger)
//! ```
//!
//! ## Invariants
//!
//! - A nonce never decreases through diff application.
//! - Applying the same diff twice leaves the same state as applying it once.
//! - Balances are unsigned; debits below zero fail with
//!   [`StateError::BalanceUnderflow`].

pub mod adapters;
pub mod domain;
pub mod ports;

pub use adapters::*;
pub use domain::*;
pub use ports::*;
