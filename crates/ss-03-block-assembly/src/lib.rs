//! # ss-03: Block Assembly
//!
//! Builds blocks from the pending pool, executing transactions either
//! locally or in one attested round trip to a remote executor.
//!
//! ## Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │  Worker / Executor Service (Outer)                  │
//! │  - Sealer: prepare → fill → finalize                │
//! │  - ExecutorService: batch in, traces out            │
//! └─────────────────────────────────────────────────────┘
//!                         │
//! ┌─────────────────────────────────────────────────────┐
//! │  Backends                                           │
//! │  - LocalBackend: apply now (optionally traced)      │
//! │  - RemoteBackend: stage, round trip, merge          │
//! └─────────────────────────────────────────────────────┘
//!                         │
//! ┌─────────────────────────────────────────────────────┐
//! │  Domain (Inner - Pure Logic)                        │
//! │  - Commit loop over two orderers                    │
//! │  - SealingContext, GasPool, CancellationSignal      │
//! │  - Header calculus, fee totals                      │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## Critical Invariants
//!
//! 1. **Gas Limit**: header gas used never exceeds the gas limit, remote
//!    results included (unless the `unchecked` policy is configured)
//! 2. **Blob Capacity**: at most six blobs per block
//! 3. **Nonce Ordering**: a sender's transactions are committed in nonce order
//! 4. **Attestation First**: no transaction leaves the sealer before the
//!    executor's report is verified
//! 5. **Cancellation**: an interrupted attempt still seals what it committed

pub mod adapters;
pub mod backend;
pub mod config;
pub mod domain;
pub mod error;
pub mod executor_service;
pub mod metrics;
pub mod ports;
pub mod worker;

pub use backend::{ApplyOutcome, BatchSummary, ExecutionBackend, LocalBackend, RemoteBackend};
pub use config::{ExecutionMode, GasLimitPolicy, RemoteExecutorConfig, SealerConfig};
pub use domain::{
    commit_transactions, CancellationSignal, CommitOutcome, DeadlineTimer, GasPool, LoopState,
    SealingContext,
};
pub use error::{ExecutionError, FailureKind, InterruptReason, Result, SealingError};
pub use executor_service::ExecutorService;
pub use metrics::SealerMetrics;
pub use worker::{connect_executor, GenerateParams, PayloadResult, Sealer};
