//! # Split-Sealer Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs       # Keys, funded genesis, in-process executors
//! └── integration/      # Cross-crate flows
//!     ├── remote_sealing.rs   # Sealer ⇄ attested executor over HTTP
//!     └── sealing_flow.rs     # Local sealing on an in-memory chain
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p ss-tests
//! cargo test -p ss-tests integration::remote_sealing
//!
//! # Benchmarks
//! cargo bench -p ss-tests
//! ```

pub mod fixtures;
pub mod integration;
