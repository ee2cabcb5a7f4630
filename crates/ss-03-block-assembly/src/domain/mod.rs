//! Domain layer of the block assembler.

pub mod commit;
pub mod context;
pub mod fees;
pub mod header;
pub mod signal;

pub use commit::{commit_transactions, CommitOutcome, LoopState};
pub use context::{GasPool, SealingContext};
pub use fees::total_fees;
pub use header::{calc_base_fee, calc_blob_fee, calc_excess_blob_gas, calc_gas_limit, fake_exponential};
pub use signal::{CancellationSignal, DeadlineTimer};
