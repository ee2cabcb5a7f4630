//! In-process implementations of the outbound ports.

pub mod chain;
pub mod finalizer;
pub mod pool;
pub mod transfer;

pub use chain::InMemoryChain;
pub use finalizer::BasicFinalizer;
pub use pool::InMemoryTxPool;
pub use transfer::{contract_address, TransferEngine};
