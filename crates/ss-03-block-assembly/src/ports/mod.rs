//! Hexagonal ports of the assembler.

pub mod outbound;

pub use outbound::*;
