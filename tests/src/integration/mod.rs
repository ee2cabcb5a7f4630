//! Cross-crate flows.

pub mod remote_sealing;
pub mod sealing_flow;
