//! # ss-04: Attested Channel
//!
//! One request/response exchange between the sealer and a remote executor
//! running inside an isolated, attested environment.
//!
//! ## Protocol
//!
//! ```text
//!  sealer                                        executor
//!    │ ── GET /cert ───────────────────────────────→ │
//!    │ ←─────────────────────── DER certificate ──── │
//!    │ ── GET /report ─────────────────────────────→ │
//!    │ ←──────── report (data = sha256(cert)) ────── │
//!    │   verify report against AttestationPolicy     │
//!    │   (abort here on any mismatch)                │
//!    │ ── POST / (BatchRequest, cert pinned) ──────→ │
//!    │ ←──────────────────────────── BatchResponse ─ │
//! ```
//!
//! No transaction data leaves the sealer before the report is verified.
//!
//! ## Modules
//!
//! - [`wire`]: request/response format
//! - [`attestation`]: report claims, verifier port, policy
//! - [`transport`]: HTTP(S) transport port and its reqwest implementation
//! - [`channel`]: the attested client round trip
//! - [`server`]: axum router for the executor side

pub mod attestation;
pub mod channel;
pub mod error;
pub mod server;
pub mod transport;
pub mod wire;

pub use attestation::{
    AttestationPolicy, AttestationReport, ReportIssuer, ReportVerification, ReportVerifier,
    SimulatedReportIssuer, SimulatedReportVerifier, TcbStatus,
};
pub use channel::AttestedChannel;
pub use error::{AttestationError, ChannelError, ExecutorError};
pub use server::{executor_router, BatchExecutor, ExecutorState};
pub use transport::{ChannelTransport, HttpsTransport};
pub use wire::{BatchRequest, BatchResponse, ExecutorHeaderView, HeaderContext, StateModification};
