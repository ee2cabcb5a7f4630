//! Error types for the attested channel

use std::time::Duration;

use thiserror::Error;

use crate::attestation::TcbStatus;

/// Reasons a report fails verification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttestationError {
    /// Report could not be parsed or its signature did not verify
    #[error("invalid report: {0}")]
    InvalidReport(String),

    /// Platform TCB level is not acceptable
    #[error("TCB level invalid: {0:?}")]
    TcbLevelInvalid(TcbStatus),

    /// Report is not bound to the presented certificate
    #[error("report data does not match the certificate's hash")]
    ReportDataMismatch,

    /// Security version below the configured minimum
    #[error("invalid security version: {actual} < {minimum}")]
    SecurityVersionTooLow {
        /// Required minimum
        minimum: u16,
        /// Reported version
        actual: u16,
    },

    /// Product id is not the expected one
    #[error("invalid product: expected {expected}, got {actual:?}")]
    ProductMismatch {
        /// Expected product id
        expected: u16,
        /// Reported product id (None if malformed)
        actual: Option<u16>,
    },

    /// Enclave was signed by someone else
    #[error("invalid signer")]
    SignerMismatch,

    /// Debug enclaves are not trusted
    #[error("debug enclave not allowed")]
    DebugEnclave,

    /// Report issuance failed (executor side)
    #[error("report issuance failed: {0}")]
    Issue(String),
}

/// Failures of one attested round trip. All of them abort the attempt.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("attestation rejected: {0}")]
    Attestation(#[from] AttestationError),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("executor answered {status}: {body}")]
    Status { status: u16, body: String },

    #[error("round trip exceeded {0:?}")]
    Timeout(Duration),

    #[error("invalid certificate: {0}")]
    InvalidCertificate(String),

    #[error("failed to encode request: {0}")]
    Encode(String),

    #[error("malformed response: {0}")]
    Decode(String),
}

/// Failures reported by a [`crate::BatchExecutor`].
#[derive(Debug, Clone, Error)]
pub enum ExecutorError {
    #[error("invalid batch: {0}")]
    InvalidBatch(String),

    #[error("execution failed: {0}")]
    Execution(String),
}
