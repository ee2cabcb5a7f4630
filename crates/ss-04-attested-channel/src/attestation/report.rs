//! Attestation report structures

use serde::{Deserialize, Serialize};
use shared_types::codec::hex_bytes;

use crate::error::AttestationError;

/// Platform TCB level reported alongside the claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TcbStatus {
    #[default]
    UpToDate,
    OutOfDate,
    ConfigurationNeeded,
    Revoked,
}

impl TcbStatus {
    pub fn is_up_to_date(&self) -> bool {
        matches!(self, TcbStatus::UpToDate)
    }
}

/// Claims of a verified enclave report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttestationReport {
    /// Enclave security version
    pub security_version: u16,
    /// Product id, little-endian u16
    #[serde(with = "hex_bytes")]
    pub product_id: Vec<u8>,
    /// Hash of the enclave signing key
    #[serde(with = "hex_bytes")]
    pub signer_id: Vec<u8>,
    /// User data bound into the report
    #[serde(with = "hex_bytes")]
    pub report_data: Vec<u8>,
    /// Enclave runs in debug mode
    #[serde(default)]
    pub debug: bool,
}

impl AttestationReport {
    /// Product id decoded as little-endian u16.
    pub fn product_id_u16(&self) -> Option<u16> {
        match self.product_id.as_slice() {
            [lo, hi, ..] => Some(u16::from_le_bytes([*lo, *hi])),
            _ => None,
        }
    }
}

/// Output of the hardware check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportVerification {
    pub report: AttestationReport,
    pub tcb_status: TcbStatus,
}

/// Verifies the signature chain of a raw report and extracts its claims.
///
/// Policy (which claims are acceptable) is applied separately by
/// [`crate::AttestationPolicy`].
pub trait ReportVerifier: Send + Sync {
    fn verify(&self, raw_report: &[u8]) -> Result<ReportVerification, AttestationError>;
}

/// Produces reports on the executor side.
pub trait ReportIssuer: Send + Sync {
    fn issue(&self, report_data: &[u8]) -> Result<Vec<u8>, AttestationError>;
}

/// Simulated raw report: JSON claims plus the TCB status, no signature.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SimulatedReport {
    #[serde(flatten)]
    claims: AttestationReport,
    #[serde(default)]
    tcb_status: TcbStatus,
}

/// Accepts simulated reports. For development and tests only.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimulatedReportVerifier;

impl ReportVerifier for SimulatedReportVerifier {
    fn verify(&self, raw_report: &[u8]) -> Result<ReportVerification, AttestationError> {
        let simulated: SimulatedReport = serde_json::from_slice(raw_report)
            .map_err(|e| AttestationError::InvalidReport(e.to_string()))?;
        Ok(ReportVerification {
            report: simulated.claims,
            tcb_status: simulated.tcb_status,
        })
    }
}

/// Issues simulated reports with fixed identity claims.
#[derive(Debug, Clone)]
pub struct SimulatedReportIssuer {
    pub security_version: u16,
    pub product_id: u16,
    pub signer_id: Vec<u8>,
    pub debug: bool,
    pub tcb_status: TcbStatus,
}

impl SimulatedReportIssuer {
    pub fn new(signer_id: Vec<u8>) -> Self {
        Self {
            security_version: 2,
            product_id: 1234,
            signer_id,
            debug: false,
            tcb_status: TcbStatus::UpToDate,
        }
    }
}

impl ReportIssuer for SimulatedReportIssuer {
    fn issue(&self, report_data: &[u8]) -> Result<Vec<u8>, AttestationError> {
        let report = SimulatedReport {
            claims: AttestationReport {
                security_version: self.security_version,
                product_id: self.product_id.to_le_bytes().to_vec(),
                signer_id: self.signer_id.clone(),
                report_data: report_data.to_vec(),
                debug: self.debug,
            },
            tcb_status: self.tcb_status,
        };
        serde_json::to_vec(&report).map_err(|e| AttestationError::Issue(e.to_string()))
    }
}
