//! # Attestation Policy
//!
//! Claims a remote executor must present before any batch is sent to it.
//!
//! Checks run in a fixed order and the first failure wins:
//!
//! 1. TCB level (an out-of-date platform is tolerated only when configured)
//! 2. report data starts with `sha256(certificate)`
//! 3. security version `>= min_security_version`
//! 4. product id (little-endian u16) equals `product_id`
//! 5. signer id equals `signer_id`
//! 6. debug enclaves rejected unless `allow_debug`

use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use super::report::{AttestationReport, ReportVerifier, TcbStatus};
use crate::error::AttestationError;

/// Default minimum enclave security version.
pub const DEFAULT_MIN_SECURITY_VERSION: u16 = 2;
/// Default expected product id.
pub const DEFAULT_PRODUCT_ID: u16 = 1234;

/// Acceptance rules for executor reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestationPolicy {
    pub min_security_version: u16,
    pub product_id: u16,
    pub signer_id: Vec<u8>,
    pub allow_debug: bool,
    pub allow_out_of_date_tcb: bool,
}

impl AttestationPolicy {
    pub fn new(signer_id: Vec<u8>) -> Self {
        Self {
            min_security_version: DEFAULT_MIN_SECURITY_VERSION,
            product_id: DEFAULT_PRODUCT_ID,
            signer_id,
            allow_debug: false,
            allow_out_of_date_tcb: false,
        }
    }

    /// Verify `raw_report` and check it is bound to `certificate`.
    pub fn verify(
        &self,
        verifier: &dyn ReportVerifier,
        raw_report: &[u8],
        certificate: &[u8],
    ) -> Result<AttestationReport, AttestationError> {
        let verification = verifier.verify(raw_report)?;
        self.check_tcb(verification.tcb_status)?;
        self.check_claims(&verification.report, certificate)?;
        debug!(
            security_version = verification.report.security_version,
            "Executor report accepted"
        );
        Ok(verification.report)
    }

    fn check_tcb(&self, status: TcbStatus) -> Result<(), AttestationError> {
        match status {
            TcbStatus::UpToDate => Ok(()),
            TcbStatus::OutOfDate if self.allow_out_of_date_tcb => {
                warn!(status = ?status, "Executor TCB level is out of date, continuing");
                Ok(())
            }
            other => Err(AttestationError::TcbLevelInvalid(other)),
        }
    }

    /// Claim checks on an already verified report.
    pub fn check_claims(
        &self,
        report: &AttestationReport,
        certificate: &[u8],
    ) -> Result<(), AttestationError> {
        let cert_hash = Sha256::digest(certificate);
        if !report.report_data.starts_with(cert_hash.as_slice()) {
            return Err(AttestationError::ReportDataMismatch);
        }
        if report.security_version < self.min_security_version {
            return Err(AttestationError::SecurityVersionTooLow {
                minimum: self.min_security_version,
                actual: report.security_version,
            });
        }
        let product = report.product_id_u16();
        if product != Some(self.product_id) {
            return Err(AttestationError::ProductMismatch {
                expected: self.product_id,
                actual: product,
            });
        }
        if report.signer_id != self.signer_id {
            return Err(AttestationError::SignerMismatch);
        }
        if report.debug && !self.allow_debug {
            return Err(AttestationError::DebugEnclave);
        }
        Ok(())
    }
}
