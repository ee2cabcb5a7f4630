//! Remote attestation: report claims, the verification port and the policy
//! applied to verified claims.

pub mod policy;
pub mod report;

pub use policy::AttestationPolicy;
pub use report::{
    AttestationReport, ReportIssuer, ReportVerification, ReportVerifier, SimulatedReportIssuer,
    SimulatedReportVerifier, TcbStatus,
};
