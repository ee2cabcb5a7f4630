//! # Executor Server
//!
//! axum router exposing an executor over the attested protocol:
//!
//! | Route | Response |
//! |-------|----------|
//! | `GET /cert` | executor certificate (DER) |
//! | `GET /report` | report whose data is `sha256(cert)` |
//! | `POST /` | [`BatchResponse`] for a JSON [`BatchRequest`] |
//!
//! TLS termination is left to the deployment.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use sha2::{Digest, Sha256};
use ss_telemetry::TrafficCollector;
use tracing::{info, warn};

use crate::attestation::ReportIssuer;
use crate::error::{AttestationError, ExecutorError};
use crate::wire::{self, BatchRequest, BatchResponse};

/// Executes one batch on the executor side.
#[async_trait]
pub trait BatchExecutor: Send + Sync {
    async fn execute(&self, request: BatchRequest) -> Result<BatchResponse, ExecutorError>;
}

/// Shared handler state.
#[derive(Clone)]
pub struct ExecutorState {
    executor: Arc<dyn BatchExecutor>,
    certificate: Arc<Vec<u8>>,
    report: Arc<Vec<u8>>,
    collector: Arc<dyn TrafficCollector>,
}

impl ExecutorState {
    /// Issue the report binding `certificate` once, up front.
    pub fn new(
        executor: Arc<dyn BatchExecutor>,
        certificate: Vec<u8>,
        issuer: &dyn ReportIssuer,
        collector: Arc<dyn TrafficCollector>,
    ) -> Result<Self, AttestationError> {
        let report = issuer.issue(&Sha256::digest(&certificate))?;
        Ok(Self {
            executor,
            certificate: Arc::new(certificate),
            report: Arc::new(report),
            collector,
        })
    }
}

pub fn executor_router(state: ExecutorState) -> Router {
    Router::new()
        .route("/cert", get(handle_cert))
        .route("/report", get(handle_report))
        .route("/", post(handle_batch))
        .with_state(state)
}

fn octets(state: &ExecutorState, bytes: &[u8]) -> Response {
    state.collector.mark_egress(bytes.len() as u64);
    (
        [(header::CONTENT_TYPE, "application/octet-stream")],
        bytes.to_vec(),
    )
        .into_response()
}

async fn handle_cert(State(state): State<ExecutorState>) -> Response {
    octets(&state, &state.certificate)
}

async fn handle_report(State(state): State<ExecutorState>) -> Response {
    octets(&state, &state.report)
}

async fn handle_batch(State(state): State<ExecutorState>, body: Bytes) -> Response {
    state.collector.mark_ingress(body.len() as u64);

    let request = match wire::decode_request(&body) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "Rejecting undecodable batch");
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
    };
    let submitted = request.transactions.len();

    let response = match state.executor.execute(request).await {
        Ok(response) => response,
        Err(e @ ExecutorError::InvalidBatch(_)) => {
            warn!(error = %e, "Rejecting batch");
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
        Err(e @ ExecutorError::Execution(_)) => {
            warn!(error = %e, "Batch execution failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
        }
    };

    match wire::encode_response(&response) {
        Ok(bytes) => {
            info!(
                submitted,
                executed = response.results.len(),
                gas_used = response.header.gas_used,
                "Batch executed"
            );
            state.collector.mark_egress(bytes.len() as u64);
            ([(header::CONTENT_TYPE, "application/json")], bytes).into_response()
        }
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attestation::{AttestationPolicy, SimulatedReportIssuer, SimulatedReportVerifier};
    use crate::channel::AttestedChannel;
    use crate::error::ChannelError;
    use crate::transport::{ChannelTransport, HttpsTransport};
    use crate::wire::{ExecutorHeaderView, HeaderContext};
    use ss_telemetry::RecordingTrafficCollector;
    use std::time::Duration;

    /// Reports the gas limit of the request back as gas used.
    struct EchoExecutor;

    #[async_trait]
    impl BatchExecutor for EchoExecutor {
        async fn execute(&self, request: BatchRequest) -> Result<BatchResponse, ExecutorError> {
            if request.env.number == 0 {
                return Err(ExecutorError::InvalidBatch("genesis".into()));
            }
            Ok(BatchResponse {
                results: vec![],
                header: ExecutorHeaderView {
                    gas_used: request.env.gas_limit,
                    blob_gas_used: 0,
                },
            })
        }
    }

    async fn spawn_executor(
        collector: Arc<RecordingTrafficCollector>,
    ) -> (String, Vec<u8>) {
        let signer = vec![0x42; 32];
        let state = ExecutorState::new(
            Arc::new(EchoExecutor),
            b"executor-cert".to_vec(),
            &SimulatedReportIssuer::new(signer.clone()),
            collector,
        )
        .unwrap();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, executor_router(state)).await.unwrap();
        });
        (format!("http://{addr}"), signer)
    }

    #[tokio::test]
    async fn test_round_trip_over_http() {
        let server_traffic = Arc::new(RecordingTrafficCollector::new());
        let (endpoint, signer) = spawn_executor(server_traffic.clone()).await;
        let client_traffic = Arc::new(RecordingTrafficCollector::new());
        let channel = AttestedChannel::new(
            Arc::new(HttpsTransport::new(endpoint, Duration::from_secs(5)).unwrap()),
            Arc::new(SimulatedReportVerifier),
            AttestationPolicy::new(signer),
            client_traffic.clone(),
            Duration::from_secs(5),
        );
        let request = BatchRequest {
            transactions: vec![],
            env: HeaderContext {
                number: 1,
                gas_limit: 30_000_000,
                ..Default::default()
            },
        };

        let response = channel.round_trip(&request).await.unwrap();
        assert_eq!(response.header.gas_used, 30_000_000);
        assert_eq!(client_traffic.egress(), server_traffic.ingress());
        assert_eq!(client_traffic.ingress(), server_traffic.egress());
    }

    #[tokio::test]
    async fn test_invalid_batch_is_bad_request() {
        let (endpoint, _) = spawn_executor(Arc::new(RecordingTrafficCollector::new())).await;
        let transport = HttpsTransport::new(endpoint, Duration::from_secs(5)).unwrap();

        let err = transport.submit(b"", b"[1,2".to_vec()).await.unwrap_err();
        assert!(matches!(err, ChannelError::Status { status: 400, .. }));

        let genesis = wire::encode_request(&BatchRequest {
            transactions: vec![],
            env: HeaderContext::default(),
        })
        .unwrap();
        let err = transport.submit(b"", genesis).await.unwrap_err();
        assert!(matches!(err, ChannelError::Status { status: 400, .. }));
    }

    #[tokio::test]
    async fn test_report_binds_certificate() {
        let (endpoint, _) = spawn_executor(Arc::new(RecordingTrafficCollector::new())).await;
        let transport = HttpsTransport::new(endpoint, Duration::from_secs(5)).unwrap();
        let cert = transport.fetch_certificate().await.unwrap();
        let report = transport.fetch_report().await.unwrap();
        let verified = AttestationPolicy::new(vec![0x42; 32])
            .verify(&SimulatedReportVerifier, &report, &cert)
            .unwrap();
        assert_eq!(verified.report_data, Sha256::digest(&cert).to_vec());
    }
}
