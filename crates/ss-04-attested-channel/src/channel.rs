//! # Attested Channel
//!
//! Client side of one attested round trip. Every byte moved through the
//! transport is reported to the injected [`TrafficCollector`].

use std::sync::Arc;
use std::time::Duration;

use ss_telemetry::TrafficCollector;
use tracing::{debug, info, warn};

use crate::attestation::{AttestationPolicy, ReportVerifier};
use crate::error::ChannelError;
use crate::transport::ChannelTransport;
use crate::wire::{self, BatchRequest, BatchResponse};

pub struct AttestedChannel {
    transport: Arc<dyn ChannelTransport>,
    verifier: Arc<dyn ReportVerifier>,
    policy: AttestationPolicy,
    collector: Arc<dyn TrafficCollector>,
    timeout: Duration,
}

impl std::fmt::Debug for AttestedChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttestedChannel")
            .field("policy", &self.policy)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl AttestedChannel {
    pub fn new(
        transport: Arc<dyn ChannelTransport>,
        verifier: Arc<dyn ReportVerifier>,
        policy: AttestationPolicy,
        collector: Arc<dyn TrafficCollector>,
        timeout: Duration,
    ) -> Self {
        Self {
            transport,
            verifier,
            policy,
            collector,
            timeout,
        }
    }

    pub fn policy(&self) -> &AttestationPolicy {
        &self.policy
    }

    /// Attest the executor, send `request`, return its response.
    ///
    /// Nothing is sent unless the report passes the policy. The whole
    /// exchange is bounded by the configured timeout.
    pub async fn round_trip(&self, request: &BatchRequest) -> Result<BatchResponse, ChannelError> {
        match tokio::time::timeout(self.timeout, self.exchange(request)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(timeout = ?self.timeout, "Attested round trip timed out");
                Err(ChannelError::Timeout(self.timeout))
            }
        }
    }

    async fn exchange(&self, request: &BatchRequest) -> Result<BatchResponse, ChannelError> {
        let certificate = self.transport.fetch_certificate().await?;
        self.collector.mark_ingress(certificate.len() as u64);

        let report = self.transport.fetch_report().await?;
        self.collector.mark_ingress(report.len() as u64);

        if let Err(e) = self
            .policy
            .verify(self.verifier.as_ref(), &report, &certificate)
        {
            warn!(error = %e, "Executor attestation rejected, batch not sent");
            return Err(e.into());
        }

        let body = wire::encode_request(request)?;
        self.collector.mark_egress(body.len() as u64);
        debug!(
            txs = request.transactions.len(),
            bytes = body.len(),
            "Submitting batch to attested executor"
        );

        let reply = self.transport.submit(&certificate, body).await?;
        self.collector.mark_ingress(reply.len() as u64);

        let response = wire::decode_response(&reply)?;
        info!(
            submitted = request.transactions.len(),
            results = response.results.len(),
            "Attested round trip complete"
        );
        Ok(response)
    }
}
