//! # Channel Transport
//!
//! Port for the three HTTP exchanges of an attested round trip, and the
//! reqwest implementation used against real executors.
//!
//! The certificate and the report are fetched without TLS verification: the
//! report itself is what authenticates the executor. The batch is then
//! posted on a connection that trusts only the fetched certificate.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Certificate, Client, StatusCode};
use tracing::{debug, warn};

use crate::error::ChannelError;

/// Raw byte exchanges with one executor.
#[async_trait]
pub trait ChannelTransport: Send + Sync {
    /// Executor certificate (DER).
    async fn fetch_certificate(&self) -> Result<Vec<u8>, ChannelError>;

    /// Raw attestation report.
    async fn fetch_report(&self) -> Result<Vec<u8>, ChannelError>;

    /// Post `body`, trusting only `certificate`.
    async fn submit(&self, certificate: &[u8], body: Vec<u8>) -> Result<Vec<u8>, ChannelError>;
}

/// reqwest transport against `https://host:port` (or `http://` in tests).
#[derive(Debug, Clone)]
pub struct HttpsTransport {
    endpoint: String,
    timeout: Duration,
    unpinned: Client,
}

impl HttpsTransport {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ChannelError> {
        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        let unpinned = Client::builder()
            .danger_accept_invalid_certs(true)
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| ChannelError::Connection(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            endpoint,
            timeout,
            unpinned,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn is_tls(&self) -> bool {
        self.endpoint.starts_with("https://")
    }

    /// Client that trusts `certificate` and nothing else.
    fn pinned_client(&self, certificate: &[u8]) -> Result<Client, ChannelError> {
        let builder = Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.timeout);
        let builder = if self.is_tls() {
            let pinned = Certificate::from_der(certificate)
                .map_err(|e| ChannelError::InvalidCertificate(e.to_string()))?;
            builder
                .tls_built_in_root_certs(false)
                .add_root_certificate(pinned)
        } else {
            warn!(endpoint = %self.endpoint, "Executor endpoint is not TLS, certificate not pinned");
            builder
        };
        builder
            .build()
            .map_err(|e| ChannelError::Connection(format!("failed to build HTTP client: {e}")))
    }

    async fn get(&self, path: &str) -> Result<Vec<u8>, ChannelError> {
        let url = format!("{}{}", self.endpoint, path);
        debug!(url = %url, "Fetching from executor");
        let response = self.unpinned.get(&url).send().await?;
        read_body(response).await
    }
}

async fn read_body(response: reqwest::Response) -> Result<Vec<u8>, ChannelError> {
    let status = response.status();
    let body = response.bytes().await?;
    if status != StatusCode::OK {
        return Err(ChannelError::Status {
            status: status.as_u16(),
            body: String::from_utf8_lossy(&body).into_owned(),
        });
    }
    Ok(body.to_vec())
}

#[async_trait]
impl ChannelTransport for HttpsTransport {
    async fn fetch_certificate(&self) -> Result<Vec<u8>, ChannelError> {
        self.get("/cert").await
    }

    async fn fetch_report(&self) -> Result<Vec<u8>, ChannelError> {
        self.get("/report").await
    }

    async fn submit(&self, certificate: &[u8], body: Vec<u8>) -> Result<Vec<u8>, ChannelError> {
        let client = self.pinned_client(certificate)?;
        let url = format!("{}/", self.endpoint);
        let response = client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;
        read_body(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_trailing_slash_trimmed() {
        let transport = HttpsTransport::new("https://executor:8443/", Duration::from_secs(1)).unwrap();
        assert_eq!(transport.endpoint(), "https://executor:8443");
        assert!(transport.is_tls());
    }

    #[test]
    fn test_garbage_certificate_cannot_be_pinned() {
        let transport = HttpsTransport::new("https://executor:8443", Duration::from_secs(1)).unwrap();
        assert!(transport.pinned_client(b"not a certificate").is_err());
    }
}
