//! Ingress/egress byte counters for the attested round trip.
//!
//! Metric names follow `ss_<component>_<metric>_<unit>`.

use std::sync::atomic::{AtomicU64, Ordering};

use prometheus::{Encoder, IntCounter, Registry, TextEncoder};

use crate::TelemetryError;

/// Sink for bytes sent to and received from the remote executor.
pub trait TrafficCollector: Send + Sync {
    fn mark_ingress(&self, bytes: u64);
    fn mark_egress(&self, bytes: u64);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTrafficCollector;

impl TrafficCollector for NoopTrafficCollector {
    fn mark_ingress(&self, _bytes: u64) {}
    fn mark_egress(&self, _bytes: u64) {}
}

/// Keeps running totals in memory.
#[derive(Debug, Default)]
pub struct RecordingTrafficCollector {
    ingress: AtomicU64,
    egress: AtomicU64,
}

impl RecordingTrafficCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ingress(&self) -> u64 {
        self.ingress.load(Ordering::Relaxed)
    }

    pub fn egress(&self) -> u64 {
        self.egress.load(Ordering::Relaxed)
    }
}

impl TrafficCollector for RecordingTrafficCollector {
    fn mark_ingress(&self, bytes: u64) {
        self.ingress.fetch_add(bytes, Ordering::Relaxed);
    }

    fn mark_egress(&self, bytes: u64) {
        self.egress.fetch_add(bytes, Ordering::Relaxed);
    }
}

/// Prometheus counters registered in their own [`Registry`].
#[derive(Clone)]
pub struct PrometheusTrafficCollector {
    registry: Registry,
    ingress: IntCounter,
    egress: IntCounter,
}

impl PrometheusTrafficCollector {
    pub fn new() -> Result<Self, TelemetryError> {
        let registry = Registry::new();
        let ingress = IntCounter::new(
            "ss_sealer_ingress_bytes_total",
            "Bytes received from the remote executor",
        )
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
        let egress = IntCounter::new(
            "ss_sealer_egress_bytes_total",
            "Bytes sent to the remote executor",
        )
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

        registry
            .register(Box::new(ingress.clone()))
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
        registry
            .register(Box::new(egress.clone()))
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

        Ok(Self {
            registry,
            ingress,
            egress,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Prometheus text exposition of the counters.
    pub fn render(&self) -> Result<String, TelemetryError> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(|e| TelemetryError::Encode(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| TelemetryError::Encode(e.to_string()))
    }
}

impl TrafficCollector for PrometheusTrafficCollector {
    fn mark_ingress(&self, bytes: u64) {
        self.ingress.inc_by(bytes);
    }

    fn mark_egress(&self, bytes: u64) {
        self.egress.inc_by(bytes);
    }
}
