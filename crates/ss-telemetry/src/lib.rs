//! # Split-Sealer Telemetry
//!
//! Structured logging and traffic metrics.
//!
//! ## Components
//!
//! - [`init_tracing`]: `tracing-subscriber` registry with an `EnvFilter` and
//!   either a pretty or a JSON fmt layer.
//! - [`TrafficCollector`]: ingress/egress byte counters around the attested
//!   round trip. Injected rather than global so tests can swap in
//!   [`RecordingTrafficCollector`] or [`NoopTrafficCollector`].
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SS_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `SS_JSON_LOGS` | `false` | JSON formatted logs |
//! | `SS_CONSOLE_OUTPUT` | `true` | Emit logs to stdout |
//! | `SS_SERVICE_NAME` | `split-sealer` | Service name in log lines |

mod config;
mod tracing_setup;
mod traffic;

pub use config::TelemetryConfig;
pub use tracing_setup::init_tracing;
pub use traffic::{
    NoopTrafficCollector, PrometheusTrafficCollector, RecordingTrafficCollector, TrafficCollector,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracerInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Failed to encode metrics: {0}")]
    Encode(String),
}
