//! Observability for Praxis: structured logging and dispatch metrics.
//!
//! - **Logging**: `tracing-subscriber` with an `EnvFilter`, JSON or pretty
//! - **Metrics**: Prometheus-format dispatch metrics via the `metrics` crate
//!
//! # Metrics Endpoint
//!
//! ```text
//! # HELP praxis_dispatch_total Total number of dispatched requests
//! # TYPE praxis_dispatch_total counter
//! praxis_dispatch_total{verb="GET",outcome="ok"} 1234
//! praxis_dispatch_total{verb="PATCH",outcome="METHOD_NOT_ALLOWED"} 3
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use praxis_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let config = TelemetryConfig::builder()
//!     .metrics_addr("0.0.0.0:9090")
//!     .log_level("info,praxis_dispatch=debug")
//!     .build();
//!
//! init_telemetry(&config)?;
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;

pub use config::{TelemetryConfig, TelemetryConfigBuilder};
pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig};
pub use metrics::{init_metrics, InFlightGuard, MetricsConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Initializes logging, then metrics.
///
/// # Errors
///
/// Returns `TelemetryError` if either subsystem fails to initialize.
pub fn init_telemetry(config: &TelemetryConfig) -> TelemetryResult<()> {
    init_logging(&config.logging)?;
    init_metrics(&config.metrics)?;
    Ok(())
}
