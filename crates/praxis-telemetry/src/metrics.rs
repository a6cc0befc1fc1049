//! Prometheus metrics for Praxis.
//!
//! # Dispatch Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `praxis_dispatch_total` | Counter | `verb`, `outcome` | Dispatched requests |
//! | `praxis_dispatch_duration_seconds` | Histogram | `outcome` | Dispatch latency |
//! | `praxis_dispatch_in_flight` | Gauge | - | Requests being dispatched |
//! | `praxis_registry_operations` | Gauge | - | Registered operations |
//! | `praxis_registry_rejections_total` | Counter | `category` | Declarations left out of the registry |
//!
//! `outcome` is `ok` or the error code (`NOT_FOUND`, `INVOCATION_FAILURE`, ...).
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use praxis_core::ErrorCategory;
//! use praxis_telemetry::metrics::{outcome_label, record_dispatch};
//!
//! // Without an installed recorder these are no-ops.
//! record_dispatch("GET", outcome_label(None), Duration::from_millis(3));
//! record_dispatch("POST", outcome_label(Some(ErrorCategory::NotFound)), Duration::from_millis(1));
//! ```

use crate::error::TelemetryError;
use crate::TelemetryResult;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use praxis_core::ErrorCategory;
use std::net::SocketAddr;
use std::sync::OnceLock;
use std::time::Duration;

/// Global metrics handle for rendering.
static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Name of the dispatch duration histogram.
const DISPATCH_DURATION: &str = "praxis_dispatch_duration_seconds";

/// Metrics configuration.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Whether metrics are enabled.
    pub enabled: bool,

    /// Address of the scrape listener (e.g., "0.0.0.0:9090"). Without one the
    /// recorder is installed and rendered through [`render_metrics`].
    pub addr: Option<String>,

    /// Histogram buckets for dispatch duration, in seconds.
    pub duration_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            addr: Some("0.0.0.0:9090".to_string()),
            // 1ms .. 10s
            duration_buckets: vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ],
        }
    }
}

/// Initializes the metrics subsystem.
///
/// With an address, installs the recorder and a scrape listener (on the
/// current Tokio runtime, or a background thread when there is none).
///
/// # Errors
///
/// Returns `TelemetryError::InvalidAddress` for an unparsable address and
/// `TelemetryError::MetricsInit` if a recorder is already installed.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let mut builder = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(DISPATCH_DURATION.to_string()),
            &config.duration_buckets,
        )
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    match &config.addr {
        Some(addr) => {
            let addr: SocketAddr = addr
                .parse()
                .map_err(|e| TelemetryError::InvalidAddress(format!("{addr}: {e}")))?;
            builder = builder.with_http_listener(addr);
            builder
                .install()
                .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
        }
        None => {
            let handle = builder
                .install_recorder()
                .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
            let _ = METRICS_HANDLE.set(handle);
        }
    }

    describe_metrics();
    Ok(())
}

/// Renders metrics in Prometheus format.
///
/// Returns `None` unless metrics were initialized without a listener.
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

fn describe_metrics() {
    describe_counter!("praxis_dispatch_total", "Total number of dispatched requests");
    describe_histogram!(DISPATCH_DURATION, "Dispatch duration in seconds");
    describe_gauge!(
        "praxis_dispatch_in_flight",
        "Number of requests currently being dispatched"
    );
    describe_gauge!(
        "praxis_registry_operations",
        "Number of operations in the action registry"
    );
    describe_counter!(
        "praxis_registry_rejections_total",
        "Action declarations left out of the registry"
    );
}

/// Returns the `outcome` label for a dispatch result.
#[must_use]
pub fn outcome_label(error: Option<ErrorCategory>) -> &'static str {
    error.map_or("ok", |category| category.code())
}

/// Records a completed dispatch.
pub fn record_dispatch(verb: &str, outcome: &'static str, duration: Duration) {
    counter!(
        "praxis_dispatch_total",
        "verb" => verb.to_string(),
        "outcome" => outcome
    )
    .increment(1);

    histogram!(DISPATCH_DURATION, "outcome" => outcome).record(duration.as_secs_f64());
}

/// Records the registry size after a population pass or router change.
#[allow(clippy::cast_precision_loss)]
pub fn record_registry_size(operations: usize) {
    gauge!("praxis_registry_operations").set(operations as f64);
}

/// Records declarations rejected during registration.
pub fn record_registry_rejections(category: ErrorCategory, count: usize) {
    counter!("praxis_registry_rejections_total", "category" => category.code())
        .increment(count as u64);
}

/// Tracks one in-flight dispatch; decrements the gauge on drop.
#[derive(Debug)]
pub struct InFlightGuard {
    _private: (),
}

impl InFlightGuard {
    /// Creates a new guard and increments the in-flight gauge.
    #[must_use]
    pub fn new() -> Self {
        gauge!("praxis_dispatch_in_flight").increment(1.0);
        Self { _private: () }
    }
}

impl Default for InFlightGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        gauge!("praxis_dispatch_in_flight").decrement(1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MetricsConfig::default();
        assert!(config.enabled);
        assert_eq!(config.addr.as_deref(), Some("0.0.0.0:9090"));
        assert!(!config.duration_buckets.is_empty());
    }

    #[test]
    fn test_outcome_label() {
        assert_eq!(outcome_label(None), "ok");
        assert_eq!(outcome_label(Some(ErrorCategory::NotFound)), "NOT_FOUND");
        assert_eq!(
            outcome_label(Some(ErrorCategory::InvocationFailure)),
            "INVOCATION_FAILURE"
        );
    }

    #[test]
    fn test_record_functions_dont_panic() {
        // No recorder installed: the metrics facade drops everything.
        record_dispatch("GET", "ok", Duration::from_millis(10));
        record_registry_size(12);
        record_registry_rejections(ErrorCategory::DuplicateKey, 1);
        let guard = InFlightGuard::new();
        drop(guard);
    }

    #[test]
    fn test_invalid_address() {
        let config = MetricsConfig {
            addr: Some("not an address".to_string()),
            ..MetricsConfig::default()
        };
        assert!(matches!(
            init_metrics(&config),
            Err(TelemetryError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_disabled_metrics() {
        let config = MetricsConfig {
            enabled: false,
            ..MetricsConfig::default()
        };
        assert!(init_metrics(&config).is_ok());
        assert!(render_metrics().is_none());
    }
}
