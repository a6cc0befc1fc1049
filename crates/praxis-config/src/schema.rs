//! Configuration schema types.
//!
//! This module defines the structure of all configuration sections.

use serde::{Deserialize, Serialize};

/// When the action registry is populated.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum InitializationMode {
    /// Populate on the first dispatch.
    #[default]
    Lazy,
    /// Populate while the service is being built.
    Eager,
}

/// What the startup self-check does with capability slots nobody can supply.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CapabilityCheck {
    /// Skip the check.
    Off,
    /// Log each unresolved capability and continue.
    #[default]
    Warn,
    /// Refuse to build the service.
    Deny,
}

/// Action registry configuration.
///
/// # Example
///
/// ```
/// use praxis_config::{CapabilityCheck, InitializationMode, RegistryConfig};
///
/// let config = RegistryConfig {
///     initialization: InitializationMode::Eager,
///     capability_check: CapabilityCheck::Deny,
/// };
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct RegistryConfig {
    /// Lazy (first dispatch) or eager (service build) population.
    #[serde(default)]
    pub initialization: InitializationMode,

    /// Startup self-check for unsatisfiable capability slots.
    #[serde(default)]
    pub capability_check: CapabilityCheck,
}

/// Verb tunneling configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TunnelConfig {
    /// The transport's fixed verb vocabulary. Every other verb is tunneled.
    #[serde(default = "default_standard_verbs")]
    pub standard_verbs: Vec<String>,

    /// Header carrying the true verb on POST requests. `None` disables it.
    #[serde(default = "default_override_header")]
    pub override_header: Option<String>,
}

impl Default for TunnelConfig {
    fn default() -> Self {
        Self {
            standard_verbs: default_standard_verbs(),
            override_header: default_override_header(),
        }
    }
}

fn default_standard_verbs() -> Vec<String> {
    [
        "GET", "POST", "PUT", "DELETE", "PATCH", "HEAD", "OPTIONS", "TRACE", "CONNECT",
    ]
    .iter()
    .map(ToString::to_string)
    .collect()
}

#[allow(clippy::unnecessary_wraps)]
fn default_override_header() -> Option<String> {
    Some("x-http-method-override".to_string())
}

/// Pagination defaults for collection actions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PaginationConfig {
    /// Page size when the request names none.
    #[serde(default = "default_per_page")]
    pub default_per_page: u32,

    /// Largest page size a request may ask for.
    #[serde(default = "default_max_per_page")]
    pub max_per_page: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_per_page: default_per_page(),
            max_per_page: default_max_per_page(),
        }
    }
}

fn default_per_page() -> u32 {
    20
}

fn default_max_per_page() -> u32 {
    100
}

/// Log format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON formatted logs (production).
    #[default]
    Json,
    /// Human-readable pretty format (development).
    Pretty,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directive (e.g., "info", "praxis_dispatch=debug").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include source file and line in logs.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            include_location: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    /// Enable metrics collection and export.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Prometheus scrape listener address. `None` keeps metrics in-process.
    #[serde(default = "default_metrics_addr")]
    pub addr: Option<String>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            addr: default_metrics_addr(),
        }
    }
}

#[allow(clippy::unnecessary_wraps)]
fn default_metrics_addr() -> Option<String> {
    Some("0.0.0.0:9090".to_string())
}

fn default_true() -> bool {
    true
}
