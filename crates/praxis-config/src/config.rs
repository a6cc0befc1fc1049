//! Main configuration types.
//!
//! This module provides the top-level [`PraxisConfig`] struct and its builder.

use http::HeaderName;
use praxis_router::VerbNormalizer;
use serde::{Deserialize, Serialize};

use crate::{
    ConfigError, LogFormat, LoggingConfig, MetricsConfig, PaginationConfig, RegistryConfig,
    TunnelConfig,
};

/// Complete Praxis configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and
/// environment variables.
///
/// # Example
///
/// ```
/// use praxis_config::{InitializationMode, PraxisConfig};
///
/// let config = PraxisConfig::default();
/// assert_eq!(config.registry.initialization, InitializationMode::Lazy);
/// assert_eq!(config.pagination.default_per_page, 20);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct PraxisConfig {
    /// Action registry behaviour.
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Verb tunneling.
    #[serde(default)]
    pub tunnel: TunnelConfig,

    /// Pagination capability defaults.
    #[serde(default)]
    pub pagination: PaginationConfig,

    /// Structured logging.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Prometheus metrics.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl PraxisConfig {
    /// Create a new configuration builder.
    ///
    /// # Example
    ///
    /// ```
    /// use praxis_config::{PaginationConfig, PraxisConfig};
    ///
    /// let config = PraxisConfig::builder()
    ///     .pagination(PaginationConfig {
    ///         default_per_page: 50,
    ///         max_per_page: 200,
    ///     })
    ///     .build();
    ///
    /// assert_eq!(config.pagination.max_per_page, 200);
    /// ```
    #[must_use]
    pub fn builder() -> PraxisConfigBuilder {
        PraxisConfigBuilder::new()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - A standard verb is not a valid method token
    /// - The override header is not a valid header name
    /// - Page sizes are zero or the default exceeds the maximum
    /// - The metrics address is not a socket address
    /// - `capability_check = "deny"` is combined with lazy initialization
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.registry.capability_check == crate::CapabilityCheck::Deny
            && self.registry.initialization == crate::InitializationMode::Lazy
        {
            return Err(ConfigError::invalid_value(
                "registry.capability_check",
                "\"deny\" needs eager initialization",
            ));
        }

        if self.tunnel.standard_verbs.is_empty() {
            return Err(ConfigError::invalid_value(
                "tunnel.standard_verbs",
                "at least one verb is required",
            ));
        }
        VerbNormalizer::with_vocabulary(&self.tunnel.standard_verbs)
            .map_err(|e| ConfigError::invalid_value("tunnel.standard_verbs", e.to_string()))?;

        if let Some(header) = &self.tunnel.override_header {
            HeaderName::from_bytes(header.as_bytes()).map_err(|_| {
                ConfigError::invalid_value(
                    "tunnel.override_header",
                    format!("invalid header name: {header}"),
                )
            })?;
        }

        if self.pagination.default_per_page == 0 {
            return Err(ConfigError::invalid_value(
                "pagination.default_per_page",
                "must be at least 1",
            ));
        }
        if self.pagination.max_per_page < self.pagination.default_per_page {
            return Err(ConfigError::invalid_value(
                "pagination.max_per_page",
                format!(
                    "must not be smaller than default_per_page ({})",
                    self.pagination.default_per_page
                ),
            ));
        }

        if self.metrics.enabled {
            if let Some(addr) = &self.metrics.addr {
                if addr.parse::<std::net::SocketAddr>().is_err() {
                    return Err(ConfigError::invalid_value(
                        "metrics.addr",
                        format!("invalid socket address: {addr}"),
                    ));
                }
            }
        }

        Ok(())
    }

    /// Create a development configuration preset.
    ///
    /// - Pretty log formatting with source locations
    /// - Debug log level
    /// - Metrics kept in-process
    ///
    /// # Example
    ///
    /// ```
    /// use praxis_config::PraxisConfig;
    ///
    /// let config = PraxisConfig::development();
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();

        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config.logging.include_location = true;

        config.metrics.addr = None;

        config
    }

    /// Create a production configuration preset.
    ///
    /// - JSON log formatting at info level
    /// - Eager registry population
    /// - Unresolvable capabilities refuse startup
    ///
    /// # Example
    ///
    /// ```
    /// use praxis_config::{CapabilityCheck, PraxisConfig};
    ///
    /// let config = PraxisConfig::production();
    /// assert_eq!(config.registry.capability_check, CapabilityCheck::Deny);
    /// ```
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();

        config.logging.level = "info".to_string();
        config.logging.format = LogFormat::Json;

        config.registry.initialization = crate::InitializationMode::Eager;
        config.registry.capability_check = crate::CapabilityCheck::Deny;

        config
    }
}

/// Builder for [`PraxisConfig`].
#[derive(Debug, Default)]
pub struct PraxisConfigBuilder {
    registry: Option<RegistryConfig>,
    tunnel: Option<TunnelConfig>,
    pagination: Option<PaginationConfig>,
    logging: Option<LoggingConfig>,
    metrics: Option<MetricsConfig>,
}

impl PraxisConfigBuilder {
    /// Create a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the registry configuration.
    #[must_use]
    pub fn registry(mut self, registry: RegistryConfig) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Set the tunneling configuration.
    #[must_use]
    pub fn tunnel(mut self, tunnel: TunnelConfig) -> Self {
        self.tunnel = Some(tunnel);
        self
    }

    /// Set the pagination configuration.
    #[must_use]
    pub fn pagination(mut self, pagination: PaginationConfig) -> Self {
        self.pagination = Some(pagination);
        self
    }

    /// Set the logging configuration.
    #[must_use]
    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = Some(logging);
        self
    }

    /// Set the metrics configuration.
    #[must_use]
    pub fn metrics(mut self, metrics: MetricsConfig) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Build the configuration.
    ///
    /// Any unset sections will use their default values.
    #[must_use]
    pub fn build(self) -> PraxisConfig {
        PraxisConfig {
            registry: self.registry.unwrap_or_default(),
            tunnel: self.tunnel.unwrap_or_default(),
            pagination: self.pagination.unwrap_or_default(),
            logging: self.logging.unwrap_or_default(),
            metrics: self.metrics.unwrap_or_default(),
        }
    }
}
