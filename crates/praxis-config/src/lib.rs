//! Typed configuration for Praxis.
//!
//! - TOML and JSON configuration files
//! - Environment variable overrides
//! - Strict validation (fails on unknown fields)
//! - Layered configuration (defaults → file → env)
//!
//! # Sections
//!
//! - [`RegistryConfig`] - lazy or eager population, capability self-check
//! - [`TunnelConfig`] - transport verb vocabulary and override header
//! - [`PaginationConfig`] - page size defaults
//! - [`LoggingConfig`] / [`MetricsConfig`] - observability
//!
//! # Example
//!
//! ```no_run
//! use praxis_config::ConfigLoader;
//!
//! # fn main() -> Result<(), praxis_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_defaults()
//!     .with_optional_file("praxis.toml")?
//!     .with_env_prefix("PRAXIS")
//!     .load()?;
//!
//! println!("registry initialization: {:?}", config.registry.initialization);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [registry]
//! initialization = "lazy"      # or "eager"
//! capability_check = "warn"    # "off" | "warn" | "deny"
//!
//! [tunnel]
//! standard_verbs = ["GET", "POST", "PUT", "DELETE", "PATCH", "HEAD", "OPTIONS", "TRACE", "CONNECT"]
//! override_header = "x-http-method-override"
//!
//! [pagination]
//! default_per_page = 20
//! max_per_page = 100
//!
//! [logging]
//! enabled = true
//! level = "info"
//! format = "json"
//!
//! [metrics]
//! enabled = true
//! addr = "0.0.0.0:9090"
//! ```
//!
//! # Environment Variable Overrides
//!
//! Values can be overridden with `PREFIX__SECTION__KEY`:
//!
//! - `PRAXIS__REGISTRY__INITIALIZATION=eager`
//! - `PRAXIS__TUNNEL__STANDARD_VERBS=GET,POST`
//! - `PRAXIS__METRICS__ENABLED=false`

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::*;
pub use error::ConfigError;
pub use loader::{ConfigLoader, DEFAULT_ENV_PREFIX};
pub use schema::*;
