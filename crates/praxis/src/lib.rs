//! # Praxis
//!
//! **Action discovery and dispatch for resource routers.**
//!
//! A router declares its actions (verb, optional custom name, parameters);
//! Praxis derives a routing key for each one, registers it once, and turns
//! every incoming request into the same kind of key to find and invoke the
//! matching action.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use praxis::prelude::*;
//!
//! struct Widgets;
//!
//! #[actions(resource = "widgets", crate = "::praxis::dispatch")]
//! impl Widgets {
//!     #[retrieve]
//!     async fn list(&self, page: Pagination) -> serde_json::Value {
//!         serde_json::json!({ "page": page.page })
//!     }
//!
//!     #[action(verb = "POST", name = "publish")]
//!     async fn publish(&self, #[id] id: u64) {}
//! }
//!
//! let config = ConfigLoader::new().with_optional_file("praxis.toml")?.load()?;
//! praxis::init_telemetry(&config)?;
//!
//! let service = ActionService::builder()
//!     .config(config)
//!     .router(Arc::new(Widgets))
//!     .build()?;
//! let response = service.handle(request).await;
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Request → RequestId → VerbTunnel → [extensions] → ActionEndpoint
//!                                                        │
//!            RequestKeyBuilder ──► RoutingKey ──► ActionRegistry
//!                                                        │
//!            ParameterPlan ──► Arguments ──► invoker ◄───┘
//! ```

#![doc(html_root_url = "https://docs.rs/praxis/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod service;

pub use service::{
    init_telemetry, pagination_settings, telemetry_config, verb_tunnel, ActionService,
    ActionServiceBuilder, ServiceError,
};

// Re-export core types
pub use praxis_core as core;

// Re-export routing keys and verbs
pub use praxis_router as router;

// Re-export introspection, registry and dispatcher
pub use praxis_dispatch as dispatch;

// Re-export capability suppliers
pub use praxis_extract as extract;

// Re-export the HTTP pipeline
pub use praxis_middleware as middleware;

// Re-export configuration
pub use praxis_config as config;

// Re-export logging and metrics
pub use praxis_telemetry as telemetry;

// Re-export the router macro
pub use praxis_macros::actions;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use praxis::prelude::*;
///
/// let config = PraxisConfig::default();
/// assert_eq!(config.registry.initialization, InitializationMode::Lazy);
/// ```
pub mod prelude {
    pub use crate::{ActionService, ServiceError};

    pub use praxis_config::{CapabilityCheck, ConfigLoader, InitializationMode, PraxisConfig};

    pub use praxis_core::{ConventionNames, DispatchError, ErrorCategory, Json, NameTable};

    pub use praxis_dispatch::{ActionRegistry, ActionRequest, ActionRouter, Dispatcher};

    pub use praxis_extract::{EmbedSpec, FieldSelection, Locale, Pagination};

    pub use praxis_middleware::{Middleware, MiddlewareContext, ResponseWriter};

    pub use praxis_macros::actions;
}
