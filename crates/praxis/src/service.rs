//! Assembling a ready-to-serve action service from configuration.
//!
//! ```text
//! PraxisConfig ──► VerbTunnelMiddleware (tunnel.*)
//!              ──► CapabilitySuppliers  (pagination.*)
//!              ──► ActionRegistry       (registry.initialization)
//!              ──► capability self-check (registry.capability_check)
//! ```

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use http::HeaderName;
use praxis_config::{
    CapabilityCheck, ConfigError, InitializationMode, LogFormat, PaginationConfig, PraxisConfig,
    TunnelConfig,
};
use praxis_core::{ConventionNames, ErrorCategory, NameResolver, TypeKey};
use praxis_dispatch::{ActionRegistry, ActionRouter, Dispatcher, UnresolvedCapability};
use praxis_extract::{CapabilitySuppliers, PaginationSettings};
use praxis_middleware::{
    ActionEndpoint, Middleware, Pipeline, PipelineBuilder, Request, Response, ResponseWriter,
    VerbTunnelMiddleware,
};
use praxis_router::{VerbError, VerbNormalizer};
use praxis_telemetry::metrics::{record_registry_rejections, record_registry_size};
use praxis_telemetry::{LogConfig, TelemetryConfig, TelemetryError};
use thiserror::Error;
use tracing::{info, warn};

/// Errors raised while assembling an [`ActionService`].
#[derive(Error, Debug)]
pub enum ServiceError {
    /// The configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The transport vocabulary is invalid.
    #[error("Invalid verb vocabulary: {0}")]
    Verbs(#[from] VerbError),

    /// The override header is not a valid header name.
    #[error("Invalid override header: {0}")]
    OverrideHeader(String),

    /// Actions declare capabilities nothing can provide.
    #[error("{} action parameter(s) have no capability provider", .0.len())]
    UnresolvedCapabilities(Vec<UnresolvedCapability>),

    /// Logging or metrics failed to start.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
}

/// Maps the pagination section onto supplier settings.
#[must_use]
pub fn pagination_settings(config: &PaginationConfig) -> PaginationSettings {
    PaginationSettings {
        default_per_page: config.default_per_page,
        max_per_page: config.max_per_page,
    }
}

/// Maps the logging and metrics sections onto telemetry settings.
#[must_use]
pub fn telemetry_config(config: &PraxisConfig) -> TelemetryConfig {
    let logging = LogConfig {
        enabled: config.logging.enabled,
        level: config.logging.level.clone(),
        json_format: config.logging.format == LogFormat::Json,
        file_line_info: config.logging.include_location,
        ..LogConfig::default()
    };
    let metrics = praxis_telemetry::MetricsConfig {
        enabled: config.metrics.enabled,
        addr: config.metrics.addr.clone(),
        ..praxis_telemetry::MetricsConfig::default()
    };
    TelemetryConfig::builder().logging(logging).metrics(metrics).build()
}

/// Installs logging and metrics as configured.
///
/// Call once per process, before building services.
pub fn init_telemetry(config: &PraxisConfig) -> Result<(), ServiceError> {
    praxis_telemetry::init_telemetry(&telemetry_config(config))?;
    Ok(())
}

/// Builds the verb tunneling stage from the tunnel section.
pub fn verb_tunnel(config: &TunnelConfig) -> Result<VerbTunnelMiddleware, ServiceError> {
    let normalizer = VerbNormalizer::with_vocabulary(&config.standard_verbs)?;
    let header = config
        .override_header
        .as_deref()
        .map(|name| {
            HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ServiceError::OverrideHeader(name.to_string()))
        })
        .transpose()?;
    Ok(VerbTunnelMiddleware::new()
        .with_normalizer(normalizer)
        .with_override_header(header))
}

/// An HTTP request handler backed by an action registry.
///
/// Cloning is cheap; clones share the registry and pipeline.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use praxis::dispatch::{ActionDescriptor, ActionMarker, ActionOutput, ActionRouter};
/// use praxis::ActionService;
///
/// struct Health;
///
/// impl ActionRouter for Health {
///     fn resource(&self) -> &str {
///         "health"
///     }
///
///     fn actions(self: Arc<Self>) -> Vec<ActionDescriptor> {
///         vec![ActionDescriptor::new("check", ActionMarker::retrieve())
///             .invoker(|_| async { Ok(ActionOutput::new(serde_json::json!("ok"))) })]
///     }
/// }
///
/// let service = ActionService::builder().router(Arc::new(Health)).build().unwrap();
/// assert!(!service.registry().is_initialized());
/// ```
#[derive(Clone)]
pub struct ActionService {
    pipeline: Arc<Pipeline>,
    endpoint: ActionEndpoint,
    config: Arc<PraxisConfig>,
    check: Arc<CapabilityCheckState>,
}

struct CapabilityCheckState {
    mode: CapabilityCheck,
    suppliers: Arc<CapabilitySuppliers>,
    provided: HashSet<TypeKey>,
    done: AtomicBool,
}

impl CapabilityCheckState {
    fn unresolved(&self, registry: &ActionRegistry) -> Vec<UnresolvedCapability> {
        registry.unresolved_capabilities(|ty| {
            self.provided.contains(ty) || self.suppliers.supports(ty)
        })
    }

    /// Runs once, after the registry's population pass.
    fn after_population(&self, registry: &ActionRegistry) -> Result<(), ServiceError> {
        if !registry.is_initialized() || self.done.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        record_registry_size(registry.len());
        let rejections = registry.rejections();
        for category in [ErrorCategory::DuplicateKey, ErrorCategory::InvalidAction] {
            let count = rejections.iter().filter(|e| e.category() == category).count();
            if count > 0 {
                record_registry_rejections(category, count);
            }
        }

        if self.mode == CapabilityCheck::Off {
            return Ok(());
        }
        let unresolved = self.unresolved(registry);
        for missing in &unresolved {
            warn!(
                key = %missing.key,
                action = %missing.action,
                capability = missing.capability.name(),
                "no capability provider for declared parameter type"
            );
        }
        if self.mode == CapabilityCheck::Deny && !unresolved.is_empty() {
            return Err(ServiceError::UnresolvedCapabilities(unresolved));
        }
        Ok(())
    }
}

impl ActionService {
    /// Creates a new service builder.
    #[must_use]
    pub fn builder() -> ActionServiceBuilder {
        ActionServiceBuilder::new()
    }

    /// Handles one HTTP request.
    pub async fn handle(&self, request: Request) -> Response {
        let response = self.pipeline.serve(&self.endpoint, request).await;
        if let Err(error) = self.check.after_population(self.registry()) {
            warn!(%error, "capability self-check failed after lazy population");
        }
        response
    }

    /// Returns the action registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<ActionRegistry> {
        self.endpoint.dispatcher().registry()
    }

    /// Returns the dispatcher.
    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        self.endpoint.dispatcher()
    }

    /// Returns the configuration the service was built from.
    #[must_use]
    pub fn config(&self) -> &PraxisConfig {
        &self.config
    }

    /// Returns the pipeline stage names in order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.pipeline.stage_names()
    }

    /// Lists declared capabilities that no supplier or extension provides.
    ///
    /// Only meaningful once the registry is populated.
    #[must_use]
    pub fn unresolved_capabilities(&self) -> Vec<UnresolvedCapability> {
        self.check.unresolved(self.registry())
    }
}

impl std::fmt::Debug for ActionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionService")
            .field("pipeline", &self.pipeline)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

/// Builder for [`ActionService`].
pub struct ActionServiceBuilder {
    config: PraxisConfig,
    routers: Vec<Arc<dyn ActionRouter>>,
    make_registry: Option<Box<dyn FnOnce(Vec<Arc<dyn ActionRouter>>) -> ActionRegistry>>,
    suppliers: Vec<Box<dyn FnOnce(&mut CapabilitySuppliers)>>,
    provided: HashSet<TypeKey>,
    writer: Option<Arc<dyn ResponseWriter>>,
    pipeline: PipelineBuilder,
}

impl ActionServiceBuilder {
    /// Creates a builder with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: PraxisConfig::default(),
            routers: Vec::new(),
            make_registry: None,
            suppliers: Vec::new(),
            provided: HashSet::new(),
            writer: None,
            pipeline: Pipeline::builder(),
        }
    }

    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: PraxisConfig) -> Self {
        self.config = config;
        self
    }

    /// Adds a router to the first population pass.
    #[must_use]
    pub fn router(mut self, router: Arc<dyn ActionRouter>) -> Self {
        self.routers.push(router);
        self
    }

    /// Sets the parent resource name resolver. Defaults to
    /// [`ConventionNames`].
    #[must_use]
    pub fn names<N: NameResolver + 'static>(mut self, names: N) -> Self {
        self.make_registry = Some(Box::new(move |routers| {
            ActionRegistry::new(names).with_source(move || routers.clone())
        }));
        self
    }

    /// Adjusts the capability suppliers after the standard ones are
    /// installed.
    #[must_use]
    pub fn suppliers<F>(mut self, configure: F) -> Self
    where
        F: FnOnce(&mut CapabilitySuppliers) + 'static,
    {
        self.suppliers.push(Box::new(configure));
        self
    }

    /// Appends a pipeline extension stage.
    #[must_use]
    pub fn extension<M: Middleware>(mut self, middleware: M) -> Self {
        self.pipeline = self.pipeline.extension(middleware);
        self
    }

    /// Declares that a pipeline extension offers `T` on every request, so
    /// the capability self-check accepts it.
    #[must_use]
    pub fn provides<T: 'static>(mut self) -> Self {
        self.provided.insert(TypeKey::of::<T>());
        self
    }

    /// Replaces the response writer.
    #[must_use]
    pub fn writer(mut self, writer: Arc<dyn ResponseWriter>) -> Self {
        self.writer = Some(writer);
        self
    }

    /// Validates the configuration and assembles the service.
    ///
    /// With eager initialization the registry is populated here and the
    /// capability self-check runs before the service is returned.
    pub fn build(self) -> Result<ActionService, ServiceError> {
        self.config.validate()?;

        let tunnel = verb_tunnel(&self.config.tunnel)?;
        let pipeline = self.pipeline.verb_tunnel(tunnel).build();

        let mut suppliers =
            CapabilitySuppliers::with_standard(pagination_settings(&self.config.pagination));
        for configure in self.suppliers {
            configure(&mut suppliers);
        }
        let suppliers = Arc::new(suppliers);

        let routers = self.routers;
        let registry = match self.make_registry {
            Some(make) => make(routers),
            None => ActionRegistry::new(ConventionNames).with_source(move || routers.clone()),
        };
        let registry = Arc::new(registry);

        let mut endpoint = ActionEndpoint::new(Dispatcher::new(Arc::clone(&registry)), Arc::clone(&suppliers));
        if let Some(writer) = self.writer {
            endpoint = endpoint.with_writer(writer);
        }

        let check = Arc::new(CapabilityCheckState {
            mode: self.config.registry.capability_check,
            suppliers,
            provided: self.provided,
            done: AtomicBool::new(false),
        });

        if self.config.registry.initialization == InitializationMode::Eager {
            registry.ensure_initialized();
            check.after_population(&registry)?;
        }

        info!(
            stages = ?pipeline.stage_names(),
            initialization = ?self.config.registry.initialization,
            "action service ready"
        );

        Ok(ActionService {
            pipeline: Arc::new(pipeline),
            endpoint,
            config: Arc::new(self.config),
            check,
        })
    }
}

impl Default for ActionServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}
