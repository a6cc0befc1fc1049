//! Request dispatch.
//!
//! ```text
//!   ActionRequest ──► PathShape ──► RoutingKey ──► registry lookup
//!                                                     │
//!                      ┌──────────────────────────────┤
//!                      ▼                              ▼
//!              404 / 405 (verb-less             bind ParameterPlan
//!              shape check)                           │
//!                                                     ▼
//!                                           invoke on spawned task
//! ```

use std::fmt;
use std::sync::Arc;

use anyhow::anyhow;
use praxis_core::{Body, Capabilities, CapabilityLookup, DispatchError};
use praxis_router::{request_key, PathShape};
use tracing::{debug, error};

use crate::args::{ActionOutput, Argument, Arguments};
use crate::plan::Slot;
use crate::registry::{ActionRegistry, RegisteredOperation};

/// One request, as the dispatcher sees it.
pub struct ActionRequest {
    verb: String,
    path: String,
    body: Body,
    capabilities: Arc<dyn CapabilityLookup>,
}

impl ActionRequest {
    /// Creates a request with the true verb and the request path.
    pub fn new(verb: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            verb: verb.into(),
            path: path.into(),
            body: Body::empty(),
            capabilities: Arc::new(Capabilities::new()),
        }
    }

    /// Sets the body.
    #[must_use]
    pub fn body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }

    /// Sets the capability lookup for this request.
    #[must_use]
    pub fn capabilities(mut self, capabilities: Arc<dyn CapabilityLookup>) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Returns the true verb.
    #[must_use]
    pub fn verb(&self) -> &str {
        &self.verb
    }

    /// Returns the path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Debug for ActionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionRequest")
            .field("verb", &self.verb)
            .field("path", &self.path)
            .field("body", &self.body)
            .finish_non_exhaustive()
    }
}

/// Executes requests against an [`ActionRegistry`].
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<ActionRegistry>,
}

impl Dispatcher {
    /// Creates a dispatcher over a registry.
    #[must_use]
    pub fn new(registry: Arc<ActionRegistry>) -> Self {
        Self { registry }
    }

    /// Returns the registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<ActionRegistry> {
        &self.registry
    }

    /// Dispatches one request.
    ///
    /// The bound operation runs on its own task: dropping the returned future
    /// does not abort an invocation that has started.
    pub async fn dispatch(&self, request: ActionRequest) -> Result<ActionOutput, DispatchError> {
        let shape = PathShape::parse(&request.path)
            .map_err(|e| DispatchError::malformed(e.to_string()))?;
        let key = request_key(&request.verb, &shape)
            .map_err(|e| DispatchError::malformed(e.to_string()))?;

        self.registry.ensure_initialized();

        let Some(operation) = self.registry.lookup(&key) else {
            let route = key.shape();
            let allowed = self.registry.allowed_verbs(&route);
            debug!(key = %key, allowed = ?allowed, "no action for key");
            return Err(if allowed.is_empty() {
                DispatchError::not_found(route.to_string())
            } else {
                DispatchError::method_not_allowed(key.verb(), route.to_string(), allowed)
            });
        };

        let args = bind(&operation, &shape, &request)?;
        debug!(key = %key, action = %operation.action_name(), "invoking action");

        let action = operation.action_name();
        match tokio::spawn(operation.invoke(args)).await {
            Ok(result) => result,
            Err(join) if join.is_panic() => {
                error!(action = %action, "action panicked");
                Err(DispatchError::invocation(anyhow!("action {action} panicked")))
            }
            Err(_) => Err(DispatchError::invocation(anyhow!("action {action} was cancelled"))),
        }
    }
}

/// Resolves one argument per plan slot, in order.
fn bind(
    operation: &RegisteredOperation,
    shape: &PathShape,
    request: &ActionRequest,
) -> Result<Arguments, DispatchError> {
    let plan = operation.plan();
    let mut values = Vec::with_capacity(plan.len());

    for slot in plan.slots() {
        let value = match slot {
            Slot::Identifier => shape
                .identifier()
                .map(|id| Argument::Identifier(id.to_string()))
                .ok_or_else(|| DispatchError::malformed("request path has no item identifier"))?,
            Slot::ParentIdentifier => shape
                .parent_identifier()
                .map(|id| Argument::ParentIdentifier(id.to_string()))
                .ok_or_else(|| DispatchError::malformed("request path has no parent identifier"))?,
            Slot::Body => Argument::Body(request.body.clone()),
            Slot::Provider(ty) => match request.capabilities.lookup(ty) {
                Ok(Some(value)) => Argument::Capability(value),
                Ok(None) => {
                    error!(
                        action = %operation.action_name(),
                        key = %operation.key(),
                        capability = ty.name(),
                        "no capability provider for declared parameter type"
                    );
                    return Err(DispatchError::ProviderUnresolved {
                        type_name: ty.name(),
                        key: operation.key().to_string(),
                        action: operation.action_name(),
                    });
                }
                Err(e) => return Err(DispatchError::malformed(e.to_string())),
            },
        };
        values.push(value);
    }

    Ok(Arguments::new(values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{ActionDescriptor, ActionMarker, ActionRouter, ParamDescriptor};
    use praxis_core::{CapabilityError, ConventionNames, ErrorCategory, TypeKey};

    #[derive(Clone)]
    struct Tenant(&'static str);

    struct Echo;

    impl ActionRouter for Echo {
        fn resource(&self) -> &str {
            "echo"
        }

        fn actions(self: Arc<Self>) -> Vec<ActionDescriptor> {
            vec![
                ActionDescriptor::new("tenant", ActionMarker::retrieve())
                    .param(ParamDescriptor::capability::<Tenant>("tenant"))
                    .invoker(|args| async move {
                        let tenant: Tenant = args.capability(0)?;
                        Ok(ActionOutput::new(tenant.0))
                    }),
                ActionDescriptor::new("boom", ActionMarker::create())
                    .invoker(|_| async { panic!("kaboom") }),
            ]
        }
    }

    fn dispatcher() -> Dispatcher {
        let registry = ActionRegistry::new(ConventionNames);
        registry.register(Arc::new(Echo));
        Dispatcher::new(Arc::new(registry))
    }

    #[tokio::test]
    async fn test_capability_bound() {
        let caps = Capabilities::new().with(Tenant("acme"));
        let out = dispatcher()
            .dispatch(ActionRequest::new("GET", "/echo").capabilities(Arc::new(caps)))
            .await
            .unwrap();
        assert_eq!(out.downcast::<&str>().ok(), Some("acme"));
    }

    #[tokio::test]
    async fn test_missing_capability_is_developer_error() {
        let err = dispatcher()
            .dispatch(ActionRequest::new("GET", "/echo"))
            .await
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::ProviderUnresolved);
        assert!(!err.is_caller_fault());
    }

    #[tokio::test]
    async fn test_bad_capability_value_is_caller_error() {
        let lookup = |_: &TypeKey| -> Result<Option<praxis_core::Capability>, CapabilityError> {
            Err(CapabilityError::new::<Tenant>("unknown tenant"))
        };
        let err = dispatcher()
            .dispatch(ActionRequest::new("GET", "/echo").capabilities(Arc::new(lookup)))
            .await
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::MalformedRequest);
    }

    #[tokio::test]
    async fn test_panic_becomes_invocation_failure() {
        let err = dispatcher()
            .dispatch(ActionRequest::new("POST", "/echo"))
            .await
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::InvocationFailure);
        assert!(err.to_string().contains("panicked"));
    }

    #[tokio::test]
    async fn test_malformed_path() {
        for path in ["", "/a/b/c/d/e", "/echo:"] {
            let err = dispatcher()
                .dispatch(ActionRequest::new("GET", path))
                .await
                .unwrap_err();
            assert_eq!(err.category(), ErrorCategory::MalformedRequest, "{path}");
        }
    }

    #[tokio::test]
    async fn test_invalid_verb_is_malformed() {
        let err = dispatcher()
            .dispatch(ActionRequest::new("GE T", "/echo"))
            .await
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::MalformedRequest);
    }
}
