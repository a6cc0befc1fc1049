//! Middleware context types.
//!
//! The [`MiddlewareContext`] carries per-request state through the pipeline:
//! the request ID, the verb pair produced by tunneling, and capabilities
//! that earlier stages contribute for the action.

use praxis_core::Capabilities;
use praxis_router::{TransportVerb, TrueVerb};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::time::Instant;
use uuid::Uuid;

/// Context that flows through the middleware pipeline.
///
/// # Example
///
/// ```
/// use praxis_middleware::context::MiddlewareContext;
///
/// #[derive(Clone)]
/// struct Principal(String);
///
/// let mut ctx = MiddlewareContext::new();
/// ctx.capabilities_mut().insert(Principal("alice".into()));
///
/// assert_eq!(ctx.capabilities().len(), 1);
/// assert!(ctx.true_verb().is_none());
/// ```
#[derive(Debug)]
pub struct MiddlewareContext {
    /// Unique identifier for this request (UUID v7).
    request_id: Uuid,

    /// The verb the caller meant, after any override.
    true_verb: Option<TrueVerb>,

    /// The verb the transport routes on.
    transport_verb: Option<TransportVerb>,

    /// When the request started processing.
    started_at: Instant,

    /// Values offered to actions as capabilities, ahead of registered suppliers.
    capabilities: Capabilities,

    /// Type-erased extension data.
    extensions: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl MiddlewareContext {
    /// Creates a new middleware context with a fresh request ID.
    #[must_use]
    pub fn new() -> Self {
        Self::with_request_id(Uuid::now_v7())
    }

    /// Creates a context with a specific request ID.
    #[must_use]
    pub fn with_request_id(request_id: Uuid) -> Self {
        Self {
            request_id,
            true_verb: None,
            transport_verb: None,
            started_at: Instant::now(),
            capabilities: Capabilities::new(),
            extensions: HashMap::new(),
        }
    }

    /// Returns the request ID.
    #[must_use]
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Sets the request ID.
    pub fn set_request_id(&mut self, request_id: Uuid) {
        self.request_id = request_id;
    }

    /// Returns the true verb, once the tunneling stage has run.
    #[must_use]
    pub fn true_verb(&self) -> Option<&TrueVerb> {
        self.true_verb.as_ref()
    }

    /// Returns the transport verb, once the tunneling stage has run.
    #[must_use]
    pub fn transport_verb(&self) -> Option<&TransportVerb> {
        self.transport_verb.as_ref()
    }

    /// Records the verb pair.
    pub fn set_verbs(&mut self, true_verb: TrueVerb, transport_verb: TransportVerb) {
        self.true_verb = Some(true_verb);
        self.transport_verb = Some(transport_verb);
    }

    /// Returns when the request started processing.
    #[must_use]
    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Returns the elapsed time since the request started.
    #[must_use]
    pub fn elapsed(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }

    /// Returns the request-scoped capability values.
    #[must_use]
    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Returns the request-scoped capability values for insertion.
    pub fn capabilities_mut(&mut self) -> &mut Capabilities {
        &mut self.capabilities
    }

    /// Takes the request-scoped capability values, leaving an empty set.
    pub fn take_capabilities(&mut self) -> Capabilities {
        std::mem::take(&mut self.capabilities)
    }

    /// Stores a typed extension value.
    pub fn set_extension<T: Send + Sync + 'static>(&mut self, value: T) {
        self.extensions.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Retrieves a typed extension value.
    #[must_use]
    pub fn get_extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref())
    }

    /// Removes and returns a typed extension value.
    pub fn remove_extension<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.extensions
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast().ok())
            .map(|b| *b)
    }
}

impl Default for MiddlewareContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use praxis_core::TypeKey;

    #[test]
    fn test_request_id_is_v7() {
        let ctx = MiddlewareContext::new();
        assert_eq!(ctx.request_id().get_version_num(), 7);
        assert_ne!(ctx.request_id(), MiddlewareContext::new().request_id());
    }

    #[test]
    fn test_set_verbs() {
        let mut ctx = MiddlewareContext::new();
        assert!(ctx.transport_verb().is_none());

        ctx.set_verbs(TrueVerb::parse("greet").unwrap(), TransportVerb::Tunneled);
        assert_eq!(ctx.true_verb().map(TrueVerb::as_str), Some("GREET"));
        assert!(ctx.transport_verb().unwrap().is_tunneled());
    }

    #[test]
    fn test_take_capabilities() {
        #[derive(Clone)]
        struct Principal(&'static str);

        let mut ctx = MiddlewareContext::new();
        ctx.capabilities_mut().insert(Principal("alice"));

        let taken = ctx.take_capabilities();
        assert!(taken.contains(&TypeKey::of::<Principal>()));
        assert_eq!(taken.get::<Principal>().map(|p| p.0), Some("alice"));
        assert!(ctx.capabilities().is_empty());
    }

    #[test]
    fn test_extensions() {
        #[derive(Debug, Clone, PartialEq)]
        struct Attempt(u32);

        let mut ctx = MiddlewareContext::new();
        assert!(ctx.get_extension::<Attempt>().is_none());

        ctx.set_extension(Attempt(2));
        assert_eq!(ctx.get_extension::<Attempt>(), Some(&Attempt(2)));
        assert_eq!(ctx.remove_extension::<Attempt>(), Some(Attempt(2)));
        assert!(ctx.get_extension::<Attempt>().is_none());
    }
}
