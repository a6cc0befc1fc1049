//! The action registry.
//!
//! [`ActionRegistry`] maps routing keys to registered operations. It is
//! read-mostly: lookups take the read side of a reader-writer lock, while
//! population and router add/remove events take the write side.
//!
//! # Lifecycle
//!
//! A registry starts empty. Routers arrive either through
//! [`ActionRegistry::register`] (component lifecycle hooks) or through a
//! [`RouterSource`] that is drained by the first call to
//! [`ActionRegistry::ensure_initialized`]. That first population pass runs at
//! most once, however many requests race for it.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use praxis_core::{NameResolver, RegistrationError, TypeKey};
use praxis_router::{RouteShape, RoutingKey};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::args::Arguments;
use crate::descriptor::{ActionRouter, InvokeFuture, Invoker};
use crate::init::LazyInitializer;
use crate::introspect::{ActionIntrospector, IntrospectedAction};
use crate::plan::ParameterPlan;

/// Identifier of one router registration (UUID v7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouterId(Uuid);

impl RouterId {
    fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl fmt::Display for RouterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An operation in the registry. Immutable once registered.
pub struct RegisteredOperation {
    key: RoutingKey,
    plan: ParameterPlan,
    invoker: Invoker,
    router_id: RouterId,
    router_name: &'static str,
    method_name: &'static str,
}

impl RegisteredOperation {
    /// Returns the routing key.
    #[must_use]
    pub fn key(&self) -> &RoutingKey {
        &self.key
    }

    /// Returns the parameter plan.
    #[must_use]
    pub fn plan(&self) -> &ParameterPlan {
        &self.plan
    }

    /// Returns the owning router registration.
    #[must_use]
    pub fn router_id(&self) -> RouterId {
        self.router_id
    }

    /// Returns the owning router's type name.
    #[must_use]
    pub fn router_name(&self) -> &'static str {
        self.router_name
    }

    /// Returns the declaring method name.
    #[must_use]
    pub fn method_name(&self) -> &'static str {
        self.method_name
    }

    /// Returns `Router::method` for diagnostics.
    #[must_use]
    pub fn action_name(&self) -> String {
        format!("{}::{}", self.router_name, self.method_name)
    }

    /// Calls the bound method with already-bound arguments.
    pub fn invoke(&self, args: Arguments) -> InvokeFuture {
        (self.invoker)(args)
    }
}

impl fmt::Debug for RegisteredOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredOperation")
            .field("key", &self.key)
            .field("plan", &self.plan)
            .field("router_id", &self.router_id)
            .field("action", &self.action_name())
            .finish_non_exhaustive()
    }
}

/// The outcome of registering one router.
#[derive(Debug, Clone)]
pub struct RouterRegistration {
    /// The registration id.
    pub id: RouterId,
    /// Number of actions added to the registry.
    pub registered: usize,
    /// Actions that were rejected.
    pub rejected: Vec<RegistrationError>,
    /// Unmarked methods.
    pub skipped: usize,
    /// `true` if the router object was already registered.
    pub already_registered: bool,
}

/// A `PROVIDER` slot no supplier can answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedCapability {
    /// The routing key of the action.
    pub key: RoutingKey,
    /// `Router::method`.
    pub action: String,
    /// The declared capability type.
    pub capability: TypeKey,
}

/// Supplies the routers drained by the first population pass.
pub trait RouterSource: Send + Sync {
    /// Returns the routers to register.
    fn routers(&self) -> Vec<Arc<dyn ActionRouter>>;
}

impl<F> RouterSource for F
where
    F: Fn() -> Vec<Arc<dyn ActionRouter>> + Send + Sync,
{
    fn routers(&self) -> Vec<Arc<dyn ActionRouter>> {
        self()
    }
}

struct RouterEntry {
    router: Arc<dyn ActionRouter>,
    keys: Vec<RoutingKey>,
}

struct Rejection {
    router: RouterId,
    router_name: &'static str,
    error: RegistrationError,
    // Set for duplicate keys: admitted once the key is free again.
    waiting: Option<IntrospectedAction>,
}

#[derive(Default)]
struct RegistryState {
    operations: IndexMap<RoutingKey, Arc<RegisteredOperation>>,
    verbs: HashMap<RouteShape, BTreeSet<String>>,
    routers: IndexMap<RouterId, RouterEntry>,
    rejected: Vec<Rejection>,
}

impl RegistryState {
    fn find_router(&self, router: &Arc<dyn ActionRouter>) -> Option<RouterId> {
        self.routers
            .iter()
            .find(|(_, entry)| same_object(&entry.router, router))
            .map(|(id, _)| *id)
    }

    fn admit(
        &mut self,
        router: RouterId,
        router_name: &'static str,
        action: IntrospectedAction,
    ) -> RoutingKey {
        debug!(router = router_name, method = action.method, key = %action.key, "action registered");
        let key = action.key;
        let operation = Arc::new(RegisteredOperation {
            key: key.clone(),
            plan: action.plan,
            invoker: action.invoker,
            router_id: router,
            router_name,
            method_name: action.method,
        });
        self.verbs
            .entry(key.shape())
            .or_default()
            .insert(key.verb().to_string());
        self.operations.insert(key.clone(), operation);
        key
    }

    /// Removes a registration, its keys and its rejections, then hands each
    /// freed key to the earliest action still waiting for it.
    fn detach(&mut self, id: RouterId) -> Option<RouterEntry> {
        let entry = self.routers.shift_remove(&id)?;
        for key in &entry.keys {
            self.remove_key(key);
        }
        self.rejected.retain(|r| r.router != id);
        for key in &entry.keys {
            self.readmit(key);
        }
        Some(entry)
    }

    fn readmit(&mut self, key: &RoutingKey) {
        let Some(pos) = self
            .rejected
            .iter()
            .position(|r| r.waiting.as_ref().is_some_and(|a| &a.key == key))
        else {
            return;
        };
        let mut rejection = self.rejected.remove(pos);
        let Some(action) = rejection.waiting.take() else {
            return;
        };

        let admitted = format!("{}::{}", rejection.router_name, action.method);
        info!(key = %key, action = %admitted, "waiting action admitted");
        let key = self.admit(rejection.router, rejection.router_name, action);
        if let Some(entry) = self.routers.get_mut(&rejection.router) {
            entry.keys.push(key.clone());
        }

        for other in &mut self.rejected {
            if other.waiting.as_ref().is_some_and(|a| a.key == key) {
                if let RegistrationError::DuplicateKey { existing, .. } = &mut other.error {
                    existing.clone_from(&admitted);
                }
            }
        }
    }

    fn remove_key(&mut self, key: &RoutingKey) {
        self.operations.shift_remove(key);
        let shape = key.shape();
        if let Some(verbs) = self.verbs.get_mut(&shape) {
            verbs.remove(key.verb());
            if verbs.is_empty() {
                self.verbs.remove(&shape);
            }
        }
    }
}

fn same_object(a: &Arc<dyn ActionRouter>, b: &Arc<dyn ActionRouter>) -> bool {
    std::ptr::eq(Arc::as_ptr(a).cast::<()>(), Arc::as_ptr(b).cast::<()>())
}

/// Concurrency-safe map from routing key to registered operation.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use praxis_core::ConventionNames;
/// use praxis_dispatch::{ActionDescriptor, ActionMarker, ActionOutput, ActionRegistry, ActionRouter};
/// use praxis_router::{build_key, KeyParts};
///
/// struct Widgets;
///
/// impl ActionRouter for Widgets {
///     fn resource(&self) -> &str {
///         "widgets"
///     }
///
///     fn actions(self: Arc<Self>) -> Vec<ActionDescriptor> {
///         vec![ActionDescriptor::new("list", ActionMarker::retrieve())
///             .invoker(|_| async { Ok(ActionOutput::new(())) })]
///     }
/// }
///
/// let registry = ActionRegistry::new(ConventionNames);
/// let registration = registry.register(Arc::new(Widgets));
/// assert_eq!(registration.registered, 1);
///
/// let key = build_key(KeyParts::new("GET", "widgets")).unwrap();
/// assert!(registry.lookup(&key).is_some());
/// ```
pub struct ActionRegistry {
    state: RwLock<RegistryState>,
    names: Arc<dyn NameResolver>,
    source: Option<Box<dyn RouterSource>>,
    init: LazyInitializer,
}

impl ActionRegistry {
    /// Creates an empty registry.
    pub fn new(names: impl NameResolver + 'static) -> Self {
        Self {
            state: RwLock::new(RegistryState::default()),
            names: Arc::new(names),
            source: None,
            init: LazyInitializer::new(),
        }
    }

    /// Sets the source drained by the first population pass.
    #[must_use]
    pub fn with_source(mut self, source: impl RouterSource + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Registers a router's actions.
    ///
    /// Registering the same router object twice is a no-op. A key that is
    /// already taken keeps its first operation; the newcomer is rejected and
    /// logged.
    pub fn register(&self, router: Arc<dyn ActionRouter>) -> RouterRegistration {
        if let Some(id) = self.state.read().find_router(&router) {
            return Self::existing(id);
        }

        let router_name = router.name();
        let introspection =
            ActionIntrospector::new(self.names.as_ref()).introspect(Arc::clone(&router));

        let mut state = self.state.write();
        if let Some(id) = state.find_router(&router) {
            return Self::existing(id);
        }

        let id = RouterId::new();
        let mut rejected = Vec::new();
        let mut pending = Vec::new();
        for failure in introspection.failures {
            warn!(router = router_name, error = %failure, "action rejected");
            rejected.push(failure.clone());
            pending.push(Rejection {
                router: id,
                router_name,
                error: failure,
                waiting: None,
            });
        }

        let mut keys = Vec::with_capacity(introspection.actions.len());
        for action in introspection.actions {
            if let Some(existing) = state.operations.get(&action.key) {
                let error = RegistrationError::DuplicateKey {
                    key: action.key.to_string(),
                    existing: existing.action_name(),
                    rejected: format!("{router_name}::{}", action.method),
                };
                warn!(
                    router = router_name,
                    method = action.method,
                    key = %action.key,
                    existing = %existing.action_name(),
                    "duplicate routing key; keeping first registration"
                );
                rejected.push(error.clone());
                pending.push(Rejection {
                    router: id,
                    router_name,
                    error,
                    waiting: Some(action),
                });
                continue;
            }
            keys.push(state.admit(id, router_name, action));
        }

        let registered = keys.len();
        state.routers.insert(id, RouterEntry { router, keys });
        state.rejected.extend(pending);

        RouterRegistration {
            id,
            registered,
            rejected,
            skipped: introspection.skipped,
            already_registered: false,
        }
    }

    fn existing(id: RouterId) -> RouterRegistration {
        RouterRegistration {
            id,
            registered: 0,
            rejected: Vec::new(),
            skipped: 0,
            already_registered: true,
        }
    }

    /// Removes every operation owned by a registration.
    ///
    /// The registration's rejections go with it. A freed key passes to the
    /// earliest duplicate still waiting for it. Returns the number of
    /// operations removed.
    pub fn deregister(&self, id: RouterId) -> usize {
        Self::detach(&mut self.state.write(), id).unwrap_or(0)
    }

    fn detach(state: &mut RegistryState, id: RouterId) -> Option<usize> {
        let entry = state.detach(id)?;
        debug!(router = entry.router.name(), removed = entry.keys.len(), "router deregistered");
        Some(entry.keys.len())
    }

    /// Lifecycle hook: a router became available.
    pub fn on_router_added(&self, router: Arc<dyn ActionRouter>) -> RouterRegistration {
        self.register(router)
    }

    /// Lifecycle hook: a router is going away.
    ///
    /// Returns `true` if this call removed the router.
    pub fn on_router_removed(&self, router: &Arc<dyn ActionRouter>) -> bool {
        let mut state = self.state.write();
        state
            .find_router(router)
            .and_then(|id| Self::detach(&mut state, id))
            .is_some()
    }

    /// Looks up the operation for a key.
    #[must_use]
    pub fn lookup(&self, key: &RoutingKey) -> Option<Arc<RegisteredOperation>> {
        self.state.read().operations.get(key).cloned()
    }

    /// Returns the verbs registered for a route shape, sorted.
    #[must_use]
    pub fn allowed_verbs(&self, shape: &RouteShape) -> Vec<String> {
        self.state
            .read()
            .verbs
            .get(shape)
            .map(|verbs| verbs.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns the rejected declarations of current registrations, in
    /// registration order.
    #[must_use]
    pub fn rejections(&self) -> Vec<RegistrationError> {
        self.state
            .read()
            .rejected
            .iter()
            .map(|r| r.error.clone())
            .collect()
    }

    /// Returns every operation in registration order.
    #[must_use]
    pub fn routes(&self) -> Vec<Arc<RegisteredOperation>> {
        self.state.read().operations.values().cloned().collect()
    }

    /// Returns the number of registered operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().operations.len()
    }

    /// Returns `true` if no operations are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.read().operations.is_empty()
    }

    /// Returns the number of registered routers.
    #[must_use]
    pub fn router_count(&self) -> usize {
        self.state.read().routers.len()
    }

    /// Populates the registry from its source unless already done.
    ///
    /// Returns `true` if this call ran the population pass.
    pub fn ensure_initialized(&self) -> bool {
        self.init.ensure(|| self.populate())
    }

    /// Returns `true` once the population pass has run.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.init.is_initialized()
    }

    /// Returns the number of population passes run.
    #[must_use]
    pub fn population_passes(&self) -> usize {
        self.init.passes()
    }

    fn populate(&self) {
        let routers = self.source.as_ref().map(|s| s.routers()).unwrap_or_default();
        let count = routers.len();
        let mut rejected = 0;
        for router in routers {
            rejected += self.register(router).rejected.len();
        }
        info!(
            routers = count,
            operations = self.len(),
            rejected,
            "action registry populated"
        );
    }

    /// Lists `PROVIDER` slots that `supports` cannot answer.
    pub fn unresolved_capabilities<F>(&self, supports: F) -> Vec<UnresolvedCapability>
    where
        F: Fn(&TypeKey) -> bool,
    {
        let state = self.state.read();
        state
            .operations
            .values()
            .flat_map(|op| {
                op.plan()
                    .providers()
                    .filter(|ty| !supports(ty))
                    .map(|capability| UnresolvedCapability {
                        key: op.key().clone(),
                        action: op.action_name(),
                        capability,
                    })
                    .collect::<Vec<_>>()
            })
            .collect()
    }
}

impl fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("ActionRegistry")
            .field("operations", &state.operations.len())
            .field("routers", &state.routers.len())
            .field("initialized", &self.init.is_initialized())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::ActionOutput;
    use crate::descriptor::{ActionDescriptor, ActionMarker, ParamDescriptor};
    use praxis_core::{ConventionNames, DispatchError, ErrorCategory};
    use praxis_router::{build_key, KeyParts};

    struct Tenant;

    struct Widgets {
        resource: &'static str,
    }

    impl ActionRouter for Widgets {
        fn resource(&self) -> &str {
            self.resource
        }

        fn actions(self: Arc<Self>) -> Vec<ActionDescriptor> {
            let unit = |_: Arguments| async { Ok::<_, DispatchError>(ActionOutput::new(())) };
            vec![
                ActionDescriptor::new("list", ActionMarker::retrieve()).invoker(unit),
                ActionDescriptor::new("create", ActionMarker::create())
                    .param(ParamDescriptor::body("body"))
                    .param(ParamDescriptor::capability::<Tenant>("tenant"))
                    .invoker(unit),
                ActionDescriptor::new("remove", ActionMarker::remove())
                    .param(ParamDescriptor::id("id"))
                    .invoker(unit),
            ]
        }
    }

    fn widgets() -> Arc<dyn ActionRouter> {
        Arc::new(Widgets { resource: "widgets" })
    }

    fn key(verb: &str, item: bool) -> RoutingKey {
        build_key(KeyParts::new(verb, "widgets").identified(item)).unwrap()
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = ActionRegistry::new(ConventionNames);
        let registration = registry.register(widgets());

        assert_eq!(registration.registered, 3);
        assert!(registration.rejected.is_empty());
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.router_count(), 1);

        let op = registry.lookup(&key("DELETE", true)).unwrap();
        assert_eq!(op.method_name(), "remove");
        assert_eq!(op.router_id(), registration.id);
        assert!(op.action_name().ends_with("Widgets::remove"));
        assert!(registry.lookup(&key("DELETE", false)).is_none());
    }

    #[test]
    fn test_same_object_registers_once() {
        let registry = ActionRegistry::new(ConventionNames);
        let router = widgets();
        let first = registry.register(Arc::clone(&router));
        let second = registry.register(router);

        assert!(second.already_registered);
        assert_eq!(first.id, second.id);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_duplicate_keys_keep_first() {
        let registry = ActionRegistry::new(ConventionNames);
        let first = registry.register(widgets());
        let second = registry.register(widgets());

        assert_eq!(second.registered, 0);
        assert_eq!(second.rejected.len(), 3);
        assert!(second
            .rejected
            .iter()
            .all(|e| e.category() == ErrorCategory::DuplicateKey));
        assert_eq!(registry.rejections(), second.rejected);
        assert_eq!(registry.lookup(&key("GET", false)).unwrap().router_id(), first.id);
    }

    #[test]
    fn test_freed_keys_pass_to_waiting_duplicates() {
        let registry = ActionRegistry::new(ConventionNames);
        let first = widgets();
        let second = widgets();
        let third = widgets();
        registry.register(Arc::clone(&first));
        let second_id = registry.register(Arc::clone(&second)).id;
        let third_id = registry.register(Arc::clone(&third)).id;
        assert_eq!(registry.rejections().len(), 6);

        assert!(registry.on_router_removed(&first));
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.lookup(&key("GET", false)).unwrap().router_id(), second_id);
        assert_eq!(registry.allowed_verbs(&key("GET", false).shape()), vec!["GET", "POST"]);
        assert_eq!(registry.rejections().len(), 3);

        assert_eq!(registry.deregister(third_id), 0);
        assert!(registry.rejections().is_empty());

        assert_eq!(registry.deregister(second_id), 3);
        assert!(registry.is_empty());
        assert!(registry.lookup(&key("DELETE", true)).is_none());
    }

    #[test]
    fn test_waiting_duplicates_name_the_new_owner() {
        struct Gadgets;

        impl ActionRouter for Gadgets {
            fn resource(&self) -> &str {
                "widgets"
            }

            fn actions(self: Arc<Self>) -> Vec<ActionDescriptor> {
                vec![ActionDescriptor::new("all", ActionMarker::retrieve())
                    .invoker(|_| async { Ok(ActionOutput::new(())) })]
            }
        }

        let registry = ActionRegistry::new(ConventionNames);
        let first = widgets();
        registry.register(Arc::clone(&first));
        registry.register(Arc::new(Gadgets));
        registry.register(widgets());

        registry.on_router_removed(&first);

        let owner = registry.lookup(&key("GET", false)).unwrap();
        assert!(owner.action_name().ends_with("Gadgets::all"));
        let waiting: Vec<_> = registry
            .rejections()
            .into_iter()
            .filter_map(|e| match e {
                RegistrationError::DuplicateKey { key, existing, .. } if key == "GET /widgets" => {
                    Some(existing)
                }
                _ => None,
            })
            .collect();
        assert_eq!(waiting.len(), 1);
        assert!(waiting[0].ends_with("Gadgets::all"));
    }

    #[test]
    fn test_router_removal_reports_once() {
        let registry = Arc::new(ActionRegistry::new(ConventionNames));
        let router = widgets();
        registry.register(Arc::clone(&router));

        let removed: usize = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| registry.on_router_removed(&router)))
                .collect();
            handles
                .into_iter()
                .map(|h| usize::from(h.join().unwrap()))
                .sum()
        });
        assert_eq!(removed, 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_allowed_verbs() {
        let registry = ActionRegistry::new(ConventionNames);
        registry.register(widgets());

        assert_eq!(registry.allowed_verbs(&key("PATCH", false).shape()), vec!["GET", "POST"]);
        assert_eq!(registry.allowed_verbs(&key("PATCH", true).shape()), vec!["DELETE"]);
    }

    #[test]
    fn test_deregister_removes_owned_keys() {
        let registry = ActionRegistry::new(ConventionNames);
        let widgets_router = widgets();
        let gadgets: Arc<dyn ActionRouter> = Arc::new(Widgets { resource: "gadgets" });
        registry.on_router_added(Arc::clone(&widgets_router));
        registry.on_router_added(gadgets);

        assert!(registry.on_router_removed(&widgets_router));
        assert!(!registry.on_router_removed(&widgets_router));
        assert_eq!(registry.len(), 3);
        assert!(registry.lookup(&key("GET", false)).is_none());
        assert!(registry.allowed_verbs(&key("GET", false).shape()).is_empty());
        assert!(registry
            .routes()
            .iter()
            .all(|op| op.key().resource() == "gadgets"));
    }

    #[test]
    fn test_population_runs_once() {
        let registry = ActionRegistry::new(ConventionNames).with_source(|| vec![widgets()]);
        assert!(registry.is_empty());
        assert!(registry.ensure_initialized());
        assert!(!registry.ensure_initialized());
        assert_eq!(registry.population_passes(), 1);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_unresolved_capabilities() {
        let registry = ActionRegistry::new(ConventionNames);
        registry.register(widgets());

        let missing = registry.unresolved_capabilities(|_| false);
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].capability, TypeKey::of::<Tenant>());
        assert!(missing[0].action.ends_with("Widgets::create"));

        assert!(registry
            .unresolved_capabilities(|ty| *ty == TypeKey::of::<Tenant>())
            .is_empty());
    }
}
