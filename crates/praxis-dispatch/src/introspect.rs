//! Action introspection.
//!
//! Turns a router's action table into `(RoutingKey, ParameterPlan, Invoker)`
//! triples. Each method is handled on its own: a bad declaration is reported
//! and skipped without affecting the router's other methods.

use std::sync::Arc;

use praxis_core::{NameResolver, RegistrationError, TypeKey};
use praxis_router::{build_key, KeyParts, RoutingKey};
use tracing::debug;

use crate::descriptor::{ActionDescriptor, ActionRouter, Invoker, ParamKind};
use crate::plan::ParameterPlan;

/// One introspected action.
#[derive(Clone)]
pub struct IntrospectedAction {
    /// The computed routing key.
    pub key: RoutingKey,
    /// The binding plan.
    pub plan: ParameterPlan,
    /// The bound invoker.
    pub invoker: Invoker,
    /// The method the action was declared on.
    pub method: &'static str,
}

impl std::fmt::Debug for IntrospectedAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntrospectedAction")
            .field("key", &self.key)
            .field("plan", &self.plan)
            .field("method", &self.method)
            .finish_non_exhaustive()
    }
}

/// The result of introspecting one router.
#[derive(Debug, Default)]
pub struct Introspection {
    /// Actions ready for registration, in declaration order.
    pub actions: Vec<IntrospectedAction>,
    /// Per-method failures.
    pub failures: Vec<RegistrationError>,
    /// Methods without an operation marker.
    pub skipped: usize,
}

/// Builds routing keys and plans from action declarations.
pub struct ActionIntrospector<'a> {
    names: &'a dyn NameResolver,
}

impl<'a> ActionIntrospector<'a> {
    /// Creates an introspector that resolves parent names through `names`.
    #[must_use]
    pub fn new(names: &'a dyn NameResolver) -> Self {
        Self { names }
    }

    /// Introspects every method of a router.
    pub fn introspect(&self, router: Arc<dyn ActionRouter>) -> Introspection {
        let router_name = router.name();
        let resource = router.resource().to_string();
        let mut result = Introspection::default();

        for descriptor in router.actions() {
            match self.introspect_action(router_name, &resource, &descriptor) {
                Ok(Some(action)) => result.actions.push(action),
                Ok(None) => result.skipped += 1,
                Err(error) => result.failures.push(error),
            }
        }

        result
    }

    /// Introspects one method. Returns `Ok(None)` for unmarked methods.
    pub fn introspect_action(
        &self,
        router_name: &str,
        resource: &str,
        descriptor: &ActionDescriptor,
    ) -> Result<Option<IntrospectedAction>, RegistrationError> {
        let Some(marker) = descriptor.marker() else {
            return Ok(None);
        };
        let action = format!("{router_name}::{}", descriptor.method());
        let params = descriptor.params();

        let id_count = params.iter().filter(|p| matches!(p.kind(), ParamKind::Id)).count();
        let parents: Vec<TypeKey> = params
            .iter()
            .filter_map(|p| match p.kind() {
                ParamKind::ParentId(ty) => Some(*ty),
                _ => None,
            })
            .collect();

        if id_count > 1 {
            return Err(RegistrationError::invalid(action, "more than one id parameter"));
        }
        if parents.len() > 1 {
            return Err(RegistrationError::invalid(action, "more than one parent id parameter"));
        }

        let parent = match parents.first() {
            Some(ty) => Some(self.names.resource_name(ty).ok_or_else(|| {
                RegistrationError::invalid(
                    action.clone(),
                    format!("no resource name for parent id type {ty}"),
                )
            })?),
            None => None,
        };

        if parent.is_some() && id_count == 1 {
            debug!(
                action = %action,
                parent = parent.as_deref().unwrap_or_default(),
                "action has both parent id and id parameters; keyed as nested"
            );
        }

        let key = build_key(
            KeyParts::new(marker.verb(), resource)
                .identified(id_count == 1)
                .parent(parent.as_deref())
                .custom_name(marker.name()),
        )
        .map_err(|e| RegistrationError::invalid(action.clone(), e.to_string()))?;

        let invoker = descriptor
            .bound_invoker()
            .ok_or_else(|| RegistrationError::invalid(action.clone(), "no invoker bound"))?;

        Ok(Some(IntrospectedAction {
            key,
            plan: ParameterPlan::from_params(params),
            invoker,
            method: descriptor.method(),
        }))
    }
}
