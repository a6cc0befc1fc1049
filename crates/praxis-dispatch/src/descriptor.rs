//! Declarative action tables.
//!
//! A router describes its actions as a list of [`ActionDescriptor`]s: which
//! verb and name each method answers to, what each parameter is, and a bound
//! invoker that calls the method on the router instance. The
//! `#[actions]` attribute macro writes these tables; they can also be built
//! by hand.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use praxis_dispatch::{ActionDescriptor, ActionMarker, ActionOutput, ActionRouter, ParamDescriptor};
//!
//! struct Hello;
//!
//! impl ActionRouter for Hello {
//!     fn resource(&self) -> &str {
//!         "hello"
//!     }
//!
//!     fn actions(self: Arc<Self>) -> Vec<ActionDescriptor> {
//!         vec![ActionDescriptor::new("greet", ActionMarker::new("GREET"))
//!             .invoker(|_args| async { Ok(ActionOutput::new("hi".to_string())) })]
//!     }
//! }
//! ```

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use praxis_core::{DispatchError, TypeKey};

use crate::args::{ActionOutput, Arguments};

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The future an invoker returns.
pub type InvokeFuture = BoxFuture<'static, Result<ActionOutput, DispatchError>>;

/// A bound, type-erased call into one router method.
pub type Invoker = Arc<dyn Fn(Arguments) -> InvokeFuture + Send + Sync>;

/// The operation marker on a method: its verb and optional custom name.
///
/// Methods without a marker are not actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionMarker {
    verb: String,
    name: Option<String>,
}

impl ActionMarker {
    /// A generic marker with an explicit verb.
    #[must_use]
    pub fn new(verb: impl Into<String>) -> Self {
        Self {
            verb: verb.into(),
            name: None,
        }
    }

    /// GET alias.
    #[must_use]
    pub fn retrieve() -> Self {
        Self::new("GET")
    }

    /// POST alias.
    #[must_use]
    pub fn create() -> Self {
        Self::new("POST")
    }

    /// PUT alias.
    #[must_use]
    pub fn update() -> Self {
        Self::new("PUT")
    }

    /// DELETE alias.
    #[must_use]
    pub fn remove() -> Self {
        Self::new("DELETE")
    }

    /// Sets the custom action name.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Returns the declared verb, as written.
    #[must_use]
    pub fn verb(&self) -> &str {
        &self.verb
    }

    /// Returns the declared custom name, as written.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// What a method parameter is bound from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// The routed resource's identifier.
    Id,
    /// The parent resource's identifier, typed so the parent name can be resolved.
    ParentId(TypeKey),
    /// The request body.
    Body,
    /// A capability looked up by declared type.
    Capability(TypeKey),
}

/// One declared method parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamDescriptor {
    name: &'static str,
    kind: ParamKind,
}

impl ParamDescriptor {
    /// An item identifier parameter.
    #[must_use]
    pub fn id(name: &'static str) -> Self {
        Self {
            name,
            kind: ParamKind::Id,
        }
    }

    /// A parent identifier parameter of type `T`.
    #[must_use]
    pub fn parent_id<T: 'static>(name: &'static str) -> Self {
        Self {
            name,
            kind: ParamKind::ParentId(TypeKey::of::<T>()),
        }
    }

    /// A body parameter.
    #[must_use]
    pub fn body(name: &'static str) -> Self {
        Self {
            name,
            kind: ParamKind::Body,
        }
    }

    /// A capability parameter of type `T`.
    #[must_use]
    pub fn capability<T: 'static>(name: &'static str) -> Self {
        Self {
            name,
            kind: ParamKind::Capability(TypeKey::of::<T>()),
        }
    }

    /// Returns the parameter name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the parameter kind.
    #[must_use]
    pub fn kind(&self) -> &ParamKind {
        &self.kind
    }
}

/// One method of a router, as seen by introspection.
#[derive(Clone)]
pub struct ActionDescriptor {
    method: &'static str,
    marker: Option<ActionMarker>,
    params: Vec<ParamDescriptor>,
    invoker: Option<Invoker>,
}

impl ActionDescriptor {
    /// Describes a method. Pass `None` for a method that is not an action.
    #[must_use]
    pub fn new(method: &'static str, marker: impl Into<Option<ActionMarker>>) -> Self {
        Self {
            method,
            marker: marker.into(),
            params: Vec::new(),
            invoker: None,
        }
    }

    /// Appends a parameter.
    #[must_use]
    pub fn param(mut self, param: ParamDescriptor) -> Self {
        self.params.push(param);
        self
    }

    /// Sets the bound invoker.
    #[must_use]
    pub fn invoker<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ActionOutput, DispatchError>> + Send + 'static,
    {
        self.invoker = Some(Arc::new(move |args| Box::pin(f(args)) as InvokeFuture));
        self
    }

    /// Returns the method name.
    #[must_use]
    pub fn method(&self) -> &'static str {
        self.method
    }

    /// Returns the operation marker, if the method has one.
    #[must_use]
    pub fn marker(&self) -> Option<&ActionMarker> {
        self.marker.as_ref()
    }

    /// Returns the parameters in declaration order.
    #[must_use]
    pub fn params(&self) -> &[ParamDescriptor] {
        &self.params
    }

    pub(crate) fn bound_invoker(&self) -> Option<Invoker> {
        self.invoker.clone()
    }
}

impl fmt::Debug for ActionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionDescriptor")
            .field("method", &self.method)
            .field("marker", &self.marker)
            .field("params", &self.params)
            .field("has_invoker", &self.invoker.is_some())
            .finish()
    }
}

/// A router object whose actions can be registered.
pub trait ActionRouter: Send + Sync + 'static {
    /// The routing name of the resource this router serves.
    fn resource(&self) -> &str;

    /// The router's action table. Invokers capture the `Arc`.
    fn actions(self: Arc<Self>) -> Vec<ActionDescriptor>;

    /// A name for diagnostics.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
