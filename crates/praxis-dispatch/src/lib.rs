//! # Praxis Dispatch
//!
//! Action discovery and dispatch.
//!
//! - [`ActionRouter`] / [`ActionDescriptor`] - a router's declarative action table
//! - [`ActionIntrospector`] - turns the table into keys, plans and invokers
//! - [`ActionRegistry`] - the shared key to operation map, populated once via
//!   [`LazyInitializer`]
//! - [`Dispatcher`] - key building, lookup, argument binding and invocation
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use praxis_core::ConventionNames;
//! use praxis_dispatch::{
//!     ActionDescriptor, ActionMarker, ActionOutput, ActionRegistry, ActionRequest, ActionRouter,
//!     Dispatcher, ParamDescriptor,
//! };
//!
//! struct Widgets;
//!
//! impl ActionRouter for Widgets {
//!     fn resource(&self) -> &str {
//!         "widgets"
//!     }
//!
//!     fn actions(self: Arc<Self>) -> Vec<ActionDescriptor> {
//!         vec![ActionDescriptor::new("get", ActionMarker::retrieve())
//!             .param(ParamDescriptor::id("id"))
//!             .invoker(|args| async move {
//!                 let id: u64 = args.identifier(0)?;
//!                 Ok(ActionOutput::new(id * 2))
//!             })]
//!     }
//! }
//!
//! # tokio_test::block_on(async {
//! let registry = Arc::new(
//!     ActionRegistry::new(ConventionNames)
//!         .with_source(|| vec![Arc::new(Widgets) as Arc<dyn ActionRouter>]),
//! );
//! let dispatcher = Dispatcher::new(registry);
//!
//! let output = dispatcher
//!     .dispatch(ActionRequest::new("GET", "/widgets/21"))
//!     .await
//!     .unwrap();
//! assert_eq!(output.downcast::<u64>().ok(), Some(42));
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/praxis-dispatch/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod args;
mod descriptor;
mod dispatcher;
mod init;
mod introspect;
mod plan;
mod registry;
mod returned;

pub use args::{ActionOutput, Argument, Arguments};
pub use praxis_core::{Body, DispatchError, Json};
pub use descriptor::{
    ActionDescriptor, ActionMarker, ActionRouter, BoxFuture, InvokeFuture, Invoker, ParamDescriptor,
    ParamKind,
};
pub use dispatcher::{ActionRequest, Dispatcher};
pub use init::LazyInitializer;
pub use introspect::{ActionIntrospector, IntrospectedAction, Introspection};
pub use plan::{ParameterPlan, Slot};

#[doc(hidden)]
pub mod __private {
    pub use crate::returned::{FallibleReturn, PlainReturn, Returned};
}

pub use registry::{
    ActionRegistry, RegisteredOperation, RouterId, RouterRegistration, RouterSource,
    UnresolvedCapability,
};
