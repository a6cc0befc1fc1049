//! Procedural macros for Praxis action routers.
//!
//! The `#[actions]` attribute turns an inherent impl block into an
//! `ActionRouter`: every method becomes an entry in the router's action
//! table, and every marked method gets a generated invoker.
//!
//! # Example
//!
//! ```rust,ignore
//! use praxis_core::DispatchResult;
//! use praxis_dispatch::Json;
//! use praxis_macros::actions;
//! use serde_json::{json, Value};
//!
//! struct Widgets;
//!
//! #[actions(resource = "widgets")]
//! impl Widgets {
//!     #[retrieve]
//!     async fn list(&self) -> Value {
//!         json!(["cog"])
//!     }
//!
//!     #[retrieve]
//!     async fn get(&self, #[id] id: u64) -> DispatchResult<Value> {
//!         self.find(id)
//!     }
//!
//!     #[action(verb = "POST", name = "archive")]
//!     async fn archive(&self, #[id] id: u64, #[body] Json(reason): Json<Reason>) {}
//! }
//! ```
//!
//! # Markers
//!
//! | Attribute | Verb |
//! |---|---|
//! | `#[retrieve]` | `GET` |
//! | `#[create]` | `POST` |
//! | `#[update]` | `PUT` |
//! | `#[remove]` | `DELETE` |
//! | `#[action(verb = "...")]` | any token |
//!
//! Each marker takes an optional `name = "..."` for a custom action segment.
//!
//! # Return values
//!
//! Any `Result<T, E>` (aliases such as `DispatchResult<T>` included) fails the
//! dispatch with its `Err`; a `DispatchError` keeps its category, anything
//! else becomes `INVOCATION_FAILURE`. Every other type is the action's output.
//! The default JSON writer renders `serde_json::Value` and `()`.
//!
//! # Parameters
//!
//! - `#[id]` binds the item identifier of the request path
//! - `#[parent_id]` binds the parent identifier; the parameter type names the
//!   parent resource
//! - `#[body]` binds the request body
//! - anything else is supplied by a capability provider keyed by its type

mod actions;
mod parse;

use proc_macro::TokenStream;

/// Declares the action table of a router.
///
/// # Attributes
///
/// - `resource`: the router's resource name (required)
/// - `crate`: path to the dispatch crate in generated code, defaults to
///   `::praxis_dispatch`; use `"::praxis::dispatch"` through the facade
///
/// # Generated Code
///
/// The macro generates approximately:
///
/// ```rust,ignore
/// impl ActionRouter for Widgets {
///     fn resource(&self) -> &str { "widgets" }
///
///     fn actions(self: Arc<Self>) -> Vec<ActionDescriptor> {
///         vec![{
///             let __router = Arc::clone(&self);
///             ActionDescriptor::new("get", ActionMarker::new("GET"))
///                 .param(ParamDescriptor::id("id"))
///                 .invoker(move |__args: Arguments| {
///                     let __router = Arc::clone(&__router);
///                     async move {
///                         let __arg0: u64 = __args.identifier::<u64>(0)?;
///                         let __output = __router.get(__arg0).await;
///                         (&Returned::new(__output)).into_action_result()
///                     }
///                 })
///         }]
///     }
/// }
/// ```
#[proc_macro_attribute]
pub fn actions(attr: TokenStream, item: TokenStream) -> TokenStream {
    actions::expand_actions(attr.into(), item.into())
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
