//! Core pipeline stages.
//!
//! 1. [`request_id`] - Generate or adopt the request ID
//! 2. [`verb_tunnel`] - Resolve the true verb and its transport form

pub mod request_id;
pub mod verb_tunnel;

pub use request_id::{RequestIdMiddleware, REQUEST_ID_HEADER};
pub use verb_tunnel::{VerbTunnelMiddleware, OVERRIDE_HEADER};
