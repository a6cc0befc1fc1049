//! # Praxis Middleware
//!
//! The HTTP edge of Praxis: a fixed-order pipeline that ends in action
//! dispatch.
//!
//! ```text
//! Request → RequestId → VerbTunnel → [extensions] → ActionEndpoint
//!                                                        ↓
//! Response ←──────── ResponseWriter / error envelope ────┘
//! ```
//!
//! | Stage | Middleware   | Purpose                                        |
//! |-------|--------------|------------------------------------------------|
//! | 1     | Request ID   | Generate or adopt a request ID (UUID v7)       |
//! | 2     | Verb tunnel  | Resolve the true verb and the transport verb   |
//! | 3..   | Extensions   | Caller-supplied stages, e.g. capability values |
//! | last  | Endpoint     | Read the body, dispatch, write the result      |
//!
//! ## Example
//!
//! ```
//! use praxis_middleware::Pipeline;
//!
//! let pipeline = Pipeline::builder().build();
//! assert_eq!(pipeline.stage_count(), 2);
//! ```

#![doc(html_root_url = "https://docs.rs/praxis-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod context;
pub mod endpoint;
pub mod middleware;
pub mod pipeline;
pub mod stages;
pub mod types;

pub use context::MiddlewareContext;
pub use endpoint::{ActionEndpoint, JsonWriter, ResponseWriter};
pub use middleware::{BoxFuture, Middleware, Next};
pub use pipeline::{BoxedMiddleware, Pipeline, PipelineBuilder};
pub use stages::{RequestIdMiddleware, VerbTunnelMiddleware, OVERRIDE_HEADER, REQUEST_ID_HEADER};
pub use types::{Request, Response, ResponseExt};
