//! The stage trait and the continuation handed to each stage.
//!
//! A stage sees the request before the action endpoint and the response
//! after it. Dropping [`Next`] without running it answers the request with
//! the stage's own response.
//!
//! # Example
//!
//! ```
//! use praxis_middleware::{BoxFuture, Middleware, MiddlewareContext, Next, Request, Response};
//!
//! struct Audit;
//!
//! impl Middleware for Audit {
//!     fn name(&self) -> &'static str {
//!         "audit"
//!     }
//!
//!     fn process<'a>(
//!         &'a self,
//!         ctx: &'a mut MiddlewareContext,
//!         request: Request,
//!         next: Next<'a>,
//!     ) -> BoxFuture<'a, Response> {
//!         Box::pin(async move {
//!             let response = next.run(ctx, request).await;
//!             tracing::info!(request_id = %ctx.request_id(), status = %response.status(), "served");
//!             response
//!         })
//!     }
//! }
//! ```

use crate::context::MiddlewareContext;
use crate::pipeline::BoxedMiddleware;
use crate::types::{Request, Response};
use std::future::Future;
use std::pin::Pin;

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

type Endpoint<'a> =
    Box<dyn FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response> + Send + 'a>;

/// One pipeline stage.
pub trait Middleware: Send + Sync + 'static {
    /// Stage name, as listed by [`Pipeline::stage_names`](crate::Pipeline::stage_names).
    fn name(&self) -> &'static str;

    /// Handles the request, usually by running `next`.
    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response>;
}

/// The rest of the pipeline: the stages still to run, then the endpoint.
///
/// `run` consumes the value, so a stage continues the request at most once.
pub struct Next<'a> {
    stages: &'a [BoxedMiddleware],
    endpoint: Endpoint<'a>,
}

impl<'a> Next<'a> {
    /// Continuation that runs `stages` in order and then `endpoint`.
    pub(crate) fn new<F>(stages: &'a [BoxedMiddleware], endpoint: F) -> Self
    where
        F: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response> + Send + 'a,
    {
        Self {
            stages,
            endpoint: Box::new(endpoint),
        }
    }

    /// Continuation that goes straight to `endpoint`.
    pub(crate) fn endpoint<F>(endpoint: F) -> Self
    where
        F: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response> + Send + 'a,
    {
        Self::new(&[], endpoint)
    }

    /// Number of stages that have not run yet.
    pub fn remaining(&self) -> usize {
        self.stages.len()
    }

    /// Runs the next stage, or the endpoint once every stage has run.
    pub async fn run(self, ctx: &mut MiddlewareContext, request: Request) -> Response {
        match self.stages.split_first() {
            Some((stage, rest)) => {
                let next = Next {
                    stages: rest,
                    endpoint: self.endpoint,
                };
                stage.process(ctx, request, next).await
            }
            None => (self.endpoint)(ctx, request).await,
        }
    }
}
