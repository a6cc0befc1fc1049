//! Fixed-order request pipeline.
//!
//! ```text
//! Request → RequestId → VerbTunnel → [extensions] → ActionEndpoint
//! ```
//!
//! The two core stages always run first and in this order: every later
//! stage sees a request ID and the true verb. Extension stages (for example
//! one that authenticates the caller and offers the principal as a
//! capability) run in registration order after them.

use crate::context::MiddlewareContext;
use crate::endpoint::ActionEndpoint;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::stages::{RequestIdMiddleware, VerbTunnelMiddleware};
use crate::types::{Request, Response};
use std::sync::Arc;

/// A type-erased middleware that can be stored in a vector.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// The request pipeline.
///
/// # Example
///
/// ```
/// use praxis_middleware::Pipeline;
///
/// let pipeline = Pipeline::builder().build();
/// assert_eq!(pipeline.stage_names(), ["request_id", "verb_tunnel"]);
/// ```
pub struct Pipeline {
    stages: Vec<BoxedMiddleware>,
}

impl Pipeline {
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Runs a request through every stage, then `handler`.
    pub async fn process<H>(&self, mut ctx: MiddlewareContext, request: Request, handler: H) -> Response
    where
        H: FnOnce(&mut MiddlewareContext, Request) -> BoxFuture<'static, Response> + Send + 'static,
    {
        Next::new(&self.stages, handler).run(&mut ctx, request).await
    }

    /// Runs a request through every stage, then the action endpoint.
    pub async fn serve(&self, endpoint: &ActionEndpoint, request: Request) -> Response {
        let endpoint = endpoint.clone();
        self.process(MiddlewareContext::new(), request, move |ctx, request| {
            endpoint.handle(ctx, request)
        })
        .await
    }

    /// Returns the names of all stages in order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|mw| mw.name()).collect()
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .finish()
    }
}

/// Builder for constructing a [`Pipeline`].
///
/// The core stages can be configured but not removed or reordered.
pub struct PipelineBuilder {
    request_id: RequestIdMiddleware,
    verb_tunnel: VerbTunnelMiddleware,
    extensions: Vec<BoxedMiddleware>,
}

impl PipelineBuilder {
    /// Creates a builder with default core stages.
    #[must_use]
    pub fn new() -> Self {
        Self {
            request_id: RequestIdMiddleware::new(),
            verb_tunnel: VerbTunnelMiddleware::new(),
            extensions: Vec::new(),
        }
    }

    /// Configures the request ID stage.
    #[must_use]
    pub fn request_id(mut self, stage: RequestIdMiddleware) -> Self {
        self.request_id = stage;
        self
    }

    /// Configures the verb tunneling stage.
    #[must_use]
    pub fn verb_tunnel(mut self, stage: VerbTunnelMiddleware) -> Self {
        self.verb_tunnel = stage;
        self
    }

    /// Appends an extension stage.
    #[must_use]
    pub fn extension<M: Middleware>(mut self, middleware: M) -> Self {
        self.extensions.push(Arc::new(middleware));
        self
    }

    /// Builds the pipeline.
    #[must_use]
    pub fn build(self) -> Pipeline {
        let mut stages: Vec<BoxedMiddleware> =
            vec![Arc::new(self.request_id), Arc::new(self.verb_tunnel)];
        stages.extend(self.extensions);
        Pipeline { stages }
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
