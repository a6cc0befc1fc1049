//! Verb tunneling stage.
//!
//! Computes the request's [`TrueVerb`] and the [`TransportVerb`] the
//! transport routes on, and records both in the context.
//!
//! The true verb is the request method, unless the request is a POST that
//! carries the override header (`X-HTTP-Method-Override` by default), in
//! which case the header wins. Clients that can only emit standard methods
//! reach custom verbs this way:
//!
//! ```text
//! POST /widgets/42:publish            → true verb POST
//! POST /widgets/42 + override: GREET  → true verb GREET, transport "*"
//! GREET /widgets/42                   → true verb GREET, transport "*"
//! ```

use crate::context::MiddlewareContext;
use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response, ResponseExt};
use http::{HeaderName, Method, StatusCode};
use praxis_core::ErrorCategory;
use praxis_router::{TrueVerb, VerbError, VerbNormalizer};
use tracing::debug;

/// Default header carrying the true verb.
pub const OVERRIDE_HEADER: &str = "x-http-method-override";

/// Middleware that resolves the true and transport verbs.
#[derive(Debug, Clone)]
pub struct VerbTunnelMiddleware {
    normalizer: VerbNormalizer,
    override_header: Option<HeaderName>,
}

impl VerbTunnelMiddleware {
    /// Creates a stage over the standard vocabulary with the default
    /// override header.
    #[must_use]
    pub fn new() -> Self {
        Self {
            normalizer: VerbNormalizer::new(),
            override_header: Some(HeaderName::from_static(OVERRIDE_HEADER)),
        }
    }

    /// Replaces the transport vocabulary.
    #[must_use]
    pub fn with_normalizer(mut self, normalizer: VerbNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Sets or clears the override header.
    #[must_use]
    pub fn with_override_header(mut self, header: Option<HeaderName>) -> Self {
        self.override_header = header;
        self
    }

    /// Returns the normaliser.
    #[must_use]
    pub fn normalizer(&self) -> &VerbNormalizer {
        &self.normalizer
    }

    /// Resolves the true verb for a request.
    ///
    /// # Errors
    ///
    /// Returns a `VerbError` when the override header is not a valid method
    /// token.
    pub fn true_verb(&self, request: &Request) -> Result<TrueVerb, VerbError> {
        if *request.method() == Method::POST {
            if let Some(value) = self
                .override_header
                .as_ref()
                .and_then(|name| request.headers().get(name))
            {
                let raw = value.to_str().map_err(|_| {
                    VerbError::InvalidToken(String::from_utf8_lossy(value.as_bytes()).into_owned())
                })?;
                return TrueVerb::parse(raw);
            }
        }
        Ok(TrueVerb::from(request.method()))
    }
}

impl Default for VerbTunnelMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl Middleware for VerbTunnelMiddleware {
    fn name(&self) -> &'static str {
        "verb_tunnel"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let true_verb = match self.true_verb(&request) {
                Ok(verb) => verb,
                Err(e) => {
                    debug!(error = %e, "rejected verb override");
                    return Response::json_error(
                        StatusCode::BAD_REQUEST,
                        ErrorCategory::MalformedRequest.code(),
                        &format!("invalid verb override: {e}"),
                    );
                }
            };

            let transport = self.normalizer.normalize(&true_verb);
            if transport.is_tunneled() {
                debug!(verb = %true_verb, method = %request.method(), "tunneling custom verb");
            }
            ctx.set_verbs(true_verb, transport);

            next.run(ctx, request).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http_body_util::Full;
    use praxis_router::TransportVerb;

    fn request(method: &str, override_verb: Option<&str>) -> Request {
        let mut builder = http::Request::builder().method(method).uri("/widgets/42");
        if let Some(verb) = override_verb {
            builder = builder.header(OVERRIDE_HEADER, verb);
        }
        builder.body(Full::new(Bytes::new())).unwrap()
    }

    async fn run(stage: &VerbTunnelMiddleware, request: Request) -> (MiddlewareContext, Response) {
        let mut ctx = MiddlewareContext::new();
        let next = Next::endpoint(|_ctx, _req| Box::pin(async { Response::empty(StatusCode::OK) }));
        let response = stage.process(&mut ctx, request, next).await;
        (ctx, response)
    }

    #[tokio::test]
    async fn test_standard_verb_passes_through() {
        let (ctx, response) = run(&VerbTunnelMiddleware::new(), request("GET", None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(ctx.true_verb().map(TrueVerb::as_str), Some("GET"));
        assert_eq!(ctx.transport_verb(), Some(&TransportVerb::Standard(Method::GET)));
    }

    #[tokio::test]
    async fn test_custom_method_is_tunneled() {
        let (ctx, _) = run(&VerbTunnelMiddleware::new(), request("GREET", None)).await;
        assert_eq!(ctx.true_verb().map(TrueVerb::as_str), Some("GREET"));
        assert!(ctx.transport_verb().unwrap().is_tunneled());
    }

    #[tokio::test]
    async fn test_override_header_on_post() {
        let (ctx, _) = run(&VerbTunnelMiddleware::new(), request("POST", Some(" greet "))).await;
        assert_eq!(ctx.true_verb().map(TrueVerb::as_str), Some("GREET"));
        assert!(ctx.transport_verb().unwrap().is_tunneled());

        // A standard verb in the header is not tunneled.
        let (ctx, _) = run(&VerbTunnelMiddleware::new(), request("POST", Some("patch"))).await;
        assert_eq!(ctx.transport_verb(), Some(&TransportVerb::Standard(Method::PATCH)));
    }

    #[tokio::test]
    async fn test_override_header_ignored_off_post() {
        let (ctx, _) = run(&VerbTunnelMiddleware::new(), request("GET", Some("DELETE"))).await;
        assert_eq!(ctx.true_verb().map(TrueVerb::as_str), Some("GET"));
    }

    #[tokio::test]
    async fn test_override_header_disabled() {
        let stage = VerbTunnelMiddleware::new().with_override_header(None);
        let (ctx, _) = run(&stage, request("POST", Some("GREET"))).await;
        assert_eq!(ctx.true_verb().map(TrueVerb::as_str), Some("POST"));
    }

    #[tokio::test]
    async fn test_invalid_override_is_rejected() {
        let (ctx, response) = run(&VerbTunnelMiddleware::new(), request("POST", Some("NOT A VERB"))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(ctx.true_verb().is_none());
    }

    #[tokio::test]
    async fn test_narrow_vocabulary() {
        let stage = VerbTunnelMiddleware::new()
            .with_normalizer(VerbNormalizer::with_vocabulary(["GET", "POST"]).unwrap());
        let (ctx, _) = run(&stage, request("PATCH", None)).await;
        assert_eq!(ctx.true_verb().map(TrueVerb::as_str), Some("PATCH"));
        assert!(ctx.transport_verb().unwrap().is_tunneled());
    }
}
