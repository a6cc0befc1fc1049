//! The terminal pipeline stage: dispatch to an action and write the result.
//!
//! ```text
//! Request ──► Body (JSON value / bytes / empty)
//!         ──► RequestCapabilities (context values, then suppliers)
//!         ──► Dispatcher::dispatch(true verb, path)
//!         ──► ResponseWriter  or  error envelope (+ Allow on 405)
//! ```

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use http::header::{HeaderValue, ALLOW, CONTENT_TYPE};
use http::StatusCode;
use http_body_util::BodyExt;
use praxis_core::{Body, DispatchError};
use praxis_dispatch::{ActionOutput, ActionRequest, Dispatcher};
use praxis_extract::{CapabilitySuppliers, RequestParts};
use praxis_router::TrueVerb;
use praxis_telemetry::metrics::{outcome_label, record_dispatch};
use praxis_telemetry::InFlightGuard;
use tracing::{debug, error};
use uuid::Uuid;

use crate::context::MiddlewareContext;
use crate::middleware::BoxFuture;
use crate::types::{Request, Response, ResponseExt};

/// Renders action results as HTTP responses.
pub trait ResponseWriter: Send + Sync + 'static {
    /// Writes a successful action result.
    fn write(&self, output: ActionOutput) -> Response;
}

/// The default writer.
///
/// | Output | Response |
/// |---|---|
/// | `serde_json::Value` | 200, JSON |
/// | `()` | 204 |
/// | anything else | 500, "unrepresentable result" |
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonWriter;

impl ResponseWriter for JsonWriter {
    fn write(&self, output: ActionOutput) -> Response {
        let output = match output.downcast::<serde_json::Value>() {
            Ok(value) => return Response::json(StatusCode::OK, &value),
            Err(output) => output,
        };
        if output.is::<()>() {
            return Response::empty(StatusCode::NO_CONTENT);
        }

        error!(output = output.type_name(), "action result has no JSON representation");
        Response::json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "UNREPRESENTABLE_RESULT",
            "unrepresentable result",
        )
    }
}

/// Dispatches requests that reached the end of the pipeline.
#[derive(Clone)]
pub struct ActionEndpoint {
    dispatcher: Dispatcher,
    suppliers: Arc<CapabilitySuppliers>,
    writer: Arc<dyn ResponseWriter>,
}

impl ActionEndpoint {
    /// Creates an endpoint with the [`JsonWriter`].
    #[must_use]
    pub fn new(dispatcher: Dispatcher, suppliers: Arc<CapabilitySuppliers>) -> Self {
        Self {
            dispatcher,
            suppliers,
            writer: Arc::new(JsonWriter),
        }
    }

    /// Replaces the response writer.
    #[must_use]
    pub fn with_writer(mut self, writer: Arc<dyn ResponseWriter>) -> Self {
        self.writer = writer;
        self
    }

    /// Returns the dispatcher.
    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Handles one request.
    ///
    /// Reads the true verb and capability values the earlier stages left in
    /// `ctx`; without a tunneling stage the request method is the true verb.
    pub fn handle(&self, ctx: &mut MiddlewareContext, request: Request) -> BoxFuture<'static, Response> {
        let endpoint = self.clone();
        let verb = ctx
            .true_verb()
            .cloned()
            .unwrap_or_else(|| TrueVerb::from(request.method()));
        let request_id = ctx.request_id();
        let values = ctx.take_capabilities();

        Box::pin(async move {
            let (parts, body) = request.into_parts();
            let path = parts.uri.path().to_string();

            let body = match read_body(&parts.headers, body).await {
                Ok(body) => body,
                Err(e) => return error_response(&e, request_id),
            };

            let capabilities = endpoint
                .suppliers
                .for_request(RequestParts::new(parts.method, parts.uri, parts.headers))
                .with_values(values);
            let action_request = ActionRequest::new(verb.as_str(), path.as_str())
                .body(body)
                .capabilities(Arc::new(capabilities));

            let _in_flight = InFlightGuard::new();
            let start = Instant::now();
            let result = endpoint.dispatcher.dispatch(action_request).await;
            let outcome = outcome_label(result.as_ref().err().map(DispatchError::category));
            record_dispatch(verb.as_str(), outcome, start.elapsed());

            match result {
                Ok(output) => {
                    debug!(verb = %verb, path = %path, outcome, "action completed");
                    endpoint.writer.write(output)
                }
                Err(e) => {
                    if e.is_caller_fault() {
                        debug!(verb = %verb, path = %path, outcome, error = %e, "request rejected");
                    } else {
                        error!(verb = %verb, path = %path, outcome, error = ?e, "action failed");
                    }
                    error_response(&e, request_id)
                }
            }
        })
    }
}

impl std::fmt::Debug for ActionEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionEndpoint")
            .field("dispatcher", &self.dispatcher)
            .field("suppliers", &self.suppliers)
            .finish_non_exhaustive()
    }
}

/// Renders a dispatch error as its JSON envelope.
fn error_response(error: &DispatchError, request_id: Uuid) -> Response {
    let envelope = error.to_envelope(Some(&request_id.to_string()));
    let body = serde_json::to_value(&envelope).unwrap_or_default();
    let mut response = Response::json(error.status_code(), &body);

    if let Some(allowed) = error.allowed_verbs() {
        if let Ok(value) = HeaderValue::from_str(&allowed.join(", ")) {
            response.headers_mut().insert(ALLOW, value);
        }
    }
    response
}

fn is_json(headers: &http::HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|mime| {
            let mime = mime.trim().to_ascii_lowercase();
            mime == "application/json" || mime.ends_with("+json")
        })
        .unwrap_or(false)
}

async fn read_body(
    headers: &http::HeaderMap,
    body: http_body_util::Full<Bytes>,
) -> Result<Body, DispatchError> {
    let bytes = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(never) => match never {},
    };
    if bytes.is_empty() {
        return Ok(Body::empty());
    }
    if is_json(headers) {
        let value: serde_json::Value = serde_json::from_slice(&bytes)
            .map_err(|e| DispatchError::malformed(format!("invalid JSON body: {e}")))?;
        return Ok(Body::new(value));
    }
    Ok(Body::new(bytes))
}
