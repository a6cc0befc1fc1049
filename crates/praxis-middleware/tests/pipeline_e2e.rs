//! End-to-end pipeline tests: HTTP request in, HTTP response out.
//!
//! ```text
//! RequestId → VerbTunnel → Authenticate (extension) → ActionEndpoint
//! ```

use std::sync::Arc;

use bytes::Bytes;
use http::header::{ALLOW, CONTENT_TYPE};
use http::{Request as HttpRequest, StatusCode};
use http_body_util::{BodyExt, Full};
use praxis_core::{ConventionNames, Json};
use praxis_dispatch::{
    ActionDescriptor, ActionMarker, ActionOutput, ActionRegistry, ActionRouter, Arguments,
    Dispatcher, ParamDescriptor,
};
use praxis_extract::{CapabilitySuppliers, Pagination, PaginationSettings};
use praxis_middleware::{
    ActionEndpoint, BoxFuture, Middleware, MiddlewareContext, Next, Pipeline, Request, Response,
    REQUEST_ID_HEADER,
};
use serde_json::{json, Value};

#[derive(Debug, Clone)]
struct Principal(String);

/// Offers the caller named in `x-user` as a [`Principal`] capability.
struct Authenticate;

impl Middleware for Authenticate {
    fn name(&self) -> &'static str {
        "authenticate"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut MiddlewareContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            if let Some(user) = request.headers().get("x-user").and_then(|v| v.to_str().ok()) {
                ctx.capabilities_mut().insert(Principal(user.to_string()));
            }
            next.run(ctx, request).await
        })
    }
}

struct Widgets;

impl ActionRouter for Widgets {
    fn resource(&self) -> &str {
        "widgets"
    }

    fn actions(self: Arc<Self>) -> Vec<ActionDescriptor> {
        vec![
            ActionDescriptor::new("list", ActionMarker::retrieve())
                .param(ParamDescriptor::capability::<Pagination>("page"))
                .invoker(|args: Arguments| async move {
                    let page: Pagination = args.capability(0)?;
                    Ok(ActionOutput::new(json!({
                        "page": page.page,
                        "per_page": page.per_page,
                    })))
                }),
            ActionDescriptor::new("get", ActionMarker::retrieve())
                .param(ParamDescriptor::id("id"))
                .invoker(|args: Arguments| async move {
                    let id: u64 = args.identifier(0)?;
                    Ok(ActionOutput::new(json!({ "id": id })))
                }),
            ActionDescriptor::new("create", ActionMarker::create())
                .param(ParamDescriptor::body("widget"))
                .param(ParamDescriptor::capability::<Principal>("caller"))
                .invoker(|args: Arguments| async move {
                    let Json(mut widget): Json<Value> = args.body(0)?;
                    let caller: Principal = args.capability(1)?;
                    widget["owner"] = Value::String(caller.0);
                    Ok(ActionOutput::new(widget))
                }),
            ActionDescriptor::new("remove", ActionMarker::remove())
                .param(ParamDescriptor::id("id"))
                .invoker(|args: Arguments| async move {
                    let _id: u64 = args.identifier(0)?;
                    Ok(ActionOutput::new(()))
                }),
            ActionDescriptor::new("publish", ActionMarker::new("POST").named("publish"))
                .param(ParamDescriptor::id("id"))
                .invoker(|args: Arguments| async move {
                    let id: u64 = args.identifier(0)?;
                    Ok(ActionOutput::new(json!({ "published": id })))
                }),
        ]
    }
}

struct Hello;

impl ActionRouter for Hello {
    fn resource(&self) -> &str {
        "hello"
    }

    fn actions(self: Arc<Self>) -> Vec<ActionDescriptor> {
        vec![ActionDescriptor::new("greet", ActionMarker::new("GREET"))
            .invoker(|_| async { Ok(ActionOutput::new(json!("hello!"))) })]
    }
}

fn service() -> (Pipeline, ActionEndpoint) {
    let registry = Arc::new(ActionRegistry::new(ConventionNames).with_source(|| {
        vec![
            Arc::new(Widgets) as Arc<dyn ActionRouter>,
            Arc::new(Hello) as Arc<dyn ActionRouter>,
        ]
    }));
    let suppliers = Arc::new(CapabilitySuppliers::with_standard(PaginationSettings::default()));
    let endpoint = ActionEndpoint::new(Dispatcher::new(registry), suppliers);
    let pipeline = Pipeline::builder().extension(Authenticate).build();
    (pipeline, endpoint)
}

fn request(method: &str, uri: &str) -> http::request::Builder {
    HttpRequest::builder().method(method).uri(uri)
}

fn empty(builder: http::request::Builder) -> Request {
    builder.body(Full::new(Bytes::new())).unwrap()
}

async fn send(request: Request) -> Response {
    let (pipeline, endpoint) = service();
    pipeline.serve(&endpoint, request).await
}

async fn json_body(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_retrieve_item() {
    let response = send(empty(request("GET", "/widgets/42"))).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key(REQUEST_ID_HEADER));
    assert_eq!(response.headers().get(CONTENT_TYPE).unwrap(), "application/json");
    assert_eq!(json_body(response).await, json!({ "id": 42 }));
}

#[tokio::test]
async fn test_pagination_capability_is_clamped() {
    let response = send(empty(request("GET", "/widgets?page=2&per_page=500"))).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({ "page": 2, "per_page": 100 }));
}

#[tokio::test]
async fn test_bad_pagination_is_malformed() {
    let response = send(empty(request("GET", "/widgets?page=0"))).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"]["code"], "MALFORMED_REQUEST");
}

#[tokio::test]
async fn test_create_with_body_and_extension_capability() {
    let request = request("POST", "/widgets")
        .header(CONTENT_TYPE, "application/json")
        .header("x-user", "alice")
        .body(Full::new(Bytes::from_static(br#"{"name":"sprocket"}"#)))
        .unwrap();

    let response = send(request).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({ "name": "sprocket", "owner": "alice" })
    );
}

#[tokio::test]
async fn test_missing_capability_value_is_reported() {
    // No `x-user`: the Principal has no value and no supplier.
    let request = request("POST", "/widgets")
        .header(CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from_static(br#"{"name":"sprocket"}"#)))
        .unwrap();

    let response = send(request).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(response).await["error"]["code"], "PROVIDER_UNRESOLVED");
}

#[tokio::test]
async fn test_invalid_json_body() {
    let request = request("POST", "/widgets")
        .header(CONTENT_TYPE, "application/json")
        .header("x-user", "alice")
        .body(Full::new(Bytes::from_static(b"{not json")))
        .unwrap();

    let response = send(request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"]["code"], "MALFORMED_REQUEST");
}

#[tokio::test]
async fn test_unit_result_is_no_content() {
    let response = send(empty(request("DELETE", "/widgets/7"))).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_custom_action_segment() {
    let response = send(empty(request("POST", "/widgets/42:publish"))).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({ "published": 42 }));
}

#[tokio::test]
async fn test_custom_verb_as_method() {
    let response = send(empty(request("GREET", "/hello"))).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!("hello!"));
}

#[tokio::test]
async fn test_custom_verb_tunneled_through_post() {
    let response = send(empty(
        request("POST", "/hello").header("x-http-method-override", "greet"),
    ))
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!("hello!"));
}

#[tokio::test]
async fn test_method_not_allowed_lists_verbs() {
    let response = send(empty(request("PUT", "/widgets/1"))).await;

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    let allow = response.headers().get(ALLOW).unwrap().to_str().unwrap().to_string();
    assert!(allow.contains("GET"));
    assert!(allow.contains("DELETE"));
    assert!(!allow.contains("PUT"));

    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "METHOD_NOT_ALLOWED");
}

#[tokio::test]
async fn test_not_found_envelope_carries_request_id() {
    let response = send(empty(request("GET", "/gadgets"))).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let header = response
        .headers()
        .get(REQUEST_ID_HEADER)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();

    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "NOT_FOUND");
    assert_eq!(body["request_id"], Value::String(header));
}

#[tokio::test]
async fn test_concurrent_first_requests_share_one_population() {
    let (pipeline, endpoint) = service();
    let pipeline = Arc::new(pipeline);

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let pipeline = Arc::clone(&pipeline);
            let endpoint = endpoint.clone();
            tokio::spawn(async move {
                let uri = format!("/widgets/{i}");
                pipeline.serve(&endpoint, empty(request("GET", &uri))).await
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().status(), StatusCode::OK);
    }
    assert_eq!(endpoint.dispatcher().registry().population_passes(), 1);
}
