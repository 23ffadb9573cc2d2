//! API Integration Tests
//!
//! The router is driven in-process with `tower::ServiceExt::oneshot`; the
//! entity linker is an in-memory fake, so nothing here touches the network.
//!
//! Author: hephaex@gmail.com

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use spotlink_api::{create_router, state::AppState};
use spotlink_core::{AnnotationConfig, AppConfig};
use spotlink_extractor::AnnotationPipeline;
use spotlink_linker::tokenizer::tokenize;
use spotlink_linker::{EntityLinker, LinkerEntity, LinkerError, LinkerOutput, RetryPolicy};
use tower::ServiceExt;

/// Links every token spelled "Bob" to the same person
struct BobLinker;

#[async_trait]
impl EntityLinker for BobLinker {
    async fn link(&self, text: &str) -> Result<LinkerOutput, LinkerError> {
        let tokens = tokenize(text);
        let entities = tokens
            .iter()
            .enumerate()
            .filter(|(_, t)| t.text == "Bob")
            .map(|(i, _)| LinkerEntity {
                start: i,
                end: i + 1,
                raw_types: Some("DBpedia:Agent,DBpedia:Person".to_string()),
                kb_id: "http://dbpedia.org/resource/Bob".to_string(),
            })
            .collect();
        Ok(LinkerOutput { tokens, entities })
    }
}

struct DownLinker;

#[async_trait]
impl EntityLinker for DownLinker {
    async fn link(&self, _text: &str) -> Result<LinkerOutput, LinkerError> {
        Err(LinkerError::Transient("connection refused".to_string()))
    }
}

fn create_test_app(linker: Arc<dyn EntityLinker>) -> Router {
    let pipeline = AnnotationPipeline::new(linker, AnnotationConfig::default())
        .with_retry(RetryPolicy::no_retry());
    create_router(Arc::new(AppState::new(AppConfig::default(), pipeline)))
}

fn mmif_with_document(properties: Value) -> Value {
    json!({
        "metadata": {"mmif": "http://mmif.clams.ai/0.4.0"},
        "documents": [{
            "@type": "http://mmif.clams.ai/0.4.0/vocabulary/TextDocument",
            "properties": properties
        }],
        "views": []
    })
}

fn create_post_request(uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(body.into())
        .unwrap()
}

fn create_get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

// =============================================================================
// Metadata and Health
// =============================================================================

#[tokio::test]
async fn test_health_check() {
    let app = create_test_app(Arc::new(BobLinker));

    let response = app.oneshot(create_get_request("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
    assert_eq!(json["total_requests"], 0);
}

#[tokio::test]
async fn test_app_metadata() {
    let app = create_test_app(Arc::new(BobLinker));

    let response = app.oneshot(create_get_request("/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["identifier"], "https://apps.clams.ai/dbpedia_spotlight");
    assert_eq!(json["input"].as_array().unwrap().len(), 1);
    assert_eq!(
        json["output"][0]["@type"],
        "http://vocab.lappsgrid.org/NamedEntity"
    );
}

// =============================================================================
// Annotation
// =============================================================================

#[tokio::test]
async fn test_annotate_inline_document() {
    let app = create_test_app(Arc::new(BobLinker));
    let input = mmif_with_document(json!({"id": "m1", "text": {"@value": "Bob met Bob."}}));

    let response = app
        .clone()
        .oneshot(create_post_request("/", input.to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(!body.contains('\n'));

    let json: Value = serde_json::from_str(&body).unwrap();
    let views = json["views"].as_array().unwrap();
    assert_eq!(views.len(), 1);
    let annotations = views[0]["annotations"].as_array().unwrap();
    assert_eq!(annotations.len(), 2);
    assert_eq!(annotations[0]["properties"]["id"], "ne1");
    assert_eq!(annotations[1]["properties"]["id"], "ne2");
    assert_eq!(annotations[1]["properties"]["start"], 8);
    assert_eq!(annotations[1]["properties"]["kb_category"], "Person");

    let health = app.oneshot(create_get_request("/health")).await.unwrap();
    let json: Value = serde_json::from_str(&body_text(health).await).unwrap();
    assert_eq!(json["total_requests"], 1);
}

#[tokio::test]
async fn test_annotate_pretty_output() {
    let app = create_test_app(Arc::new(BobLinker));
    let input = mmif_with_document(json!({"id": "m1", "text": {"@value": "Bob."}}));

    let response = app
        .oneshot(create_post_request("/?pretty=true", input.to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains('\n'));
}

#[tokio::test]
async fn test_invalid_json_is_bad_request() {
    let app = create_test_app(Arc::new(BobLinker));

    let response = app
        .oneshot(create_post_request("/", "{\"documents\": ["))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_unreachable_document_is_bad_gateway() {
    let app = create_test_app(Arc::new(BobLinker));
    let input = mmif_with_document(json!({"id": "m1", "location": "/no/such/transcript.txt"}));

    let response = app
        .oneshot(create_post_request("/", input.to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert!(json["details"].as_str().unwrap().contains("/no/such/transcript.txt"));
}

#[tokio::test]
async fn test_linker_outage_is_service_unavailable() {
    let app = create_test_app(Arc::new(DownLinker));
    let input = mmif_with_document(json!({"id": "m1", "text": {"@value": "Bob."}}));

    let response = app
        .oneshot(create_post_request("/", input.to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["code"], "SERVICE_UNAVAILABLE");
}

#[tokio::test]
async fn test_upstream_view_without_timezone_is_accepted() {
    let app = create_test_app(Arc::new(BobLinker));
    let mut input = mmif_with_document(json!({"id": "m1", "text": {"@value": "Bob."}}));
    input["views"] = json!([{
        "id": "v1",
        "metadata": {
            "app": "http://apps.clams.ai/spacy",
            "timestamp": "2021-09-20T19:04:39.164093",
            "contains": {"http://vocab.lappsgrid.org/NamedEntity": {"document": "m1"}}
        },
        "annotations": []
    }]);

    let response = app
        .oneshot(create_post_request("/", input.to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["views"][0]["metadata"]["timestamp"], "2021-09-20T19:04:39.164093");
    assert_eq!(json["views"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_duplicate_view_ids_are_bad_request() {
    let app = create_test_app(Arc::new(BobLinker));
    let mut input = mmif_with_document(json!({"id": "m1", "text": {"@value": "Bob."}}));
    input["views"] = json!([
        {"id": "v1", "metadata": {"app": "a"}, "annotations": []},
        {"id": "v1", "metadata": {"app": "b"}, "annotations": []}
    ]);

    let response = app
        .oneshot(create_post_request("/", input.to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json: Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert!(json["message"].as_str().unwrap().contains("duplicate view id"));
}
