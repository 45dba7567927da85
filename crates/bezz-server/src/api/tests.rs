use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::Request;
use bezz_ai::{AiError, ChatClient, ChatRequest, ImageClient, ImagePayload, ModelCapabilityRegistry};
use bezz_core::{Brief, BriefInput, BriefStatus, PhotoStyles};
use bezz_db::MemoryBriefStore;
use bezz_pipeline::{PipelineDeps, PipelineSettings};
use bezz_storage::MemoryObjectStore;
use chrono::Utc;
use serde_json::{json, Value};
use tower::ServiceExt;

use super::*;

/// Every model call fails, so started runs settle in `failed` quickly.
struct OfflineModels;

#[async_trait]
impl ChatClient for OfflineModels {
    async fn complete(&self, _request: &ChatRequest) -> Result<String, AiError> {
        Err(AiError::Api {
            status: 503,
            message: "offline".to_string(),
        })
    }
}

#[async_trait]
impl ImageClient for OfflineModels {
    async fn generate(&self, _model: &str, _prompt: &str) -> Result<ImagePayload, AiError> {
        Err(AiError::Api {
            status: 503,
            message: "offline".to_string(),
        })
    }

    async fn download(&self, _url: &str) -> Result<Vec<u8>, AiError> {
        Ok(Vec::new())
    }
}

fn test_app() -> (Router, Arc<MemoryBriefStore>) {
    let store = Arc::new(MemoryBriefStore::new());
    let orchestrator = PipelineOrchestrator::new(
        PipelineDeps {
            store: store.clone(),
            chat: Arc::new(OfflineModels),
            images: Arc::new(OfflineModels),
            objects: Arc::new(MemoryObjectStore::new()),
            registry: Arc::new(ModelCapabilityRegistry::openai_defaults()),
            styles: Arc::new(PhotoStyles::builtin().expect("builtin styles")),
        },
        PipelineSettings {
            text_models: vec!["gpt-4".to_string()],
            render_backoff_unit: Duration::ZERO,
            ..PipelineSettings::default()
        },
    );
    let auth = AuthState::parse("alice:tok-alice,bob:tok-bob", false).expect("auth");
    let app = build_app(
        AppState {
            orchestrator,
            store: store.clone(),
        },
        auth,
        default_rate_limit_state(),
    );
    (app, store)
}

fn input() -> BriefInput {
    BriefInput {
        company_name: "Acme".to_string(),
        sector: "Technology".to_string(),
        tone: "confident".to_string(),
        target_audience: "Lead developers".to_string(),
        language: "en".to_string(),
        business_description: String::new(),
        additional_info: String::new(),
    }
}

async fn seed(store: &MemoryBriefStore, owner: &str, status: BriefStatus) -> Brief {
    let mut brief = Brief::new(owner, input(), Utc::now());
    brief.status = status;
    store.set(&brief).await.expect("seed brief");
    brief
}

fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}

#[test]
fn api_error_conflict_maps_to_409() {
    let response = ApiError::new("req-1", "conflict", "not retryable").into_response();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[test]
fn foreign_brief_is_reported_as_missing() {
    let error = map_pipeline_error("req-1".to_string(), &PipelineError::Forbidden("b1".to_string()));
    assert_eq!(error.error.code, "not_found");
}

#[tokio::test]
async fn health_is_public_and_reports_store() {
    let (app, _) = test_app();

    let response = app
        .oneshot(request("GET", "/api/v1/health", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    let body = json_body(response).await;
    assert_eq!(body["data"]["status"], "ok");
}

#[tokio::test]
async fn briefs_require_a_known_token() {
    let (app, _) = test_app();

    let missing = app
        .clone()
        .oneshot(request("GET", "/api/v1/briefs", None, None))
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let wrong = app
        .oneshot(request("GET", "/api/v1/briefs", Some("tok-mallory"), None))
        .await
        .unwrap();
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_returns_created_brief_in_processing() {
    let (app, store) = test_app();

    let response = app
        .oneshot(request(
            "POST",
            "/api/v1/briefs",
            Some("tok-alice"),
            Some(serde_json::to_value(input()).unwrap()),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["data"]["status"], "processing");
    assert_eq!(body["data"]["owner_id"], "alice");
    let id = body["data"]["id"].as_str().unwrap();
    assert!(store.get(id).await.is_ok());
}

#[tokio::test]
async fn create_rejects_unsupported_language() {
    let (app, _) = test_app();
    let mut body = serde_json::to_value(input()).unwrap();
    body["language"] = json!("de");

    let response = app
        .oneshot(request("POST", "/api/v1/briefs", Some("tok-alice"), Some(body)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "validation_error");
}

#[tokio::test]
async fn owners_only_see_their_own_briefs() {
    let (app, store) = test_app();
    let alices = seed(&store, "alice", BriefStatus::Completed).await;
    seed(&store, "bob", BriefStatus::Completed).await;

    let list = app
        .clone()
        .oneshot(request("GET", "/api/v1/briefs?limit=10", Some("tok-alice"), None))
        .await
        .unwrap();
    assert_eq!(list.status(), StatusCode::OK);
    let body = json_body(list).await;
    let items = body["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], alices.id.as_str());

    let foreign = app
        .oneshot(request(
            "GET",
            &format!("/api/v1/briefs/{}", alices.id),
            Some("tok-bob"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(foreign.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn retry_is_conflict_unless_failed() {
    let (app, store) = test_app();
    let done = seed(&store, "alice", BriefStatus::Completed).await;
    let broken = seed(&store, "alice", BriefStatus::ImagesFailed).await;

    let conflict = app
        .clone()
        .oneshot(request(
            "POST",
            &format!("/api/v1/briefs/{}/retry", done.id),
            Some("tok-alice"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(conflict.status(), StatusCode::CONFLICT);

    let accepted = app
        .oneshot(request(
            "POST",
            &format!("/api/v1/briefs/{}/retry", broken.id),
            Some("tok-alice"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(accepted.status(), StatusCode::ACCEPTED);
    let body = json_body(accepted).await;
    assert_eq!(body["data"]["status"], "processing");
}

#[tokio::test]
async fn delete_removes_brief() {
    let (app, store) = test_app();
    let brief = seed(&store, "alice", BriefStatus::Failed).await;
    let uri = format!("/api/v1/briefs/{}", brief.id);

    let deleted = app
        .clone()
        .oneshot(request("DELETE", &uri, Some("tok-alice"), None))
        .await
        .unwrap();
    assert_eq!(deleted.status(), StatusCode::OK);

    let gone = app
        .oneshot(request("GET", &uri, Some("tok-alice"), None))
        .await
        .unwrap();
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn refresh_returns_ads_for_owner() {
    let (app, store) = test_app();
    let brief = seed(&store, "alice", BriefStatus::Completed).await;

    let response = app
        .oneshot(request(
            "POST",
            &format!("/api/v1/briefs/{}/refresh-urls", brief.id),
            Some("tok-alice"),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"], json!([]));
}
