//! Router-level tests driving the full HTTP surface with in-process fakes

use anyhow::Result;
use axum::{
    body::{to_bytes, Body},
    extract::connect_info::MockConnectInfo,
    http::{header, HeaderMap, HeaderValue, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use rag_chat_server::config::Settings;
use rag_chat_server::create_router;
use rag_chat_server::services::conversation::{
    ChatOrchestrator, Generator, IdempotencyCache, Prompt, RetrievedItem, Retriever,
    SessionContextStore,
};
use rag_chat_server::services::{DocumentService, Embedder};
use rag_chat_server::state::AppState;
use rag_chat_server::vector::VectorIndex;

/// Numbers its answers so repeated generations are distinguishable
#[derive(Default)]
struct CountingGenerator {
    calls: AtomicUsize,
}

#[async_trait::async_trait]
impl Generator for CountingGenerator {
    async fn generate(&self, prompt: &Prompt) -> Result<String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("answer #{} to [{}]", n, prompt.path().as_str()))
    }
}

struct NoRetrieval;

#[async_trait::async_trait]
impl Retriever for NoRetrieval {
    async fn retrieve(&self, _query: &str, _collection: &str) -> Result<Vec<RetrievedItem>> {
        Ok(Vec::new())
    }
}

struct LengthEmbedder;

#[async_trait::async_trait]
impl Embedder for LengthEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(vec![text.len() as f32, 1.0])
    }
}

struct TestApp {
    router: Router,
    generator: Arc<CountingGenerator>,
    index: Arc<VectorIndex>,
}

fn test_app() -> TestApp {
    let settings = Settings::defaults().unwrap();
    let generator = Arc::new(CountingGenerator::default());
    let index = Arc::new(VectorIndex::new());

    let orchestrator = Arc::new(ChatOrchestrator::new(
        Arc::new(SessionContextStore::new(Duration::from_secs(3600))),
        Arc::new(IdempotencyCache::new(Duration::from_secs(86400))),
        Arc::new(NoRetrieval),
        generator.clone(),
        settings.retrieval.default_collection.clone(),
    ));
    let documents = Arc::new(DocumentService::new(
        Arc::clone(&index),
        Arc::new(LengthEmbedder),
        settings.ingestion.content_columns.clone(),
    ));

    let router = create_router(AppState {
        orchestrator,
        documents,
        settings: Arc::new(settings),
    })
    .layer(MockConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40000))));

    TestApp {
        router,
        generator,
        index,
    }
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Vec<u8>) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, body.to_vec())
}

fn json_of(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes).unwrap()
}

fn chat_request(session: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/v1/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .header("X-Session-ID", session)
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn multipart_request(filename: &str, content: &str, collection: Option<&str>) -> Request<Body> {
    let boundary = "rag-test-boundary";
    let mut body = String::new();
    if let Some(collection) = collection {
        body.push_str(&format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"collection\"\r\n\r\n{c}\r\n",
            b = boundary,
            c = collection
        ));
    }
    body.push_str(&format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{f}\"\r\n\
         Content-Type: text/csv\r\n\r\n{content}\r\n--{b}--\r\n",
        b = boundary,
        f = filename,
        content = content
    ));

    Request::builder()
        .method(Method::POST)
        .uri("/api/v1/rag")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = test_app();
    let request = Request::builder()
        .uri("/api/v1/health")
        .body(Body::empty())
        .unwrap();

    let (status, _, body) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::OK);
    let json = json_of(&body);
    assert_eq!(json["status"], "success");
    assert_eq!(json["message"], "Service is healthy");
    assert!(json["timestamp"].is_string());
}

#[tokio::test]
async fn test_chat_requires_json_content_type() {
    let app = test_app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/chat")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from("question=hi"))
        .unwrap();

    let (status, _, body) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        json_of(&body),
        json!({"status": "error", "message": "Content-Type must be application/json"})
    );
    assert_eq!(app.generator.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_chat_missing_question() {
    let app = test_app();
    let (status, _, body) = send(&app.router, chat_request("s1", json!({}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_of(&body)["message"], "Question is required");
}

#[tokio::test]
async fn test_chat_malformed_json() {
    let app = test_app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, _, body) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_of(&body)["status"], "error");
}

#[tokio::test]
async fn test_chat_answers_and_builds_context() {
    let app = test_app();

    let request = chat_request("s1", json!({"question": "Who won?"}));
    let (status, _, body) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::OK);
    let json = json_of(&body);
    assert_eq!(json["status"], "success");
    assert_eq!(json["data"]["question"], "Who won?");
    assert_eq!(json["data"]["answer"], "answer #1 to [bare]");
    assert_eq!(json["data"]["session_id"], "s1");

    // Second turn in the same session sees the first as context
    let request = chat_request("s1", json!({"question": "And then?"}));
    let (_, _, body) = send(&app.router, request).await;
    assert_eq!(json_of(&body)["data"]["answer"], "answer #2 to [contextual]");
}

#[tokio::test]
async fn test_session_falls_back_to_peer_address() {
    let app = test_app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({"question": "hi"}).to_string()))
        .unwrap();

    let (status, _, body) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_of(&body)["data"]["session_id"], "127.0.0.1");
}

#[tokio::test]
async fn test_idempotent_retry_is_byte_identical() {
    let app = test_app();
    let make = || {
        let mut request = chat_request("s1", json!({"question": "Who won?"}));
        request
            .headers_mut()
            .insert("idempotency-key", "retry-42".parse().unwrap());
        request
    };

    let (status_a, headers_a, body_a) = send(&app.router, make()).await;
    let (status_b, headers_b, body_b) = send(&app.router, make()).await;

    assert_eq!(status_a, StatusCode::OK);
    assert_eq!(status_a, status_b);
    assert_eq!(body_a, body_b);
    assert!(headers_a.get("idempotency-replayed").is_none());
    assert_eq!(headers_b.get("idempotency-replayed").unwrap(), "true");
    assert_eq!(app.generator.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_idempotency_key_in_body() {
    let app = test_app();
    let body = json!({"question": "Who won?", "idempotency_key": "body-token"});

    let (_, _, first) = send(&app.router, chat_request("s1", body.clone())).await;
    let (_, headers, second) = send(&app.router, chat_request("s1", body)).await;

    assert_eq!(first, second);
    assert_eq!(headers.get("idempotency-replayed").unwrap(), "true");
    assert_eq!(app.generator.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_empty_idempotency_header_falls_back_to_body_token() {
    let app = test_app();
    let make = || {
        let body = json!({"question": "Who won?", "idempotency_key": "body-token"});
        let mut request = chat_request("s1", body);
        request
            .headers_mut()
            .insert("idempotency-key", HeaderValue::from_static(""));
        request
    };

    let (_, _, first) = send(&app.router, make()).await;
    let (_, headers, second) = send(&app.router, make()).await;

    assert_eq!(first, second);
    assert_eq!(headers.get("idempotency-replayed").unwrap(), "true");
    assert_eq!(app.generator.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_clear_context() {
    let app = test_app();
    send(&app.router, chat_request("s1", json!({"question": "first"}))).await;

    let request = Request::builder()
        .method(Method::DELETE)
        .uri("/api/v1/context")
        .header("X-Session-ID", "s1")
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json_of(&body),
        json!({"status": "success", "message": "Context cleared successfully"})
    );

    // Fresh context again
    let (_, _, body) = send(&app.router, chat_request("s1", json!({"question": "second"}))).await;
    assert_eq!(json_of(&body)["data"]["answer"], "answer #2 to [bare]");
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let app = test_app();
    let request = Request::builder()
        .uri("/api/v1/nope")
        .body(Body::empty())
        .unwrap();

    let (status, _, body) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        json_of(&body),
        json!({"status": "error", "message": "Resource not found"})
    );
}

#[tokio::test]
async fn test_wrong_method_is_json_405() {
    let app = test_app();
    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/v1/chat")
        .body(Body::empty())
        .unwrap();

    let (status, headers, body) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert!(headers.get(header::ALLOW).is_some());
    assert_eq!(
        json_of(&body),
        json!({"status": "error", "message": "Method not allowed"})
    );
}

#[tokio::test]
async fn test_csv_upload_ingests_rows() {
    let app = test_app();
    let csv = "name,summary,team\nKohli,Batter,India\nRashid,Spinner,Afghanistan\n";

    let request = multipart_request("players.CSV", csv, Some("cricket"));
    let (status, _, body) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::OK);
    let json = json_of(&body);
    assert_eq!(json["status"], "success");
    assert_eq!(json["message"], "RAG system initialized successfully");
    assert_eq!(json["data"]["filename"], "players.CSV");
    assert_eq!(json["data"]["rows_processed"], 2);
    assert_eq!(json["data"]["collection"], "cricket");
    assert_eq!(app.index.len("cricket"), 2);
}

#[tokio::test]
async fn test_csv_upload_defaults_collection() {
    let app = test_app();
    let request = multipart_request("a.csv", "name,summary\nA,B\n", None);
    let (status, _, body) = send(&app.router, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_of(&body)["data"]["collection"], "documents");
    assert_eq!(app.index.len("documents"), 1);
}

#[tokio::test]
async fn test_csv_upload_keeps_collection_name_verbatim() {
    let app = test_app();
    let request = multipart_request("a.csv", "name,summary\nA,B\n", Some(" docs"));
    let (status, _, body) = send(&app.router, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_of(&body)["data"]["collection"], " docs");
    assert_eq!(app.index.len(" docs"), 1);
    assert_eq!(app.index.len("docs"), 0);
}

#[tokio::test]
async fn test_csv_upload_rejects_other_types() {
    let app = test_app();
    let (status, _, body) = send(&app.router, multipart_request("notes.txt", "hello", None)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        json_of(&body)["message"],
        "Invalid file type. Only CSV files are allowed"
    );
}

#[tokio::test]
async fn test_csv_upload_empty_filename() {
    let app = test_app();
    let (status, _, body) = send(&app.router, multipart_request("", "a,b\n", None)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_of(&body)["message"], "No file selected");
}

#[tokio::test]
async fn test_csv_upload_without_multipart() {
    let app = test_app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/rag")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .unwrap();

    let (status, _, body) = send(&app.router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_of(&body)["message"], "No file part in the request");
}

#[tokio::test]
async fn test_csv_upload_malformed_csv() {
    let app = test_app();
    let request = multipart_request("bad.csv", "name,summary\nA,B,C\n", None);
    let (status, _, body) = send(&app.router, request).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let json = json_of(&body);
    assert_eq!(json["message"], "Error processing CSV file");
    assert!(json["error"].is_string());
}
