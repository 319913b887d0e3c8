//! `ApiClient` against the live mock server and a few purpose-built routers.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::OriginalUri,
    http::StatusCode,
    routing::post,
    Json, Router,
};
use kg_client::{
    ApiClient, ApiError, ClientConfig, Envelope, GraphLimit, HttpRequest, HttpResponse, Interceptor,
    QaRequest, RequestOptions, FALLBACK_MESSAGE,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;

async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, router).await });
    format!("http://{addr}/api")
}

async fn mock_backend() -> String {
    serve(mock_server::app()).await
}

fn client(base_url: &str) -> ApiClient {
    ApiClient::new(ClientConfig::new(base_url)).unwrap()
}

/// Router that answers every request with a fixed envelope.
fn fixed(envelope: Value) -> Router {
    Router::new().fallback(move || {
        let envelope = envelope.clone();
        async move { Json(envelope) }
    })
}

#[derive(Debug, Default)]
struct Recorder {
    events: Mutex<Vec<String>>,
}

impl Recorder {
    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl Interceptor for Recorder {
    fn on_request(&self, request: &HttpRequest) {
        self.events
            .lock()
            .unwrap()
            .push(format!("request {} {}", request.method, request.path));
    }

    fn on_response(&self, _request: &HttpRequest, response: &HttpResponse, envelope: &Envelope) {
        self.events
            .lock()
            .unwrap()
            .push(format!("response {} {}", response.status, envelope.code));
    }

    fn on_error(&self, request: Option<&HttpRequest>, error: &ApiError) {
        let tag = if request.is_some() { "error" } else { "build-error" };
        self.events.lock().unwrap().push(format!("{tag} {error}"));
    }
}

// --- success path ---

#[tokio::test]
async fn success_resolves_to_exact_payload() {
    let base = serve(fixed(json!({"code": 200, "data": {"nodes": [], "edges": []}}))).await;
    let data = client(&base).get_full_graph_data().await.unwrap();
    assert!(data.is_empty());
}

#[tokio::test]
async fn every_operation_against_mock_backend() {
    let base = mock_backend().await;
    let client = ApiClient::new(ClientConfig::new(&base).with_graph_limit(GraphLimit::Capped(2))).unwrap();

    let entities = client.get_entities().await.unwrap();
    assert_eq!(entities.len(), 12);

    let core = client.get_graph_data().await.unwrap();
    assert_eq!(core.nodes.len(), 2);

    let full = client.get_full_graph_data().await.unwrap();
    assert_eq!(full.edges.len(), 11);

    let react = client.get_graph_data_by_entity("React").await.unwrap();
    assert_eq!(react.nodes.len(), 4);

    let fuzzy = client.fuzzy_search_entity("SASS").await.unwrap();
    assert!(fuzzy.nodes.iter().any(|n| n.id == "Sass"));

    let answer = client.qa("What is Vue?").await.unwrap();
    assert_eq!(answer.related_entities, ["Vue"]);

    let recs = client.get_recommendations("Vue").await.unwrap();
    assert_eq!(recs.len(), 2);

    let path = client.get_learning_path("Redux").await.unwrap();
    assert_eq!(path["prerequisites"], json!(["React"]));
}

#[tokio::test]
async fn concurrent_calls_share_one_client() {
    let base = mock_backend().await;
    let client = client(&base);
    let (a, b, c) = tokio::join!(
        client.get_entities(),
        client.get_full_graph_data(),
        client.fuzzy_search_entity("script"),
    );
    assert!(a.is_ok() && b.is_ok() && c.is_ok());
}

// --- application failures ---

#[tokio::test]
async fn non_200_code_fails_with_message() {
    let base = serve(fixed(json!({"code": 500, "msg": "db error"}))).await;
    let err = client(&base).get_entities().await.unwrap_err();
    assert!(err.is_application());
    assert_eq!(err.to_string(), "db error");
}

#[tokio::test]
async fn non_200_code_without_message_uses_fallback() {
    let base = serve(fixed(json!({"code": 403, "data": null}))).await;
    let err = client(&base).get_graph_data().await.unwrap_err();
    assert!(matches!(err, ApiError::Application { code: 403, .. }));
    assert_eq!(err.to_string(), FALLBACK_MESSAGE);
}

#[tokio::test]
async fn backend_rejects_placeholder_entity() {
    let base = mock_backend().await;
    let err = client(&base)
        .get_graph_data_by_entity("[object Object]")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "invalid entity name");
}

// --- transport failures ---

#[tokio::test]
async fn non_2xx_status_is_transport_failure() {
    let router = Router::new().fallback(|| async {
        (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"code": 200, "data": []})))
    });
    let base = serve(router).await;
    let err = client(&base).get_entities().await.unwrap_err();
    assert!(matches!(err, ApiError::HttpStatus { status: 500, .. }));
    assert!(err.is_transport());
}

#[tokio::test]
async fn unreachable_backend_is_transport_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(&format!("http://{addr}/api")).get_entities().await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
    assert!(!err.is_application());
}

#[tokio::test]
async fn configured_timeout_elapses() {
    let router = Router::new().fallback(|| async {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Json(json!({"code": 200, "data": []}))
    });
    let base = serve(router).await;
    let config = ClientConfig::new(&base).with_timeout(Duration::from_millis(100));
    let err = ApiClient::new(config).unwrap().get_entities().await.unwrap_err();
    assert!(err.is_timeout());
}

#[tokio::test]
async fn qa_timeout_override_applies_per_call() {
    let router = Router::new().route(
        "/api/qa",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({"code": 200, "data": {"answer": ""}}))
        }),
    );
    let base = serve(router).await;
    let options = RequestOptions::default().with_timeout(Duration::from_millis(100));
    let err = client(&base)
        .qa_with_options("slow question", &options)
        .await
        .unwrap_err();
    assert!(err.is_timeout());
}

#[tokio::test]
async fn html_body_is_deserialization_failure() {
    let router = Router::new().fallback(|| async { "<html>maintenance</html>" });
    let base = serve(router).await;
    let err = client(&base).get_entities().await.unwrap_err();
    assert!(matches!(err, ApiError::Deserialization(_)));
}

// --- request shape ---

#[tokio::test]
async fn reserved_characters_are_encoded_on_the_wire() {
    let router = Router::new().fallback(|OriginalUri(uri): OriginalUri| async move {
        Json(json!({"code": 200, "data": {"nodes": [{"id": uri.path(), "label": ""}], "edges": []}}))
    });
    let base = serve(router).await;
    let client = client(&base);

    let data = client.get_graph_data_by_entity("A&B").await.unwrap();
    assert_eq!(data.nodes[0].id, "/api/graph-data/entity/A%26B");

    let data = client.fuzzy_search_entity("a/b c?").await.unwrap();
    assert_eq!(data.nodes[0].id, "/api/graph-data/entity/fuzzy/a%2Fb%20c%3F");
}

#[tokio::test]
async fn qa_body_and_headers_reach_server() {
    let router = Router::new().route(
        "/api/qa",
        post(|headers: axum::http::HeaderMap, Json(body): Json<Value>| async move {
            let content_type = headers
                .get("content-type")
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            let trace = headers
                .get("x-trace")
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            Json(json!({
                "code": 200,
                "data": {
                    "answer": body.to_string(),
                    "related_entities": [content_type, trace],
                }
            }))
        }),
    );
    let base = serve(router).await;
    let client = client(&base);

    let answer = client.qa("bare string").await.unwrap();
    let sent: Value = serde_json::from_str(&answer.answer).unwrap();
    assert_eq!(sent, json!({"question": "bare string"}));
    assert_eq!(answer.related_entities[0], "application/json");

    let mut structured = QaRequest::new("structured").with_mode("deep");
    structured.extra.insert("history".to_string(), json!(["hi"]));
    let options = RequestOptions::default().with_header("x-trace", "t-1");
    let answer = client.qa_with_options(structured, &options).await.unwrap();
    let sent: Value = serde_json::from_str(&answer.answer).unwrap();
    assert_eq!(sent, json!({"question": "structured", "mode": "deep", "history": ["hi"]}));
    assert_eq!(answer.related_entities[1], "t-1");
}

// --- interceptors ---

#[tokio::test]
async fn interceptors_see_request_then_response() {
    let base = mock_backend().await;
    let recorder = Arc::new(Recorder::default());
    let client = ApiClient::new(ClientConfig::new(&base).with_log_traffic(false))
        .unwrap()
        .with_interceptor(recorder.clone());

    client.get_entities().await.unwrap();
    assert_eq!(
        recorder.events(),
        [format!("request GET {base}/entities"), "response 200 200".to_string()]
    );
}

#[tokio::test]
async fn interceptors_see_application_failure_after_envelope() {
    let base = serve(fixed(json!({"code": 500, "msg": "db error"}))).await;
    let recorder = Arc::new(Recorder::default());
    let client = client(&base).with_interceptor(recorder.clone());

    let _ = client.get_entities().await;
    let events = recorder.events();
    assert_eq!(events.len(), 3);
    assert_eq!(events[1], "response 200 500");
    assert_eq!(events[2], "error db error");
}

#[tokio::test]
async fn interceptors_skip_response_hook_on_transport_failure() {
    let router = Router::new().fallback(|| async { StatusCode::BAD_GATEWAY });
    let base = serve(router).await;
    let recorder = Arc::new(Recorder::default());
    let client = client(&base).with_interceptor(recorder.clone());

    let _ = client.get_full_graph_data().await;
    let events = recorder.events();
    assert_eq!(events.len(), 2);
    assert!(events[0].starts_with("request GET"));
    assert!(events[1].starts_with("error HTTP 502"));
}

#[tokio::test]
async fn invalid_per_call_header_fails_before_sending() {
    let recorder = Arc::new(Recorder::default());
    let client = ApiClient::new(ClientConfig::new("http://127.0.0.1:9/api").with_log_traffic(false))
        .unwrap()
        .with_interceptor(recorder.clone());

    let options = RequestOptions::default().with_header("bad header", "x");
    let err = client.qa_with_options("q", &options).await.unwrap_err();
    assert!(matches!(err, ApiError::Config(_)));
    assert!(!err.is_transport());

    let events = recorder.events();
    assert_eq!(events.len(), 1);
    assert!(events[0].starts_with("build-error invalid configuration"));
}
