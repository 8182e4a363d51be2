use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tokio::{net::TcpListener, sync::Mutex};

use super::*;

#[derive(Clone, Default)]
struct ServerState {
    generate_bodies: Arc<Mutex<Vec<Value>>>,
    recent_limits: Arc<Mutex<Vec<u32>>>,
}

#[derive(Deserialize)]
struct RecentQuery {
    limit: u32,
}

async fn handle_generate(State(state): State<ServerState>, Json(body): Json<Value>) -> Json<Value> {
    state.generate_bodies.lock().await.push(body);
    Json(json!({"outputs": ["Variant A", "Variant B"]}))
}

async fn handle_recent(
    State(state): State<ServerState>,
    Query(q): Query<RecentQuery>,
) -> Json<Value> {
    state.recent_limits.lock().await.push(q.limit);
    Json(json!([{"id": "1", "prompt": "Alpha", "created_at": "2024-01-01T00:00:00Z"}]))
}

async fn handle_broken() -> StatusCode {
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn handle_not_json() -> &'static str {
    "<html>oops</html>"
}

async fn spawn_backend() -> anyhow::Result<(String, ServerState)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let state = ServerState::default();
    let app = Router::new()
        .route("/api/generate", post(handle_generate))
        .route("/api/recent", get(handle_recent))
        .route("/broken", get(handle_broken))
        .route("/html", get(handle_not_json))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}"), state))
}

#[test]
fn base_url_resolution() {
    assert_eq!(
        resolve_base_url(Some("https://api.example.com/"), "http://127.0.0.1:8000"),
        "https://api.example.com"
    );
    assert_eq!(
        resolve_base_url(Some("  "), "http://127.0.0.1:8000/"),
        "http://127.0.0.1:8000"
    );
    assert_eq!(
        resolve_base_url(None, "http://localhost:5173"),
        "http://localhost:5173"
    );
}

#[test]
fn rejects_unparseable_base_url() {
    assert!(matches!(
        HttpTransport::new("not a url"),
        Err(TransportError::Url(_))
    ));
}

#[tokio::test]
async fn posts_generation_body_and_parses_response() {
    let (base_url, state) = spawn_backend().await.expect("spawn backend");
    let transport = HttpTransport::new(base_url).expect("transport");

    let body = json!({"prompt": "Launch", "variants": 2});
    let response = transport
        .send(TransportRequest::post_json("/api/generate", body.clone()))
        .await
        .expect("send");

    assert!(response.is_success());
    assert_eq!(
        response.body,
        Some(json!({"outputs": ["Variant A", "Variant B"]}))
    );
    assert_eq!(*state.generate_bodies.lock().await, vec![body]);
}

#[tokio::test]
async fn encodes_listing_query() {
    let (base_url, state) = spawn_backend().await.expect("spawn backend");
    let transport = HttpTransport::new(base_url).expect("transport");

    let response = transport
        .send(TransportRequest::get("/api/recent").with_query("limit", 12))
        .await
        .expect("send");

    assert_eq!(response.status, 200);
    assert!(response.body.as_ref().is_some_and(Value::is_array));
    assert_eq!(*state.recent_limits.lock().await, vec![12]);
}

#[tokio::test]
async fn non_success_status_is_returned_without_body() {
    let (base_url, _state) = spawn_backend().await.expect("spawn backend");
    let transport = HttpTransport::new(base_url).expect("transport");

    let response = transport
        .send(TransportRequest::get("/broken"))
        .await
        .expect("send");
    assert_eq!(response, TransportResponse::status(500));
    assert!(!response.is_success());
}

#[tokio::test]
async fn invalid_json_is_a_decode_error() {
    let (base_url, _state) = spawn_backend().await.expect("spawn backend");
    let transport = HttpTransport::new(base_url).expect("transport");

    let err = transport
        .send(TransportRequest::get("/html"))
        .await
        .expect_err("must fail");
    assert!(matches!(err, TransportError::Decode(_)));
    assert!(matches!(ClientError::from(err), ClientError::Malformed(_)));
}

#[tokio::test]
async fn unreachable_backend_is_a_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let transport = HttpTransport::new(format!("http://{addr}")).expect("transport");
    let err = transport
        .send(TransportRequest::get("/api/recent"))
        .await
        .expect_err("must fail");
    assert!(matches!(err, TransportError::Network(_)));
}
