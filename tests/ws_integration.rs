//! Integration tests for the `IDIssuer` WebSocket endpoint.
//!
//! These tests spin up a real server instance and talk to it over WebSocket
//! and HTTP to verify the complete exchange.

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use idissuer::api::{AppState, WS_PATH, create_router};
use idissuer::client::{REQUEST_PAYLOAD, request_id, run_clients};
use idissuer::config::{AppConfig, ServerConfig};
use idissuer::domain::Identifier;
use idissuer::error::{ClientError, IssueError, IssueResult};
use idissuer::service::{IdSource, IssuanceService, OsRngSource, RetryLimit};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const RESPONSE_BUDGET: Duration = Duration::from_secs(1);
const SILENCE_WINDOW: Duration = Duration::from_millis(300);

// ============================================================================
// Test Harness
// ============================================================================

/// Test server instance.
struct TestServer {
    addr: SocketAddr,
    client: Client,
    issuance: Arc<IssuanceService>,
}

impl TestServer {
    async fn new() -> Self {
        Self::with_config(AppConfig::default()).await
    }

    async fn with_config(config: AppConfig) -> Self {
        let issuance = Arc::new(IssuanceService::default());
        Self::with_issuance(issuance, config).await
    }

    async fn with_source(source: Arc<dyn IdSource>) -> Self {
        let issuance = Arc::new(IssuanceService::new(source, RetryLimit::default()));
        Self::with_issuance(issuance, AppConfig::default()).await
    }

    async fn with_issuance(issuance: Arc<IssuanceService>, config: AppConfig) -> Self {
        let state = AppState::with_issuance(Arc::new(config), Arc::clone(&issuance));
        let app = create_router(state);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Server failed");
        });

        Self {
            addr,
            client: Client::new(),
            issuance,
        }
    }

    fn ws_url(&self) -> String {
        format!("ws://{}{}", self.addr, WS_PATH)
    }

    fn http_url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.http_url(path))
            .send()
            .await
            .expect("Request failed")
    }

    async fn connect(&self) -> WsStream {
        let (stream, _) = connect_async(self.ws_url())
            .await
            .expect("WebSocket connect failed");
        stream
    }
}

/// Fails the first `failures` draws, then draws from the OS CSPRNG.
struct FlakySource {
    failures_left: AtomicUsize,
}

impl FlakySource {
    const fn new(failures: usize) -> Self {
        Self {
            failures_left: AtomicUsize::new(failures),
        }
    }
}

impl IdSource for FlakySource {
    fn draw(&self) -> IssueResult<Identifier> {
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();

        if failing {
            Err(IssueError::RandomSource("forced failure".to_string()))
        } else {
            OsRngSource.draw()
        }
    }
}

async fn send_request(stream: &mut WsStream) {
    stream
        .send(Message::text(REQUEST_PAYLOAD.to_string()))
        .await
        .expect("Send failed");
}

/// Read the next text message within the response budget.
async fn recv_text(stream: &mut WsStream) -> String {
    let message = timeout(RESPONSE_BUDGET, stream.next())
        .await
        .expect("No response within budget")
        .expect("Stream ended")
        .expect("Read failed");

    match message {
        Message::Text(text) => text.as_str().to_string(),
        other => panic!("Expected text message, got {other:?}"),
    }
}

/// API response structure.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    code: i32,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct HealthData {
    status: String,
}

#[derive(Debug, Deserialize)]
struct ReadyData {
    ready: bool,
    issued: u64,
}

// ============================================================================
// Protocol Tests
// ============================================================================

#[tokio::test]
async fn test_round_trip_returns_canonical_decimal() {
    let server = TestServer::new().await;
    let mut stream = server.connect().await;

    send_request(&mut stream).await;
    let text = recv_text(&mut stream).await;

    let id: Identifier = text.parse().expect("Response is not a canonical identifier");
    assert_eq!(id.to_string(), text);
    assert!(text.len() <= 39);
    assert!(server.issuance.registry().contains(id));
}

#[tokio::test]
async fn test_request_id_within_budget() {
    let server = TestServer::new().await;

    let id = request_id(&server.ws_url(), RESPONSE_BUDGET)
        .await
        .expect("Exchange failed");

    assert!(server.issuance.registry().contains(id));
    assert_eq!(server.issuance.issued(), 1);
}

#[tokio::test]
async fn test_sequential_requests_on_one_connection() {
    let server = TestServer::new().await;
    let mut stream = server.connect().await;

    let mut ids = HashSet::new();
    for _ in 0..5 {
        send_request(&mut stream).await;
        ids.insert(recv_text(&mut stream).await);
    }

    assert_eq!(ids.len(), 5);
    assert_eq!(server.issuance.issued(), 5);
}

#[tokio::test]
async fn test_payload_content_is_ignored() {
    let server = TestServer::new().await;
    let mut stream = server.connect().await;

    stream
        .send(Message::text("anything at all".to_string()))
        .await
        .unwrap();
    recv_text(&mut stream).await.parse::<Identifier>().unwrap();

    stream
        .send(Message::binary(vec![0xde, 0xad, 0xbe, 0xef]))
        .await
        .unwrap();
    recv_text(&mut stream).await.parse::<Identifier>().unwrap();
}

#[tokio::test]
async fn test_ping_does_not_trigger_issuance() {
    let server = TestServer::new().await;
    let mut stream = server.connect().await;

    stream
        .send(Message::Ping(vec![1, 2, 3].into()))
        .await
        .unwrap();
    let reply = timeout(RESPONSE_BUDGET, stream.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert!(matches!(reply, Message::Pong(_)));
    assert_eq!(server.issuance.issued(), 0);
}

// ============================================================================
// Concurrency Tests
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_ten_concurrent_connections_get_distinct_ids() {
    let server = TestServer::new().await;

    let outcomes = run_clients(&server.ws_url(), 10, RESPONSE_BUDGET).await;
    assert_eq!(outcomes.len(), 10);

    let ids: HashSet<Identifier> = outcomes
        .into_iter()
        .enumerate()
        .map(|(i, outcome)| {
            assert_eq!(outcome.connection, i + 1);
            outcome.result.expect("Exchange failed")
        })
        .collect();

    assert_eq!(ids.len(), 10);
    assert_eq!(server.issuance.issued(), 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_connections_many_requests_are_unique() {
    const CONNECTIONS: usize = 50;
    const REQUESTS: usize = 20;

    let server = Arc::new(TestServer::new().await);

    let mut tasks = tokio::task::JoinSet::new();
    for _ in 0..CONNECTIONS {
        let server = Arc::clone(&server);
        tasks.spawn(async move {
            let mut stream = server.connect().await;
            let mut ids = Vec::with_capacity(REQUESTS);
            for _ in 0..REQUESTS {
                send_request(&mut stream).await;
                ids.push(recv_text(&mut stream).await);
            }
            ids
        });
    }

    let mut all = HashSet::new();
    while let Some(ids) = tasks.join_next().await {
        for id in ids.unwrap() {
            assert!(all.insert(id), "Identifier issued twice");
        }
    }

    assert_eq!(all.len(), CONNECTIONS * REQUESTS);
    assert_eq!(server.issuance.issued(), CONNECTIONS * REQUESTS);
}

#[tokio::test]
async fn test_dropped_connection_does_not_affect_others() {
    let server = TestServer::new().await;

    let mut doomed = server.connect().await;
    send_request(&mut doomed).await;
    drop(doomed);

    let id = request_id(&server.ws_url(), RESPONSE_BUDGET)
        .await
        .expect("Exchange after peer drop failed");
    assert!(server.issuance.registry().contains(id));
}

// ============================================================================
// Fault Tests
// ============================================================================

#[tokio::test]
async fn test_source_failure_sends_nothing_and_keeps_connection_open() {
    let server = TestServer::with_source(Arc::new(FlakySource::new(1))).await;
    let mut stream = server.connect().await;

    send_request(&mut stream).await;
    assert!(
        timeout(SILENCE_WINDOW, stream.next()).await.is_err(),
        "Failed issuance must not produce a response"
    );
    assert_eq!(server.issuance.issued(), 0);

    send_request(&mut stream).await;
    recv_text(&mut stream).await.parse::<Identifier>().unwrap();
    assert_eq!(server.issuance.issued(), 1);
}

#[tokio::test]
async fn test_client_times_out_when_source_is_down() {
    let server = TestServer::with_source(Arc::new(FlakySource::new(usize::MAX))).await;

    let result = request_id(&server.ws_url(), SILENCE_WINDOW).await;
    assert!(matches!(result, Err(ClientError::Timeout(_))));
}

#[tokio::test]
async fn test_idle_connection_is_closed() {
    let config = AppConfig {
        server: ServerConfig {
            idle_timeout_secs: 1,
            ..Default::default()
        },
        ..Default::default()
    };
    let server = TestServer::with_config(config).await;
    let mut stream = server.connect().await;

    let next = timeout(Duration::from_secs(3), stream.next())
        .await
        .expect("Server did not close the idle connection");
    assert!(!matches!(next, Some(Ok(Message::Text(_)))));
}

#[tokio::test]
async fn test_connect_to_missing_server_fails() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let result = request_id(&format!("ws://{addr}{WS_PATH}"), RESPONSE_BUDGET).await;
    assert!(matches!(result, Err(ClientError::Connect(_))));
}

// ============================================================================
// HTTP Endpoint Tests
// ============================================================================

#[tokio::test]
async fn test_plain_get_on_ws_path_is_rejected() {
    let server = TestServer::new().await;
    let response = server.get(WS_PATH).await;
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_health_endpoint() {
    let server = TestServer::new().await;
    let response = server.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: ApiResponse<HealthData> = response.json().await.unwrap();
    assert_eq!(body.code, 0);
    assert_eq!(body.data.unwrap().status, "healthy");
}

#[tokio::test]
async fn test_ready_reports_issued_count() {
    let server = TestServer::new().await;
    request_id(&server.ws_url(), RESPONSE_BUDGET).await.unwrap();
    request_id(&server.ws_url(), RESPONSE_BUDGET).await.unwrap();

    let response = server.get("/ready").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: ApiResponse<ReadyData> = response.json().await.unwrap();
    let data = body.data.unwrap();
    assert!(data.ready);
    assert_eq!(data.issued, 2);
}

#[tokio::test]
async fn test_ready_fails_when_source_is_down() {
    let server = TestServer::with_source(Arc::new(FlakySource::new(usize::MAX))).await;

    let response = server.get("/ready").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body: ApiResponse<ReadyData> = response.json().await.unwrap();
    assert_eq!(body.code, 5003);
    assert!(!body.data.unwrap().ready);
}

#[tokio::test]
async fn test_metrics_endpoint_without_recorder() {
    let server = TestServer::new().await;
    let response = server.get("/metrics").await;
    assert_eq!(response.status(), StatusCode::OK);

    let text = response.text().await.unwrap();
    assert!(text.contains("idissuer_up 1"));
}
