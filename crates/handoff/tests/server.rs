//! Integration tests for the handoff server: HTTP routes and the full
//! register → login → connect → echo → close flow.

use std::time::Duration;

use argon2::Params;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use handoff::prelude::*;
use serde_json::{json, Value};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::{self, Message};
use tower::ServiceExt;

// =========================================================================
// Helpers
// =========================================================================

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// A server running on a random port.
struct TestServer {
    router: Router,
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<Result<(), HandoffError>>,
}

impl TestServer {
    /// Triggers graceful shutdown and waits for the server to stop.
    async fn shutdown(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        tokio::time::timeout(Duration::from_secs(5), &mut self.task)
            .await
            .expect("server should stop")
            .expect("server task should not panic")
            .expect("server should exit cleanly");
    }
}

/// Starts a server on a random port with cheap password hashing.
async fn start_server() -> TestServer {
    let params = Params::new(Params::MIN_M_COST, Params::MIN_T_COST, 1, None)
        .expect("minimum params are valid");
    let server = HandoffServer::builder()
        .bind("127.0.0.1:0")
        .public_host("127.0.0.1")
        .credential_hasher(CredentialHasher::with_params(params))
        .build()
        .await
        .expect("server should build");

    let router = server.router();
    let (stop, stopped) = oneshot::channel::<()>();
    let task = tokio::spawn(server.run_until(async move {
        let _ = stopped.await;
    }));

    TestServer {
        router,
        stop: Some(stop),
        task,
    }
}

/// Sends one request through the router and returns status, headers, body.
async fn send(
    router: &Router,
    request: Request<Body>,
) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let response = router.clone().oneshot(request).await.expect("infallible");
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should read");
    (status, headers, body.to_vec())
}

async fn post_json(
    router: &Router,
    path: &str,
    body: &Value,
) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let request = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("valid request");
    send(router, request).await
}

async fn register(router: &Router, name: &str, password: &str) -> UserCreated {
    let (status, _, body) =
        post_json(router, "/user", &json!({"userName": name, "password": password})).await;
    assert_eq!(status, StatusCode::CREATED);
    serde_json::from_slice(&body).expect("user body")
}

/// Logs in and returns the connect URL.
async fn login(router: &Router, name: &str, password: &str) -> String {
    let (status, _, body) = post_json(
        router,
        "/user/login",
        &json!({"userName": name, "password": password}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let connect: ConnectUrl = serde_json::from_slice(&body).expect("url body");
    connect.url
}

async fn active_list(router: &Router) -> Vec<String> {
    let request = Request::builder()
        .uri("/user/active/list")
        .body(Body::empty())
        .expect("valid request");
    let (status, _, body) = send(router, request).await;
    assert_eq!(status, StatusCode::OK);
    serde_json::from_slice(&body).expect("list body")
}

/// Polls the active list until it equals `expected` or a second passes.
async fn wait_for_active(router: &Router, expected: &[&str]) {
    for _ in 0..100 {
        if active_list(router).await == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!(
        "active list never became {expected:?}, last: {:?}",
        active_list(router).await
    );
}

async fn connect(url: &str) -> ClientWs {
    let (ws, _) = tokio_tungstenite::connect_async(url)
        .await
        .expect("should connect");
    ws
}

/// Returns the HTTP status a refused WebSocket connect was answered with.
async fn connect_refused_status(url: &str) -> u16 {
    match tokio_tungstenite::connect_async(url).await {
        Err(tungstenite::Error::Http(response)) => response.status().as_u16(),
        Err(other) => panic!("expected HTTP refusal, got {other}"),
        Ok(_) => panic!("connect should have been refused"),
    }
}

fn echo(data: Value) -> Message {
    Message::Text(json!({"name": "echo", "data": data}).to_string().into())
}

/// Receives the next data frame as JSON.
async fn recv_json(ws: &mut ClientWs) -> Value {
    let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
        .await
        .expect("reply should arrive")
        .expect("stream open")
        .expect("valid frame");
    serde_json::from_slice(&msg.into_data()).expect("json frame")
}

// =========================================================================
// POST /user
// =========================================================================

#[tokio::test]
async fn test_register_valid_returns_created_with_id() {
    let server = start_server().await;

    let created = register(&server.router, "JohnDoe", "password123").await;

    assert_eq!(created.user_name, "JohnDoe");
    assert!(!created.id.is_empty());
}

#[tokio::test]
async fn test_register_short_username_returns_400_with_message() {
    let server = start_server().await;

    let (status, _, body) = post_json(
        &server.router,
        "/user",
        &json!({"userName": "Joe", "password": "password123"}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        String::from_utf8(body).unwrap(),
        "username should be 4 chars or longer"
    );
}

#[tokio::test]
async fn test_register_short_password_returns_400_with_message() {
    let server = start_server().await;

    let (status, _, body) = post_json(
        &server.router,
        "/user",
        &json!({"userName": "JohnDoe", "password": "short"}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        String::from_utf8(body).unwrap(),
        "password should be 8 chars or longer"
    );
}

#[tokio::test]
async fn test_register_malformed_body_returns_400() {
    let server = start_server().await;

    let request = Request::builder()
        .method("POST")
        .uri("/user")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, _, body) = send(&server.router, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(String::from_utf8(body).unwrap(), "invalid body");
}

// =========================================================================
// POST /user/login
// =========================================================================

#[tokio::test]
async fn test_login_valid_returns_connect_url_and_headers() {
    let server = start_server().await;
    register(&server.router, "JohnDoe", "password123").await;

    let (status, headers, body) = post_json(
        &server.router,
        "/user/login",
        &json!({"userName": "JohnDoe", "password": "password123"}),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(headers["x-rate-limit"], "60");
    let expires = headers["x-expires-after"].to_str().unwrap();
    assert!(expires.ends_with(" +0000 UTC"), "got {expires}");

    let connect: ConnectUrl = serde_json::from_slice(&body).unwrap();
    let (prefix, token) = connect.url.split_once("/ws?token=").expect("connect url");
    assert!(prefix.starts_with("ws://127.0.0.1:"));
    assert_eq!(token.len(), 48);
}

#[tokio::test]
async fn test_login_wrong_password_returns_400() {
    let server = start_server().await;
    register(&server.router, "JohnDoe", "password123").await;

    let (status, _, body) = post_json(
        &server.router,
        "/user/login",
        &json!({"userName": "JohnDoe", "password": "wrongpassword"}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.is_empty());
}

#[tokio::test]
async fn test_login_unknown_user_returns_400() {
    let server = start_server().await;

    let (status, _, _) = post_json(
        &server.router,
        "/user/login",
        &json!({"userName": "Nobody", "password": "password123"}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_twice_issues_distinct_tokens() {
    let server = start_server().await;
    register(&server.router, "JohnDoe", "password123").await;

    let first = login(&server.router, "JohnDoe", "password123").await;
    let second = login(&server.router, "JohnDoe", "password123").await;

    assert_ne!(first, second);
}

// =========================================================================
// GET /ws
// =========================================================================

#[tokio::test]
async fn test_connect_echo_and_close_updates_active_list() {
    let server = start_server().await;
    register(&server.router, "JohnDoe", "password123").await;
    let url = login(&server.router, "JohnDoe", "password123").await;

    let mut ws = connect(&url).await;
    wait_for_active(&server.router, &["JohnDoe"]).await;

    let payload = json!({"text": "hello", "n": [1, 2, 3]});
    ws.send(echo(payload.clone())).await.unwrap();
    let reply = recv_json(&mut ws).await;
    assert_eq!(reply, json!({"name": "echo", "data": payload}));

    ws.close(None).await.unwrap();
    wait_for_active(&server.router, &[]).await;
}

#[tokio::test]
async fn test_connect_ignores_unknown_and_malformed_frames() {
    let server = start_server().await;
    register(&server.router, "JohnDoe", "password123").await;
    let url = login(&server.router, "JohnDoe", "password123").await;
    let mut ws = connect(&url).await;

    ws.send(Message::Text("garbage".to_string().into())).await.unwrap();
    ws.send(Message::Text(r#"{"name":"shout","data":1}"#.to_string().into()))
        .await
        .unwrap();
    ws.send(echo(json!("after"))).await.unwrap();

    let reply = recv_json(&mut ws).await;
    assert_eq!(reply["data"], "after");
}

#[tokio::test]
async fn test_connect_spent_token_returns_401() {
    let server = start_server().await;
    register(&server.router, "JohnDoe", "password123").await;
    let url = login(&server.router, "JohnDoe", "password123").await;

    let mut ws = connect(&url).await;
    ws.close(None).await.unwrap();
    wait_for_active(&server.router, &[]).await;

    assert_eq!(connect_refused_status(&url).await, 401);
    assert!(active_list(&server.router).await.is_empty());
}

#[tokio::test]
async fn test_connect_unknown_token_returns_401_without_side_effects() {
    let server = start_server().await;

    let request = Request::builder()
        .uri("/ws?token=deadbeef")
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(&server.router, request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.is_empty());
    assert!(active_list(&server.router).await.is_empty());
}

#[tokio::test]
async fn test_connect_missing_token_returns_401() {
    let server = start_server().await;

    let request = Request::builder().uri("/ws").body(Body::empty()).unwrap();
    let (status, _, _) = send(&server.router, request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_connect_repeated_unknown_tokens_returns_401_empty() {
    let server = start_server().await;

    let request = Request::builder()
        .uri("/ws?token=a&token=b")
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(&server.router, request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.is_empty());
}

#[tokio::test]
async fn test_connect_undecodable_token_returns_401_empty() {
    let server = start_server().await;

    let request = Request::builder()
        .uri("/ws?token=%FF")
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(&server.router, request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.is_empty());
}

#[tokio::test]
async fn test_connect_live_token_first_wins_over_later_token_params() {
    let server = start_server().await;
    register(&server.router, "JohnDoe", "password123").await;
    let url = login(&server.router, "JohnDoe", "password123").await;

    let mut ws = connect(&format!("{url}&token=other")).await;
    wait_for_active(&server.router, &["JohnDoe"]).await;

    ws.send(echo(json!("hi"))).await.unwrap();
    assert_eq!(recv_json(&mut ws).await["data"], "hi");
}

#[tokio::test]
async fn test_connect_plain_get_spends_token_without_registering() {
    let server = start_server().await;
    register(&server.router, "JohnDoe", "password123").await;
    let url = login(&server.router, "JohnDoe", "password123").await;
    let path = &url[url.find("/ws").unwrap()..];

    let request = Request::builder().uri(path).body(Body::empty()).unwrap();
    let (status, _, _) = send(&server.router, request).await;

    assert!(status.is_client_error());
    assert!(active_list(&server.router).await.is_empty());
    assert_eq!(connect_refused_status(&url).await, 401);
}

#[tokio::test]
async fn test_connect_same_user_twice_keeps_newer_session() {
    let server = start_server().await;
    register(&server.router, "JohnDoe", "password123").await;
    let first_url = login(&server.router, "JohnDoe", "password123").await;
    let second_url = login(&server.router, "JohnDoe", "password123").await;

    let mut first = connect(&first_url).await;
    let mut second = connect(&second_url).await;
    wait_for_active(&server.router, &["JohnDoe"]).await;

    first.close(None).await.unwrap();
    // Give the first loop time to exit; the newer session must survive it.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(active_list(&server.router).await, vec!["JohnDoe"]);

    second.close(None).await.unwrap();
    wait_for_active(&server.router, &[]).await;
}

#[tokio::test]
async fn test_active_list_shows_every_connected_user() {
    let server = start_server().await;
    let mut clients = Vec::new();
    for name in ["Carol", "Alice", "Bobby"] {
        register(&server.router, name, "password123").await;
        let url = login(&server.router, name, "password123").await;
        clients.push(connect(&url).await);
    }

    wait_for_active(&server.router, &["Alice", "Bobby", "Carol"]).await;

    let mut bobby = clients.remove(1);
    bobby.close(None).await.unwrap();
    wait_for_active(&server.router, &["Alice", "Carol"]).await;
}

// =========================================================================
// Shutdown
// =========================================================================

#[tokio::test]
async fn test_shutdown_closes_live_connections() {
    let server = start_server().await;
    register(&server.router, "JohnDoe", "password123").await;
    let url = login(&server.router, "JohnDoe", "password123").await;
    let mut ws = connect(&url).await;
    wait_for_active(&server.router, &["JohnDoe"]).await;

    let router = server.router.clone();
    server.shutdown().await;

    // The client sees the server close the connection.
    let closed = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                Some(Ok(_)) => continue,
            }
        }
    })
    .await;
    assert!(closed.is_ok(), "client should observe close");
    wait_for_active(&router, &[]).await;
}
