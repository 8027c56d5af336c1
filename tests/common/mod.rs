//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{http::HeaderMap, routing::get, Json, Router};
use serde_json::json;
use tokio::net::TcpListener;

use quiz_gateway::auth::{AuthService, HttpTokenVerifier};
use quiz_gateway::config::GatewayConfig;
use quiz_gateway::dispatch::Dispatcher;
use quiz_gateway::http::HttpServer;
use quiz_gateway::lifecycle::Shutdown;
use quiz_gateway::quiz::{self, QuizService};
use quiz_gateway::storage::MemoryStore;

/// Start a mock auth service that accepts exactly one token and counts how
/// often it is consulted.
pub async fn start_mock_auth(valid_token: &'static str) -> (String, Arc<AtomicU32>) {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();

    let app = Router::new().route(
        "/auth",
        get(move |headers: HeaderMap| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                let presented = headers.get("api_token").and_then(|v| v.to_str().ok());
                Json(json!({ "is_authenticated": presented == Some(valid_token) }))
            }
        }),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}/auth"), calls)
}

/// Start a full gateway with in-memory storage against the given auth URL.
/// The returned `Shutdown` must be kept alive for the server's lifetime.
pub async fn start_gateway(
    auth_url: &str,
    path_prefixes: Vec<String>,
    token_ttl: Duration,
) -> (SocketAddr, Shutdown) {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.auth.url = auth_url.to_string();
    config.auth.token_ttl_secs = token_ttl.as_secs().max(1);
    config.routing.path_prefixes = path_prefixes.clone();

    let quiz = Arc::new(QuizService::new(
        Arc::new(MemoryStore::new(["session"])),
        Arc::new(MemoryStore::new(["session", "question_id"])),
        Arc::new(MemoryStore::new(["session", "question_id"])),
    ));
    let auth = AuthService::new(Arc::new(HttpTokenVerifier::new(auth_url)), token_ttl);
    let dispatcher = Arc::new(Dispatcher::new(quiz::routes(quiz), path_prefixes, auth));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let server = HttpServer::new(config, dispatcher);
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}
