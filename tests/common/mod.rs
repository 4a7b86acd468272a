//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::net::SocketAddr;

use axum::{
    body::{to_bytes, Body},
    extract::State,
    http::Request,
    Json, Router,
};
use campus_gateway::config::GatewayConfig;
use campus_gateway::http::HttpServer;
use campus_gateway::lifecycle::Shutdown;
use serde_json::{json, Value};
use tokio::net::TcpListener;

/// Serve `app` on an ephemeral local port.
pub async fn spawn_upstream(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// An upstream that describes every request it receives as JSON.
pub async fn spawn_echo_upstream(service: &'static str) -> SocketAddr {
    spawn_upstream(Router::new().fallback(echo).with_state(service)).await
}

async fn echo(State(service): State<&'static str>, request: Request<Body>) -> Json<Value> {
    let (parts, body) = request.into_parts();
    let headers: BTreeMap<String, String> = parts
        .headers
        .iter()
        .map(|(k, v)| (k.as_str().to_string(), v.to_str().unwrap_or("").to_string()))
        .collect();
    let body = to_bytes(body, usize::MAX).await.unwrap();

    Json(json!({
        "service": service,
        "method": parts.method.as_str(),
        "uri": parts.uri.to_string(),
        "headers": headers,
        "body_len": body.len(),
    }))
}

/// A local address nothing listens on.
pub fn dead_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Default routing table with every service pointed at `addr`.
pub fn config_all_at(addr: SocketAddr) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    for url in config.services.values_mut() {
        *url = format!("http://{addr}");
    }
    config
}

/// Start the gateway on an ephemeral port.
pub async fn spawn_gateway(config: GatewayConfig) -> (SocketAddr, Shutdown) {
    let server = HttpServer::new(config).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let stop = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, stop).await;
    });
    (addr, shutdown)
}

/// Client that never follows redirects and ignores proxy settings.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}
