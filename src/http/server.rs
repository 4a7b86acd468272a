//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the health probe and the proxy handler
//! - Wire up middleware (request ID, tracing, CORS)
//! - Bind server to listener, shut down gracefully
//! - Run the per-request pipeline:
//!   `Received → Routed → Forwarding → (Succeeded | Failed) → Completed`

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderName, Request},
    response::Response,
    routing::{any, get},
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::{ConfigError, GatewayConfig};
use crate::health;
use crate::http::cors;
use crate::http::error::GatewayError;
use crate::http::forward::Forwarder;
use crate::http::request::{RequestContext, X_REQUEST_ID};
use crate::http::response;
use crate::lifecycle;
use crate::observability::metrics;
use crate::routing::RouteTable;

/// Error raised while assembling the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("route table: {0}")]
    Routes(#[from] ConfigError),

    #[error("upstream client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<RouteTable>,
    pub forwarder: Forwarder,
    pub trust_forwarded_headers: bool,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GatewayConfig) -> Result<Self, ServerError> {
        let routes = RouteTable::from_config(&config)?;
        for shadow in routes.shadowed_prefixes() {
            tracing::warn!(
                route = %shadow.route,
                prefix = %shadow.prefix,
                shadowed_by_route = %shadow.shadowed_by_route,
                shadowed_by_prefix = %shadow.shadowed_by_prefix,
                "Route prefix can never match; declare it before the broader prefix"
            );
        }
        tracing::info!(routes = routes.len(), "Route table compiled");

        let state = AppState {
            routes: Arc::new(routes),
            forwarder: Forwarder::new(&config.timeouts)?,
            trust_forwarded_headers: config.listener.trust_forwarded_headers,
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let x_request_id = HeaderName::from_static(X_REQUEST_ID);

        let router = Router::new()
            .route("/health", get(health::health).fallback(proxy_handler))
            .route("/", any(proxy_handler))
            .route("/{*path}", any(proxy_handler))
            .with_state(state);

        let router = if config.cors.enabled {
            cors::layer(router)
        } else {
            router
        };

        router.layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
    }

    /// Axum router, for serving or driving in tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self
            .router
            .into_make_service_with_connect_info::<std::net::SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                lifecycle::triggered(shutdown).await;
                tracing::info!("Draining in-flight requests");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

/// Main proxy handler.
/// Looks up the route, forwards the request, rewrites the response.
async fn proxy_handler(
    State(state): State<AppState>,
    request: Request<Body>,
) -> Result<Response, GatewayError> {
    let start = Instant::now();
    let (parts, body) = request.into_parts();
    let method = parts.method.to_string();

    // Routed
    let Some(route) = state.routes.resolve(parts.uri.path()) else {
        tracing::warn!(method = %method, path = %parts.uri.path(), "No route matched");
        metrics::record_request(&method, 404, "none", start);
        return Err(GatewayError::RouteNotFound {
            path: parts.uri.path().to_string(),
        });
    };
    let ctx = RequestContext::new(&parts, &route, state.trust_forwarded_headers);
    let upstream = route.entry.upstream();

    tracing::debug!(
        request_id = %ctx.request_id,
        method = %ctx.method,
        path = %ctx.original_path,
        upstream_path = %ctx.rewritten_path,
        route = %route.entry.name(),
        upstream = %ctx.upstream,
        has_authorization = ctx.has_authorization,
        "Forwarding request"
    );

    // Forwarding
    match state.forwarder.forward(parts, body, upstream, &ctx).await {
        Ok(upstream_response) => {
            let status = upstream_response.status();
            tracing::debug!(
                request_id = %ctx.request_id,
                status = %status,
                upstream = %ctx.upstream,
                "Upstream responded"
            );
            metrics::record_request(&method, status.as_u16(), &ctx.upstream, start);
            Ok(response::into_client_response(upstream_response, upstream, &ctx))
        }
        Err(err) => {
            tracing::error!(
                request_id = %ctx.request_id,
                method = %ctx.method,
                path = %ctx.original_path,
                upstream = %ctx.upstream,
                error = %err,
                "Upstream request failed"
            );
            metrics::record_request(&method, err.status().as_u16(), &ctx.upstream, start);
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::http::StatusCode;
    use tower::ServiceExt;

    fn unreachable_config() -> GatewayConfig {
        let mut config = GatewayConfig::default();
        for url in config.services.values_mut() {
            *url = "http://127.0.0.1:1".to_string();
        }
        config
    }

    #[tokio::test]
    async fn health_never_touches_upstreams() {
        let server = HttpServer::new(unreachable_config()).unwrap();
        let response = server
            .router()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(X_REQUEST_ID));
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(
            serde_json::from_slice::<serde_json::Value>(&body).unwrap(),
            serde_json::json!({"status": "ok", "service": "api-gateway"})
        );
    }

    #[tokio::test]
    async fn unrouted_path_is_404_envelope() {
        let server = HttpServer::new(unreachable_config()).unwrap();
        let response = server
            .router()
            .oneshot(Request::get("/v9/nothing").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let envelope: crate::http::ErrorEnvelope = serde_json::from_slice(&body).unwrap();
        assert_eq!(envelope.error, "Not Found");
    }

    #[tokio::test]
    async fn non_get_health_falls_through_to_routing() {
        let server = HttpServer::new(unreachable_config()).unwrap();
        let response = server
            .router()
            .oneshot(Request::post("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn cors_preflight_answered_locally() {
        let server = HttpServer::new(unreachable_config()).unwrap();
        let response = server
            .router()
            .oneshot(
                Request::options("/v1/users/me")
                    .header("origin", "http://localhost:5173")
                    .header("access-control-request-method", "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
    }

    #[test]
    fn invalid_route_table_is_rejected() {
        let mut config = GatewayConfig::default();
        config.services.remove("users");
        assert!(matches!(HttpServer::new(config), Err(ServerError::Routes(_))));
    }
}
