//! Cross-origin handling.
//!
//! # Responsibilities
//! - Answer preflight `OPTIONS` requests at the gateway
//! - Add permissive CORS headers to responses whose upstream sent none
//!
//! # Design Decisions
//! - An upstream that sets any `access-control-*` header owns CORS for that
//!   response: its values go out exactly as sent and none of the gateway's
//!   are added
//! - An upstream `Vary` is kept ahead of the values the CORS layer adds
//! - `CorsLayer` overwrites headers it manages, so upstream values are
//!   saved in a response extension before it runs and put back after

use axum::{
    http::{header, HeaderMap, HeaderName, HeaderValue},
    middleware::map_response,
    response::Response,
    Router,
};
use tower_http::cors::CorsLayer;

/// Upstream headers the CORS layer would overwrite.
#[derive(Clone)]
struct UpstreamCors(HeaderMap);

fn is_cors_header(name: &HeaderName) -> bool {
    name.as_str().starts_with("access-control-")
}

/// Wrap `router` with permissive CORS that defers to upstream CORS headers.
pub fn layer(router: Router) -> Router {
    router
        .layer(map_response(save_upstream_cors))
        .layer(CorsLayer::permissive())
        .layer(map_response(restore_upstream_cors))
}

async fn save_upstream_cors(mut response: Response) -> Response {
    let saved: HeaderMap = response
        .headers()
        .iter()
        .filter(|(name, _)| is_cors_header(name) || **name == header::VARY)
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();

    if !saved.is_empty() {
        response.extensions_mut().insert(UpstreamCors(saved));
    }
    response
}

async fn restore_upstream_cors(mut response: Response) -> Response {
    let Some(UpstreamCors(saved)) = response.extensions_mut().remove::<UpstreamCors>() else {
        return response;
    };
    let upstream_owns_cors = saved.keys().any(is_cors_header);
    let headers = response.headers_mut();

    let added_vary: Vec<HeaderValue> = headers.get_all(header::VARY).iter().cloned().collect();
    headers.remove(header::VARY);

    if upstream_owns_cors {
        let added: Vec<HeaderName> = headers
            .keys()
            .filter(|name| is_cors_header(name))
            .cloned()
            .collect();
        for name in added {
            headers.remove(&name);
        }
    }

    for (name, value) in &saved {
        headers.append(name.clone(), value.clone());
    }
    if !upstream_owns_cors {
        for value in added_vary {
            headers.append(header::VARY, value);
        }
    }
    response
}
