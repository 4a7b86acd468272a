//! Request handling and transformation.
//!
//! # Responsibilities
//! - Capture the per-request context (public host and scheme, paths, upstream)
//! - Strip hop-by-hop headers before forwarding
//! - Prepare the upstream header set (Host, X-Forwarded-*)
//!
//! # Design Decisions
//! - `Authorization` and every other end-to-end header pass through untouched
//! - `Host` is replaced with the upstream's own authority
//! - `X-Forwarded-For` gains the peer IP after every inbound entry
//! - With trusted forwarding headers, an inbound `X-Forwarded-Host` and
//!   `X-Forwarded-Proto` describe the public origin; otherwise the gateway
//!   derives both from the request it received
//! - Original request preserved for logging; modified copy forwarded

use std::net::IpAddr;

use axum::http::{
    header::{self, HeaderMap, HeaderName, HeaderValue},
    request::Parts,
    Method,
};

use crate::routing::RouteMatch;

/// Header carrying the gateway request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");
const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");

/// Connection-scoped headers, never forwarded as-is (RFC 9110 §7.6.1).
const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Everything known about one in-flight request.
///
/// Owned by the handler of that request and dropped with it.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
    pub method: Method,
    /// Inbound `Host`, i.e. the gateway's public authority.
    pub client_host: Option<String>,
    /// `http` or `https`, as seen by the client.
    pub client_scheme: String,
    /// Value sent upstream as `X-Forwarded-Host`.
    pub forwarded_host: Option<String>,
    /// Inbound path and query.
    pub original_path: String,
    /// Path and query sent upstream.
    pub rewritten_path: String,
    /// Upstream service name.
    pub upstream: String,
    pub has_authorization: bool,
}

impl RequestContext {
    pub fn new(parts: &Parts, route: &RouteMatch<'_>, trust_forwarded_headers: bool) -> Self {
        let original_path = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| parts.uri.path().to_string());
        let rewritten_path = route.entry.rewriter().rewrite(&original_path).into_owned();

        Self {
            request_id: header_str(&parts.headers, X_REQUEST_ID)
                .unwrap_or("unknown")
                .to_string(),
            method: parts.method.clone(),
            client_host: client_host(parts),
            client_scheme: client_scheme(parts, trust_forwarded_headers),
            forwarded_host: forwarded_host(parts, trust_forwarded_headers),
            original_path,
            rewritten_path,
            upstream: route.entry.upstream().name().to_string(),
            has_authorization: parts.headers.contains_key(header::AUTHORIZATION),
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Public authority: `Host`, or the URI authority for HTTP/2 requests.
fn client_host(parts: &Parts) -> Option<String> {
    header_str(&parts.headers, header::HOST.as_str())
        .map(str::to_string)
        .or_else(|| parts.uri.authority().map(|a| a.as_str().to_string()))
        .filter(|h| !h.is_empty())
}

/// Inbound `X-Forwarded-Host` when trusted, else the inbound `Host`.
fn forwarded_host(parts: &Parts, trust_forwarded_headers: bool) -> Option<String> {
    let trusted = trust_forwarded_headers
        .then(|| header_str(&parts.headers, X_FORWARDED_HOST.as_str()))
        .flatten()
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .map(str::to_string);
    trusted.or_else(|| client_host(parts))
}

/// Public scheme. The listener is plain HTTP; a TLS-terminating front end
/// reports the original scheme through `X-Forwarded-Proto`.
fn client_scheme(parts: &Parts, trust_forwarded_headers: bool) -> String {
    if trust_forwarded_headers {
        let forwarded = header_str(&parts.headers, X_FORWARDED_PROTO.as_str())
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_ascii_lowercase());
        if let Some(proto) = forwarded.filter(|p| p == "http" || p == "https") {
            return proto;
        }
    }
    parts
        .uri
        .scheme_str()
        .unwrap_or("http")
        .to_ascii_lowercase()
}

pub fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(name)
}

/// Remove hop-by-hop headers, including any listed in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed.iter().chain(HOP_BY_HOP.iter()) {
        headers.remove(name);
    }
}

/// Build the header set for the upstream request.
pub fn upstream_headers(
    inbound: &HeaderMap,
    ctx: &RequestContext,
    upstream_authority: &str,
    peer: Option<IpAddr>,
) -> HeaderMap {
    let mut headers = inbound.clone();
    strip_hop_by_hop(&mut headers);

    if let Ok(host) = HeaderValue::from_str(upstream_authority) {
        headers.insert(header::HOST, host);
    } else {
        headers.remove(header::HOST);
    }

    if let Some(ip) = peer {
        let mut chain: Vec<String> = inbound
            .get_all(&X_FORWARDED_FOR)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect();
        chain.push(ip.to_string());
        let chain = chain.join(", ");
        if let Ok(value) = HeaderValue::from_str(&chain) {
            headers.insert(X_FORWARDED_FOR, value);
        }
    }
    if let Some(value) = ctx
        .forwarded_host
        .as_deref()
        .and_then(|h| HeaderValue::from_str(h).ok())
    {
        headers.insert(X_FORWARDED_HOST, value);
    }
    if let Ok(value) = HeaderValue::from_str(&ctx.client_scheme) {
        headers.insert(X_FORWARDED_PROTO, value);
    }

    headers
}
