//! Upstream forwarding.
//!
//! # Responsibilities
//! - Hold the pooled upstream client shared by all requests
//! - Stream the inbound body to the upstream without buffering
//! - Enforce connect and idle-read timeouts
//! - Surface redirects instead of following them
//!
//! # Design Decisions
//! - One `reqwest::Client` (connection pool inside, safe for concurrent use)
//! - Redirect policy is `none`: a 3xx must reach the Location rewrite
//! - Dropping the returned future aborts the upstream call, so a client
//!   disconnect cancels the in-flight request
//! - No retries

use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    body::{Body, HttpBody},
    extract::ConnectInfo,
    http::request::Parts,
};

use crate::config::TimeoutConfig;
use crate::http::error::GatewayError;
use crate::http::request::{upstream_headers, RequestContext};
use crate::routing::Upstream;

/// Forwards requests to upstream services.
#[derive(Debug, Clone)]
pub struct Forwarder {
    client: reqwest::Client,
}

impl Forwarder {
    /// Build the shared client from the configured timeouts.
    pub fn new(timeouts: &TimeoutConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .read_timeout(Duration::from_secs(timeouts.read_idle_secs))
            .pool_idle_timeout(Duration::from_secs(timeouts.pool_idle_secs))
            .no_proxy()
            .build()?;
        Ok(Self { client })
    }

    /// Send the request to `upstream` at `ctx.rewritten_path`.
    ///
    /// Resolves once the upstream response head has arrived; the body is
    /// left unread for the caller to stream.
    pub async fn forward(
        &self,
        parts: Parts,
        body: Body,
        upstream: &Upstream,
        ctx: &RequestContext,
    ) -> Result<reqwest::Response, GatewayError> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());
        let headers = upstream_headers(&parts.headers, ctx, &upstream.authority(), peer);

        let mut request = self
            .client
            .request(parts.method, upstream.url_for(&ctx.rewritten_path))
            .headers(headers);

        // An empty stream would be sent chunked; requests without a body
        // must stay without one.
        if !body.is_end_stream() {
            request = request.body(reqwest::Body::wrap_stream(body.into_data_stream()));
        }

        request.send().await.map_err(GatewayError::from_upstream)
    }
}
