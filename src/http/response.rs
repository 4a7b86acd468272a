//! Response handling and transformation.
//!
//! # Responsibilities
//! - Rewrite `Location` headers that point back at the upstream itself
//! - Copy status and end-to-end headers verbatim
//! - Stream the upstream body to the client
//!
//! # Design Decisions
//! - Streaming responses avoid buffering entire body
//! - Hop-by-hop headers stripped; framing is re-derived by the server
//! - A Location that fails to parse is passed through unchanged
//! - Hostname comparison only: ports and schemes of the upstream are ignored

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderValue},
    response::Response,
};
use futures_util::TryStreamExt;
use url::{Position, Url};

use crate::http::request::{strip_hop_by_hop, RequestContext};
use crate::routing::Upstream;

/// Rewrite one `Location` value.
///
/// Returns `None` when the value must be left as is: unparseable, pointing to
/// another host, or the public host is unknown.
pub fn rewrite_location(location: &str, upstream: &Upstream, ctx: &RequestContext) -> Option<String> {
    let target: Url = match upstream.base_url().join(location) {
        Ok(url) => url,
        Err(e) => {
            tracing::debug!(
                request_id = %ctx.request_id,
                error = %e,
                "Unparseable Location header left untouched"
            );
            return None;
        }
    };

    if target.host_str() != Some(upstream.hostname()) {
        return None;
    }
    let public_host = ctx.client_host.as_deref()?;

    Some(format!(
        "{}://{}{}",
        ctx.client_scheme,
        public_host,
        &target[Position::BeforePath..]
    ))
}

/// Apply [`rewrite_location`] to every `Location` value in place.
pub fn rewrite_location_headers(headers: &mut HeaderMap, upstream: &Upstream, ctx: &RequestContext) {
    if !headers.contains_key(header::LOCATION) {
        return;
    }

    let rewritten: Vec<HeaderValue> = headers
        .get_all(header::LOCATION)
        .iter()
        .map(|value| {
            value
                .to_str()
                .ok()
                .and_then(|raw| {
                    let new = rewrite_location(raw, upstream, ctx)?;
                    tracing::debug!(
                        request_id = %ctx.request_id,
                        from = %raw,
                        to = %new,
                        "Rewrote Location"
                    );
                    HeaderValue::from_str(&new).ok()
                })
                .unwrap_or_else(|| value.clone())
        })
        .collect();

    headers.remove(header::LOCATION);
    for value in rewritten {
        headers.append(header::LOCATION, value);
    }
}

/// Turn the upstream response into the client response.
pub fn into_client_response(
    upstream_response: reqwest::Response,
    upstream: &Upstream,
    ctx: &RequestContext,
) -> Response {
    let status = upstream_response.status();
    let mut headers = upstream_response.headers().clone();
    strip_hop_by_hop(&mut headers);
    rewrite_location_headers(&mut headers, upstream, ctx);

    let request_id = ctx.request_id.clone();
    let stream = upstream_response.bytes_stream().inspect_err(move |e| {
        // Headers are already out; the client sees a truncated body.
        tracing::warn!(request_id = %request_id, error = %e, "Upstream body stream aborted");
    });

    let mut response = Response::new(Body::from_stream(stream));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}
