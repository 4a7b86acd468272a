//! Gateway failures and their client-facing envelope.
//!
//! # Status Mapping
//! - `RouteNotFound` → 404
//! - `UpstreamUnreachable` (refused, DNS) → 502
//! - `UpstreamTimeout` (connect or idle read) → 504
//! - anything else from the transport → 500
//!
//! The envelope only ever carries a short cause. Upstream URLs are stripped
//! from transport errors before their message is used.

use std::error::Error as StdError;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The only body shape returned on gateway failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: String,
    pub details: String,
}

/// Failure of a single proxied request.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("no route for path {path}")]
    RouteNotFound { path: String },

    #[error("upstream unreachable: {0}")]
    UpstreamUnreachable(String),

    #[error("upstream timed out: {0}")]
    UpstreamTimeout(String),

    #[error("transport failure: {0}")]
    Transport(String),
}

impl GatewayError {
    /// Classify a failed upstream call.
    pub fn from_upstream(err: reqwest::Error) -> Self {
        // Connect timeouts report both `is_timeout` and `is_connect`.
        let timeout = err.is_timeout();
        let connect = err.is_connect();
        let cause = root_cause(&err.without_url());

        if timeout {
            GatewayError::UpstreamTimeout(cause)
        } else if connect {
            GatewayError::UpstreamUnreachable(cause)
        } else {
            GatewayError::Transport(cause)
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            GatewayError::UpstreamUnreachable(_) => StatusCode::BAD_GATEWAY,
            GatewayError::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::Transport(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn envelope(&self) -> ErrorEnvelope {
        let (error, details) = match self {
            GatewayError::RouteNotFound { path } => {
                ("Not Found", format!("No route configured for {path}"))
            }
            GatewayError::UpstreamUnreachable(cause) => ("Bad Gateway", cause.clone()),
            GatewayError::UpstreamTimeout(cause) => ("Gateway Timeout", cause.clone()),
            GatewayError::Transport(cause) => ("Proxy Error", cause.clone()),
        };
        ErrorEnvelope {
            error: error.to_string(),
            details,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.envelope())).into_response()
    }
}

/// Message of the innermost error in the chain.
fn root_cause(err: &(dyn StdError + 'static)) -> String {
    let mut current = err;
    while let Some(source) = current.source() {
        current = source;
    }
    current.to_string()
}
