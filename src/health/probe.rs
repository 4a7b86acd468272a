//! Gateway liveness probe.
//!
//! Answers from the gateway process alone. An upstream outage must never make
//! the orchestrator restart the gateway.

use axum::Json;
use serde::Serialize;

/// Body of `GET /health`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub service: &'static str,
}

impl HealthStatus {
    pub const OK: Self = Self {
        status: "ok",
        service: "api-gateway",
    };
}

pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus::OK)
}
