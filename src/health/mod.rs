//! Health subsystem.
//!
//! # Design Decisions
//! - Liveness only: `GET /health` never contacts an upstream
//! - No active or passive upstream checks; a failing upstream surfaces as a
//!   502/504 on the requests routed to it and nowhere else

pub mod probe;

pub use probe::{health, HealthStatus};
