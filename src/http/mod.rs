//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, /health short-circuit)
//!     → cors.rs (preflight answered locally, upstream CORS headers win)
//!     → [routing layer resolves route + upstream path]
//!     → request.rs (request context, header preparation)
//!     → forward.rs (stream to upstream, timeouts, no redirect following)
//!     → response.rs (Location rewrite, stream body back)
//!     → Send to client
//!
//! Any failure along the way → error.rs (status + JSON envelope)
//! ```

pub mod cors;
pub mod error;
pub mod forward;
pub mod request;
pub mod response;
pub mod server;

pub use error::{ErrorEnvelope, GatewayError};
pub use forward::Forwarder;
pub use request::{RequestContext, X_REQUEST_ID};
pub use server::{HttpServer, ServerError};
