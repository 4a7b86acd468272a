//! Campus chat API gateway library.
//!
//! One public entry point in front of the identity, channel, thread,
//! message, file, moderation, presence, search and chatbot services.

pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::RouteTable;
