//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! built-in defaults (campus services + routing table)
//!     → loader.rs (optional TOML file, then PORT / *_SERVICE_URL overrides)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → RouteTable built once, shared via Arc
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults so the gateway runs with no file at all
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_config_from, ConfigError};
pub use schema::{
    CorsConfig, GatewayConfig, ListenerConfig, ObservabilityConfig, RewriteConfig, RouteConfig,
    TimeoutConfig,
};
pub use validation::ValidationError;
