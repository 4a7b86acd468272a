//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from TOML files; every
//! section falls back to the built-in campus deployment when omitted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Built-in upstream services: (name, environment variable, default base URL).
pub const SERVICE_DEFAULTS: &[(&str, &str, &str)] = &[
    ("users", "USERS_SERVICE_URL", "https://users.inf326.nursoft.dev"),
    ("channels", "CHANNELS_SERVICE_URL", "https://channel-api.inf326.nur.dev"),
    ("threads", "THREADS_SERVICE_URL", "https://threads.inf326.nursoft.dev"),
    ("messages", "MESSAGES_SERVICE_URL", "https://messages-service.kroder.dev"),
    ("files", "FILES_SERVICE_URL", "http://file-service-134-199-176-197.nip.io"),
    ("moderation", "MODERATION_SERVICE_URL", "https://moderation.inf326.nur.dev"),
    ("presence", "PRESENCE_SERVICE_URL", "https://presence-134-199-176-197.nip.io"),
    ("search", "SEARCH_SERVICE_URL", "https://searchservice.inf326.nursoft.dev"),
    ("wiki_bot", "WIKI_BOT_SERVICE_URL", "http://wikipedia-chatbot-134-199-176-197.nip.io"),
    ("prog_bot", "PROG_BOT_SERVICE_URL", "https://chatbotprogra.inf326.nursoft.dev"),
];

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind host, port).
    pub listener: ListenerConfig,

    /// Upstream call timeouts.
    pub timeouts: TimeoutConfig,

    /// Upstream base URLs keyed by service name.
    pub services: BTreeMap<String, String>,

    /// Route definitions, in precedence order.
    pub routes: Vec<RouteConfig>,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Cross-origin settings.
    pub cors: CorsConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            timeouts: TimeoutConfig::default(),
            services: default_services(),
            routes: default_routes(),
            observability: ObservabilityConfig::default(),
            cors: CorsConfig::default(),
        }
    }
}

/// Base URLs of the built-in upstream services.
pub fn default_services() -> BTreeMap<String, String> {
    SERVICE_DEFAULTS
        .iter()
        .map(|(name, _, url)| (name.to_string(), url.to_string()))
        .collect()
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind.
    pub host: String,

    /// Listen port (overridden by `PORT`).
    pub port: u16,

    /// Trust `X-Forwarded-Proto` and `X-Forwarded-Host` from a front end:
    /// the first sets the public scheme, the second is passed upstream as is.
    pub trust_forwarded_headers: bool,
}

impl ListenerConfig {
    /// Socket address string, e.g. "0.0.0.0:3000".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            trust_forwarded_headers: true,
        }
    }
}

/// Timeout configuration for upstream calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Maximum silence between two reads from an upstream, in seconds.
    pub read_idle_secs: u64,

    /// How long an unused pooled upstream connection is kept, in seconds.
    pub pool_idle_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            read_idle_secs: 30,
            pool_idle_secs: 90,
        }
    }
}

/// Route configuration mapping path prefixes to an upstream service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Route identifier for logging/metrics.
    pub name: String,

    /// Service name, a key of `services`.
    pub service: String,

    /// Path prefixes; any one of them selects this route.
    pub prefixes: Vec<String>,

    /// Prefix substitutions applied before forwarding. First match fires.
    #[serde(default)]
    pub rewrite: Vec<RewriteConfig>,
}

/// A single prefix substitution.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RewriteConfig {
    pub from: String,
    pub to: String,
}

impl RouteConfig {
    fn passthrough(name: &str, service: &str, prefixes: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            service: service.to_string(),
            prefixes: prefixes.iter().map(|p| p.to_string()).collect(),
            rewrite: Vec::new(),
        }
    }

    fn rewritten(name: &str, service: &str, from: &str, to: &str) -> Self {
        Self {
            name: name.to_string(),
            service: service.to_string(),
            prefixes: vec![from.to_string()],
            rewrite: vec![RewriteConfig {
                from: from.to_string(),
                to: to.to_string(),
            }],
        }
    }
}

/// The campus routing table.
///
/// Order matters: the first route with a matching prefix wins, so narrower
/// prefixes (`/v1/threads/...`, `/chat-wikipedia`) sit above the broader
/// ones they would otherwise lose to (`/threads`, `/chat`).
pub fn default_routes() -> Vec<RouteConfig> {
    vec![
        RouteConfig::passthrough("users", "users", &["/v1/users", "/v1/auth"]),
        RouteConfig::passthrough("channels", "channels", &["/v1/channels", "/v1/members"]),
        RouteConfig::rewritten("threads-threads", "threads", "/v1/threads/threads", "/threads/threads"),
        RouteConfig::rewritten("threads-channel", "threads", "/v1/threads/channel", "/threads/channel"),
        RouteConfig::rewritten("threads-health", "threads", "/v1/threads/health", "/threads/health"),
        RouteConfig::rewritten("threads-admin", "threads", "/v1/threads/admin", "/threads/admin"),
        RouteConfig::rewritten(
            "threads-moderation",
            "threads",
            "/v1/threads/moderation",
            "/threads/moderation",
        ),
        RouteConfig::rewritten("threads-message", "threads", "/v1/threads/message", "/threads/message"),
        RouteConfig::passthrough("messages", "messages", &["/threads"]),
        RouteConfig::passthrough("files", "files", &["/v1/files"]),
        RouteConfig::passthrough(
            "moderation",
            "moderation",
            &[
                "/api/v1/moderation",
                "/api/v1/blacklist",
                "/api/v1/admin",
                "/api/v1/ping",
                "/api/v1/health",
            ],
        ),
        RouteConfig::passthrough("presence", "presence", &["/api/v1.0.0/presence"]),
        RouteConfig::passthrough(
            "search",
            "search",
            &[
                "/api/message",
                "/api/files",
                "/api/channel",
                "/api/threads",
                "/api/healthz",
                "/api/livez",
            ],
        ),
        RouteConfig::passthrough("wiki-bot", "wiki_bot", &["/chat-wikipedia"]),
        RouteConfig::passthrough("prog-bot", "prog_bot", &["/chat"]),
    ]
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes precedence.
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Cross-origin resource sharing.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Answer every origin permissively and handle preflights locally.
    pub enabled: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}
