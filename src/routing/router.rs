//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Store compiled routes in declaration order
//! - Look up the matching route for a request path
//! - Return matched route or explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) prefix scan; the first declared match wins even when a later
//!   route has a longer prefix
//! - Explicit NoMatch rather than silent default

use url::{Position, Url};

use crate::config::{ConfigError, GatewayConfig, ValidationError};
use crate::routing::matcher::PrefixMatcher;
use crate::routing::rewrite::{PathRewriter, RewriteRule};

/// An upstream service base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upstream {
    name: String,
    base: Url,
}

impl Upstream {
    /// Parse an absolute http(s) base URL.
    pub fn parse(name: impl Into<String>, base: &str) -> Result<Self, ValidationError> {
        let name = name.into();
        let invalid = |reason: String| ValidationError::InvalidServiceUrl {
            service: name.clone(),
            url: base.to_string(),
            reason,
        };
        let url = Url::parse(base).map_err(|e| invalid(e.to_string()))?;
        if url.host_str().is_none() || !matches!(url.scheme(), "http" | "https") {
            return Err(invalid("expected an absolute http(s) URL".to_string()));
        }
        Ok(Self { name, base: url })
    }

    /// Service name, used in logs and metrics.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Hostname without port, as compared by the Location rewrite.
    pub fn hostname(&self) -> &str {
        self.base.host_str().unwrap_or_default()
    }

    /// Value for the `Host` header of upstream requests.
    pub fn authority(&self) -> String {
        match self.base.port() {
            Some(port) => format!("{}:{}", self.hostname(), port),
            None => self.hostname().to_string(),
        }
    }

    /// Absolute URL for a rewritten path (with query).
    ///
    /// A base URL carrying a path is used as a mount point.
    pub fn url_for(&self, path_and_query: &str) -> String {
        let root = self.base[..Position::AfterPath].trim_end_matches('/');
        format!("{}{}", root, path_and_query)
    }
}

/// A compiled route.
#[derive(Debug, Clone)]
pub struct RouteEntry {
    name: String,
    matcher: PrefixMatcher,
    upstream: Upstream,
    rewriter: PathRewriter,
}

impl RouteEntry {
    pub fn new(
        name: impl Into<String>,
        matcher: PrefixMatcher,
        upstream: Upstream,
        rewriter: PathRewriter,
    ) -> Self {
        Self {
            name: name.into(),
            matcher,
            upstream,
            rewriter,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prefixes(&self) -> &[String] {
        self.matcher.prefixes()
    }

    pub fn upstream(&self) -> &Upstream {
        &self.upstream
    }

    pub fn rewriter(&self) -> &PathRewriter {
        &self.rewriter
    }
}

/// Result of a successful lookup.
#[derive(Debug, Clone, Copy)]
pub struct RouteMatch<'a> {
    pub entry: &'a RouteEntry,
    pub prefix: &'a str,
}

/// A prefix that can never be selected because an earlier route claims
/// every path it would match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShadowedPrefix {
    pub route: String,
    pub prefix: String,
    pub shadowed_by_route: String,
    pub shadowed_by_prefix: String,
}

/// Immutable, ordered routing table.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
}

impl RouteTable {
    pub fn new(entries: Vec<RouteEntry>) -> Self {
        Self { entries }
    }

    /// Compile the configured routes, preserving their order.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, ConfigError> {
        let mut errors = Vec::new();
        let mut entries = Vec::with_capacity(config.routes.len());

        for route in &config.routes {
            let Some(base) = config.services.get(&route.service) else {
                errors.push(ValidationError::UnknownService {
                    route: route.name.clone(),
                    service: route.service.clone(),
                });
                continue;
            };
            let upstream = match Upstream::parse(&route.service, base) {
                Ok(upstream) => upstream,
                Err(e) => {
                    errors.push(e);
                    continue;
                }
            };
            let rules = route
                .rewrite
                .iter()
                .map(|r| RewriteRule::new(&r.from, &r.to))
                .collect();
            entries.push(RouteEntry::new(
                &route.name,
                PrefixMatcher::new(route.prefixes.iter().cloned()),
                upstream,
                PathRewriter::new(rules),
            ));
        }

        if errors.is_empty() {
            Ok(Self::new(entries))
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Find the first route whose prefix set matches `path`.
    pub fn resolve(&self, path: &str) -> Option<RouteMatch<'_>> {
        self.entries.iter().find_map(|entry| {
            entry
                .matcher
                .matches(path)
                .map(|prefix| RouteMatch { entry, prefix })
        })
    }

    /// Prefixes that lose to an earlier route with a shorter (or equal) prefix.
    pub fn shadowed_prefixes(&self) -> Vec<ShadowedPrefix> {
        let mut shadowed = Vec::new();
        for (i, later) in self.entries.iter().enumerate() {
            for prefix in later.prefixes() {
                let earlier = self.entries[..i].iter().find_map(|entry| {
                    entry.matcher.matches(prefix).map(|p| (entry, p))
                });
                if let Some((entry, by)) = earlier {
                    shadowed.push(ShadowedPrefix {
                        route: later.name.clone(),
                        prefix: prefix.clone(),
                        shadowed_by_route: entry.name.clone(),
                        shadowed_by_prefix: by.to_string(),
                    });
                }
            }
        }
        shadowed
    }

    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RouteConfig;

    fn entry(name: &str, prefixes: &[&str], base: &str) -> RouteEntry {
        RouteEntry::new(
            name,
            PrefixMatcher::new(prefixes.iter().copied()),
            Upstream::parse(name, base).unwrap(),
            PathRewriter::identity(),
        )
    }

    fn default_table() -> RouteTable {
        RouteTable::from_config(&GatewayConfig::default()).unwrap()
    }

    #[test]
    fn earlier_entry_wins_over_longer_prefix() {
        let table = RouteTable::new(vec![
            entry("broad", &["/v1/threads"], "http://broad.internal"),
            entry("narrow", &["/v1/threads/threads"], "http://narrow.internal"),
        ]);

        let matched = table.resolve("/v1/threads/threads/42").unwrap();
        assert_eq!(matched.entry.name(), "broad");
        assert_eq!(matched.prefix, "/v1/threads");

        assert_eq!(
            table.shadowed_prefixes(),
            vec![ShadowedPrefix {
                route: "narrow".into(),
                prefix: "/v1/threads/threads".into(),
                shadowed_by_route: "broad".into(),
                shadowed_by_prefix: "/v1/threads".into(),
            }]
        );
    }

    #[test]
    fn unknown_path_is_no_match() {
        let table = default_table();
        assert!(table.resolve("/v2/unknown").is_none());
        assert!(table.resolve("/").is_none());
        assert!(table.resolve("/health").is_none());
    }

    #[test]
    fn default_table_resolves_every_service() {
        let table = default_table();
        let cases = [
            ("/v1/users/me", "users", "/v1/users/me"),
            ("/v1/auth/login", "users", "/v1/auth/login"),
            ("/v1/members/3", "channels", "/v1/members/3"),
            ("/v1/threads/threads/42", "threads", "/threads/threads/42"),
            ("/v1/threads/channel/9?page=2", "threads", "/threads/channel/9?page=2"),
            ("/v1/threads/health", "threads", "/threads/health"),
            ("/v1/threads/admin/x", "threads", "/threads/admin/x"),
            ("/v1/threads/moderation/q", "threads", "/threads/moderation/q"),
            ("/v1/threads/message/1", "threads", "/threads/message/1"),
            ("/threads/5/messages", "messages", "/threads/5/messages"),
            ("/v1/files/upload", "files", "/v1/files/upload"),
            ("/api/v1/ping", "moderation", "/api/v1/ping"),
            ("/api/v1/blacklist/words", "moderation", "/api/v1/blacklist/words"),
            ("/api/v1.0.0/presence/u1", "presence", "/api/v1.0.0/presence/u1"),
            ("/api/message?q=hi", "search", "/api/message?q=hi"),
            ("/api/livez", "search", "/api/livez"),
            ("/chat-wikipedia/ask", "wiki_bot", "/chat-wikipedia/ask"),
            ("/chat/ask", "prog_bot", "/chat/ask"),
        ];

        for (path, service, upstream_path) in cases {
            let only_path = path.split('?').next().unwrap();
            let matched = table.resolve(only_path).unwrap_or_else(|| panic!("no route for {path}"));
            assert_eq!(matched.entry.upstream().name(), service, "{path}");
            assert_eq!(matched.entry.rewriter().rewrite(path), upstream_path, "{path}");
        }
    }

    #[test]
    fn default_table_has_no_shadowed_prefixes() {
        assert!(default_table().shadowed_prefixes().is_empty());
    }

    #[test]
    fn thread_routes_precede_messages() {
        // `/threads` alone goes to messages; the rewritten thread routes only
        // claim the `/v1/threads/...` namespace.
        let table = default_table();
        assert_eq!(table.resolve("/threads").unwrap().entry.upstream().name(), "messages");
        assert_eq!(
            table.resolve("/v1/threads/threads").unwrap().entry.name(),
            "threads-threads"
        );
    }

    #[test]
    fn from_config_rejects_unknown_service() {
        let mut config = GatewayConfig::default();
        config.routes.push(RouteConfig {
            name: "orphan".into(),
            service: "missing".into(),
            prefixes: vec!["/orphan".into()],
            rewrite: Vec::new(),
        });
        assert!(matches!(
            RouteTable::from_config(&config),
            Err(ConfigError::Validation(errors)) if errors.len() == 1
        ));
    }

    #[test]
    fn upstream_urls() {
        let plain = Upstream::parse("threads", "https://threads.inf326.nursoft.dev").unwrap();
        assert_eq!(plain.hostname(), "threads.inf326.nursoft.dev");
        assert_eq!(plain.authority(), "threads.inf326.nursoft.dev");
        assert_eq!(
            plain.url_for("/threads/threads/42?x=1"),
            "https://threads.inf326.nursoft.dev/threads/threads/42?x=1"
        );

        let mounted = Upstream::parse("files", "http://127.0.0.1:9000/svc/").unwrap();
        assert_eq!(mounted.authority(), "127.0.0.1:9000");
        assert_eq!(mounted.url_for("/v1/files/a"), "http://127.0.0.1:9000/svc/v1/files/a");

        // Default ports are not repeated in the Host header.
        let default_port = Upstream::parse("x", "https://x.internal:443").unwrap();
        assert_eq!(default_port.authority(), "x.internal");

        assert!(Upstream::parse("bad", "mailto:ops@example.com").is_err());
    }
}
