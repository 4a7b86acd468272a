//! Route matching logic.
//!
//! # Responsibilities
//! - Match the request path against an ordered set of prefixes
//! - Report which prefix matched (for logging)
//!
//! # Design Decisions
//! - Path matching is case-sensitive and purely textual (`starts_with`)
//! - Prefixes are tried in declaration order within a set
//! - No regex, no segment awareness: `/chat` matches `/chat-wikipedia`

/// An ordered set of path prefixes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixMatcher {
    prefixes: Vec<String>,
}

impl PrefixMatcher {
    /// Create a matcher. Duplicate prefixes are dropped, order is kept.
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for prefix in prefixes {
            let prefix = prefix.into();
            if !unique.contains(&prefix) {
                unique.push(prefix);
            }
        }
        Self { prefixes: unique }
    }

    /// Returns the first prefix `path` starts with.
    pub fn matches(&self, path: &str) -> Option<&str> {
        self.prefixes
            .iter()
            .map(String::as_str)
            .find(|prefix| path.starts_with(prefix))
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }
}
