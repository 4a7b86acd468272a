//! Path rewriting.
//!
//! A route may carry prefix substitutions. The first rule whose pattern is a
//! prefix of the path fires; the rest of the path and the query string are
//! kept byte for byte. Rules never chain.

use std::borrow::Cow;

/// Replace `pattern` with `replacement` at the start of a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteRule {
    pattern: String,
    replacement: String,
}

impl RewriteRule {
    pub fn new(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            replacement: replacement.into(),
        }
    }

    fn apply(&self, path_and_query: &str) -> Option<String> {
        path_and_query
            .strip_prefix(self.pattern.as_str())
            .map(|rest| format!("{}{}", self.replacement, rest))
    }
}

/// Ordered rewrite rules of one route.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathRewriter {
    rules: Vec<RewriteRule>,
}

impl PathRewriter {
    pub fn new(rules: Vec<RewriteRule>) -> Self {
        Self { rules }
    }

    /// Pass-through rewriter.
    pub fn identity() -> Self {
        Self::default()
    }

    /// Rewrite a path (with optional query). Borrowed when nothing fires.
    pub fn rewrite<'a>(&self, path_and_query: &'a str) -> Cow<'a, str> {
        self.rules
            .iter()
            .find_map(|rule| rule.apply(path_and_query))
            .map_or(Cow::Borrowed(path_and_query), Cow::Owned)
    }

    pub fn is_identity(&self) -> bool {
        self.rules.is_empty()
    }
}
