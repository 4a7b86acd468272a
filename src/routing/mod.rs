//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request path
//!     → router.rs (ordered route lookup)
//!     → matcher.rs (prefix set evaluation)
//!     → rewrite.rs (prefix substitution for the upstream path)
//!     → Return: matched route + upstream path, or NoMatch
//!
//! Route Compilation (at startup):
//!     RouteConfig[] (declaration order)
//!     → Resolve service base URLs
//!     → Compile matchers and rewriters
//!     → Freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always matches same route
//! - First match wins, in declaration order, never longest-prefix

pub mod matcher;
pub mod rewrite;
pub mod router;

pub use matcher::PrefixMatcher;
pub use rewrite::{PathRewriter, RewriteRule};
pub use router::{RouteEntry, RouteMatch, RouteTable, ShadowedPrefix, Upstream};
