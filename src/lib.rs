//! kati: path-regex HTTP reverse proxy
//!
//! Routes each inbound request to one of several backend hosts by testing
//! the request path against an ordered list of regular expressions. The
//! first matching rule wins; the last rule is the fallback and receives
//! every request no earlier rule claims, whether or not its own pattern
//! matches.
//!
//! # Features
//!
//! - Ordered, first-match-wins path routing by regex
//! - Unconditional fallback backend (the last rule)
//! - Plain-HTTP forwarding with Host rewriting
//! - Mappings from repeatable CLI flags or a TOML file
//! - Request/decision logging
//!
//! # Example invocation
//!
//! ```text
//! kati --proxy "/api/.* -> api.example.com:8080" \
//!      --proxy ".* -> web.example.com:8080"
//! ```
//!
//! # Example Configuration
//!
//! ```toml
//! http_port = 80
//! mappings = [
//!     "/api/.* -> api.example.com:8080",
//!     ".* -> web.example.com:8080",
//! ]
//! ```
//!
//! Patterns are unanchored: a rule matches if its regex occurs anywhere in
//! the request path. `/api` also matches `/v2/api/users`; anchor explicitly
//! (`^/api/`) when only prefixes should match.

pub mod args;
pub mod config;
pub mod error;
pub mod proxy;
pub mod router;

pub use config::ProxyConfig;
pub use error::{ProxyError, Result};
pub use proxy::ProxyServer;
pub use router::{DecisionSink, LogSink, Router, Rule, RuleTable};
