//! Request router for kati
//!
//! Compiles raw `<pattern> -> <host:port>` mapping strings into an ordered,
//! immutable rule table and picks a backend target for every request path.
//!
//! Patterns are unanchored: a rule matches if its regex occurs anywhere in
//! the path, not only when it spans the whole path. Operators who want
//! prefix- or full-path matching must anchor explicitly (`^/api/`).

use std::sync::Arc;

use axum::http::{header, HeaderValue, Request, Uri};
use regex::Regex;
use tracing::info;

use crate::error::{ProxyError, Result};

/// Token separating the pattern half of a mapping from its target.
pub const MAPPING_SEPARATOR: &str = "->";

/// A single routing rule: a compiled path pattern and the backend it maps to.
#[derive(Debug, Clone)]
pub struct Rule {
    pattern: Regex,
    target: String,
}

impl Rule {
    /// Pattern text as written in the mapping.
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// Backend address (`host:port`) this rule forwards to.
    pub fn target(&self) -> &str {
        &self.target
    }
}

/// Ordered, immutable sequence of rules.
///
/// The last rule is the fallback: it is selected whenever no earlier rule
/// matches, whether or not its own pattern matches. A compiled table is
/// never empty; [`RuleTable::compile`] rejects an empty mapping list so the
/// fallback always exists. There is no way to mutate a table after
/// construction, which is what makes lock-free sharing across connection
/// tasks sound.
#[derive(Debug, Clone)]
pub struct RuleTable {
    rules: Vec<Rule>,
}

impl RuleTable {
    /// Compile raw mapping strings into a rule table, preserving input order.
    ///
    /// Rules are never reordered, merged, or deduplicated; the table mirrors
    /// the input exactly.
    pub fn compile<I, S>(mappings: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut rules = Vec::new();
        for mapping in mappings {
            rules.push(parse_mapping(mapping.as_ref())?);
        }
        if rules.is_empty() {
            return Err(ProxyError::Config(
                "no proxy mappings configured".to_string(),
            ));
        }
        Ok(Self { rules })
    }

    /// Number of rules in the table. At least 1 for any compiled table.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Iterate the rules in table order.
    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }
}

/// Parse one `<pattern> -> <target>` mapping.
///
/// The separator token may also occur inside the pattern text; only the last
/// occurrence delimits the target. Both halves are trimmed independently.
fn parse_mapping(raw: &str) -> Result<Rule> {
    let (pattern, target) = raw
        .rsplit_once(MAPPING_SEPARATOR)
        .ok_or_else(|| ProxyError::InvalidMappingSyntax(raw.to_string()))?;

    let pattern = pattern.trim();
    let target = target.trim();

    let pattern =
        Regex::new(pattern).map_err(|_| ProxyError::InvalidPattern(pattern.to_string()))?;

    Ok(Rule {
        pattern,
        target: target.to_string(),
    })
}

/// Receives one record per routing decision.
///
/// Injected into the [`Router`] at construction so tests can observe
/// decisions deterministically instead of capturing process-global log
/// output.
pub trait DecisionSink: Send + Sync {
    fn record(&self, path: &str, target: &str);
}

/// Default sink: one `tracing` event per decision.
#[derive(Debug, Default)]
pub struct LogSink;

impl DecisionSink for LogSink {
    fn record(&self, path: &str, target: &str) {
        info!("Proxying: {} -> {}", path, target);
    }
}

/// Matches request paths against the rule table and rewrites requests toward
/// the selected backend.
///
/// Stateless per request: every decision is a pure function of the path and
/// the immutable table, so a `Router` behind an `Arc` can serve any number of
/// concurrent connection tasks without locking.
pub struct Router {
    table: RuleTable,
    sink: Arc<dyn DecisionSink>,
}

impl Router {
    /// Create a router that logs decisions through `tracing`.
    pub fn new(table: RuleTable) -> Self {
        Self::with_sink(table, Arc::new(LogSink))
    }

    /// Create a router reporting decisions to the given sink.
    pub fn with_sink(table: RuleTable, sink: Arc<dyn DecisionSink>) -> Self {
        Self { table, sink }
    }

    /// The rule table this router consults.
    pub fn table(&self) -> &RuleTable {
        &self.table
    }

    /// Select the backend target for a request path.
    ///
    /// Rules are scanned in table order and the first whose pattern matches
    /// anywhere in the path wins; no scoring, no longest-match. The final
    /// rule is the fallback and is selected without consulting its pattern,
    /// so routing cannot fail. Every invocation reports `{path, target}` to
    /// the decision sink.
    pub fn route(&self, path: &str) -> &str {
        let rules = &self.table.rules;
        // len >= 1 is guaranteed by RuleTable::compile
        let last = rules.len() - 1;
        let rule = rules[..last]
            .iter()
            .find(|rule| rule.pattern.is_match(path))
            .unwrap_or(&rules[last]);

        self.sink.record(path, rule.target());
        rule.target()
    }

    /// Rewrite `req` in place to point at the selected backend.
    ///
    /// The URI scheme is forced to plain `http` (backend transport is never
    /// encrypted), the URI authority and the `Host` header are both set to
    /// the target address, and the path and query are left untouched.
    /// Returns the selected target.
    pub fn rewrite<B>(&self, req: &mut Request<B>) -> Result<&str> {
        let target = self.route(req.uri().path());

        let path_and_query = req
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        let uri: Uri = format!("http://{}{}", target, path_and_query)
            .parse()
            .map_err(|e| ProxyError::Http(format!("invalid target address '{}': {}", target, e)))?;
        let host = HeaderValue::from_str(target)
            .map_err(|e| ProxyError::Http(format!("invalid target address '{}': {}", target, e)))?;

        *req.uri_mut() = uri;
        req.headers_mut().insert(header::HOST, host);

        Ok(target)
    }
}
