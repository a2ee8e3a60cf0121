//! Error types for kati

use thiserror::Error;

/// Result type alias for proxy operations
pub type Result<T> = std::result::Result<T, ProxyError>;

/// Proxy error types
#[derive(Error, Debug)]
pub enum ProxyError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(String),

    /// Mapping string did not reduce to one pattern and one target
    #[error("Invalid mapping syntax for: {0}")]
    InvalidMappingSyntax(String),

    /// Pattern half of a mapping is not a valid regular expression
    #[error("Invalid regex: {0}")]
    InvalidPattern(String),
}
