//! Configuration for kati

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{ProxyError, Result};

/// Proxy configuration: the listen port and the raw routing mappings.
///
/// Mappings are kept as raw strings here; compiling them into a rule table
/// happens once, at server construction.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProxyConfig {
    /// Port to listen on for plain HTTP
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    /// Routing mappings, one `<pattern> -> <host:port>` per entry, in
    /// matching order; the last entry is the fallback backend.
    #[serde(default)]
    pub mappings: Vec<String>,
}

fn default_http_port() -> u16 {
    80
}

impl ProxyConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ProxyError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| ProxyError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.mappings.is_empty() {
            return Err(ProxyError::Config(
                "No proxy mappings configured".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            http_port: default_http_port(),
            mappings: Vec::new(),
        }
    }
}
