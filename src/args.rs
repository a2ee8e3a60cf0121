//! Command line argument parsing for kati.
//!
//! Mappings can be given directly with repeated `--proxy` flags, loaded from
//! a TOML file with `--config`, or both; flags win over file values.

use std::path::PathBuf;

use clap::Parser;

use crate::config::ProxyConfig;
use crate::error::Result;

/// Command line arguments for kati.
#[derive(Debug, Parser)]
#[command(name = env!("CARGO_PKG_NAME"))]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = env!("CARGO_PKG_DESCRIPTION"))]
#[command(
    long_about = "Simple proxy server to send requests to different hosts based on path matched by a regex.\n\nRules are tried in the order given; the last one is the fallback and receives every request no earlier rule matches. Patterns are unanchored: anchor explicitly (^/api/) for prefix-only matches.\n\nExample usage:\n  kati --proxy \"/api/.* -> api.example.com:8080\" --proxy \".* -> web.example.com:8080\""
)]
pub struct Args {
    /// Proxy mappings look like this: "/api/.* -> api.example.com:8080"
    #[arg(short = 'p', long = "proxy", value_name = "MAPPING")]
    pub proxy: Vec<String>,

    /// Port to listen for HTTP (not TLS) [default: 80]
    #[arg(long, value_name = "PORT")]
    pub http_port: Option<u16>,

    /// TOML configuration file; --proxy and --http-port override its values
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl Args {
    /// Resolve the CLI flags and the optional config file into a validated
    /// [`ProxyConfig`].
    ///
    /// Mappings given with `--proxy` replace the file's mapping list
    /// wholesale; interleaving the two would make rule order ambiguous.
    pub fn into_config(self) -> Result<ProxyConfig> {
        let mut config = match self.config {
            Some(path) => ProxyConfig::from_file(&path)?,
            None => ProxyConfig::default(),
        };

        if !self.proxy.is_empty() {
            config.mappings = self.proxy;
        }
        if let Some(port) = self.http_port {
            config.http_port = port;
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_repeated_proxy_flags_preserve_order() {
        let args = Args::try_parse_from([
            "kati",
            "--proxy",
            "/api/.* -> api.example.com:8080",
            "-p",
            ".* -> web.example.com:8080",
            "--http-port",
            "8080",
        ])
        .unwrap();

        let config = args.into_config().unwrap();
        assert_eq!(config.http_port, 8080);
        assert_eq!(
            config.mappings,
            [
                "/api/.* -> api.example.com:8080",
                ".* -> web.example.com:8080",
            ]
        );
    }

    #[test]
    fn test_port_defaults_to_80() {
        let args =
            Args::try_parse_from(["kati", "-p", ".* -> example.com:8080"]).unwrap();
        let config = args.into_config().unwrap();
        assert_eq!(config.http_port, 80);
    }

    #[test]
    fn test_no_mappings_is_an_error() {
        let args = Args::try_parse_from(["kati"]).unwrap();
        assert!(args.into_config().is_err());
    }

    #[test]
    fn test_flags_override_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "http_port = 9999\nmappings = [\"/file/.* -> file.example.com:1\"]"
        )
        .unwrap();

        let args = Args::try_parse_from([
            "kati",
            "--config",
            file.path().to_str().unwrap(),
            "--http-port",
            "8080",
        ])
        .unwrap();

        let config = args.into_config().unwrap();
        // port comes from the flag, mappings stay from the file
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.mappings, ["/file/.* -> file.example.com:1"]);
    }
}
