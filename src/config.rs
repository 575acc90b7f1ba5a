//! Configuration parsing.
//!
//! Settings come from a TOML file (default `./config/isb.toml`). Every
//! key has a compiled default, so an empty file, or no file at the
//! default location, yields a working configuration that talks to the
//! public iSamples central index.
//!
//! ```toml
//! [server]
//! url = "https://central.isample.xyz/isamples_central/"
//! timeout_secs = 10
//! user_agent = "isamples-client/0.1.0"
//!
//! [transport]
//! post_threshold_bytes = 2048
//! ```

use anyhow::{bail, Context, Result};
use isamples_core::transport::TransportPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "./config/isb.toml";
pub const DEFAULT_SERVER_URL: &str = "https://central.isample.xyz/isamples_central/";

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub transport: TransportPolicy,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_url() -> String {
    DEFAULT_SERVER_URL.to_string()
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_user_agent() -> String {
    format!("isamples-client/{}", env!("CARGO_PKG_VERSION"))
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        let url = reqwest::Url::parse(self.server.url.trim())
            .with_context(|| format!("server.url is not a valid URL: '{}'", self.server.url))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            bail!("server.url must be http or https, got '{}'", url.scheme());
        }
        if self.server.timeout_secs == 0 {
            bail!("server.timeout_secs must be > 0");
        }
        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    config.validate()?;
    Ok(config)
}

/// Load `path` when given; otherwise the default path if it exists, or
/// compiled defaults.
pub fn resolve_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(p) => load_config(p),
        None => {
            let default = Path::new(DEFAULT_CONFIG_PATH);
            if default.exists() {
                load_config(default)
            } else {
                Ok(Config::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let f = write_config("");
        let cfg = load_config(f.path()).unwrap();
        assert_eq!(cfg.server.url, DEFAULT_SERVER_URL);
        assert_eq!(cfg.server.timeout_secs, 10);
        assert_eq!(cfg.transport.post_threshold_bytes, 2048);
        assert!(cfg.server.user_agent.starts_with("isamples-client/"));
    }

    #[test]
    fn test_overrides() {
        let f = write_config(
            r#"
[server]
url = "http://localhost:8983/solr/isb_core_records/"
timeout_secs = 3

[transport]
post_threshold_bytes = 100
"#,
        );
        let cfg = load_config(f.path()).unwrap();
        assert_eq!(cfg.server.url, "http://localhost:8983/solr/isb_core_records/");
        assert_eq!(cfg.server.timeout_secs, 3);
        assert_eq!(cfg.transport.post_threshold_bytes, 100);
    }

    #[test]
    fn test_bad_url_rejected() {
        let f = write_config("[server]\nurl = \"not a url\"\n");
        assert!(load_config(f.path()).is_err());

        let f = write_config("[server]\nurl = \"ftp://example.org/\"\n");
        assert!(load_config(f.path()).is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let f = write_config("[server]\ntimeout_secs = 0\n");
        assert!(load_config(f.path()).is_err());
    }

    #[test]
    fn test_explicit_missing_path_is_error() {
        let err = resolve_config(Some(Path::new("/nonexistent/isb.toml"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_roundtrip_through_toml() {
        let text = toml::to_string_pretty(&Config::default()).unwrap();
        let cfg: Config = toml::from_str(&text).unwrap();
        assert_eq!(cfg.server.url, DEFAULT_SERVER_URL);
    }
}
