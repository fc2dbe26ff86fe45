use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Application configuration loaded from environment variables
///
/// Every field is read from a `CINESYNC_`-prefixed variable, e.g.
/// `CINESYNC_API_URL`. A `.env` file is honoured when present.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Base URL of the recommendation service
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// File backing the persisted identity and theme markers
    #[serde(default = "default_state_path")]
    pub state_path: PathBuf,

    /// Upper bound on any single remote call, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Stub server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Stub server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Default tracing filter when `RUST_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_api_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_state_path() -> PathBuf {
    PathBuf::from("cinesync-state.json")
}

fn default_request_timeout_secs() -> u64 {
    15
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            state_path: default_state_path(),
            request_timeout_secs: default_request_timeout_secs(),
            host: default_host(),
            port: default_port(),
            log_filter: default_log_filter(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = envy::prefixed("CINESYNC_")
            .from_env::<Config>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.request_timeout_secs == 0 {
            anyhow::bail!("CINESYNC_REQUEST_TIMEOUT_SECS must be greater than 0");
        }
        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            anyhow::bail!("CINESYNC_API_URL must be an http(s) URL, got {}", self.api_url);
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Address the stub server binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api_url, "http://127.0.0.1:5000");
        assert_eq!(config.request_timeout(), Duration::from_secs(15));
        assert_eq!(config.bind_addr(), "127.0.0.1:5000");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_envy_applies_defaults_for_missing_fields() {
        let vars = vec![("API_URL".to_string(), "https://movies.example".to_string())];
        let config: Config = envy::from_iter(vars).unwrap();
        assert_eq!(config.api_url, "https://movies.example");
        assert_eq!(config.port, 5000);
        assert_eq!(config.state_path, PathBuf::from("cinesync-state.json"));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config = Config {
            request_timeout_secs: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_non_http_url() {
        let config = Config {
            api_url: "ftp://movies".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
