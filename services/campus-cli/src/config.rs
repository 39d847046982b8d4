//! Configuration types and loading
//!
//! Config precedence: CLI args > env vars > config file > defaults.
//! Tokens never live in the TOML; they are kept in the session file.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub auth: AuthConfig,
}

/// School API settings
#[derive(Debug, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// Session and token refresh settings
#[derive(Debug, Deserialize)]
pub struct AuthConfig {
    pub token_endpoint: String,
    #[serde(default = "default_client_id")]
    pub client_id: String,
    pub session_file: PathBuf,
    /// Upper bound on a single refresh call. Absent means no bound.
    #[serde(default)]
    pub refresh_timeout_secs: Option<u64>,
}

fn default_timeout() -> u64 {
    30
}

fn default_client_id() -> String {
    "campus-mobile".into()
}

impl Config {
    /// Load configuration from a TOML file, then overlay environment variables.
    ///
    /// `CAMPUS_BASE_URL` replaces `api.base_url` when set.
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;

        if let Ok(base_url) = std::env::var("CAMPUS_BASE_URL") {
            config.api.base_url = base_url;
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> common::Result<()> {
        common::Error::check_url("api.base_url", &self.api.base_url)?;
        common::Error::check_url("auth.token_endpoint", &self.auth.token_endpoint)?;

        if self.api.timeout_secs == 0 {
            return Err(common::Error::Config(
                "timeout_secs must be greater than 0".into(),
            ));
        }
        if self.auth.refresh_timeout_secs == Some(0) {
            return Err(common::Error::Config(
                "refresh_timeout_secs must be greater than 0 when set".into(),
            ));
        }
        if self.auth.client_id.trim().is_empty() {
            return Err(common::Error::Config("client_id must not be empty".into()));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    pub fn refresh_timeout(&self) -> Option<Duration> {
        self.auth.refresh_timeout_secs.map(Duration::from_secs)
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("campus.toml")
    }
}
