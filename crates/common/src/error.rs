//! Configuration and startup errors

use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid URL for {field}: {value}")]
    InvalidUrl { field: &'static str, value: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result alias using common Error
pub type Result<T> = std::result::Result<T, Error>;

/// Check that `value` is an absolute http(s) URL.
pub fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

impl Error {
    /// Validate a URL-valued config field, returning `InvalidUrl` when it is not http(s).
    pub fn check_url(field: &'static str, value: &str) -> Result<()> {
        if is_http_url(value) {
            Ok(())
        } else {
            Err(Error::InvalidUrl {
                field,
                value: value.to_string(),
            })
        }
    }
}
