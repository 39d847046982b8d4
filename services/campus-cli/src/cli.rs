//! Command-line parsing
//!
//! ```text
//! campus [--config PATH] [--metrics] request METHOD PATH [JSON_BODY]
//! campus [--config PATH] login ACCESS_TOKEN REFRESH_TOKEN [EXPIRES_IN_SECS]
//! campus [--config PATH] logout
//! campus [--config PATH] status
//! ```

use anyhow::{Context, Result, anyhow, bail};
use reqwest::Method;

/// Lifetime assumed for an imported access token when none is given.
const DEFAULT_EXPIRES_IN_SECS: u64 = 3600;

pub const USAGE: &str = "usage: campus [--config PATH] [--metrics] <command>

commands:
  request METHOD PATH [JSON_BODY]                  call the school API
  login ACCESS_TOKEN REFRESH_TOKEN [EXPIRES_IN]    store a session
  logout                                           clear the stored session
  status                                           show the stored session";

#[derive(Debug, PartialEq)]
pub struct Invocation {
    pub config_path: Option<String>,
    pub print_metrics: bool,
    pub command: Command,
}

#[derive(Debug, PartialEq)]
pub enum Command {
    Request {
        method: Method,
        path: String,
        body: Option<serde_json::Value>,
    },
    Login {
        access: String,
        refresh: String,
        expires_in: u64,
    },
    Logout,
    Status,
}

/// Parse arguments, excluding the program name.
pub fn parse(args: &[String]) -> Result<Invocation> {
    let mut config_path = None;
    let mut print_metrics = false;
    let mut positional = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let path = iter.next().ok_or_else(|| anyhow!("--config needs a path"))?;
                config_path = Some(path.clone());
            }
            "--metrics" => print_metrics = true,
            other if other.starts_with("--") => bail!("unknown flag {other}\n\n{USAGE}"),
            _ => positional.push(arg.as_str()),
        }
    }

    let command = match positional.as_slice() {
        ["request", method, path, rest @ ..] if rest.len() <= 1 => {
            let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
                .with_context(|| format!("invalid HTTP method {method}"))?;
            let body = rest
                .first()
                .map(|raw| serde_json::from_str(raw))
                .transpose()
                .context("request body must be valid JSON")?;
            Command::Request {
                method,
                path: path.to_string(),
                body,
            }
        }
        ["login", access, refresh, rest @ ..] if rest.len() <= 1 => {
            let expires_in = match rest.first() {
                Some(raw) => raw
                    .parse()
                    .with_context(|| format!("EXPIRES_IN must be a number of seconds, got {raw}"))?,
                None => DEFAULT_EXPIRES_IN_SECS,
            };
            Command::Login {
                access: access.to_string(),
                refresh: refresh.to_string(),
                expires_in,
            }
        }
        ["logout"] => Command::Logout,
        ["status"] => Command::Status,
        _ => bail!("{USAGE}"),
    };

    Ok(Invocation {
        config_path,
        print_metrics,
        command,
    })
}
