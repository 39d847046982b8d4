//! Types shared across the campus client crates

mod error;
mod secret;

pub use error::{Error, Result, is_http_url};
pub use secret::Secret;
