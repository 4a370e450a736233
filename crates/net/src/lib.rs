#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Network operations for cscan
//!
//! This crate owns the HTTP client and the [`ScanBackend`] contract the
//! session controller drives.

mod backend;
mod client;

pub use backend::{HttpBackend, ScanBackend, DEFAULT_REJECTION_MESSAGE};
pub use client::{NetClient, NetConfig};

use cscan_config::Config;
use cscan_errors::{Error, NetworkError};
use url::Url;

/// Build an HTTP backend from loaded configuration
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built or the configured
/// base URL is invalid.
pub fn backend_from_config(config: &Config) -> Result<HttpBackend, Error> {
    let client = NetClient::new(&NetConfig::from(config))?;
    HttpBackend::new(client, config.backend_url())
}

/// Parse and validate a URL
///
/// # Errors
///
/// Returns an error if the URL string is malformed or invalid according to RFC 3986.
pub fn parse_url(url: &str) -> Result<Url, Error> {
    Url::parse(url).map_err(|e| NetworkError::InvalidUrl(e.to_string()).into())
}
