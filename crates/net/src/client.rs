//! HTTP client with connection pooling

use cscan_config::Config;
use cscan_errors::{Error, NetworkError};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Network client configuration
#[derive(Debug, Clone)]
pub struct NetConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub pool_idle_timeout: Duration,
    pub pool_max_idle_per_host: usize,
    pub user_agent: String,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 4,
            user_agent: format!("cscan/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl From<&Config> for NetConfig {
    fn from(config: &Config) -> Self {
        Self {
            timeout: config.network.timeout(),
            connect_timeout: config.network.connect_timeout(),
            ..Self::default()
        }
    }
}

/// HTTP client wrapper.
///
/// Requests are sent exactly once. Status polls are retried by the poller's
/// own schedule and submissions must not be duplicated, so there is no
/// retry loop here.
#[derive(Clone)]
pub struct NetClient {
    client: Client,
}

impl NetClient {
    /// Create a new network client
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying reqwest client fails to initialize.
    pub fn new(config: &NetConfig) -> Result<Self, Error> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| NetworkError::ConnectionRefused(e.to_string()))?;

        Ok(Self { client })
    }

    /// Create with default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created with default settings.
    pub fn with_defaults() -> Result<Self, Error> {
        Self::new(&NetConfig::default())
    }

    /// Execute a GET request
    ///
    /// # Errors
    ///
    /// Returns an error on timeouts, connection failures, or other transport
    /// errors. Non-success statuses are returned as responses.
    pub async fn get(&self, url: &str) -> Result<Response, Error> {
        self.client
            .get(url)
            .send()
            .await
            .map_err(|e| map_transport_error(&e).into())
    }

    /// Execute a POST request with a JSON body
    ///
    /// # Errors
    ///
    /// Returns an error on timeouts, connection failures, or other transport
    /// errors. Non-success statuses are returned as responses.
    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<Response, Error> {
        self.client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| map_transport_error(&e).into())
    }

    /// GET a URL and decode a successful JSON response
    ///
    /// # Errors
    ///
    /// Returns `NetworkError::HttpError` for non-success statuses and
    /// `NetworkError::InvalidBody` when the body is not the expected JSON.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, Error> {
        let response = self.get(url).await?;
        let status = response.status();

        if !status.is_success() {
            let message = error_message(response)
                .await
                .unwrap_or_else(|| status.to_string());
            return Err(NetworkError::HttpError {
                status: status.as_u16(),
                message,
            }
            .into());
        }

        decode_json(response, url).await
    }

    /// Get the underlying reqwest client for advanced usage
    #[must_use]
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

/// Decode a response body as JSON
pub(crate) async fn decode_json<T: DeserializeOwned>(
    response: Response,
    url: &str,
) -> Result<T, Error> {
    let bytes = response
        .bytes()
        .await
        .map_err(|e| map_transport_error(&e))?;
    serde_json::from_slice(&bytes).map_err(|e| {
        NetworkError::InvalidBody {
            url: url.to_string(),
            message: e.to_string(),
        }
        .into()
    })
}

/// Pull the `error` (or `message`) field out of a JSON error body
pub(crate) async fn error_message(response: Response) -> Option<String> {
    let body: cscan_types::wire::ErrorBody = response.json().await.ok()?;
    body.error.or(body.message)
}

fn map_transport_error(e: &reqwest::Error) -> NetworkError {
    if e.is_timeout() {
        NetworkError::Timeout {
            url: e
                .url()
                .map(std::string::ToString::to_string)
                .unwrap_or_default(),
        }
    } else if e.is_connect() {
        NetworkError::ConnectionRefused(e.to_string())
    } else {
        NetworkError::RequestFailed(e.to_string())
    }
}
