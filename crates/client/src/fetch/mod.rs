//! HTTP fetch pipeline behind the `Network` seam.
//!
//! ### Failure model
//! - Connect/DNS failures and timeouts are `NetworkError`s (the "offline" branch).
//! - Any HTTP status, including 4xx/5xx, is a response; callers decide what to cache.
//!
//! ### Limits
//! - Max redirects: 5
//! - Max body bytes: 50MB (configurable)

pub mod error;
pub mod request;
pub mod url;

use bytes::Bytes;
use reqwest::{Client, header};
use shellcache_core::{Error, ResponseSnapshot};
use std::time::{Duration, Instant};

pub use error::NetworkError;
pub use request::FetchRequest;
pub use self::url::{UrlError, resolve, same_origin};

/// Source of network responses.
///
/// The worker only ever talks to the network through this trait so that
/// tests can script connectivity.
#[async_trait::async_trait]
pub trait Network: Send + Sync {
    /// Issue `request` and capture the full response.
    async fn fetch(&self, request: &FetchRequest) -> Result<ResponseSnapshot, NetworkError>;
}

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "shellcache/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 50MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "shellcache/0.1".to_string(),
            max_bytes: 50 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
        }
    }
}

impl From<&shellcache_core::AppConfig> for FetchConfig {
    fn from(config: &shellcache_core::AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            ..Default::default()
        }
    }
}

/// HTTP fetch client backed by reqwest.
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    fn check_size(&self, size: usize) -> Result<(), NetworkError> {
        if size > self.config.max_bytes {
            return Err(NetworkError::TooLarge { size, limit: self.config.max_bytes });
        }
        Ok(())
    }
}

/// Copy response headers into snapshot form, skipping values that are not valid UTF-8.
fn snapshot_headers(headers: &header::HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
        .collect()
}

#[async_trait::async_trait]
impl Network for FetchClient {
    async fn fetch(&self, request: &FetchRequest) -> Result<ResponseSnapshot, NetworkError> {
        let start = Instant::now();
        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|e| NetworkError::InvalidRequest(e.to_string()))?;

        let response = self.http.request(method, request.url.as_str()).send().await?;

        let status = response.status();

        if let Some(len) = response.content_length() {
            self.check_size(len as usize)?;
        }

        let headers = snapshot_headers(response.headers());
        let bytes: Bytes = response.bytes().await?;
        self.check_size(bytes.len())?;

        tracing::debug!(
            "fetched {} {} -> {} in {}ms ({} bytes)",
            request.method,
            request.url,
            status.as_u16(),
            start.elapsed().as_millis(),
            bytes.len()
        );

        Ok(ResponseSnapshot::new(status.as_u16(), headers, bytes))
    }
}
