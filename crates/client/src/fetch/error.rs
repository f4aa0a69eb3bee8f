//! Network failure types.

use std::sync::Arc;

/// Transport-level failures. An HTTP error status is a response, not a
/// `NetworkError`.
#[derive(Debug, Clone, thiserror::Error)]
pub enum NetworkError {
    /// No connectivity (DNS, refused connection, unreachable host).
    #[error("offline: {0}")]
    Offline(String),

    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// Response body exceeded the configured limit.
    #[error("response too large: {size} bytes exceeds {limit}")]
    TooLarge { size: usize, limit: usize },

    /// The request could not be built (e.g. an unknown method).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Any other transport error.
    #[error("network error: {0}")]
    Transport(Arc<reqwest::Error>),
}

impl From<reqwest::Error> for NetworkError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            NetworkError::Timeout
        } else if err.is_connect() {
            NetworkError::Offline(err.to_string())
        } else {
            NetworkError::Transport(Arc::new(err))
        }
    }
}

impl From<NetworkError> for shellcache_core::Error {
    fn from(err: NetworkError) -> Self {
        shellcache_core::Error::Network(err.to_string())
    }
}
