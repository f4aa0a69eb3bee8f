//! Request identities and their content-addressed store keys.

use sha2::{Digest, Sha256};
use url::Url;

/// Normalized request identity: method plus absolute URL.
///
/// Only GET identities are ever written to a store; the method is kept in
/// the key so a future method would never alias a GET entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey {
    method: String,
    url: Url,
}

impl RequestKey {
    pub fn new(method: &str, url: Url) -> Self {
        let mut url = url;
        url.set_fragment(None);
        Self { method: method.to_ascii_uppercase(), url }
    }

    /// Shorthand for the identities the store accepts.
    pub fn get(url: Url) -> Self {
        Self::new("GET", url)
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }

    /// SHA-256 hex digest used as the primary key within a store.
    pub fn hash(&self) -> String {
        compute_cache_key(&self.method, self.url.as_str())
    }
}

impl std::fmt::Display for RequestKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

/// Compute a content-addressed cache key for a request identity.
pub fn compute_cache_key(method: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}
