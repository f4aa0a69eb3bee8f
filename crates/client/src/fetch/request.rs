//! Request descriptors crossing the interception boundary.

use shellcache_core::RequestKey;
use url::Url;

/// A request issued by the application: method, absolute URL, whether it
/// is a page navigation, and optionally which application instance sent it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub method: String,
    pub url: Url,
    pub navigate: bool,
    pub client_id: Option<String>,
}

impl FetchRequest {
    pub fn new(method: &str, url: Url) -> Self {
        Self { method: method.to_ascii_uppercase(), url, navigate: false, client_id: None }
    }

    pub fn get(url: Url) -> Self {
        Self::new("GET", url)
    }

    /// A GET issued as a top-level page navigation.
    pub fn navigation(url: Url) -> Self {
        Self { navigate: true, ..Self::get(url) }
    }

    pub fn with_client(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    pub fn is_get(&self) -> bool {
        self.method == "GET"
    }

    /// Store identity for this request.
    pub fn key(&self) -> RequestKey {
        RequestKey::new(&self.method, self.url.clone())
    }
}
