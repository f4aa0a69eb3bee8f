//! Request classification and strategy selection.
//!
//! Classification is purely syntactic: it looks at method, origin and path,
//! never at content types.

use crate::fetch::{FetchRequest, same_origin};
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;
use url::Url;

/// Extensions served network-first.
static LARGE_MEDIA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.(pdf|mp3|wav|jpe?g|png)$").expect("large media pattern is valid"));

/// Which caching discipline a request gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// Network-first: expensive to precache and likely to change.
    LargeMedia,
    /// Cache-first: the app shell and its data.
    StaticAsset,
}

/// Why a request is left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PassReason {
    NotGet,
    CrossOrigin,
}

/// Routing decision for one intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    PassThrough(PassReason),
    Handle(Classification),
}

/// Stateless router bound to the application origin.
#[derive(Debug, Clone)]
pub struct Router {
    origin: Url,
    static_prefixes: Vec<String>,
}

impl Router {
    /// `static_prefixes` lists directories (e.g. `/icons/`) whose files are
    /// always static assets, whatever their extension.
    pub fn new(origin: Url, static_prefixes: Vec<String>) -> Self {
        Self { origin, static_prefixes }
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    pub fn route(&self, request: &FetchRequest) -> Route {
        if !request.is_get() {
            return Route::PassThrough(PassReason::NotGet);
        }
        if !same_origin(&self.origin, &request.url) {
            return Route::PassThrough(PassReason::CrossOrigin);
        }
        Route::Handle(self.classify(&request.url))
    }

    pub fn classify(&self, url: &Url) -> Classification {
        let path = url.path();
        let exempt = self.static_prefixes.iter().any(|prefix| path.starts_with(prefix.as_str()));
        if !exempt && LARGE_MEDIA.is_match(path) { Classification::LargeMedia } else { Classification::StaticAsset }
    }
}
