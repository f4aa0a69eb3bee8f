//! Precache manifest: the assets a generation must hold before it can serve.

use crate::fetch::{FetchRequest, resolve};
use shellcache_core::Error;
use url::Url;

/// Ordered, de-duplicated list of root-relative asset paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrecacheManifest {
    paths: Vec<String>,
}

impl PrecacheManifest {
    /// Build a manifest, keeping the first occurrence of each path.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if any path is not root-relative.
    pub fn new<I, S>(paths: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for path in paths {
            let path = path.into();
            if !path.starts_with('/') {
                return Err(Error::InvalidInput(format!("precache path must start with '/': {path}")));
            }
            if !unique.contains(&path) {
                unique.push(path);
            }
        }
        Ok(Self { paths: unique })
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// GET requests for every entry, resolved against `origin`.
    pub fn requests(&self, origin: &Url) -> Result<Vec<FetchRequest>, Error> {
        self.paths
            .iter()
            .map(|path| {
                resolve(origin, path)
                    .map(FetchRequest::get)
                    .map_err(|e| Error::InvalidUrl(format!("{path}: {e}")))
            })
            .collect()
    }
}
