//! Support for library configuration options

use std::error::Error;
use std::path::Path;
use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use url::Url;

/// The key of the storage slot that holds every planner item
pub const ITEMS_KEY: &str = "items";

/// Name of the response cache used by the offline worker.
/// Bump its version tag whenever the pre-cached URLs change.
pub const DEFAULT_CACHE_NAME: &str = "cache-v1";

/// URLs (relative to the worker scope) that are fetched and cached when the offline worker is installed
pub const DEFAULT_URLS_TO_CACHE: &[&str] = &["/", "/index.html"];

/// Product name, sent in the `User-Agent` header of network requests.
/// Feel free to override it when initing this library.
pub static PRODUCT_NAME: Lazy<Arc<Mutex<String>>> = Lazy::new(|| Arc::new(Mutex::new("OfflinePlanner".to_string())));

/// The `User-Agent` string derived from [`PRODUCT_NAME`]
pub fn user_agent() -> String {
    let product = PRODUCT_NAME.lock()
        .map(|name| name.clone())
        .unwrap_or_else(|_| String::from("OfflinePlanner"));
    format!("{}/{}", product, env!("CARGO_PKG_VERSION"))
}


/// Settings of an [`OfflineWorker`](crate::worker::OfflineWorker)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// The URL the worker is registered for. Requests with the same origin are "basic" requests.
    pub scope: Url,
    /// The name of the cache bucket the worker reads from and writes to
    #[serde(default = "default_cache_name")]
    pub cache_name: String,
    /// The URLs to pre-cache at install time. Relative URLs are resolved against `scope`
    #[serde(default = "default_urls_to_cache")]
    pub urls_to_cache: Vec<String>,
}

fn default_cache_name() -> String {
    DEFAULT_CACHE_NAME.to_string()
}

fn default_urls_to_cache() -> Vec<String> {
    DEFAULT_URLS_TO_CACHE.iter().map(|u| u.to_string()).collect()
}

impl WorkerConfig {
    /// A config for `scope`, with the default cache name and URL list
    pub fn new(scope: Url) -> Self {
        Self {
            scope,
            cache_name: default_cache_name(),
            urls_to_cache: default_urls_to_cache(),
        }
    }

    /// Read a config from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, Box<dyn Error>> {
        let file = match std::fs::File::open(path) {
            Err(err) => {
                return Err(format!("Unable to open file {:?}: {}", path, err).into());
            },
            Ok(file) => file,
        };
        let config = serde_json::from_reader(file)?;
        Ok(config)
    }

    /// The absolute URLs to pre-cache
    pub fn precache_urls(&self) -> Result<Vec<Url>, url::ParseError> {
        self.urls_to_cache.iter()
            .map(|u| self.scope.join(u))
            .collect()
    }
}
