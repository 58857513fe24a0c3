//! Named buckets of cached responses

use std::collections::HashMap;
use std::error::Error;
use std::path::{Path, PathBuf};

use reqwest::Method;
use serde::{Deserialize, Serialize};
use url::Url;

use super::fetch::{Request, Response};


/// A named bucket of responses, indexed by the URL of their request (without its fragment)
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseCache {
    entries: HashMap<String, Response>,
}

impl ResponseCache {
    /// Returns the response stored for this request, if any.
    /// Only `GET` requests can match.
    pub fn match_request(&self, request: &Request) -> Option<&Response> {
        if request.method() != Method::GET {
            return None;
        }
        self.entries.get(&cache_key(request.url()))
    }

    /// Store a response for a request, replacing any previous one
    pub fn put(&mut self, request: &Request, response: Response) -> Result<(), Box<dyn Error>> {
        if request.method() != Method::GET {
            return Err(format!("Unable to cache a response to a {} request", request.method()).into());
        }
        match request.url().scheme() {
            "http" | "https" => (),
            other => return Err(format!("Unable to cache a response to a {} URL", other).into()),
        }
        if response.status() == 206 {
            return Err("Unable to cache a partial response".into());
        }

        self.entries.insert(cache_key(request.url()), response);
        Ok(())
    }

    /// Remove the entry for this request. Returns whether there was one
    pub fn delete(&mut self, request: &Request) -> bool {
        self.entries.remove(&cache_key(request.url())).is_some()
    }

    /// The URLs that have a cached response
    pub fn keys(&self) -> Vec<&str> {
        self.entries.keys().map(|k| k.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Fragments never reach the server, so they do not select another response
fn cache_key(url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);
    url.into()
}


#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct NamedCache {
    name: String,
    cache: ResponseCache,
}

/// Every response cache of a worker, in creation order.
///
/// It can be backed by a local JSON file, or only live in memory.
#[derive(Debug, Default, PartialEq)]
pub struct CacheStorage {
    backing_file: Option<PathBuf>,
    caches: Vec<NamedCache>,
}

impl CacheStorage {
    /// Initialize an empty storage, that only lives in memory
    pub fn new() -> Self {
        Self::default()
    }

    /// Initialize a storage from the content of a valid backing file if it exists.
    /// Returns an error otherwise
    pub fn from_file(path: &Path) -> Result<Self, Box<dyn Error>> {
        let caches = match std::fs::File::open(path) {
            Err(err) => {
                return Err(format!("Unable to open file {:?}: {}", path, err).into());
            },
            Ok(file) => serde_json::from_reader(file)?,
        };

        Ok(Self {
            backing_file: Some(PathBuf::from(path)),
            caches,
        })
    }

    /// Initialize an empty storage, that will be saved to `path`
    pub fn with_backing_file(path: &Path) -> Self {
        Self {
            backing_file: Some(PathBuf::from(path)),
            caches: Vec::new(),
        }
    }

    /// Store the current content to the backing file (if any)
    pub fn save(&self) -> Result<(), Box<dyn Error>> {
        let path = match &self.backing_file {
            None => return Ok(()),
            Some(path) => path,
        };
        let file = match std::fs::File::create(path) {
            Err(err) => {
                return Err(format!("Unable to save file {:?}: {}", path, err).into());
            },
            Ok(f) => f,
        };

        serde_json::to_writer(file, &self.caches)?;
        Ok(())
    }

    /// Returns the cache with this name, creating it if it does not exist yet
    pub fn open(&mut self, name: &str) -> &mut ResponseCache {
        let index = match self.caches.iter().position(|c| c.name == name) {
            Some(index) => index,
            None => {
                log::debug!("Creating response cache {}", name);
                self.caches.push(NamedCache { name: name.to_string(), cache: ResponseCache::default() });
                self.caches.len() - 1
            },
        };
        &mut self.caches[index].cache
    }

    /// Returns the cache with this name, if it exists
    pub fn get(&self, name: &str) -> Option<&ResponseCache> {
        self.caches.iter()
            .find(|c| c.name == name)
            .map(|c| &c.cache)
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Delete a whole cache. Returns whether it existed
    pub fn delete(&mut self, name: &str) -> bool {
        let n_caches = self.caches.len();
        self.caches.retain(|c| c.name != name);
        self.caches.len() != n_caches
    }

    /// The names of the existing caches, in creation order
    pub fn keys(&self) -> Vec<&str> {
        self.caches.iter().map(|c| c.name.as_str()).collect()
    }

    /// Look for a response in every cache, in creation order
    pub fn match_request(&self, request: &Request) -> Option<&Response> {
        self.caches.iter()
            .find_map(|c| c.cache.match_request(request))
    }
}
