//! The seams of this crate: where the persistence and the network are plugged in

use std::error::Error;

use async_trait::async_trait;

use crate::worker::{Request, Response};

/// A persistent store of string values, indexed by string keys.
///
/// This is the only persistence substrate of an [`ItemStore`](crate::ItemStore).
/// Implementations are not expected to coordinate concurrent writers.
pub trait KeyValueStore {
    /// Returns the value stored under `key`, or None if there is none
    fn get(&self, key: &str) -> Result<Option<String>, Box<dyn Error>>;
    /// Stores `value` under `key`, replacing any previous value
    fn set(&mut self, key: &str, value: String) -> Result<(), Box<dyn Error>>;
    /// Removes the value stored under `key`. Removing a missing key is not an error
    fn remove(&mut self, key: &str) -> Result<(), Box<dyn Error>>;
}

/// Something that is able to perform network requests
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Send `request` and return the full response.
    ///
    /// HTTP error statuses are not errors: they are returned as regular responses.
    /// This returns an error only if no response could be obtained at all (e.g. the network is down).
    async fn fetch(&self, request: &Request) -> Result<Response, Box<dyn Error>>;
}
