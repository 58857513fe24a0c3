//! This module provides a mocked network and a mocked key-value store, that can be told to fail on some requests
#![cfg(any(test, feature = "integration_tests"))]

use std::collections::HashMap;
use std::error::Error;
use std::sync::Mutex;

use async_trait::async_trait;
use url::Url;

use crate::storage::MemoryStorage;
use crate::traits::{Fetcher, KeyValueStore};
use crate::worker::{Request, Response, ResponseType};

/// This stores some behaviour tweaks, that describe how a mocked instance will behave during a given test
///
/// So that a functions fails _n_ times after _m_ initial successes, set `(m, n)` for the suited parameter
#[derive(Default, Clone, Debug)]
pub struct MockBehaviour {
    /// If this is true, every action will be allowed
    pub is_suspended: bool,

    pub fetch_behaviour: (u32, u32),
    /// Applies to `set` and `remove`
    pub set_behaviour: (u32, u32),
}

impl MockBehaviour {
    pub fn new() -> Self {
        Self::default()
    }

    /// All requests will fail at once, for `n_fails` times
    pub fn fail_now(n_fails: u32) -> Self {
        Self {
            is_suspended: false,
            fetch_behaviour: (0, n_fails),
            set_behaviour: (0, n_fails),
        }
    }

    /// Suspend this mock behaviour until you call `resume`
    pub fn suspend(&mut self) {
        self.is_suspended = true;
    }
    /// Make this behaviour active again
    pub fn resume(&mut self) {
        self.is_suspended = false;
    }

    pub fn can_fetch(&mut self) -> Result<(), Box<dyn Error>> {
        if self.is_suspended { return Ok(()) }
        decrement(&mut self.fetch_behaviour, "fetch")
    }

    pub fn can_set(&mut self) -> Result<(), Box<dyn Error>> {
        if self.is_suspended { return Ok(()) }
        decrement(&mut self.set_behaviour, "set")
    }
}


/// Return Ok(()) in case the value is `(1+, _)` or `(_, 0)`, or return Err and decrement otherwise
fn decrement(value: &mut (u32, u32), descr: &str) -> Result<(), Box<dyn Error>> {
    let remaining_successes = value.0;
    let remaining_failures = value.1;

    if remaining_successes > 0 {
        value.0 -= 1;
        log::debug!("Mock behaviour: allowing a {} ({:?})", descr, value);
        Ok(())
    } else if remaining_failures > 0 {
        value.1 -= 1;
        log::debug!("Mock behaviour: failing a {} ({:?})", descr, value);
        Err(format!("Mocked behaviour requires this {} to fail this time. ({:?})", descr, value).into())
    } else {
        log::debug!("Mock behaviour: allowing a {} ({:?})", descr, value);
        Ok(())
    }
}


/// A [`Fetcher`] that answers from a fixed set of responses (and `404 Not Found` for any other URL).
///
/// It records the URL of every request it receives.
#[derive(Default)]
pub struct MockFetcher {
    routes: HashMap<String, Response>,
    behaviour: Mutex<MockBehaviour>,
    requests: Mutex<Vec<Url>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `response` to requests for its URL
    pub fn with_route(mut self, response: Response) -> Self {
        self.routes.insert(response.url().to_string(), response);
        self
    }

    pub fn with_behaviour(mut self, behaviour: MockBehaviour) -> Self {
        self.behaviour = Mutex::new(behaviour);
        self
    }

    /// The URLs that have been requested so far
    pub fn requests(&self) -> Vec<Url> {
        match self.requests.lock() {
            Ok(requests) => requests.clone(),
            Err(_) => Vec::new(),
        }
    }

    pub fn n_requests(&self) -> usize {
        self.requests().len()
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response, Box<dyn Error>> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.url().clone());
        }
        self.behaviour.lock()
            .map_err(|_| Box::<dyn Error>::from("mock behaviour is poisoned"))?
            .can_fetch()?;

        match self.routes.get(request.url().as_str()) {
            Some(response) => Ok(response.clone()),
            None => Ok(Response::new(request.url().clone(), 404, ResponseType::Basic)),
        }
    }
}


/// An in-memory [`KeyValueStore`] whose writes can be made to fail. Reads always succeed.
#[derive(Default, Debug)]
pub struct MockStorage {
    data: MemoryStorage,
    behaviour: MockBehaviour,
}

impl MockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_behaviour(&mut self, behaviour: MockBehaviour) {
        self.behaviour = behaviour;
    }
}

impl KeyValueStore for MockStorage {
    fn get(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.data.get(key)
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), Box<dyn Error>> {
        self.behaviour.can_set()?;
        self.data.set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), Box<dyn Error>> {
        self.behaviour.can_set()?;
        self.data.remove(key)
    }
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_mock_behaviour() {
        let mut ok = MockBehaviour::new();
        assert!(ok.can_fetch().is_ok());
        assert!(ok.can_fetch().is_ok());
        assert!(ok.can_fetch().is_ok());

        let mut now = MockBehaviour::fail_now(2);
        assert!(now.can_fetch().is_err());
        assert!(now.can_fetch().is_err());
        assert!(now.can_fetch().is_ok());
        assert!(now.can_fetch().is_ok());

        let mut custom = MockBehaviour{
            fetch_behaviour: (1,2),
            ..MockBehaviour::default()
        };
        assert!(custom.can_fetch().is_ok());
        assert!(custom.can_fetch().is_err());
        custom.suspend();
        assert!(custom.can_fetch().is_ok());
        custom.resume();
        assert!(custom.can_fetch().is_err());
        assert!(custom.can_fetch().is_ok());
        assert!(custom.can_set().is_ok());
    }

    #[test]
    fn mock_storage_fails_writes_only() {
        let mut storage = MockStorage::new();
        storage.set("k", "v".to_string()).unwrap();

        storage.set_behaviour(MockBehaviour{ set_behaviour: (0, 2), ..MockBehaviour::default() });
        assert!(storage.set("k", "w".to_string()).is_err());
        assert!(storage.remove("k").is_err());
        assert_eq!(storage.get("k").unwrap(), Some("v".to_string()));

        storage.remove("k").unwrap();
        assert_eq!(storage.get("k").unwrap(), None);
    }

    #[tokio::test]
    async fn mock_fetcher_records_requests() {
        let url: Url = "https://planner.example/".parse().unwrap();
        let fetcher = MockFetcher::new()
            .with_route(Response::new(url.clone(), 200, ResponseType::Basic).with_body("root"));

        let response = fetcher.fetch(&Request::get(url.clone())).await.unwrap();
        assert_eq!(response.body(), b"root");
        let missing = fetcher.fetch(&Request::get(url.join("missing").unwrap())).await.unwrap();
        assert_eq!(missing.status(), 404);
        assert_eq!(fetcher.requests(), vec![url.clone(), url.join("missing").unwrap()]);
    }
}
