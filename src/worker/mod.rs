//! An offline-first request interceptor.
//!
//! Once installed, an [`OfflineWorker`] has pre-cached a fixed list of URLs (typically the entry page of a web app). \
//! Once activated, it serves every request from its response cache when it can, and from the network otherwise.
//! Successful same-origin network responses are written through to the cache, so that they can be served offline later on.
//!
//! Cached responses never expire, and caches of former versions are never cleaned up.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::task::JoinHandle;

use crate::config::WorkerConfig;
use crate::traits::Fetcher;

mod cache;
pub use cache::{CacheStorage, ResponseCache};
mod fetch;
pub use fetch::{HttpFetcher, Request, Response, ResponseType};
pub mod install_progress;
use install_progress::{notify, FeedbackSender, InstallEvent};


/// The lifecycle of a worker
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkerState {
    /// Created, but not installed yet
    Parsed,
    /// Pre-caching its URLs
    Installing,
    /// Pre-caching is done, the worker does not intercept requests yet
    Installed,
    /// The worker intercepts requests
    Activated,
    /// Installation failed. This worker will never intercept any request
    Redundant,
}

impl Display for WorkerState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkerState::Parsed => write!(f, "parsed"),
            WorkerState::Installing => write!(f, "installing"),
            WorkerState::Installed => write!(f, "installed"),
            WorkerState::Activated => write!(f, "activated"),
            WorkerState::Redundant => write!(f, "redundant"),
        }
    }
}

/// A network connectivity notification
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Connectivity {
    Online,
    Offline,
}


/// A cache-first request interceptor
pub struct OfflineWorker<F: Fetcher> {
    config: WorkerConfig,
    fetcher: F,
    caches: Arc<Mutex<CacheStorage>>,
    state: WorkerState,

    /// Background writes to the response cache that may still be running
    pending_writes: Mutex<Vec<JoinHandle<()>>>,
}

impl<F: Fetcher> OfflineWorker<F> {
    /// Create a worker. It must be installed, then activated before it intercepts requests.
    ///
    /// `caches` may already contain responses, e.g. from a previous run.
    pub fn new(config: WorkerConfig, fetcher: F, caches: CacheStorage) -> Self {
        Self {
            config,
            fetcher,
            caches: Arc::new(Mutex::new(caches)),
            state: WorkerState::Parsed,
            pending_writes: Mutex::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &WorkerConfig { &self.config }
    pub fn fetcher(&self) -> &F { &self.fetcher }
    pub fn state(&self) -> WorkerState { self.state }

    /// Returns the response caches of this worker
    pub fn caches(&self) -> Arc<Mutex<CacheStorage>> {
        Arc::clone(&self.caches)
    }

    fn lock_caches(&self) -> Result<MutexGuard<'_, CacheStorage>, Box<dyn Error>> {
        self.caches.lock()
            .map_err(|_| Box::<dyn Error>::from("The response caches are poisoned"))
    }

    /// Pre-cache every URL of the config, and report every step to `feedback_sender`.
    ///
    /// This is all or nothing: in case any URL cannot be fetched, or returns an HTTP error, nothing is cached
    /// and the worker becomes [`WorkerState::Redundant`].
    pub async fn install_with_feedback(&mut self, feedback_sender: FeedbackSender) -> Result<(), Box<dyn Error>> {
        self.run_install(Some(&feedback_sender)).await
    }

    /// Pre-cache every URL of the config, without giving any feedback.
    ///
    /// See [`Self::install_with_feedback`]
    pub async fn install(&mut self) -> Result<(), Box<dyn Error>> {
        self.run_install(None).await
    }

    async fn run_install(&mut self, feedback: Option<&FeedbackSender>) -> Result<(), Box<dyn Error>> {
        if self.state != WorkerState::Parsed {
            return Err(format!("Unable to install a worker that is {}", self.state).into());
        }
        self.state = WorkerState::Installing;
        log::info!("Installing the offline worker for {}", self.config.scope);

        match self.precache(feedback).await {
            Ok(total) => {
                log::info!("Pre-cached {} URLs into {}", total, self.config.cache_name);
                self.state = WorkerState::Installed;
                notify(feedback, InstallEvent::Installed{ total });
                Ok(())
            },
            Err(err) => {
                log::error!("Installation terminated because of an error: {}", err);
                self.state = WorkerState::Redundant;
                notify(feedback, InstallEvent::Failed{ reason: err.to_string() });
                Err(err)
            },
        }
    }

    /// Fetch every URL of the allow-list, then store them all at once. Returns the number of cached URLs.
    async fn precache(&self, feedback: Option<&FeedbackSender>) -> Result<usize, Box<dyn Error>> {
        let urls = self.config.precache_urls()?;
        let total = urls.len();
        let mut fetched = Vec::with_capacity(total);
        for url in urls {
            let request = Request::get(url);
            let response = self.fetcher.fetch(&request).await?;
            if response.is_ok() == false {
                return Err(format!("Unable to pre-cache {} (HTTP status {})", request.url(), response.status()).into());
            }
            notify(feedback, InstallEvent::Fetched{
                url: request.url().clone(),
                status: response.status(),
                done: fetched.len() + 1,
                total,
            });
            fetched.push((request, response));
        }

        let mut caches = self.lock_caches()?;
        let mut updated = caches.open(&self.config.cache_name).clone();
        for (request, response) in fetched {
            updated.put(&request, response)?;
        }
        *caches.open(&self.config.cache_name) = updated;
        caches.save()?;
        Ok(total)
    }

    /// Start intercepting requests. The worker must be installed.
    pub fn activate(&mut self) -> Result<(), Box<dyn Error>> {
        match self.state {
            WorkerState::Installed => {
                self.state = WorkerState::Activated;
                log::info!("Offline worker for {} is active", self.config.scope);
                Ok(())
            },
            WorkerState::Activated => Ok(()),
            other => Err(format!("Unable to activate a worker that is {}", other).into()),
        }
    }

    /// Handle a request.
    ///
    /// An activated worker first looks for an exact match in its cache, and returns it as is.
    /// Otherwise, the request goes to the network. In case the response is a same-origin `200 OK`, a copy is
    /// written to the cache in the background (failures are only logged), and the response is returned.
    ///
    /// A worker that is not activated sends every request to the network.
    /// There is no timeout: this waits as long as the network does.
    ///
    /// Cache writes run on the blocking thread pool of the current tokio runtime, so this must be called from within one.
    pub async fn fetch(&self, request: Request) -> Result<Response, Box<dyn Error>> {
        if self.state != WorkerState::Activated {
            log::trace!("Worker is {}, not intercepting {}", self.state, request.url());
            return self.fetcher.fetch(&request).await;
        }

        let cached = self.lock_caches()?
            .get(&self.config.cache_name)
            .and_then(|cache| cache.match_request(&request))
            .cloned();
        if let Some(response) = cached {
            log::debug!("Serving {} from cache", request.url());
            return Ok(response);
        }

        let response = self.fetcher.fetch(&request).await?;
        if response.is_cacheable() == false {
            log::debug!("Not caching {} (status {}, {:?} response)", request.url(), response.status(), response.response_type());
            return Ok(response);
        }

        self.write_through(request, response.clone());
        Ok(response)
    }

    fn write_through(&self, request: Request, response: Response) {
        let caches = Arc::clone(&self.caches);
        let cache_name = self.config.cache_name.clone();

        let handle = tokio::task::spawn_blocking(move || {
            let mut caches = match caches.lock() {
                Ok(caches) => caches,
                Err(_) => {
                    log::warn!("Unable to cache {}: the response caches are poisoned", request.url());
                    return;
                },
            };
            if let Err(err) = caches.open(&cache_name).put(&request, response) {
                log::warn!("Unable to cache {}: {}", request.url(), err);
                return;
            }
            log::debug!("Cached {} into {}", request.url(), cache_name);
            if let Err(err) = caches.save() {
                log::warn!("Unable to save the response caches: {}", err);
            }
        });

        match self.pending_writes.lock() {
            Ok(mut pending) => {
                pending.retain(|h| h.is_finished() == false);
                pending.push(handle);
            },
            Err(_) => log::warn!("Unable to track a background cache write"),
        }
    }

    /// Wait until every background cache write started so far is over
    pub async fn wait_for_pending_writes(&self) {
        let handles: Vec<JoinHandle<()>> = match self.pending_writes.lock() {
            Ok(mut pending) => pending.drain(..).collect(),
            Err(_) => return,
        };
        for handle in handles {
            if let Err(err) = handle.await {
                log::warn!("A background cache write did not complete: {}", err);
            }
        }
    }

    /// Called when the network connectivity changes. This is only logged.
    pub fn on_connectivity_change(&self, connectivity: Connectivity) {
        match connectivity {
            Connectivity::Online => log::info!("Network connection is back"),
            Connectivity::Offline => log::warn!("Network connection lost, only cached responses will be available"),
        }
    }
}


/// Create a worker, install it and activate it.
///
/// Failures are logged, and no worker is returned. There is no retry.
pub async fn register<F: Fetcher>(config: WorkerConfig, fetcher: F, caches: CacheStorage) -> Option<OfflineWorker<F>> {
    let mut worker = OfflineWorker::new(config, fetcher, caches);

    log::info!("Offline worker is installing");
    if let Err(err) = worker.install().await {
        log::error!("Unable to register the offline worker: {}", err);
        return None;
    }
    log::info!("Offline worker is installed");

    if let Err(err) = worker.activate() {
        log::error!("Unable to register the offline worker: {}", err);
        return None;
    }
    Some(worker)
}



#[cfg(test)]
mod tests {
    use super::*;

    use reqwest::Method;
    use url::Url;

    use crate::mock_behaviour::{MockBehaviour, MockFetcher};
    use super::install_progress::feedback_channel;

    const SCOPE: &str = "https://planner.example/";

    fn url(path: &str) -> Url {
        Url::parse(SCOPE).unwrap().join(path).unwrap()
    }

    fn page(path: &str, body: &str) -> Response {
        Response::new(url(path), 200, ResponseType::Basic)
            .with_header("Content-Type", "text/html")
            .with_body(body)
    }

    fn site() -> MockFetcher {
        MockFetcher::new()
            .with_route(page("/", "root"))
            .with_route(page("/index.html", "index"))
            .with_route(page("/about.html", "about"))
            .with_route(Response::new("https://cdn.example/lib.js".parse().unwrap(), 200, ResponseType::Cors).with_body("lib"))
            .with_route(Response::new(url("/broken"), 500, ResponseType::Basic))
            .with_route(Response::new(url("/api/items"), 200, ResponseType::Basic).with_body("{}"))
    }

    fn config() -> WorkerConfig {
        WorkerConfig::new(SCOPE.parse().unwrap())
    }

    async fn active_worker() -> OfflineWorker<MockFetcher> {
        let _ = env_logger::builder().is_test(true).try_init();
        match register(config(), site(), CacheStorage::new()).await {
            Some(worker) => worker,
            None => panic!("registration failed"),
        }
    }

    #[tokio::test]
    async fn install_precaches_the_allow_list() {
        let worker = active_worker().await;
        assert_eq!(worker.state(), WorkerState::Activated);
        assert_eq!(worker.fetcher().n_requests(), 2);

        let caches = worker.caches();
        let caches = caches.lock().unwrap();
        let cache = caches.get("cache-v1").unwrap();
        assert_eq!(cache.len(), 2);
        assert!(cache.match_request(&Request::get(url("/index.html"))).is_some());
    }

    #[tokio::test]
    async fn allow_listed_urls_are_served_without_network() {
        let worker = active_worker().await;
        let n_requests = worker.fetcher().n_requests();

        let response = worker.fetch(Request::get(url("/index.html"))).await.unwrap();
        assert_eq!(response.body(), b"index");
        let response = worker.fetch(Request::get(url("/"))).await.unwrap();
        assert_eq!(response.body(), b"root");
        assert_eq!(worker.fetcher().n_requests(), n_requests);
    }

    #[tokio::test]
    async fn same_origin_responses_are_written_through() {
        let worker = active_worker().await;

        let response = worker.fetch(Request::get(url("/about.html"))).await.unwrap();
        assert_eq!(response.body(), b"about");
        worker.wait_for_pending_writes().await;
        let n_requests = worker.fetcher().n_requests();

        let response = worker.fetch(Request::get(url("/about.html"))).await.unwrap();
        assert_eq!(response, page("/about.html", "about"));
        assert_eq!(worker.fetcher().n_requests(), n_requests);
    }

    #[tokio::test]
    async fn cross_origin_responses_are_not_cached() {
        let worker = active_worker().await;
        let lib = Request::get("https://cdn.example/lib.js".parse().unwrap());

        let response = worker.fetch(lib.clone()).await.unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(response.body(), b"lib");
        worker.wait_for_pending_writes().await;

        assert!(worker.caches().lock().unwrap().get("cache-v1").unwrap().match_request(&lib).is_none());
        let n_requests = worker.fetcher().n_requests();
        worker.fetch(lib).await.unwrap();
        assert_eq!(worker.fetcher().n_requests(), n_requests + 1);
    }

    #[tokio::test]
    async fn error_responses_are_not_cached() {
        let worker = active_worker().await;

        let response = worker.fetch(Request::get(url("/broken"))).await.unwrap();
        assert_eq!(response.status(), 500);
        let response = worker.fetch(Request::get(url("/nowhere"))).await.unwrap();
        assert_eq!(response.status(), 404);
        worker.wait_for_pending_writes().await;

        assert_eq!(worker.caches().lock().unwrap().get("cache-v1").unwrap().len(), 2);
    }

    #[tokio::test]
    async fn cache_write_failures_are_swallowed() {
        let worker = active_worker().await;

        let post = Request::new(Method::POST, url("/api/items"));
        let response = worker.fetch(post).await.unwrap();
        assert_eq!(response.status(), 200);
        worker.wait_for_pending_writes().await;

        let caches = worker.caches();
        let caches = caches.lock().unwrap();
        assert!(caches.get("cache-v1").unwrap().match_request(&Request::get(url("/api/items"))).is_none());
    }

    #[tokio::test]
    async fn network_failures_are_returned() {
        let _ = env_logger::builder().is_test(true).try_init();
        let fetcher = site().with_behaviour(MockBehaviour { fetch_behaviour: (2, 1), ..MockBehaviour::default() });
        let worker = match register(config(), fetcher, CacheStorage::new()).await {
            Some(worker) => worker,
            None => panic!("registration failed"),
        };

        assert!(worker.fetch(Request::get(url("/about.html"))).await.is_err());
        // Cached responses are still available
        assert!(worker.fetch(Request::get(url("/"))).await.is_ok());
        assert!(worker.fetch(Request::get(url("/about.html"))).await.is_ok());
    }

    #[tokio::test]
    async fn failed_install_caches_nothing() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut config = config();
        config.urls_to_cache.push("/missing.css".to_string());

        let mut worker = OfflineWorker::new(config.clone(), site(), CacheStorage::new());
        assert!(worker.install().await.is_err());
        assert_eq!(worker.state(), WorkerState::Redundant);
        assert!(worker.activate().is_err());
        assert!(worker.caches().lock().unwrap().get("cache-v1").map(|c| c.is_empty()).unwrap_or(true));

        assert!(register(config, site(), CacheStorage::new()).await.is_none());
    }

    #[tokio::test]
    async fn unreachable_network_fails_install() {
        let fetcher = site().with_behaviour(MockBehaviour::fail_now(1));
        assert!(register(config(), fetcher, CacheStorage::new()).await.is_none());
    }

    #[tokio::test]
    async fn inactive_workers_do_not_intercept() {
        let mut worker = OfflineWorker::new(config(), site(), CacheStorage::new());
        worker.fetch(Request::get(url("/about.html"))).await.unwrap();
        worker.wait_for_pending_writes().await;
        assert!(worker.caches().lock().unwrap().keys().is_empty());

        worker.install().await.unwrap();
        assert_eq!(worker.state(), WorkerState::Installed);
        let n_requests = worker.fetcher().n_requests();
        worker.fetch(Request::get(url("/"))).await.unwrap();
        assert_eq!(worker.fetcher().n_requests(), n_requests + 1);

        assert!(worker.install().await.is_err());
        worker.activate().unwrap();
        worker.fetch(Request::get(url("/"))).await.unwrap();
        assert_eq!(worker.fetcher().n_requests(), n_requests + 1);
    }

    #[tokio::test]
    async fn install_feedback() {
        let (sender, receiver) = feedback_channel();
        let mut worker = OfflineWorker::new(config(), site(), CacheStorage::new());
        worker.install_with_feedback(sender).await.unwrap();
        assert_eq!(*receiver.borrow(), InstallEvent::Installed{ total: 2 });
    }

    #[tokio::test]
    async fn install_feedback_names_the_failure() {
        let mut config = config();
        config.urls_to_cache.push("/missing.css".to_string());
        let (sender, receiver) = feedback_channel();

        let mut worker = OfflineWorker::new(config, site(), CacheStorage::new());
        assert!(worker.install_with_feedback(sender).await.is_err());
        match &*receiver.borrow() {
            InstallEvent::Failed{ reason } => assert!(reason.contains("/missing.css") && reason.contains("404")),
            other => panic!("unexpected feedback {:?}", other),
        };
    }

    #[tokio::test]
    async fn fragments_are_ignored_by_the_cache() {
        let worker = active_worker().await;
        let n_requests = worker.fetcher().n_requests();

        let response = worker.fetch(Request::get(url("/index.html#top"))).await.unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(response.body(), b"index");
        assert_eq!(worker.fetcher().n_requests(), n_requests);
    }

    #[tokio::test]
    async fn stale_caches_are_kept() {
        let mut caches = CacheStorage::new();
        caches.open("cache-v0").put(&Request::get(url("/")), page("/", "old root")).unwrap();

        let worker = match register(config(), site(), caches).await {
            Some(worker) => worker,
            None => panic!("registration failed"),
        };
        worker.on_connectivity_change(Connectivity::Offline);
        worker.on_connectivity_change(Connectivity::Online);

        assert_eq!(worker.caches().lock().unwrap().keys(), vec!["cache-v0", "cache-v1"]);
        let response = worker.fetch(Request::get(url("/"))).await.unwrap();
        assert_eq!(response.body(), b"root");
    }

    #[tokio::test]
    async fn written_through_responses_are_saved() {
        let random = uuid::Uuid::new_v4().to_hyphenated().to_string();
        let path = std::env::temp_dir().join(format!("worker-caches-{}.json", random));

        let worker = match register(config(), site(), CacheStorage::with_backing_file(&path)).await {
            Some(worker) => worker,
            None => panic!("registration failed"),
        };
        worker.fetch(Request::get(url("/about.html"))).await.unwrap();
        worker.wait_for_pending_writes().await;

        let saved = CacheStorage::from_file(&path).unwrap();
        assert_eq!(saved.get("cache-v1").map(|c| c.len()), Some(3));

        let _ = std::fs::remove_file(&path);
    }
}
