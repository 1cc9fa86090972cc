//! The cache-controller actor.
//!
//! Inbound events mirror a worker lifecycle: `Install` precaches the shell
//! and the offline document, `Activate` prunes stale-versioned caches and
//! claims clients, `Fetch` answers a request per the strategy table, and a
//! `SkipWaiting` client message promotes a waiting update immediately. The
//! actor exclusively owns its [`CacheStorage`]; everything outside talks to
//! it through the [`WorkerHandle`] channel.

use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use crate::cache::{CacheLimits, CacheStorage, versioned_cache_name};
use crate::fetch::{
    FetchRequest, FetchResponse, Network, RequestClass, ResponseSource, classify,
};
use crate::strategy::race_network;

#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Network race window for navigations and document fetches.
    pub nav_timeout: Duration,
    /// Network race window for same-origin API paths.
    pub api_timeout: Duration,
    pub page_cache: CacheLimits,
    pub asset_cache: CacheLimits,
    pub api_cache: CacheLimits,
    pub shell_path: String,
    pub offline_path: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            nav_timeout: Duration::from_secs(3),
            api_timeout: Duration::from_secs(10),
            page_cache: CacheLimits {
                max_entries: 20,
                max_age: Duration::from_secs(7 * 24 * 3600),
            },
            asset_cache: CacheLimits {
                max_entries: 60,
                max_age: Duration::from_secs(30 * 24 * 3600),
            },
            api_cache: CacheLimits {
                max_entries: 20,
                max_age: Duration::from_secs(5 * 60),
            },
            shell_path: "/".to_string(),
            offline_path: "/offline".to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ControllerError {
    #[error("precache of {path} failed: {reason}")]
    Precache { path: String, reason: String },

    #[error("controller is gone")]
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientMessage {
    /// Promote a waiting update to active without waiting for every client
    /// to go away.
    SkipWaiting,
}

pub enum WorkerEvent {
    Install {
        done: oneshot::Sender<Result<(), ControllerError>>,
    },
    Activate {
        done: oneshot::Sender<()>,
    },
    Fetch {
        request: FetchRequest,
        reply: oneshot::Sender<FetchResponse>,
    },
    Message {
        message: ClientMessage,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Installing,
    Waiting,
    Active,
}

pub struct OfflineController {
    network: Arc<dyn Network>,
    caches: CacheStorage,
    config: ControllerConfig,
    phase: Phase,
}

impl OfflineController {
    pub fn new(network: Arc<dyn Network>, config: ControllerConfig) -> Self {
        Self {
            network,
            caches: CacheStorage::new(),
            config,
            phase: Phase::Installing,
        }
    }

    pub async fn run(mut self, mut inbox: mpsc::Receiver<WorkerEvent>) {
        while let Some(event) = inbox.recv().await {
            match event {
                WorkerEvent::Install { done } => {
                    let _ = done.send(self.install().await);
                }
                WorkerEvent::Activate { done } => {
                    self.activate();
                    let _ = done.send(());
                }
                WorkerEvent::Fetch { request, reply } => {
                    let response = self.fetch(&request).await;
                    let _ = reply.send(response);
                }
                WorkerEvent::Message { message } => match message {
                    ClientMessage::SkipWaiting => {
                        if self.phase == Phase::Waiting {
                            info!("skip-waiting received, activating now");
                            self.activate();
                        }
                    }
                },
            }
        }
    }

    /// Eagerly cache the shell route and the offline fallback document. A
    /// failure here fails the install; a worker without its offline
    /// document would not be able to honor the strategy table.
    async fn install(&mut self) -> Result<(), ControllerError> {
        let shell = self.config.shell_path.clone();
        let offline = self.config.offline_path.clone();
        for path in [shell, offline] {
            let request = FetchRequest::navigation(path.as_str());
            let response = self
                .network
                .fetch(&request)
                .await
                .map_err(|e| ControllerError::Precache {
                    path: path.clone(),
                    reason: e.to_string(),
                })?;
            if !response.is_ok() {
                return Err(ControllerError::Precache {
                    path,
                    reason: format!("status {}", response.status),
                });
            }
            self.page_cache().put(&path, response);
        }
        self.phase = Phase::Waiting;
        info!("install complete, update waiting");
        Ok(())
    }

    /// Delete every cache from a previous version and take over open
    /// clients immediately.
    fn activate(&mut self) {
        let stale = self.caches.prune_stale_versions();
        if !stale.is_empty() {
            info!("pruned stale caches: {stale:?}");
        }
        self.phase = Phase::Active;
    }

    async fn fetch(&mut self, request: &FetchRequest) -> FetchResponse {
        // Until activation claims the clients, requests pass straight
        // through; only an active controller applies the strategy table.
        if self.phase != Phase::Active {
            return match self.network.fetch(request).await {
                Ok(response) => response,
                Err(_) => FetchResponse::service_unavailable(),
            };
        }

        match classify(request) {
            RequestClass::ShellNavigation => self.shell_navigation(request).await,
            RequestClass::PageNavigation | RequestClass::DocumentFetch => {
                self.network_first_document(request).await
            }
            RequestClass::StaticAsset => {
                let name = versioned_cache_name("assets");
                let limits = self.config.asset_cache;
                self.cache_first(request, &name, limits).await
            }
            RequestClass::Bundle => {
                let name = versioned_cache_name("bundles");
                let limits = self.config.asset_cache;
                self.cache_first(request, &name, limits).await
            }
            RequestClass::Api => self.network_first_api(request).await,
            RequestClass::Passthrough => match self.network.fetch(request).await {
                Ok(response) => response,
                Err(_) => FetchResponse::service_unavailable(),
            },
        }
    }

    /// The shell root always races the live network and never degrades to
    /// the offline document: a cold start must see a real load attempt, and
    /// a masked failure would hide that the app is down.
    async fn shell_navigation(&mut self, request: &FetchRequest) -> FetchResponse {
        match race_network(self.network.as_ref(), request, self.config.nav_timeout).await {
            Some(response) => {
                if response.is_ok() {
                    self.page_cache().put(&request.path, response.clone());
                }
                response
            }
            None => FetchResponse::service_unavailable(),
        }
    }

    /// Network-first with the full fallback chain: cached copy of the same
    /// path, then the offline document, then a synthetic 503.
    async fn network_first_document(&mut self, request: &FetchRequest) -> FetchResponse {
        if let Some(response) =
            race_network(self.network.as_ref(), request, self.config.nav_timeout).await
        {
            if response.is_ok() {
                self.page_cache().put(&request.path, response.clone());
            }
            return response;
        }

        let offline_path = self.config.offline_path.clone();
        let cache = self.page_cache();
        if let Some(cached) = cache.get(&request.path) {
            return cached;
        }
        if let Some(mut offline) = cache.get(&offline_path) {
            offline.source = ResponseSource::OfflineFallback;
            return offline;
        }
        warn!("offline document uncached, answering {} with 503", request.path);
        FetchResponse::service_unavailable()
    }

    async fn network_first_api(&mut self, request: &FetchRequest) -> FetchResponse {
        if let Some(response) =
            race_network(self.network.as_ref(), request, self.config.api_timeout).await
        {
            if response.is_ok() {
                let name = versioned_cache_name("api");
                let limits = self.config.api_cache;
                self.caches.open(&name, limits).put(&request.path, response.clone());
            }
            return response;
        }

        let name = versioned_cache_name("api");
        let limits = self.config.api_cache;
        match self.caches.open(&name, limits).get(&request.path) {
            Some(cached) => cached,
            None => FetchResponse::service_unavailable(),
        }
    }

    /// Serve from cache without waiting on the network; only a miss goes
    /// out, and the fetched copy is kept for next time.
    async fn cache_first(
        &mut self,
        request: &FetchRequest,
        cache_name: &str,
        limits: CacheLimits,
    ) -> FetchResponse {
        if let Some(hit) = self.caches.open(cache_name, limits).get(&request.path) {
            return hit;
        }
        match self.network.fetch(request).await {
            Ok(response) => {
                if response.is_ok() {
                    self.caches
                        .open(cache_name, limits)
                        .put(&request.path, response.clone());
                }
                response
            }
            Err(_) => FetchResponse::service_unavailable(),
        }
    }

    fn page_cache(&mut self) -> &mut crate::cache::Cache {
        let name = versioned_cache_name("pages");
        self.caches.open(&name, self.config.page_cache)
    }
}

/// Client-side handle; the only way to reach the actor.
#[derive(Clone)]
pub struct WorkerHandle {
    tx: mpsc::Sender<WorkerEvent>,
}

impl WorkerHandle {
    pub async fn install(&self) -> Result<(), ControllerError> {
        let (done, rx) = oneshot::channel();
        self.tx
            .send(WorkerEvent::Install { done })
            .await
            .map_err(|_| ControllerError::Unavailable)?;
        rx.await.map_err(|_| ControllerError::Unavailable)?
    }

    pub async fn activate(&self) -> Result<(), ControllerError> {
        let (done, rx) = oneshot::channel();
        self.tx
            .send(WorkerEvent::Activate { done })
            .await
            .map_err(|_| ControllerError::Unavailable)?;
        rx.await.map_err(|_| ControllerError::Unavailable)
    }

    /// Always resolves to a response; a dead controller degrades to the
    /// synthetic 503 like any other total failure.
    pub async fn fetch(&self, request: FetchRequest) -> FetchResponse {
        let (reply, rx) = oneshot::channel();
        if self
            .tx
            .send(WorkerEvent::Fetch { request, reply })
            .await
            .is_err()
        {
            return FetchResponse::service_unavailable();
        }
        rx.await.unwrap_or_else(|_| FetchResponse::service_unavailable())
    }

    pub async fn skip_waiting(&self) -> Result<(), ControllerError> {
        self.tx
            .send(WorkerEvent::Message {
                message: ClientMessage::SkipWaiting,
            })
            .await
            .map_err(|_| ControllerError::Unavailable)
    }
}

/// Spawn the actor on the current runtime and hand back its mailbox.
pub fn spawn(network: Arc<dyn Network>, config: ControllerConfig) -> WorkerHandle {
    let (tx, rx) = mpsc::channel(32);
    let controller = OfflineController::new(network, config);
    tokio::spawn(controller.run(rx));
    WorkerHandle { tx }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{NetworkError, NetworkFuture, RequestKind};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    /// Scripted network: fixed routes, an offline switch, an optional
    /// response delay, and a hit counter.
    struct ScriptedNetwork {
        routes: Mutex<HashMap<String, FetchResponse>>,
        offline: AtomicBool,
        delay: Mutex<Duration>,
        hits: AtomicU32,
    }

    impl ScriptedNetwork {
        fn new() -> Self {
            let mut routes = HashMap::new();
            for path in ["/", "/offline", "/history", "/api/export", "/assets/index.js"] {
                routes.insert(path.to_string(), FetchResponse::html(path));
            }
            Self {
                routes: Mutex::new(routes),
                offline: AtomicBool::new(false),
                delay: Mutex::new(Duration::ZERO),
                hits: AtomicU32::new(0),
            }
        }

        fn go_offline(&self) {
            self.offline.store(true, Ordering::SeqCst);
        }

        fn set_delay(&self, delay: Duration) {
            *self.delay.lock().unwrap() = delay;
        }

        fn hits(&self) -> u32 {
            self.hits.load(Ordering::SeqCst)
        }
    }

    impl Network for ScriptedNetwork {
        fn fetch<'a>(&'a self, request: &'a FetchRequest) -> NetworkFuture<'a> {
            Box::pin(async move {
                self.hits.fetch_add(1, Ordering::SeqCst);
                let delay = *self.delay.lock().unwrap();
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                if self.offline.load(Ordering::SeqCst) {
                    return Err(NetworkError::Unreachable("offline".to_string()));
                }
                let routes = self.routes.lock().unwrap();
                Ok(routes
                    .get(&request.path)
                    .cloned()
                    .unwrap_or_else(|| FetchResponse::network(404, "text/plain", Vec::new())))
            })
        }
    }

    async fn installed_worker(network: Arc<ScriptedNetwork>) -> WorkerHandle {
        let handle = spawn(network, ControllerConfig::default());
        handle.install().await.expect("install");
        handle.activate().await.expect("activate");
        handle
    }

    #[tokio::test]
    async fn shell_navigation_offline_is_synthetic_503_not_offline_page() {
        let network = Arc::new(ScriptedNetwork::new());
        let handle = installed_worker(network.clone()).await;

        network.go_offline();
        let response = handle.fetch(FetchRequest::navigation("/")).await;
        assert_eq!(response.status, 503);
        assert_eq!(response.source, ResponseSource::Synthetic);
    }

    #[tokio::test]
    async fn cold_page_navigation_offline_gets_the_offline_document() {
        let network = Arc::new(ScriptedNetwork::new());
        let handle = installed_worker(network.clone()).await;

        network.go_offline();
        let response = handle.fetch(FetchRequest::navigation("/history")).await;
        assert_eq!(response.status, 200);
        assert_eq!(response.source, ResponseSource::OfflineFallback);
        assert_eq!(response.body, b"/offline".to_vec());
    }

    #[tokio::test]
    async fn warm_page_navigation_offline_serves_the_cached_copy() {
        let network = Arc::new(ScriptedNetwork::new());
        let handle = installed_worker(network.clone()).await;

        let live = handle.fetch(FetchRequest::navigation("/history")).await;
        assert_eq!(live.source, ResponseSource::Network);

        network.go_offline();
        let cached = handle.fetch(FetchRequest::navigation("/history")).await;
        assert_eq!(cached.status, 200);
        assert_eq!(cached.source, ResponseSource::Cache);
        assert_eq!(cached.body, b"/history".to_vec());
    }

    #[tokio::test]
    async fn uninstalled_worker_offline_answers_503_for_navigations() {
        let network = Arc::new(ScriptedNetwork::new());
        let handle = spawn(network.clone(), ControllerConfig::default());

        network.go_offline();
        let response = handle.fetch(FetchRequest::navigation("/history")).await;
        assert_eq!(response.status, 503);
        assert_eq!(response.source, ResponseSource::Synthetic);
    }

    #[tokio::test]
    async fn assets_are_served_from_cache_after_first_fetch() {
        let network = Arc::new(ScriptedNetwork::new());
        let handle = installed_worker(network.clone()).await;
        let hits_after_install = network.hits();

        let request = FetchRequest::new("/assets/index.js", RequestKind::Script);
        let first = handle.fetch(request.clone()).await;
        assert_eq!(first.source, ResponseSource::Network);

        let second = handle.fetch(request).await;
        assert_eq!(second.source, ResponseSource::Cache);
        assert_eq!(network.hits(), hits_after_install + 1);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_network_loses_the_navigation_race() {
        let network = Arc::new(ScriptedNetwork::new());
        let handle = installed_worker(network.clone()).await;

        network.set_delay(Duration::from_secs(5));
        let response = handle.fetch(FetchRequest::navigation("/history")).await;
        assert_eq!(response.source, ResponseSource::OfflineFallback);
    }

    #[tokio::test(start_paused = true)]
    async fn api_requests_get_the_longer_race_window() {
        let network = Arc::new(ScriptedNetwork::new());
        let handle = installed_worker(network.clone()).await;

        // Slower than the 3s navigation window, inside the 10s API window.
        network.set_delay(Duration::from_secs(5));
        let response = handle
            .fetch(FetchRequest::new("/api/export", RequestKind::Other))
            .await;
        assert_eq!(response.source, ResponseSource::Network);
        assert_eq!(response.status, 200);
    }

    #[tokio::test]
    async fn api_falls_back_to_its_bounded_cache() {
        let network = Arc::new(ScriptedNetwork::new());
        let handle = installed_worker(network.clone()).await;

        let request = FetchRequest::new("/api/export", RequestKind::Other);
        handle.fetch(request.clone()).await;

        network.go_offline();
        let cached = handle.fetch(request).await;
        assert_eq!(cached.source, ResponseSource::Cache);
    }

    #[tokio::test]
    async fn skip_waiting_activates_a_waiting_update() {
        let network = Arc::new(ScriptedNetwork::new());
        let handle = spawn(network.clone(), ControllerConfig::default());
        handle.install().await.unwrap();

        // No Activate event; the client message alone must promote it.
        handle.skip_waiting().await.unwrap();

        network.go_offline();
        let response = handle.fetch(FetchRequest::navigation("/history")).await;
        assert_eq!(response.source, ResponseSource::OfflineFallback);
    }

    #[tokio::test]
    async fn install_fails_without_the_offline_document() {
        let network = Arc::new(ScriptedNetwork::new());
        network.routes.lock().unwrap().remove("/offline");
        let handle = spawn(network, ControllerConfig::default());

        let err = handle.install().await.unwrap_err();
        assert!(matches!(err, ControllerError::Precache { .. }));
    }

    #[tokio::test]
    async fn network_failures_never_surface_as_errors() {
        let network = Arc::new(ScriptedNetwork::new());
        let handle = installed_worker(network.clone()).await;
        network.go_offline();

        for request in [
            FetchRequest::navigation("/"),
            FetchRequest::navigation("/settings"),
            FetchRequest::new("/data", RequestKind::Document),
            FetchRequest::new("/img/logo.png", RequestKind::Image),
            FetchRequest::new("/assets/app.css", RequestKind::Style),
            FetchRequest::new("/api/export", RequestKind::Other),
            FetchRequest::cross_origin("/tracker.js", RequestKind::Other),
        ] {
            let response = handle.fetch(request).await;
            assert!(response.status == 200 || response.status == 503);
        }
    }
}
