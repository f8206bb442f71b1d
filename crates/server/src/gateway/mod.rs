//! The gateway: classification and per-category routing of intercepted
//! requests.
//!
//! Only GET requests over http(s) are intercepted; everything else is
//! relayed untouched. Intercepted requests are classified in priority
//! order and served by the matching strategy against a versioned cache
//! partition.

pub mod classify;
pub mod offline;
pub mod strategies;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use bytes::Bytes;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use url::Url;

use wayfare_client::{FetchResponse, Network};
use wayfare_core::cache::Entry;
use wayfare_core::{AppConfig, CacheDb, Error, Partitions};

use classify::RequestClass;

/// An intercepted (or about-to-be-relayed) request.
#[derive(Debug, Clone)]
pub struct AssetRequest {
    pub method: String,
    pub url: Url,
    /// Accept header of the original request, if any.
    pub accept: Option<String>,
}

impl AssetRequest {
    /// A GET request, the only kind the gateway caches.
    pub fn get(url: Url, accept: Option<&str>) -> Self {
        Self { method: "GET".to_string(), url, accept: accept.map(str::to_string) }
    }

    /// Whether this request is a page navigation (Accept: text/html).
    pub fn is_navigation(&self) -> bool {
        self.accept.as_deref().is_some_and(|a| a.contains("text/html"))
    }

    /// Whether the gateway intercepts this request at all.
    pub fn is_intercepted(&self) -> bool {
        self.method == "GET" && matches!(self.url.scheme(), "http" | "https")
    }
}

/// Where the served bytes came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Cache,
    Network,
    Offline,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Cache => "cache",
            Source::Network => "network",
            Source::Offline => "offline",
        }
    }
}

/// The response handed back for an intercepted request.
#[derive(Debug, Clone)]
pub struct ServedResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Bytes,
    pub source: Source,
}

/// A served response plus the background refresh it may have spawned.
///
/// The refresh runs to completion on its own; callers that don't care
/// simply drop the handle. Tests await it to observe the refreshed entry.
pub struct ServedOutcome {
    pub response: ServedResponse,
    pub refresh: Option<JoinHandle<()>>,
}

impl ServedOutcome {
    pub(crate) fn cached(entry: Entry) -> Self {
        let response = ServedResponse {
            status: entry.status,
            content_type: entry.content_type,
            body: Bytes::from(entry.body),
            source: Source::Cache,
        };
        Self { response, refresh: None }
    }

    pub(crate) fn network(fetched: &FetchResponse) -> Self {
        let response = ServedResponse {
            status: fetched.status,
            content_type: fetched.content_type.clone(),
            body: fetched.body.clone(),
            source: Source::Network,
        };
        Self { response, refresh: None }
    }

    pub(crate) fn offline(request: &AssetRequest) -> Self {
        Self { response: offline::offline_response(request), refresh: None }
    }

    pub(crate) fn with_refresh(mut self, handle: JoinHandle<()>) -> Self {
        self.refresh = Some(handle);
        self
    }
}

/// What the gateway decided to do with a request.
pub enum Decision {
    /// Serve through a caching strategy.
    Serve(ServedOutcome),
    /// Relay untouched: non-GET method or non-http(s) scheme.
    PassThrough,
}

/// Event broadcast to connected clients.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientEvent {
    Activated { version: String },
}

struct GatewayState {
    controlling: AtomicBool,
    skip_waiting: AtomicBool,
    events: broadcast::Sender<ClientEvent>,
}

/// The offline asset cache gateway.
#[derive(Clone)]
pub struct Gateway {
    cache: CacheDb,
    network: Arc<dyn Network>,
    config: AppConfig,
    upstream: Url,
    partitions: Partitions,
    state: Arc<GatewayState>,
}

impl Gateway {
    pub fn new(cache: CacheDb, network: Arc<dyn Network>, config: AppConfig) -> Result<Self, Error> {
        let upstream = Url::parse(&config.upstream_origin).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        let partitions = Partitions::for_version(&config.version);
        let (events, _) = broadcast::channel(16);
        let state = Arc::new(GatewayState {
            controlling: AtomicBool::new(false),
            skip_waiting: AtomicBool::new(false),
            events,
        });
        Ok(Self { cache, network, config, upstream, partitions, state })
    }

    pub fn cache(&self) -> &CacheDb {
        &self.cache
    }

    pub fn network(&self) -> &Arc<dyn Network> {
        &self.network
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn upstream(&self) -> &Url {
        &self.upstream
    }

    pub fn partitions(&self) -> &Partitions {
        &self.partitions
    }

    pub fn version(&self) -> &str {
        &self.config.version
    }

    /// Subscribe to gateway events (activation broadcasts).
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.state.events.subscribe()
    }

    pub(crate) fn broadcast(&self, event: ClientEvent) {
        // Nobody listening is fine.
        let _ = self.state.events.send(event);
    }

    /// Ask the new version to go live without waiting.
    pub fn request_skip_waiting(&self) {
        self.state.skip_waiting.store(true, Ordering::SeqCst);
    }

    pub fn skip_waiting_requested(&self) -> bool {
        self.state.skip_waiting.load(Ordering::SeqCst)
    }

    pub(crate) fn set_controlling(&self) {
        self.state.controlling.store(true, Ordering::SeqCst);
    }

    /// Whether activation has taken over open clients.
    pub fn is_controlling(&self) -> bool {
        self.state.controlling.load(Ordering::SeqCst)
    }

    /// Route one request through the policy.
    pub async fn handle(&self, request: &AssetRequest) -> Decision {
        if !request.is_intercepted() {
            return Decision::PassThrough;
        }

        let class = classify::classify(request, &self.config);
        tracing::debug!(url = %request.url, class = ?class, "routing intercepted request");

        let outcome = match class {
            RequestClass::CriticalPage => {
                strategies::cache_first_with_refresh(self, request, &self.partitions.static_assets).await
            }
            RequestClass::StaticAsset => strategies::cache_first(self, request, &self.partitions.static_assets).await,
            RequestClass::Image => {
                strategies::cache_first_bounded(
                    self,
                    request,
                    &self.partitions.images,
                    self.config.image_cache_cap as u64,
                )
                .await
            }
            RequestClass::Font => strategies::cache_first(self, request, &self.partitions.fonts).await,
            RequestClass::Api => strategies::network_first(self, request, &self.partitions.api).await,
            RequestClass::HtmlPage => {
                strategies::stale_while_revalidate(self, request, &self.partitions.dynamic).await
            }
            RequestClass::Other => strategies::network_first(self, request, &self.partitions.dynamic).await,
        };

        Decision::Serve(outcome)
    }
}
