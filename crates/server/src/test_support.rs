//! Shared test helpers: an in-memory gateway over a scripted upstream.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use url::Url;

use wayfare_client::{FetchResponse, Network};
use wayfare_core::{AppConfig, CacheDb, Error};

use crate::gateway::{AssetRequest, Gateway};

/// Scripted upstream. Bodies default to `network:<url>` so tests can tell
/// a fresh fetch from a cached copy without scripting every URL.
pub(crate) struct MockNetwork {
    fail: AtomicBool,
    status: AtomicU16,
    bodies: Mutex<HashMap<String, String>>,
    calls: Mutex<Vec<String>>,
}

impl MockNetwork {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            fail: AtomicBool::new(false),
            status: AtomicU16::new(200),
            bodies: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn set_status(&self, status: u16) {
        self.status.store(status, Ordering::SeqCst);
    }

    pub(crate) fn set_body(&self, url: &str, body: &str) {
        self.bodies.lock().unwrap().insert(url.to_string(), body.to_string());
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn response(&self, target: &Url, body: String) -> FetchResponse {
        FetchResponse {
            url: target.clone(),
            final_url: target.clone(),
            status: self.status.load(Ordering::SeqCst),
            content_type: Some("text/plain".to_string()),
            headers: Vec::new(),
            body: Bytes::from(body),
            fetch_ms: 1,
        }
    }
}

#[async_trait]
impl Network for MockNetwork {
    async fn fetch(&self, target: &Url) -> Result<FetchResponse, Error> {
        self.calls.lock().unwrap().push(target.to_string());
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Network("connection refused".to_string()));
        }
        let body = self
            .bodies
            .lock()
            .unwrap()
            .get(target.as_str())
            .cloned()
            .unwrap_or_else(|| format!("network:{target}"));
        Ok(self.response(target, body))
    }

    async fn forward(&self, method: &str, target: &Url, _body: Bytes) -> Result<FetchResponse, Error> {
        self.calls.lock().unwrap().push(format!("{method} {target}"));
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Network("connection refused".to_string()));
        }
        Ok(self.response(target, format!("forwarded:{method}")))
    }
}

pub(crate) async fn test_gateway() -> (Gateway, Arc<MockNetwork>) {
    test_gateway_with(AppConfig { upstream_origin: "http://origin.test".into(), ..Default::default() }).await
}

pub(crate) async fn test_gateway_with(config: AppConfig) -> (Gateway, Arc<MockNetwork>) {
    let cache = CacheDb::open_in_memory().await.unwrap();
    let network = MockNetwork::new();
    let gateway = Gateway::new(cache, network.clone(), config).unwrap();
    (gateway, network)
}

pub(crate) fn get(url: &str, accept: Option<&str>) -> AssetRequest {
    AssetRequest::get(Url::parse(url).unwrap(), accept)
}
