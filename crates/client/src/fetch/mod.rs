//! Upstream HTTP access for the gateway.
//!
//! The strategies never talk to reqwest directly; they go through the
//! [`Network`] trait so tests can script the upstream. The contract that
//! matters for routing: transport failures (connect, DNS, timeout) are
//! `Err`, while HTTP responses of any status are `Ok`. Only the former
//! triggers cache fallback in the network-first strategies.

pub mod url;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Method, Url};
use std::time::{Duration, Instant};

use wayfare_core::Error;

/// Configuration for the upstream HTTP client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// User agent string (default: "wayfare/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: "wayfare/0.1".to_string(),
            max_bytes: 5 * 1024 * 1024,
            timeout: Duration::from_millis(20_000),
            max_redirects: 5,
        }
    }
}

/// Response from an upstream fetch.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// The URL requested
    pub url: Url,
    /// The final URL after redirects
    pub final_url: Url,
    /// HTTP status code
    pub status: u16,
    /// Content-Type header
    pub content_type: Option<String>,
    /// Response headers as name/value pairs
    pub headers: Vec<(String, String)>,
    /// Response body bytes
    pub body: Bytes,
    /// Time taken to fetch in milliseconds
    pub fetch_ms: u64,
}

impl FetchResponse {
    /// Whether the transport status indicates success (2xx).
    ///
    /// Responses are only written into a cache partition when this holds.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Headers serialized for storage alongside the cached body.
    pub fn headers_json(&self) -> Option<String> {
        serde_json::to_string(&self.headers).ok()
    }
}

/// Upstream access used by the routing strategies.
#[async_trait]
pub trait Network: Send + Sync {
    /// Fetch a URL with GET.
    async fn fetch(&self, target: &Url) -> Result<FetchResponse, Error>;

    /// Relay a request verbatim, bypassing every cache. Used for the
    /// pass-through path (non-GET methods).
    async fn forward(&self, method: &str, target: &Url, body: Bytes) -> Result<FetchResponse, Error>;
}

/// reqwest-backed upstream client.
pub struct HttpClient {
    http: Client,
    config: ClientConfig,
}

impl HttpClient {
    /// Create a new upstream client with the given configuration.
    pub fn new(config: ClientConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    async fn execute(
        &self, target: &Url, request: reqwest::RequestBuilder, limit: Option<usize>,
    ) -> Result<FetchResponse, Error> {
        let start = Instant::now();

        let response = request.send().await.map_err(map_transport_error)?;

        let status = response.status().as_u16();
        let requested = target.clone();

        if let Some(max) = limit
            && let Some(len) = response.content_length()
            && len as usize > max
        {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", len, max)));
        }

        let final_url = response.url().clone();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| (name.to_string(), String::from_utf8_lossy(value.as_bytes()).into_owned()))
            .collect::<Vec<_>>();

        let body = response.bytes().await.map_err(map_transport_error)?;

        if let Some(max) = limit
            && body.len() > max
        {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", body.len(), max)));
        }

        let content_type = headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("content-type"))
            .map(|(_, value)| value.clone());

        let fetch_ms = start.elapsed().as_millis() as u64;

        tracing::debug!("fetched {} -> {} in {}ms ({} bytes)", requested, final_url, fetch_ms, body.len());

        Ok(FetchResponse { url: requested, final_url, status, content_type, headers, body, fetch_ms })
    }
}

fn map_transport_error(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::FetchTimeout(err.to_string())
    } else {
        Error::Network(err.to_string())
    }
}

#[async_trait]
impl Network for HttpClient {
    async fn fetch(&self, target: &Url) -> Result<FetchResponse, Error> {
        let request = self.http.get(target.as_str()).header(
            "Accept",
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        );
        self.execute(target, request, Some(self.config.max_bytes)).await
    }

    async fn forward(&self, method: &str, target: &Url, body: Bytes) -> Result<FetchResponse, Error> {
        let method = Method::from_bytes(method.as_bytes())
            .map_err(|_| Error::InvalidInput(format!("bad method: {method}")))?;
        let mut request = self.http.request(method, target.as_str());
        if !body.is_empty() {
            request = request.body(body);
        }
        // No size limit on relayed responses: pass-through must not alter
        // what the upstream returned.
        self.execute(target, request, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_default() {
        let config = ClientConfig::default();
        assert_eq!(config.user_agent, "wayfare/0.1");
        assert_eq!(config.max_bytes, 5 * 1024 * 1024);
        assert_eq!(config.timeout, Duration::from_millis(20_000));
        assert_eq!(config.max_redirects, 5);
    }

    #[test]
    fn test_is_success_bounds() {
        let mut response = FetchResponse {
            url: Url::parse("https://example.com").unwrap(),
            final_url: Url::parse("https://example.com").unwrap(),
            status: 200,
            content_type: None,
            headers: Vec::new(),
            body: Bytes::new(),
            fetch_ms: 0,
        };
        assert!(response.is_success());

        response.status = 299;
        assert!(response.is_success());

        response.status = 304;
        assert!(!response.is_success());

        response.status = 503;
        assert!(!response.is_success());
    }

    #[test]
    fn test_headers_json_round_trips() {
        let response = FetchResponse {
            url: Url::parse("https://example.com").unwrap(),
            final_url: Url::parse("https://example.com").unwrap(),
            status: 200,
            content_type: Some("text/css".to_string()),
            headers: vec![("content-type".to_string(), "text/css".to_string())],
            body: Bytes::new(),
            fetch_ms: 12,
        };
        let json = response.headers_json().unwrap();
        let parsed: Vec<(String, String)> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, response.headers);
    }

    #[tokio::test]
    async fn test_http_client_new() {
        let client = HttpClient::new(ClientConfig::default());
        assert!(client.is_ok());
    }
}
