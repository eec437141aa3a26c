//! Upstream GET requests cached by URL

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::{CacheStats, TtlCache};
use crate::error::NetworkError;

/// Freshness of username lookups and name histories
pub const UUID_TTL: Duration = Duration::from_secs(3600);
/// Freshness of session profiles, which change with skins
pub const PROFILE_TTL: Duration = Duration::from_secs(60);

const DEFAULT_USER_AGENT: &str = "mojang-proxy/0.1";

/// Status and JSON body of an upstream response. The body is only
/// present for a 200.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: Option<Value>,
}

/// Something that can answer a GET with JSON
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn get_json(&self, url: &str) -> Result<UpstreamResponse, NetworkError>;
}

/// [`Upstream`] over HTTPS
pub struct HttpUpstream {
    client: Client,
}

impl HttpUpstream {
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(10))
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(DEFAULT_USER_AGENT)
            .build()
            .expect("Failed to create HTTP client");

        Self { client }
    }
}

impl Default for HttpUpstream {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn get_json(&self, url: &str) -> Result<UpstreamResponse, NetworkError> {
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();

        if status != 200 {
            debug!(url, status, "Upstream returned no body");
            return Ok(UpstreamResponse { status, body: None });
        }

        let body = response.json::<Value>().await?;
        Ok(UpstreamResponse {
            status,
            body: Some(body),
        })
    }
}

/// Result of a cached fetch
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub status: u16,
    pub body: Option<Arc<Value>>,
    pub from_cache: bool,
}

/// Fetches upstream JSON and caches 200 bodies under the request URL.
///
/// Concurrent misses for the same URL may each reach upstream; the last
/// write wins and all of them agree once it lands.
pub struct CachedFetcher {
    upstream: Arc<dyn Upstream>,
    cache: Arc<TtlCache<Arc<Value>>>,
}

impl CachedFetcher {
    pub fn new(upstream: Arc<dyn Upstream>, cache: Arc<TtlCache<Arc<Value>>>) -> Self {
        Self { upstream, cache }
    }

    /// GET a URL, serving from cache while the entry is fresh.
    ///
    /// Non-200 statuses are returned as data with no body and are not
    /// cached; only transport failures are errors.
    pub async fn fetch(&self, url: &str, ttl: Duration) -> Result<FetchResult, NetworkError> {
        if let Some(body) = self.cache.get(url).await {
            debug!(url, "Cache hit");
            return Ok(FetchResult {
                status: 200,
                body: Some(body),
                from_cache: true,
            });
        }

        let response = self.upstream.get_json(url).await.map_err(|e| {
            warn!(url, error = %e, "Upstream request failed");
            e
        })?;

        let body = response.body.map(Arc::new);
        if let (200, Some(body)) = (response.status, &body) {
            self.cache.set(url, body.clone(), ttl).await;
            debug!(url, ttl_secs = ttl.as_secs(), "Cached upstream response");
        }

        Ok(FetchResult {
            status: response.status,
            body,
            from_cache: false,
        })
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}
