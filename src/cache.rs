//! The Response Cache: per-URL crawl-result memoization keyed by
//! `crawl:` + hex(sha256(url)), with a 7-day TTL. All failures are swallowed —
//! a cache miss (or a missing backend entirely) is never fatal to a crawl.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::config::Config;
use crate::error::CrawlerError;
use crate::types::PerUrlResult;

const CACHE_KEY_PREFIX: &str = "crawl:";
const DEFAULT_TTL: Duration = Duration::from_secs(7 * 24 * 3600);

/// Computes the cache key for a URL: `crawl:` + hex(sha256(url)).
pub fn cache_key(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    format!("{CACHE_KEY_PREFIX}{}", hex::encode(hasher.finalize()))
}

/// A key-value backend capable of storing JSON-encoded blobs with a TTL.
/// Implementations must never propagate I/O errors to the caller — on any
/// failure they should log and return `None`/do nothing.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get_raw(&self, key: &str) -> Option<String>;
    async fn set_raw(&self, key: &str, value: &str, ttl: Duration);
}

/// No-op backend used when `ENABLE_CACHE=false` or no `REDIS_URL` is configured.
pub struct NoopCache;

#[async_trait]
impl CacheBackend for NoopCache {
    async fn get_raw(&self, _key: &str) -> Option<String> {
        None
    }

    async fn set_raw(&self, _key: &str, _value: &str, _ttl: Duration) {}
}

/// Redis-backed cache using a `ConnectionManager` for automatic reconnection.
pub struct RedisCache {
    manager: redis::aio::ConnectionManager,
}

impl RedisCache {
    pub async fn connect(redis_url: &str) -> redis::RedisResult<Self> {
        let client = redis::Client::open(redis_url)?;
        let manager = redis::aio::ConnectionManager::new(client).await?;
        Ok(Self { manager })
    }
}

#[async_trait]
impl CacheBackend for RedisCache {
    async fn get_raw(&self, key: &str) -> Option<String> {
        use redis::AsyncCommands;
        let mut conn = self.manager.clone();
        match conn.get::<_, Option<String>>(key).await {
            Ok(value) => value,
            Err(error) => {
                tracing::warn!(%error, "response cache get failed, treating as miss");
                None
            }
        }
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) {
        use redis::AsyncCommands;
        let mut conn = self.manager.clone();
        if let Err(error) = conn
            .set_ex::<_, _, ()>(key, value, ttl.as_secs().max(1))
            .await
        {
            tracing::warn!(%error, "response cache set failed, continuing without caching");
        }
    }
}

/// Typed facade over a [`CacheBackend`] for [`PerUrlResult`] values.
#[derive(Clone)]
pub struct ResponseCache {
    backend: Arc<dyn CacheBackend>,
}

impl ResponseCache {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self { backend }
    }

    pub fn noop() -> Self {
        Self::new(Arc::new(NoopCache))
    }

    /// Picks a backend from process configuration: `NoopCache` when
    /// `ENABLE_CACHE` is off or no `REDIS_URL` is set, otherwise a connected
    /// `RedisCache`.
    pub async fn from_config(config: &Config) -> Result<Self, CrawlerError> {
        if !config.enable_cache {
            return Ok(Self::noop());
        }

        match &config.redis_url {
            Some(redis_url) => {
                let backend = RedisCache::connect(redis_url)
                    .await
                    .map_err(|error| CrawlerError::CacheBackend(error.to_string()))?;
                Ok(Self::new(Arc::new(backend)))
            }
            None => Ok(Self::noop()),
        }
    }

    /// Looks up the cached crawl result for `url`, if present and still valid
    /// JSON. Any decode failure is treated as a miss.
    pub async fn get(&self, url: &str) -> Option<PerUrlResult> {
        let raw = self.backend.get_raw(&cache_key(url)).await?;
        match serde_json::from_str(&raw) {
            Ok(result) => Some(result),
            Err(error) => {
                tracing::warn!(%error, "response cache entry failed to decode, treating as miss");
                None
            }
        }
    }

    /// Stores the crawl result for `url` with the default 7-day TTL.
    pub async fn set(&self, url: &str, result: &PerUrlResult) {
        let Ok(encoded) = serde_json::to_string(result) else {
            return;
        };
        self.backend.set_raw(&cache_key(url), &encoded, DEFAULT_TTL).await;
    }
}
