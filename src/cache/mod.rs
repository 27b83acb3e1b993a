// cache/mod.rs - Response cache for the read-heavy API handlers
//
// Dashboard stats, country aggregates, meeting/user/city lists are cached for a
// short TTL. The backend is in-memory unless a Redis URL is configured in
// production. The cache is never authoritative: backend failures degrade to a
// miss and the handler falls through to the database.

pub mod memory;
pub mod redis;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::AppConfig;

pub use memory::InMemoryCache;
pub use self::redis::RedisCache;

/// Key prefixes shared by the handlers that read and invalidate them.
pub mod keys {
    pub const DASHBOARD_STATS: &str = "dashboard-stats:";
    pub const COUNTRY_AGGREGATES: &str = "country-aggregates:";
    pub const TEAM_MEETINGS: &str = "team-meetings:";
    pub const USERS: &str = "users:";
    pub const CITIES: &str = "cities:";
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(#[from] ::redis::RedisError),

    #[error("Cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unexpected cache response: {0}")]
    Backend(String),
}

/// Storage operations a cache backend provides. Values are opaque JSON strings.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn get_raw(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store `value`; `None` keeps it until deleted.
    async fn set_raw(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Remove every key starting with `prefix`, returning how many were removed.
    async fn delete_prefix(&self, prefix: &str) -> Result<u64, CacheError>;

    async fn clear(&self) -> Result<(), CacheError>;

    async fn health_check(&self) -> Result<(), CacheError>;
}

/// Memory backend with a background sweeper already running.
fn swept_memory(every: Duration) -> InMemoryCache {
    let memory = InMemoryCache::new();
    memory.spawn_sweeper(every);
    memory
}

/// Typed façade over a [`CacheBackend`], shared through `AppState`.
#[derive(Clone)]
pub struct Cache {
    backend: Arc<dyn CacheBackend>,
    default_ttl: Duration,
    enabled: bool,
}

impl Cache {
    pub fn new(backend: Arc<dyn CacheBackend>, default_ttl: Duration) -> Self {
        Self {
            backend,
            default_ttl,
            enabled: true,
        }
    }

    /// In-memory cache with the given default TTL.
    pub fn in_memory(default_ttl: Duration) -> Self {
        Self::new(Arc::new(InMemoryCache::new()), default_ttl)
    }

    /// Pick the backend for this deployment. Redis is only used in production;
    /// a Redis that cannot be reached falls back to memory.
    pub async fn from_config(config: &AppConfig) -> Self {
        let ttl = Duration::from_secs(config.cache.default_ttl_secs);
        let sweep_every = ttl.max(Duration::from_secs(1));

        let mut cache = match config.cache.redis_url.as_deref() {
            Some(url) if config.is_production() => match RedisCache::connect(url).await {
                Ok(redis) => {
                    info!("Using Redis cache backend");
                    Self::new(Arc::new(redis), ttl)
                }
                Err(e) => {
                    warn!(error = %e, "Redis unavailable, falling back to in-memory cache");
                    Self::new(Arc::new(swept_memory(sweep_every)), ttl)
                }
            },
            _ => {
                info!("Using in-memory cache backend");
                Self::new(Arc::new(swept_memory(sweep_every)), ttl)
            }
        };

        cache.enabled = config.cache.enabled;
        cache
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        if !self.enabled {
            return None;
        }

        let raw = match self.backend.get_raw(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(key, error = %e, "Cache read failed");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                // Stale shape from an older build; drop it
                warn!(key, error = %e, "Discarding undecodable cache entry");
                let _ = self.backend.delete(key).await;
                None
            }
        }
    }

    /// Store `value` under `key` (default TTL when `ttl` is `None`).
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Option<Duration>) {
        if !self.enabled {
            return;
        }

        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key, error = %e, "Cache serialization failed");
                return;
            }
        };

        let ttl = ttl.unwrap_or(self.default_ttl);
        if let Err(e) = self.backend.set_raw(key, raw, Some(ttl)).await {
            warn!(key, error = %e, "Cache write failed");
        }
    }

    pub async fn invalidate(&self, key: &str) {
        if let Err(e) = self.backend.delete(key).await {
            warn!(key, error = %e, "Cache invalidation failed");
        }
    }

    pub async fn invalidate_prefix(&self, prefix: &str) {
        match self.backend.delete_prefix(prefix).await {
            Ok(removed) => debug!(prefix, removed, "Invalidated cache prefix"),
            Err(e) => warn!(prefix, error = %e, "Cache prefix invalidation failed"),
        }
    }

    pub async fn clear(&self) {
        if let Err(e) = self.backend.clear().await {
            warn!(error = %e, "Cache clear failed");
        }
    }

    pub async fn health_check(&self) -> Result<(), CacheError> {
        self.backend.health_check().await
    }

    /// Return the cached value for `key`, or run `loader`, store its result and
    /// return it. Loader errors are passed through and nothing is stored.
    pub async fn cached<T, E, F, Fut>(&self, key: &str, ttl: Option<Duration>, loader: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(hit) = self.get::<T>(key).await {
            debug!(key, "Cache hit");
            return Ok(hit);
        }

        debug!(key, "Cache miss");
        let value = loader().await?;
        self.set(key, &value, ttl).await;
        Ok(value)
    }
}
