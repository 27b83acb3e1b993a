use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{CacheBackend, CacheError};

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// Process-local cache. Expired entries are dropped when read and by
/// [`InMemoryCache::purge_expired`].
#[derive(Clone, Default)]
pub struct InMemoryCache {
    store: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every expired entry, returning how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut store = self.store.write().await;
        let before = store.len();
        store.retain(|_, entry| !entry.is_expired(now));
        let removed = before - store.len();
        drop(store);

        if removed > 0 {
            tracing::debug!("Purged {} expired cache entries", removed);
        }
        removed
    }

    /// Run [`purge_expired`](Self::purge_expired) every `every` until the
    /// last handle to this cache is dropped.
    pub fn spawn_sweeper(&self, every: Duration) -> tokio::task::JoinHandle<()> {
        let store = Arc::downgrade(&self.store);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(store) = store.upgrade() else { break };
                InMemoryCache { store }.purge_expired().await;
            }
        })
    }

    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }
}

#[async_trait]
impl CacheBackend for InMemoryCache {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get_raw(&self, key: &str) -> Result<Option<String>, CacheError> {
        let now = Instant::now();
        {
            let store = self.store.read().await;
            match store.get(key) {
                None => return Ok(None),
                Some(entry) if !entry.is_expired(now) => return Ok(Some(entry.value.clone())),
                Some(_) => {}
            }
        }

        // Expired: remove it unless a writer replaced it in the meantime
        let mut store = self.store.write().await;
        if store.get(key).is_some_and(|entry| entry.is_expired(now)) {
            store.remove(key);
        }
        Ok(None)
    }

    async fn set_raw(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), CacheError> {
        let entry = CacheEntry {
            value,
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        };
        self.store.write().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.store.write().await.remove(key);
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<u64, CacheError> {
        let mut store = self.store.write().await;
        let before = store.len();
        store.retain(|key, _| !key.starts_with(prefix));
        Ok((before - store.len()) as u64)
    }

    async fn clear(&self) -> Result<(), CacheError> {
        self.store.write().await.clear();
        Ok(())
    }

    async fn health_check(&self) -> Result<(), CacheError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn entries_without_ttl_never_expire() {
        let cache = InMemoryCache::new();
        cache.set_raw("k", "v".to_string(), None).await.unwrap();
        assert_eq!(cache.purge_expired().await, 0);
        assert_eq!(cache.get_raw("k").await.unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn purge_removes_only_expired_entries() {
        let cache = InMemoryCache::new();
        cache.set_raw("old", "1".into(), Some(Duration::from_millis(10))).await.unwrap();
        cache.set_raw("new", "2".into(), Some(Duration::from_secs(60))).await.unwrap();

        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(cache.purge_expired().await, 1);
        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.get_raw("new").await.unwrap().as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn sweeper_purges_in_background() {
        let cache = InMemoryCache::new();
        cache.set_raw("k", "v".into(), Some(Duration::from_millis(10))).await.unwrap();
        let sweeper = cache.spawn_sweeper(Duration::from_millis(20));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(cache.is_empty().await);
        sweeper.abort();
    }

    #[tokio::test]
    async fn expired_read_removes_the_entry() {
        let cache = InMemoryCache::new();
        cache.set_raw("k", "v".into(), Some(Duration::from_millis(10))).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(cache.get_raw("k").await.unwrap(), None);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn delete_prefix_counts_removed_keys() {
        let cache = InMemoryCache::new();
        for key in ["users:1", "users:2", "cities:all"] {
            cache.set_raw(key, "x".into(), None).await.unwrap();
        }

        assert_eq!(cache.delete_prefix("users:").await.unwrap(), 2);
        cache.clear().await.unwrap();
        assert!(cache.is_empty().await);
    }
}
