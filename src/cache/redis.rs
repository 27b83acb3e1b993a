use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::{error, info};

use super::{CacheBackend, CacheError};

/// Namespace for every key this service writes, so a shared Redis is safe to use.
const KEY_PREFIX: &str = "cleanwhale:";

/// Redis backend. Reads that fail are logged and reported as a miss, writes
/// that fail are logged and dropped.
#[derive(Clone)]
pub struct RedisCache {
    manager: ConnectionManager,
}

impl RedisCache {
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(url)?;
        let manager = ConnectionManager::new(client).await?;

        let cache = Self { manager };
        cache.health_check().await?;
        info!("Connected to Redis cache");
        Ok(cache)
    }

    fn build_key(key: &str) -> String {
        format!("{KEY_PREFIX}{key}")
    }

    async fn delete_matching(&self, pattern: &str) -> Result<u64, CacheError> {
        let mut conn = self.manager.clone();
        let mut removed = 0u64;
        let mut cursor = 0u64;

        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await?;

            if !keys.is_empty() {
                let deleted: u64 = conn.del(&keys).await?;
                removed += deleted;
            }

            cursor = next;
            if cursor == 0 {
                break;
            }
        }

        Ok(removed)
    }
}

/// Escape glob metacharacters so a literal prefix can be used in SCAN MATCH.
fn escape_pattern(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[async_trait]
impl CacheBackend for RedisCache {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn get_raw(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.manager.clone();
        match conn.get::<_, Option<String>>(Self::build_key(key)).await {
            Ok(value) => Ok(value),
            Err(e) => {
                error!(key, error = %e, "Redis GET failed");
                Ok(None)
            }
        }
    }

    async fn set_raw(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), CacheError> {
        let mut conn = self.manager.clone();
        let redis_key = Self::build_key(key);

        let result = match ttl {
            // SET EX needs at least one second
            Some(ttl) => conn.set_ex::<_, _, ()>(&redis_key, value, ttl.as_secs().max(1)).await,
            None => conn.set::<_, _, ()>(&redis_key, value).await,
        };

        if let Err(e) = result {
            error!(key, error = %e, "Redis SET failed");
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.manager.clone();
        let _: u64 = conn.del(Self::build_key(key)).await?;
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<u64, CacheError> {
        let pattern = format!("{}*", escape_pattern(&Self::build_key(prefix)));
        self.delete_matching(&pattern).await
    }

    async fn clear(&self) -> Result<(), CacheError> {
        let pattern = format!("{}*", escape_pattern(KEY_PREFIX));
        self.delete_matching(&pattern).await?;
        Ok(())
    }

    async fn health_check(&self) -> Result<(), CacheError> {
        let mut conn = self.manager.clone();
        let response: String = redis::cmd("PING").query_async(&mut conn).await?;
        if response == "PONG" {
            Ok(())
        } else {
            Err(CacheError::Backend(format!("unexpected PING response '{response}'")))
        }
    }
}
