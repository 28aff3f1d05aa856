use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::Client;
use tokio::time::Instant;

use crate::errors::{AppError, Result};

/// Short-lived keyed values with per-key expiry.
///
/// A missing key and an expired key are indistinguishable to callers.
#[async_trait]
pub trait KeyValueCache: Send + Sync {
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn delete(&self, key: &str) -> Result<()>;

    /// Increments a counter, starting its TTL when the key is created.
    async fn incr(&self, key: &str, ttl: Duration) -> Result<i64>;

    fn backend(&self) -> &'static str;
}

const CONNECT_ATTEMPTS: u32 = 6;
const CONNECT_BASE_DELAY: Duration = Duration::from_millis(250);

#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
    op_timeout: Duration,
}

impl RedisCache {
    /// Connects once for the lifetime of the process.
    ///
    /// The first connection is retried with exponential backoff
    /// (250ms, 500ms, 1s, ...). After that the connection manager
    /// re-establishes dropped connections on the next command.
    pub async fn connect(redis_url: &str, op_timeout: Duration) -> Result<Self> {
        let client = Client::open(redis_url)?;

        let mut delay = CONNECT_BASE_DELAY;
        let mut attempt = 1;
        loop {
            match ConnectionManager::new(client.clone()).await {
                Ok(conn) => {
                    tracing::info!("Redis client connected and ready to use");
                    return Ok(Self { conn, op_timeout });
                }
                Err(e) if attempt < CONNECT_ATTEMPTS => {
                    tracing::warn!(
                        attempt,
                        retry_in_ms = delay.as_millis() as u64,
                        "Failed to connect to Redis: {}",
                        e
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!("Giving up on Redis after {} attempts: {}", attempt, e);
                    return Err(e.into());
                }
            }
        }
    }

    async fn run<T, F>(&self, op: F) -> Result<T>
    where
        F: Future<Output = redis::RedisResult<T>>,
    {
        match tokio::time::timeout(self.op_timeout, op).await {
            Ok(result) => result.map_err(AppError::from),
            Err(_) => Err(AppError::CacheTimeout),
        }
    }
}

#[async_trait]
impl KeyValueCache for RedisCache {
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut conn = self.conn.clone();
        let seconds = ttl.as_secs().max(1);
        self.run(async move {
            redis::cmd("SET")
                .arg(key)
                .arg(value)
                .arg("EX")
                .arg(seconds)
                .query_async::<_, ()>(&mut conn)
                .await
        })
        .await
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        self.run(async move {
            redis::cmd("GET")
                .arg(key)
                .query_async::<_, Option<String>>(&mut conn)
                .await
        })
        .await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        self.run(async move {
            redis::cmd("DEL")
                .arg(key)
                .query_async::<_, ()>(&mut conn)
                .await
        })
        .await
    }

    async fn incr(&self, key: &str, ttl: Duration) -> Result<i64> {
        let mut conn = self.conn.clone();
        let seconds = ttl.as_secs().max(1);
        self.run(async move {
            let count: i64 = redis::cmd("INCR").arg(key).query_async(&mut conn).await?;
            if count == 1 {
                redis::cmd("EXPIRE")
                    .arg(key)
                    .arg(seconds)
                    .query_async::<_, ()>(&mut conn)
                    .await?;
            }
            Ok::<_, redis::RedisError>(count)
        })
        .await
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}

struct Entry {
    value: String,
    expires_at: Instant,
}

/// In-process cache for single-node development and tests.
///
/// Expiry follows the tokio clock, so a paused runtime can simulate time.
/// Expired entries are dropped when read and swept on every write.
#[derive(Clone, Default)]
pub struct MemoryCache {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Entry>>> {
        self.entries
            .lock()
            .map_err(|_| AppError::Cache("memory cache lock poisoned".to_string()))
    }
}

#[async_trait]
impl KeyValueCache for MemoryCache {
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let now = Instant::now();
        let mut entries = self.lock()?;
        // keys that are never read again would otherwise live forever
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: now + ttl,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut entries = self.lock()?;
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }

    async fn incr(&self, key: &str, ttl: Duration) -> Result<i64> {
        let now = Instant::now();
        let mut entries = self.lock()?;

        let current = match entries.get(key) {
            Some(entry) if entry.expires_at > now => Some((
                entry.value.parse::<i64>().map_err(|_| {
                    AppError::Cache(format!("value at {} is not an integer", key))
                })?,
                entry.expires_at,
            )),
            _ => None,
        };

        let (count, expires_at) = match current {
            Some((count, expires_at)) => (count + 1, expires_at),
            None => (1, now + ttl),
        };

        entries.insert(
            key.to_string(),
            Entry {
                value: count.to_string(),
                expires_at,
            },
        );
        Ok(count)
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn memory_cache_expires_entries() {
        let cache = MemoryCache::new();
        cache.set_ex("otp:a@x.com", "12345", Duration::from_secs(300)).await.unwrap();

        tokio::time::advance(Duration::from_secs(299)).await;
        assert_eq!(cache.get("otp:a@x.com").await.unwrap().as_deref(), Some("12345"));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.get("otp:a@x.com").await.unwrap(), None);
    }

    #[tokio::test]
    async fn memory_cache_set_overwrites() {
        let cache = MemoryCache::new();
        cache.set_ex("k", "first", Duration::from_secs(60)).await.unwrap();
        cache.set_ex("k", "second", Duration::from_secs(60)).await.unwrap();

        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("second"));

        cache.delete("k").await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn writes_sweep_expired_entries() {
        let cache = MemoryCache::new();
        cache.set_ex("otp:gone@x.com", "11111", Duration::from_secs(300)).await.unwrap();
        cache.incr("otp_attempts:gone@x.com", Duration::from_secs(300)).await.unwrap();

        tokio::time::advance(Duration::from_secs(301)).await;
        cache.set_ex("otp:live@x.com", "22222", Duration::from_secs(300)).await.unwrap();

        let entries = cache.entries.lock().unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries.contains_key("otp:live@x.com"));
    }

    #[tokio::test(start_paused = true)]
    async fn incr_keeps_the_original_window() {
        let cache = MemoryCache::new();
        let ttl = Duration::from_secs(10);

        assert_eq!(cache.incr("n", ttl).await.unwrap(), 1);
        tokio::time::advance(Duration::from_secs(6)).await;
        assert_eq!(cache.incr("n", ttl).await.unwrap(), 2);

        // window started at the first increment
        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(cache.incr("n", ttl).await.unwrap(), 1);
    }
}
