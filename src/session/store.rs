//! Session store implementations
//!
//! The store owns durability and expiry; the rest of the pipeline only
//! sees the load/save/delete contract. Concurrent requests with the same
//! token may race on save; last write wins by design.

use crate::config::RedisConfig;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Persisted session state: an arbitrary key/value map
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionRecord {
    pub data: HashMap<String, Value>,
}

/// Durable key -> blob store keyed by an opaque session token
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load the record for `token`, `None` if absent or expired
    async fn load(&self, token: &str) -> Result<Option<SessionRecord>>;

    /// Persist the record under `token`, resetting its lifetime to `ttl`
    async fn save(&self, token: &str, record: &SessionRecord, ttl: Duration) -> Result<()>;

    /// Remove the record for `token`, if any
    async fn delete(&self, token: &str) -> Result<()>;
}

/// In-memory store. Used as the test double and for single-process
/// deployments; expiry is checked on load.
#[derive(Default)]
pub struct MemorySessionStore {
    entries: Mutex<HashMap<String, (SessionRecord, Instant)>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (non-expired) records, for test assertions
    pub fn len(&self) -> usize {
        let now = Instant::now();
        let entries = self.entries.lock().expect("store lock poisoned");
        entries.values().filter(|(_, exp)| *exp > now).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, token: &str) -> Result<Option<SessionRecord>> {
        let mut entries = self.entries.lock().expect("store lock poisoned");
        match entries.get(token) {
            Some((record, expires)) if *expires > Instant::now() => Ok(Some(record.clone())),
            Some(_) => {
                entries.remove(token);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn save(&self, token: &str, record: &SessionRecord, ttl: Duration) -> Result<()> {
        let mut entries = self.entries.lock().expect("store lock poisoned");
        entries.insert(token.to_string(), (record.clone(), Instant::now() + ttl));
        Ok(())
    }

    async fn delete(&self, token: &str) -> Result<()> {
        let mut entries = self.entries.lock().expect("store lock poisoned");
        entries.remove(token);
        Ok(())
    }
}

/// Key prefix for session records in Redis
const KEY_PREFIX: &str = "snipbox:session";

/// Redis-backed store for production deployments. Expiry is delegated to
/// Redis key TTLs, so the sliding lifetime costs nothing extra on load.
#[derive(Clone)]
pub struct RedisSessionStore {
    conn: ConnectionManager,
}

impl RedisSessionStore {
    pub async fn connect(config: &RedisConfig) -> Result<Self> {
        let client = redis::Client::open(config.url.as_str())
            .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to create Redis client: {e}")))?;

        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to connect to Redis: {e}")))?;

        Ok(Self { conn })
    }

    fn key(token: &str) -> String {
        format!("{KEY_PREFIX}:{token}")
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn load(&self, token: &str) -> Result<Option<SessionRecord>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(Self::key(token)).await?;

        match value {
            Some(v) => {
                let record = serde_json::from_str(&v).map_err(|e| {
                    AppError::Internal(anyhow::anyhow!("session record deserialize error: {e}"))
                })?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    async fn save(&self, token: &str, record: &SessionRecord, ttl: Duration) -> Result<()> {
        let mut conn = self.conn.clone();
        let value = serde_json::to_string(record).map_err(|e| {
            AppError::Internal(anyhow::anyhow!("session record serialize error: {e}"))
        })?;
        let _: () = conn.set_ex(Self::key(token), value, ttl.as_secs()).await?;
        Ok(())
    }

    async fn delete(&self, token: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(Self::key(token)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemorySessionStore::new();
        let mut record = SessionRecord::default();
        record
            .data
            .insert("k".to_string(), serde_json::json!("v"));

        store
            .save("tok", &record, Duration::from_secs(60))
            .await
            .unwrap();

        let loaded = store.load("tok").await.unwrap().unwrap();
        assert_eq!(loaded.data.get("k"), Some(&serde_json::json!("v")));
    }

    #[tokio::test]
    async fn test_memory_store_expiry() {
        let store = MemorySessionStore::new();
        store
            .save("tok", &SessionRecord::default(), Duration::from_secs(0))
            .await
            .unwrap();

        assert!(store.load("tok").await.unwrap().is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_memory_store_delete() {
        let store = MemorySessionStore::new();
        store
            .save("tok", &SessionRecord::default(), Duration::from_secs(60))
            .await
            .unwrap();
        store.delete("tok").await.unwrap();
        assert!(store.load("tok").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_store_unknown_token() {
        let store = MemorySessionStore::new();
        assert!(store.load("missing").await.unwrap().is_none());
    }
}
