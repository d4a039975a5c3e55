//! In-process TTL map backed by DashMap for lock-free concurrent access.
//! Satisfies the cache contract for single-instance development and tests;
//! entries are not shared between processes.

use crate::backend::CacheBackend;
use crate::error::StoreResult;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

struct CacheEntry {
    value: String,
    expires_at: Instant,
}

/// Local cache that expires entries lazily on read and in bulk via
/// [`evict_expired`](Self::evict_expired).
#[derive(Clone, Default)]
pub struct LocalBackend {
    store: Arc<DashMap<String, CacheEntry>>,
}

impl LocalBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove expired entries. Call this periodically from a background task.
    pub fn evict_expired(&self) -> usize {
        let before = self.store.len();
        let now = Instant::now();
        self.store.retain(|_, entry| entry.expires_at > now);
        before - self.store.len()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

#[async_trait]
impl CacheBackend for LocalBackend {
    fn is_open(&self) -> bool {
        true
    }

    async fn connect(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let Some(entry) = self.store.get(key) else {
            return Ok(None);
        };
        if entry.expires_at <= Instant::now() {
            drop(entry);
            self.store.remove(key);
            return Ok(None);
        }
        Ok(Some(entry.value.clone()))
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> StoreResult<()> {
        self.store.insert(
            key.to_string(),
            CacheEntry {
                value: value.to_string(),
                expires_at: Instant::now() + Duration::from_secs(ttl_secs),
            },
        );
        Ok(())
    }

    async fn del(&self, key: &str) -> StoreResult<()> {
        self.store.remove(key);
        Ok(())
    }
}
