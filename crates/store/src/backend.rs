//! Lazily (re)connecting journey store over a pluggable cache backend.

use crate::error::StoreResult;
use crate::store::JourneyStore;
use async_trait::async_trait;
use tracing::{debug, warn};

/// Raw cache operations plus the connection lifecycle the store manages.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Whether the underlying connection is currently usable.
    fn is_open(&self) -> bool;

    /// (Re)establish the underlying connection.
    async fn connect(&self) -> StoreResult<()>;

    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> StoreResult<()>;

    async fn del(&self, key: &str) -> StoreResult<()>;
}

/// [`JourneyStore`] that checks the backend connection before every
/// operation and reconnects only when it is not open.
pub struct CacheStore<B> {
    backend: B,
}

impl<B: CacheBackend> CacheStore<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    async fn ensure_connected(&self) -> StoreResult<()> {
        if self.backend.is_open() {
            return Ok(());
        }
        debug!("Cache connection not open, reconnecting");
        metrics::counter!("cache.reconnect").increment(1);
        self.backend.connect().await
    }
}

#[async_trait]
impl<B: CacheBackend> JourneyStore for CacheStore<B> {
    async fn get(&self, key: &str) -> Option<String> {
        let result: StoreResult<Option<String>> = async {
            self.ensure_connected().await?;
            self.backend.get(key).await
        }
        .await;

        match result {
            Ok(Some(value)) => {
                metrics::counter!("cache.hit").increment(1);
                Some(value)
            }
            Ok(None) => {
                metrics::counter!("cache.miss").increment(1);
                None
            }
            Err(e) => {
                metrics::counter!("cache.unavailable").increment(1);
                warn!(key = key, error = %e, "Cache read failed, treating as miss");
                None
            }
        }
    }

    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> StoreResult<()> {
        self.ensure_connected().await?;
        self.backend.set_ex(key, value, ttl_secs).await
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.ensure_connected().await?;
        self.backend.del(key).await
    }
}
