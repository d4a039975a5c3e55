//! TTL-bound key/value contract over the shared cache.

use crate::error::StoreResult;
use crate::signal::WriteSignal;
use async_trait::async_trait;

/// A shared, expiring string store. Keys are opaque: the same store holds
/// journey state and cached system tokens under different prefixes.
#[async_trait]
pub trait JourneyStore: Send + Sync {
    /// Returns the stored value, or `None` when it is missing, expired or the
    /// cache cannot be reached. Never fails.
    async fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`, expiring after `ttl_secs`.
    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> StoreResult<()>;

    async fn delete(&self, key: &str) -> StoreResult<()>;

    /// [`set`](Self::set), then notify `signal` for `key` whatever the
    /// outcome. The signal is consumed, so it fires at most once.
    async fn set_and_signal(
        &self,
        key: &str,
        value: &str,
        ttl_secs: u64,
        signal: WriteSignal,
    ) -> StoreResult<()> {
        let result = self.set(key, value, ttl_secs).await;
        signal.notify(key);
        result
    }
}
