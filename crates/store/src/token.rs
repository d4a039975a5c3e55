//! Cache of OAuth system tokens, kept in the journey store under their own
//! key namespace.

use crate::error::StoreResult;
use crate::store::JourneyStore;
use std::sync::Arc;

pub const SYSTEM_TOKEN_PREFIX: &str = "systemToken:";

#[derive(Clone)]
pub struct SystemTokenCache {
    store: Arc<dyn JourneyStore>,
}

impl SystemTokenCache {
    pub fn new(store: Arc<dyn JourneyStore>) -> Self {
        Self { store }
    }

    fn key(key: &str) -> String {
        format!("{SYSTEM_TOKEN_PREFIX}{key}")
    }

    /// Cached token for `key`, if one is still live.
    pub async fn get_token(&self, key: &str) -> Option<String> {
        self.store.get(&Self::key(key)).await
    }

    /// Cache `token` for `ttl_secs`, normally a little under its lifetime.
    pub async fn set_token(&self, key: &str, token: &str, ttl_secs: u64) -> StoreResult<()> {
        self.store.set(&Self::key(key), token, ttl_secs).await
    }

    pub async fn remove_token(&self, key: &str) -> StoreResult<()> {
        self.store.delete(&Self::key(key)).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::backend::CacheStore;
    use crate::local::LocalBackend;

    #[tokio::test]
    async fn test_tokens_are_prefixed() {
        let store = Arc::new(CacheStore::new(LocalBackend::new()));
        let tokens = SystemTokenCache::new(store.clone());
        tokens.set_token("%ANONYMOUS%", "abc.def", 3300).await.unwrap();

        assert_eq!(tokens.get_token("%ANONYMOUS%").await.as_deref(), Some("abc.def"));
        assert_eq!(store.get("systemToken:%ANONYMOUS%").await.as_deref(), Some("abc.def"));
        assert_eq!(store.get("%ANONYMOUS%").await, None);
    }

    #[tokio::test]
    async fn test_remove_token() {
        let tokens = SystemTokenCache::new(Arc::new(CacheStore::new(LocalBackend::new())));
        tokens.set_token("BLOGGSJ", "t", 60).await.unwrap();
        tokens.remove_token("BLOGGSJ").await.unwrap();
        assert_eq!(tokens.get_token("BLOGGSJ").await, None);
    }
}
