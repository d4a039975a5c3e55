//! In-memory journey state for one request, and the write that persists it.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use journey_core::config::JourneyConfig;
use journey_core::{JourneyData, JourneyKey};
use journey_store::signal::{self, SignalOutcome};
use journey_store::JourneyStore;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// How journey state is written back at the end of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlushPolicy {
    pub ttl_secs: u64,
    /// The response proceeds after this long even if the write has not landed.
    pub write_timeout: Duration,
}

impl From<&JourneyConfig> for FlushPolicy {
    fn from(config: &JourneyConfig) -> Self {
        Self {
            ttl_secs: config.ttl_secs(),
            write_timeout: Duration::from_millis(config.write_timeout_ms),
        }
    }
}

/// Result of writing journey state back to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlushOutcome {
    /// There was no journey state on the request.
    NothingToSave,
    /// The write completed before the response was released.
    Flushed,
    /// The write did not complete within the policy timeout.
    TimedOut,
    /// The write task ended without signalling.
    Abandoned,
}

/// Mutable journey state attached to a request by the loader. Clones share
/// the same state.
#[derive(Clone)]
pub struct JourneySession {
    key: JourneyKey,
    data: Arc<Mutex<Option<JourneyData>>>,
    store: Arc<dyn JourneyStore>,
    policy: FlushPolicy,
}

impl std::fmt::Debug for JourneySession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JourneySession")
            .field("key", &self.key)
            .field("active", &self.is_active())
            .finish()
    }
}

impl JourneySession {
    pub fn new(
        key: JourneyKey,
        data: JourneyData,
        store: Arc<dyn JourneyStore>,
        policy: FlushPolicy,
    ) -> Self {
        Self {
            key,
            data: Arc::new(Mutex::new(Some(data))),
            store,
            policy,
        }
    }

    pub fn key(&self) -> &JourneyKey {
        &self.key
    }

    /// Whether the request still carries journey state to persist.
    pub fn is_active(&self) -> bool {
        self.data.lock().is_some()
    }

    /// A copy of the current state, or `None` once cleared.
    pub fn snapshot(&self) -> Option<JourneyData> {
        self.data.lock().clone()
    }

    /// Mutate the state in place. A cleared session starts again from empty.
    pub fn update<R>(&self, f: impl FnOnce(&mut JourneyData) -> R) -> R {
        let mut guard = self.data.lock();
        f(guard.get_or_insert_with(JourneyData::new))
    }

    /// Deserialize the wizard namespace `name` (e.g. `createJourney`).
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        let guard = self.data.lock();
        let value = guard.as_ref()?.get(name)?.clone();
        match serde_json::from_value(value) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!(key = %self.key, namespace = name, error = %e, "Journey namespace does not match expected shape");
                None
            }
        }
    }

    /// Replace the wizard namespace `name` with `value`.
    pub fn set<T: Serialize>(&self, name: &str, value: &T) -> serde_json::Result<()> {
        let value = serde_json::to_value(value)?;
        self.update(|data| {
            data.insert(name.to_string(), value);
        });
        Ok(())
    }

    /// Drop the state so that nothing is written at the end of the request.
    /// The stored copy is left to expire.
    pub fn clear(&self) {
        *self.data.lock() = None;
    }

    /// Delete the stored copy now and drop the in-memory state.
    pub async fn discard(&self) -> journey_store::StoreResult<()> {
        self.clear();
        self.store.delete(self.key.as_str()).await
    }

    /// Write the state to the store and wait, bounded by the policy timeout,
    /// for the write to complete.
    ///
    /// The write is driven by the caller and dropped when the timeout
    /// elapses, so a stalled write cannot land after a later flush of the
    /// same journey.
    pub async fn flush(&self) -> FlushOutcome {
        let Some(data) = self.snapshot() else {
            debug!(key = %self.key, "Journey cleared, nothing to save");
            metrics::counter!("journey.flush.skipped").increment(1);
            return FlushOutcome::NothingToSave;
        };
        let json = match serde_json::to_string(&data) {
            Ok(json) => json,
            Err(e) => {
                warn!(key = %self.key, error = %e, "Journey data could not be serialized");
                return FlushOutcome::Abandoned;
            }
        };

        let started = Instant::now();
        let payload_bytes = json.len();
        let key = self.key.to_string();
        let timeout = self.policy.write_timeout;
        let (write_signal, listener) = signal::channel();

        let write = async {
            match self
                .store
                .set_and_signal(&key, &json, self.policy.ttl_secs, write_signal)
                .await
            {
                Ok(()) => metrics::counter!("journey.flush.ok").increment(1),
                Err(e) => {
                    metrics::counter!("journey.flush.failed").increment(1);
                    warn!(key = %key, error = %e, "Failed to save journey data");
                }
            }
        };
        let (written, signalled) = tokio::join!(
            tokio::time::timeout(timeout, write),
            listener.wait_for(&key, timeout)
        );
        let outcome = match written {
            Ok(()) => signalled,
            Err(_) => SignalOutcome::TimedOut,
        };

        match outcome {
            SignalOutcome::Signalled => {
                info!(
                    key = %key,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    payload_bytes = payload_bytes,
                    "Journey data flushed"
                );
                FlushOutcome::Flushed
            }
            SignalOutcome::TimedOut => {
                metrics::counter!("journey.flush.timeout").increment(1);
                warn!(
                    key = %key,
                    timeout_ms = timeout.as_millis() as u64,
                    payload_bytes = payload_bytes,
                    "Journey data write timed out and was cancelled, responding without it"
                );
                FlushOutcome::TimedOut
            }
            SignalOutcome::Abandoned => {
                warn!(key = %key, "Journey data write ended without signalling");
                FlushOutcome::Abandoned
            }
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for JourneySession
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<JourneySession>().cloned().ok_or((
            StatusCode::INTERNAL_SERVER_ERROR,
            "journey state is not loaded for this route",
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use journey_store::{CacheStore, LocalBackend, StoreResult};
    use serde::Deserialize;
    use serde_json::json;

    const POLICY: FlushPolicy = FlushPolicy {
        ttl_secs: 8 * 3600,
        write_timeout: Duration::from_secs(3),
    };

    /// Store whose writes never complete.
    struct HangingStore;

    #[async_trait]
    impl JourneyStore for HangingStore {
        async fn get(&self, _key: &str) -> Option<String> {
            None
        }

        async fn set(&self, _key: &str, _value: &str, _ttl_secs: u64) -> StoreResult<()> {
            std::future::pending().await
        }

        async fn delete(&self, _key: &str) -> StoreResult<()> {
            Ok(())
        }
    }

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    #[serde(rename_all = "camelCase")]
    struct CreateJourney {
        activity_id: u64,
    }

    fn session_with(store: Arc<dyn JourneyStore>, data: serde_json::Value) -> JourneySession {
        let data = data.as_object().cloned().unwrap();
        JourneySession::new(JourneyKey::new("BLOGGSJ", Some("J")), data, store, POLICY)
    }

    fn local_store() -> Arc<CacheStore<LocalBackend>> {
        Arc::new(CacheStore::new(LocalBackend::new()))
    }

    #[tokio::test]
    async fn test_typed_namespace_access() {
        let session = session_with(local_store(), json!({}));
        assert_eq!(session.get::<CreateJourney>("createJourney"), None);

        session
            .set("createJourney", &CreateJourney { activity_id: 123 })
            .unwrap();
        assert_eq!(
            session.get::<CreateJourney>("createJourney"),
            Some(CreateJourney { activity_id: 123 })
        );
        assert_eq!(
            serde_json::Value::Object(session.snapshot().unwrap()),
            json!({"createJourney": {"activityId": 123}})
        );
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let session = session_with(local_store(), json!({}));
        let other = session.clone();
        other.update(|data| {
            data.insert("editJourney".into(), json!({"step": 2}));
        });
        assert!(session.snapshot().unwrap().contains_key("editJourney"));
    }

    #[tokio::test]
    async fn test_flush_writes_state() {
        let store = local_store();
        let session = session_with(store.clone(), json!({"createJourney": {"activityId": 123}}));

        assert_eq!(session.flush().await, FlushOutcome::Flushed);
        assert_eq!(
            store.get("journey.BLOGGSJ.J").await.as_deref(),
            Some(r#"{"createJourney":{"activityId":123}}"#)
        );
    }

    #[tokio::test]
    async fn test_cleared_session_writes_nothing() {
        let store = local_store();
        let session = session_with(store.clone(), json!({"createJourney": {}}));
        session.clear();

        assert!(!session.is_active());
        assert_eq!(session.flush().await, FlushOutcome::NothingToSave);
        assert_eq!(store.get("journey.BLOGGSJ.J").await, None);
    }

    #[tokio::test]
    async fn test_update_after_clear_starts_empty() {
        let session = session_with(local_store(), json!({"createJourney": {}}));
        session.clear();
        session.update(|data| {
            data.insert("allocateJourney".into(), json!(true));
        });
        let data = session.snapshot().unwrap();
        assert_eq!(data.len(), 1);
        assert!(data.contains_key("allocateJourney"));
    }

    #[tokio::test]
    async fn test_discard_deletes_stored_copy() {
        let store = local_store();
        store.set("journey.BLOGGSJ.J", "{}", 60).await.unwrap();
        let session = session_with(store.clone(), json!({}));

        session.discard().await.unwrap();
        assert_eq!(store.get("journey.BLOGGSJ.J").await, None);
        assert!(!session.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_write_is_bounded() {
        let session = session_with(Arc::new(HangingStore), json!({"createJourney": {}}));
        let started = tokio::time::Instant::now();
        assert_eq!(session.flush().await, FlushOutcome::TimedOut);
        assert!(started.elapsed() >= POLICY.write_timeout);
    }

    #[test]
    fn test_policy_from_config() {
        let policy = FlushPolicy::from(&JourneyConfig::default());
        assert_eq!(policy.ttl_secs, 28_800);
        assert_eq!(policy.write_timeout, Duration::from_millis(3000));
    }
}
