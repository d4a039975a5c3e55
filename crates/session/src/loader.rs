//! Middleware that loads the journey state for the current user and journey.

use crate::session::{FlushPolicy, JourneySession};
use axum::extract::rejection::RawPathParamsRejection;
use axum::extract::{FromRequestParts, RawPathParams, Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use journey_core::config::JourneyConfig;
use journey_core::{JourneyData, JourneyKey, Principal};
use journey_store::JourneyStore;
use std::sync::Arc;
use tracing::{debug, warn};

/// Route parameter that carries the journey id.
pub const JOURNEY_ID_PARAM: &str = "journeyId";

/// Shared state for [`load_journey`].
#[derive(Clone)]
pub struct JourneyLoader {
    store: Arc<dyn JourneyStore>,
    policy: FlushPolicy,
}

impl JourneyLoader {
    pub fn new(store: Arc<dyn JourneyStore>, config: &JourneyConfig) -> Self {
        Self::with_policy(store, FlushPolicy::from(config))
    }

    pub fn with_policy(store: Arc<dyn JourneyStore>, policy: FlushPolicy) -> Self {
        Self { store, policy }
    }

    /// Read and parse the stored state for `key`. Anything unreadable starts
    /// the journey over with empty state.
    pub async fn load(&self, key: &JourneyKey) -> JourneyData {
        let Some(raw) = self.store.get(key.as_str()).await else {
            debug!(key = %key, "No stored journey data");
            return JourneyData::new();
        };
        match serde_json::from_str::<JourneyData>(&raw) {
            Ok(data) => data,
            Err(e) => {
                warn!(key = %key, error = %e, "Stored journey data is malformed, starting over");
                JourneyData::new()
            }
        }
    }

    pub fn session(&self, key: JourneyKey, data: JourneyData) -> JourneySession {
        JourneySession::new(key, data, self.store.clone(), self.policy)
    }
}

/// Attach a [`JourneySession`] to the request.
///
/// Must be installed with `route_layer` so that the matched path parameters
/// are visible. Requires a [`Principal`] extension from the authentication
/// layer. Routes without a `journeyId` parameter use the `default` journey;
/// a journey id that cannot be decoded is rejected with `400`.
pub async fn load_journey(
    State(loader): State<JourneyLoader>,
    req: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = req.into_parts();

    let Some(principal) = parts.extensions.get::<Principal>().cloned() else {
        warn!(path = %parts.uri.path(), "Journey route reached without an authenticated user");
        return StatusCode::UNAUTHORIZED.into_response();
    };

    let journey_id = match RawPathParams::from_request_parts(&mut parts, &()).await {
        Ok(params) => params
            .iter()
            .find(|(name, _)| *name == JOURNEY_ID_PARAM)
            .map(|(_, value)| value.to_string()),
        Err(RawPathParamsRejection::MissingPathParams(_)) => None,
        Err(e) => {
            warn!(path = %parts.uri.path(), error = %e, "Journey id in path could not be decoded");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    let key = JourneyKey::new(&principal.username, journey_id.as_deref());
    let data = loader.load(&key).await;
    debug!(key = %key, entries = data.len(), "Journey data loaded");

    parts.extensions.insert(loader.session(key, data));
    next.run(Request::from_parts(parts, body)).await
}
