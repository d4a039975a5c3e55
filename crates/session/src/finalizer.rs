//! The two ways a journey-aware handler finishes a request.
//!
//! Handlers return `finalizer.redirect(..)` or `finalizer.render(..)` instead
//! of building the response themselves. When the request carries journey
//! state it is written to the store first, and the response is only produced
//! once that write has completed or the write timeout has elapsed. Both
//! methods take `self`, so a request is flushed at most once.

use crate::session::{FlushOutcome, JourneySession};
use crate::views::Views;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use serde_json::Value;
use std::convert::Infallible;
use tracing::{debug, error};

pub struct ResponseFinalizer {
    session: Option<JourneySession>,
    views: Option<Views>,
}

impl ResponseFinalizer {
    pub fn new(session: Option<JourneySession>, views: Option<Views>) -> Self {
        Self { session, views }
    }

    /// Journey state this finalizer will persist, if any.
    pub fn session(&self) -> Option<&JourneySession> {
        self.session.as_ref()
    }

    /// Forget the journey state so nothing is written for this request.
    pub fn clear(&self) {
        if let Some(session) = &self.session {
            session.clear();
        }
    }

    /// Persist journey state, then redirect to `uri`.
    pub async fn redirect(self, uri: &str) -> Response {
        self.flush_journey_data().await;
        Redirect::to(uri).into_response()
    }

    /// Persist journey state, then render `view` with `data`.
    pub async fn render(self, view: &str, data: Value) -> Response {
        self.flush_journey_data().await;
        match &self.views {
            Some(Views(renderer)) => renderer.render(view, &data),
            None => {
                error!(view = view, "No view renderer configured");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }

    async fn flush_journey_data(&self) -> FlushOutcome {
        match &self.session {
            Some(session) => session.flush().await,
            None => {
                debug!("No journey data on request, nothing to save");
                FlushOutcome::NothingToSave
            }
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for ResponseFinalizer
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::new(
            parts.extensions.get::<JourneySession>().cloned(),
            parts.extensions.get::<Views>().cloned(),
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::session::FlushPolicy;
    use crate::views::JsonViews;
    use axum::http::header::LOCATION;
    use journey_core::JourneyKey;
    use journey_store::{CacheStore, JourneyStore, LocalBackend};
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn session(store: Arc<dyn JourneyStore>) -> JourneySession {
        let data = json!({"createJourney": {"activityId": 123}});
        JourneySession::new(
            JourneyKey::new("BLOGGSJ", Some("J")),
            data.as_object().cloned().unwrap(),
            store,
            FlushPolicy {
                ttl_secs: 60,
                write_timeout: Duration::from_secs(1),
            },
        )
    }

    #[tokio::test]
    async fn test_redirect_without_journey_state() {
        let response = ResponseFinalizer::new(None, None)
            .redirect("/next-location")
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[LOCATION], "/next-location");
    }

    #[tokio::test]
    async fn test_render_flushes_before_responding() {
        let store = Arc::new(CacheStore::new(LocalBackend::new()));
        let finalizer = ResponseFinalizer::new(Some(session(store.clone())), Some(Views::new(JsonViews)));

        let response = finalizer.render("create/name", json!({"title": "Name"})).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(store.get("journey.BLOGGSJ.J").await.is_some());
    }

    #[tokio::test]
    async fn test_render_without_renderer_is_server_error() {
        let response = ResponseFinalizer::new(None, None)
            .render("create/name", json!({}))
            .await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_clear_skips_write() {
        let store = Arc::new(CacheStore::new(LocalBackend::new()));
        let finalizer = ResponseFinalizer::new(Some(session(store.clone())), None);
        finalizer.clear();

        let response = finalizer.redirect("/appointments").await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(store.get("journey.BLOGGSJ.J").await, None);
    }
}
