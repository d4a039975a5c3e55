//! Start a journey by minting its id into the URL.

use axum::extract::{OriginalUri, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use journey_core::JourneyId;
use tracing::{debug, warn};

/// Insert a fresh v4 UUID path segment after the first occurrence of
/// `marker` in `original_url`.
///
/// A missing or empty marker, or one that does not occur in the URL, leaves
/// the URL unchanged.
pub fn start_new_journey(marker: Option<&str>, original_url: &str) -> String {
    match marker {
        Some(marker) if !marker.is_empty() && original_url.contains(marker) => {
            let replacement = format!("{marker}{}/", JourneyId::new());
            original_url.replacen(marker, &replacement, 1)
        }
        _ => original_url.to_string(),
    }
}

/// Middleware state for routes that begin a journey.
#[derive(Debug, Clone)]
pub struct JourneyBootstrap {
    marker: String,
}

impl JourneyBootstrap {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }
}

/// Redirect the client to the same URL with a new journey id inserted.
/// Requests whose URL does not contain the marker continue to the handler,
/// with a warning since the route is then misconfigured.
pub async fn bootstrap_journey(
    State(bootstrap): State<JourneyBootstrap>,
    req: Request,
    next: Next,
) -> Response {
    let uri = req
        .extensions()
        .get::<OriginalUri>()
        .map(|original| original.0.clone())
        .unwrap_or_else(|| req.uri().clone());
    let original_url = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());

    let target = start_new_journey(Some(bootstrap.marker()), original_url);
    if target == original_url {
        warn!(
            url = original_url,
            marker = bootstrap.marker(),
            "Journey start route does not contain the bootstrap marker, no journey started"
        );
        return next.run(req).await;
    }

    debug!(from = original_url, to = %target, "Starting new journey");
    Redirect::to(&target).into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use regex::Regex;
    use uuid::Uuid;

    const URL: &str = "/appointments/create/start-group";

    #[test]
    fn test_inserts_id_after_marker() {
        let result = start_new_journey(Some("/create/"), URL);
        let pattern = Regex::new(r"^/appointments/create/[0-9a-f-]{36}/start-group$").unwrap();
        assert!(pattern.is_match(&result), "unexpected url {result}");
    }

    #[test]
    fn test_root_marker_prefixes_id() {
        let result = start_new_journey(Some("/"), URL);
        let pattern = Regex::new(r"^/[0-9a-f-]{36}/appointments/create/start-group$").unwrap();
        assert!(pattern.is_match(&result), "unexpected url {result}");
    }

    #[test]
    fn test_inserted_segment_is_v4_uuid() {
        let result = start_new_journey(Some("/create/"), URL);
        let segment = result.split('/').nth(3).unwrap();
        let id = Uuid::parse_str(segment).unwrap();
        assert_eq!(id.get_version_num(), 4);
    }

    #[test]
    fn test_absent_marker_leaves_url_unchanged() {
        assert_eq!(start_new_journey(Some("/not-create/"), URL), URL);
    }

    #[test]
    fn test_missing_or_empty_marker_leaves_url_unchanged() {
        assert_eq!(start_new_journey(None, URL), URL);
        assert_eq!(start_new_journey(Some(""), URL), URL);
    }

    #[test]
    fn test_only_first_occurrence_is_replaced() {
        let url = "/a/create/b/create/c";
        let result = start_new_journey(Some("/create/"), url);
        let pattern = Regex::new(r"^/a/create/[0-9a-f-]{36}/b/create/c$").unwrap();
        assert!(pattern.is_match(&result), "unexpected url {result}");
    }

    #[test]
    fn test_query_string_is_preserved() {
        let result = start_new_journey(Some("/create/"), "/appointments/create/start-group?preserveHistory=true");
        assert!(result.ends_with("/start-group?preserveHistory=true"));
    }

    #[test]
    fn test_each_call_mints_a_new_id() {
        let first = start_new_journey(Some("/create/"), URL);
        let second = start_new_journey(Some("/create/"), URL);
        assert_ne!(first, second);
    }
}
