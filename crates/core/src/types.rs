//! Identifiers and payload types shared by the store and the session layer.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Journey id used by journey-aware routes reached without one in the URL.
pub const DEFAULT_JOURNEY_ID: &str = "default";

/// Namespace for journey state keys in the shared cache.
pub const JOURNEY_KEY_PREFIX: &str = "journey";

/// In-progress wizard answers, conventionally namespaced by wizard name
/// (e.g. a `createJourney` object). The store enforces no schema.
pub type JourneyData = serde_json::Map<String, serde_json::Value>;

/// Identifier of one in-flight wizard run, carried as a URL path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JourneyId(Uuid);

impl JourneyId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for JourneyId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JourneyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// Storage slot of one user's journey: `journey.<username>.<journeyId|default>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JourneyKey(String);

impl JourneyKey {
    /// Build the key for `username`. A missing or empty journey id falls back
    /// to [`DEFAULT_JOURNEY_ID`].
    pub fn new(username: &str, journey_id: Option<&str>) -> Self {
        let journey_id = journey_id
            .filter(|id| !id.is_empty())
            .unwrap_or(DEFAULT_JOURNEY_ID);
        Self(format!("{JOURNEY_KEY_PREFIX}.{username}.{journey_id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JourneyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for JourneyKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The authenticated member of staff making the request. Supplied by the
/// authentication layer as a request extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub username: String,
}

impl Principal {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_key_with_explicit_journey_id() {
        let key = JourneyKey::new("BLOGGSJ", Some("J"));
        assert_eq!(key.as_str(), "journey.BLOGGSJ.J");
    }

    #[test]
    fn test_key_falls_back_to_default() {
        assert_eq!(JourneyKey::new("BLOGGSJ", None).as_str(), "journey.BLOGGSJ.default");
        assert_eq!(JourneyKey::new("BLOGGSJ", Some("")).as_str(), "journey.BLOGGSJ.default");
    }

    #[test]
    fn test_journey_id_is_hyphenated_v4() {
        let id = JourneyId::new();
        let text = id.to_string();
        assert_eq!(text.len(), 36);
        assert_eq!(id.as_uuid().get_version_num(), 4);
        assert_eq!(Uuid::parse_str(&text).unwrap(), *id.as_uuid());
    }

    #[test]
    fn test_distinct_ids_per_journey() {
        assert_ne!(JourneyId::new(), JourneyId::new());
    }
}
