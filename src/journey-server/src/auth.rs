//! Development principal lookup.
//!
//! Accepts `Authorization: Bearer dev_<USERNAME>` and attaches the username
//! as the request's [`Principal`]. Production deployments put the real
//! sign-in layer in front and supply the same extension.

use axum::extract::Request;
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use journey_core::Principal;
use serde::Serialize;

const DEV_TOKEN_PREFIX: &str = "dev_";

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Extract the username from a development bearer token.
pub fn principal_from_token(token: &str) -> Option<Principal> {
    let username = token.strip_prefix(DEV_TOKEN_PREFIX)?;
    if username.is_empty() {
        return None;
    }
    Some(Principal::new(username))
}

/// Axum middleware that attaches a [`Principal`]. Skips health checks.
pub async fn principal_middleware(mut req: Request, next: Next) -> Response {
    let path = req.uri().path();
    if path.starts_with("/health") || path.starts_with("/ready") || path.starts_with("/live") {
        return next.run(req).await;
    }

    let principal = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .and_then(principal_from_token);

    match principal {
        Some(principal) => {
            req.extensions_mut().insert(principal);
            next.run(req).await
        }
        None => (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: "missing_auth".to_string(),
                message: "Authorization header with a staff bearer token required".to_string(),
            }),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_principal_from_dev_token() {
        assert_eq!(principal_from_token("dev_BLOGGSJ"), Some(Principal::new("BLOGGSJ")));
    }

    #[test]
    fn test_rejects_other_tokens() {
        assert_eq!(principal_from_token("dev_"), None);
        assert_eq!(principal_from_token("BLOGGSJ"), None);
    }
}
