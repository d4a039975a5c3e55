//! Seam to the template layer that turns a view name and model into a page.

use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use std::sync::Arc;

/// Renders a named view with its model.
pub trait ViewRenderer: Send + Sync {
    fn render(&self, view: &str, data: &Value) -> Response;
}

/// Request extension holding the renderer used by
/// [`ResponseFinalizer::render`](crate::ResponseFinalizer::render).
#[derive(Clone)]
pub struct Views(pub Arc<dyn ViewRenderer>);

impl Views {
    pub fn new(renderer: impl ViewRenderer + 'static) -> Self {
        Self(Arc::new(renderer))
    }
}

/// Renders every view as a JSON document naming the view and its model.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonViews;

impl ViewRenderer for JsonViews {
    fn render(&self, view: &str, data: &Value) -> Response {
        Json(json!({ "view": view, "data": data })).into_response()
    }
}
