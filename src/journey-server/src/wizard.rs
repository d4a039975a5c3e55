//! Sample "create appointment" wizard wired through the journey layer.
//!
//! Only enough of the wizard to carry answers across pages. Creating the
//! appointment in the downstream API happens elsewhere.

use axum::extract::Path;
use axum::response::Response;
use axum::Form;
use journey_session::{JourneySession, ResponseFinalizer};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

pub const CREATE_JOURNEY: &str = "createJourney";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJourney {
    pub appointment_type: Option<AppointmentType>,
    #[serde(default)]
    pub prisoners: Vec<String>,
    pub category_code: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentType {
    Individual,
    Group,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrisonerForm {
    pub prisoner_number: String,
}

fn step(journey_id: &str, page: &str) -> String {
    format!("/appointments/create/{journey_id}/{page}")
}

fn start(
    journey_id: &str,
    session: &JourneySession,
    appointment_type: AppointmentType,
) -> Option<String> {
    let journey = CreateJourney {
        appointment_type: Some(appointment_type),
        ..CreateJourney::default()
    };
    if let Err(e) = session.set(CREATE_JOURNEY, &journey) {
        warn!(error = %e, "Could not start create journey");
        return None;
    }
    Some(step(journey_id, "select-prisoner"))
}

/// GET /appointments/create/:journeyId/start-individual
pub async fn start_individual(
    Path(journey_id): Path<String>,
    session: JourneySession,
    finalizer: ResponseFinalizer,
) -> Response {
    let next = start(&journey_id, &session, AppointmentType::Individual)
        .unwrap_or_else(|| "/appointments".to_string());
    finalizer.redirect(&next).await
}

/// GET /appointments/create/:journeyId/start-group
pub async fn start_group(
    Path(journey_id): Path<String>,
    session: JourneySession,
    finalizer: ResponseFinalizer,
) -> Response {
    let next = start(&journey_id, &session, AppointmentType::Group)
        .unwrap_or_else(|| "/appointments".to_string());
    finalizer.redirect(&next).await
}

/// GET /appointments/create/:journeyId/select-prisoner
pub async fn select_prisoner(session: JourneySession, finalizer: ResponseFinalizer) -> Response {
    let journey = session.get::<CreateJourney>(CREATE_JOURNEY).unwrap_or_default();
    finalizer
        .render("create-and-edit/select-prisoner", json!({ "createJourney": journey }))
        .await
}

/// POST /appointments/create/:journeyId/select-prisoner
pub async fn submit_prisoner(
    Path(journey_id): Path<String>,
    session: JourneySession,
    finalizer: ResponseFinalizer,
    Form(form): Form<PrisonerForm>,
) -> Response {
    let prisoner_number = form.prisoner_number.trim().to_uppercase();
    if prisoner_number.is_empty() {
        return finalizer.redirect(&step(&journey_id, "select-prisoner")).await;
    }

    let mut journey = session.get::<CreateJourney>(CREATE_JOURNEY).unwrap_or_default();
    if journey.appointment_type != Some(AppointmentType::Group) {
        journey.prisoners.clear();
    }
    if !journey.prisoners.contains(&prisoner_number) {
        journey.prisoners.push(prisoner_number);
    }
    if let Err(e) = session.set(CREATE_JOURNEY, &journey) {
        warn!(error = %e, "Could not record prisoner");
    }

    finalizer.redirect(&step(&journey_id, "check-answers")).await
}

/// GET /appointments/create/:journeyId/check-answers
pub async fn check_answers(session: JourneySession, finalizer: ResponseFinalizer) -> Response {
    let journey = session.get::<CreateJourney>(CREATE_JOURNEY).unwrap_or_default();
    finalizer
        .render("create-and-edit/check-answers", json!({ "createJourney": journey }))
        .await
}
