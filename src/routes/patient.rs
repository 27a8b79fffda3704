//! Patient pages.

use axum::extract::State;
use axum::response::Html;

use super::auth::PatientSession;
use crate::pages;
use crate::services::patient as patient_svc;
use crate::state::AppState;

/// `GET /patient/dashboard`: welcome line and linked doctors.
pub async fn dashboard(State(state): State<AppState>, session: PatientSession) -> Html<String> {
    let doctors = patient_svc::linked_doctors(state.backend.as_ref(), session.token(), session.patient.patient_id)
        .await
        .unwrap_or_else(|e| {
            tracing::error!(patient_id = %session.patient.patient_id, error = %e, "linked doctors fetch failed");
            Vec::new()
        });
    Html(pages::patient_dashboard(&session.patient, &doctors))
}
