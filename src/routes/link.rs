//! Directory linking page: pick any doctor and any patient and link them.

use axum::Form;
use axum::extract::{Query, State};
use axum::response::{Html, Redirect};
use serde::Deserialize;
use uuid::Uuid;

use super::StatusQuery;
use super::auth::DoctorSession;
use crate::pages::{self, Notice};
use crate::services::{doctor as doctor_svc, link as link_svc};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct DirectoryQuery {
    /// Kept as text so an empty or stale selection renders the page
    /// instead of failing extraction.
    pub doctor_id: Option<String>,
    pub status: Option<String>,
}

/// `GET /link`: doctor and patient selects; `?doctor_id=` also lists that
/// doctor's linked patients.
pub async fn directory(
    State(state): State<AppState>,
    session: DoctorSession,
    Query(query): Query<DirectoryQuery>,
) -> Html<String> {
    let backend = state.backend.as_ref();
    let selected: Option<Uuid> = query.doctor_id.as_deref().and_then(|id| id.parse().ok());

    let directory = link_svc::directory(backend, session.token())
        .await
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "directory fetch failed");
            link_svc::Directory::default()
        });
    let selected_patients = match selected {
        Some(doctor_id) => doctor_svc::linked_patients(backend, session.token(), doctor_id)
            .await
            .unwrap_or_else(|e| {
                tracing::error!(%doctor_id, error = %e, "linked patients fetch failed");
                Vec::new()
            }),
        None => Vec::new(),
    };

    let notice = StatusQuery { status: query.status }.notice();
    Html(pages::link_directory(&directory, selected, &selected_patients, notice))
}

#[derive(Debug, Deserialize)]
pub struct LinkPairForm {
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
}

/// `POST /link`: link the selected pair, then show that doctor's patients.
pub async fn link(State(state): State<AppState>, session: DoctorSession, Form(form): Form<LinkPairForm>) -> Redirect {
    let LinkPairForm { doctor_id, patient_id } = form;
    let notice = match link_svc::link_patient(state.backend.as_ref(), session.token(), doctor_id, patient_id).await {
        Ok(()) => Notice::Linked,
        Err(e) => {
            tracing::error!(%doctor_id, %patient_id, error = %e, "directory link failed");
            Notice::LinkFailed
        }
    };
    Redirect::to(&notice.redirect_target(&format!("/link?doctor_id={doctor_id}")))
}
