//! Doctor pages: dashboard, uploads, linked patients, profile.

use axum::Form;
use axum::extract::{Multipart, Path, Query, State};
use axum::response::{Html, Redirect};
use serde::Deserialize;
use uuid::Uuid;

use super::StatusQuery;
use super::auth::DoctorSession;
use crate::pages::{self, Notice};
use crate::services::pdf::{self, PdfError};
use crate::services::{doctor as doctor_svc, link as link_svc};
use crate::state::AppState;

const DASHBOARD: &str = "/doctor/dashboard";
const LINKED_PATIENTS: &str = "/doctor/dashboard/linked-patients";

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    #[serde(default)]
    pub q: String,
    pub status: Option<String>,
}

/// `GET /doctor/dashboard`: upload form, patient search, linked patients.
pub async fn dashboard(
    State(state): State<AppState>,
    session: DoctorSession,
    Query(query): Query<DashboardQuery>,
) -> Html<String> {
    let backend = state.backend.as_ref();
    let (results, linked) = tokio::join!(
        link_svc::search_patients(backend, session.token(), &query.q),
        doctor_svc::linked_patients(backend, session.token(), session.doctor.doctor_id),
    );
    let results = results.unwrap_or_else(|e| {
        tracing::error!(error = %e, "patient search failed");
        Vec::new()
    });
    let linked = linked.unwrap_or_else(|e| {
        tracing::error!(error = %e, "linked patients fetch failed");
        Vec::new()
    });

    let notice = StatusQuery { status: query.status }.notice();
    Html(pages::doctor_dashboard(&session.doctor, &query.q, &results, &linked, notice))
}

/// `POST /doctor/dashboard/upload`: store the first file field as a PDF.
pub async fn upload(State(state): State<AppState>, session: DoctorSession, mut multipart: Multipart) -> Redirect {
    let backend = state.backend.as_ref();

    let file = loop {
        match multipart.next_field().await {
            Ok(Some(field)) if field.file_name().is_some() => {
                let name = field.file_name().unwrap_or_default().to_owned();
                let content_type = field.content_type().unwrap_or("application/pdf").to_owned();
                match field.bytes().await {
                    Ok(bytes) => break Some((name, content_type, bytes.to_vec())),
                    Err(e) => {
                        tracing::warn!(error = %e, "multipart body read failed");
                        return Redirect::to(&Notice::UploadFailed.redirect_target(DASHBOARD));
                    }
                }
            }
            Ok(Some(_)) => {}
            Ok(None) => break None,
            Err(e) => {
                tracing::warn!(error = %e, "multipart parse failed");
                return Redirect::to(&Notice::UploadFailed.redirect_target(DASHBOARD));
            }
        }
    };
    let Some((name, content_type, bytes)) = file else {
        return Redirect::to(&Notice::NoFile.redirect_target(DASHBOARD));
    };

    let doctor = match doctor_svc::doctor_for_user(backend, session.token(), session.caller.user.id).await {
        Ok(doctor) => doctor,
        Err(e) => {
            tracing::error!(error = %e, "upload refused: doctor row lookup failed");
            return Redirect::to(&Notice::UploadFailed.redirect_target(DASHBOARD));
        }
    };

    let notice = match pdf::upload_pdf(backend, session.token(), doctor.doctor_id, &name, &content_type, bytes).await {
        Ok(_) => Notice::Uploaded,
        Err(PdfError::NoFile) => Notice::NoFile,
        Err(e) => {
            tracing::error!(doctor_id = %doctor.doctor_id, error = %e, "pdf upload failed");
            Notice::UploadFailed
        }
    };
    Redirect::to(&notice.redirect_target(DASHBOARD))
}

#[derive(Debug, Deserialize)]
pub struct LinkForm {
    pub patient_id: Uuid,
}

/// `POST /doctor/dashboard/link`: link a search result to this doctor.
pub async fn link(State(state): State<AppState>, session: DoctorSession, Form(form): Form<LinkForm>) -> Redirect {
    let doctor_id = session.doctor.doctor_id;
    let notice = match link_svc::link_patient(state.backend.as_ref(), session.token(), doctor_id, form.patient_id).await {
        Ok(()) => Notice::Linked,
        Err(e) => {
            tracing::error!(%doctor_id, patient_id = %form.patient_id, error = %e, "link failed");
            Notice::LinkFailed
        }
    };
    Redirect::to(&notice.redirect_target(DASHBOARD))
}

/// `GET /doctor/dashboard/uploaded-pdf`: this doctor's PDFs with signed links.
pub async fn uploaded_pdfs(State(state): State<AppState>, session: DoctorSession) -> Html<String> {
    let listings = pdf::list_pdfs(
        state.backend.as_ref(),
        session.token(),
        session.doctor.doctor_id,
        state.settings.pdf_url_ttl_secs,
    )
    .await
    .unwrap_or_else(|e| {
        tracing::error!(error = %e, "pdf list failed");
        Vec::new()
    });
    Html(pages::uploaded_pdfs(&listings))
}

/// `GET /doctor/dashboard/linked-patients`: linked patients with delete buttons.
pub async fn linked_patients(
    State(state): State<AppState>,
    session: DoctorSession,
    Query(query): Query<StatusQuery>,
) -> Html<String> {
    let patients = doctor_svc::linked_patients(state.backend.as_ref(), session.token(), session.doctor.doctor_id)
        .await
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "linked patients fetch failed");
            Vec::new()
        });
    Html(pages::linked_patients(&patients, query.notice()))
}

/// `POST /doctor/dashboard/linked-patients/{patient_id}/delete`
pub async fn unlink(State(state): State<AppState>, session: DoctorSession, Path(patient_id): Path<Uuid>) -> Redirect {
    let doctor_id = session.doctor.doctor_id;
    let notice = match doctor_svc::unlink_patient(state.backend.as_ref(), session.token(), doctor_id, patient_id).await {
        Ok(()) => Notice::Unlinked,
        Err(e) => {
            tracing::error!(%doctor_id, %patient_id, error = %e, "unlink failed");
            Notice::UnlinkFailed
        }
    };
    Redirect::to(&notice.redirect_target(LINKED_PATIENTS))
}

/// `GET /profile`: the doctor's own details and linked patients.
pub async fn profile(State(state): State<AppState>, session: DoctorSession) -> Html<String> {
    let backend = state.backend.as_ref();
    let doctor = match doctor_svc::doctor_for_user(backend, session.token(), session.caller.user.id).await {
        Ok(doctor) => doctor,
        Err(e) => {
            tracing::error!(error = %e, "profile doctor lookup failed");
            return Html(pages::profile(&session.doctor, None));
        }
    };

    match doctor_svc::linked_patients(backend, session.token(), doctor.doctor_id).await {
        Ok(patients) => Html(pages::profile(&doctor, Some(patients.as_slice()))),
        Err(e) => {
            tracing::error!(error = %e, "profile linked patients fetch failed");
            Html(pages::profile(&doctor, None))
        }
    }
}
