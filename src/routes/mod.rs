//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every page is server-rendered HTML. Role-gated pages take a
//! [`auth::DoctorSession`] or [`auth::PatientSession`] extractor, which
//! runs the guard and redirects to `/` on any rejection. Form posts answer
//! with a 303 redirect carrying a `status` code that the next page turns
//! into a notice.

pub mod auth;
pub mod doctor;
pub mod link;
pub mod patient;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::routing::{get, post};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::pages::Notice;
use crate::state::AppState;

/// Largest accepted PDF upload request.
const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// `?status=` carried across a post/redirect/get.
#[derive(Debug, Default, Deserialize)]
pub struct StatusQuery {
    pub status: Option<String>,
}

impl StatusQuery {
    #[must_use]
    pub fn notice(&self) -> Option<Notice> {
        self.status.as_deref().and_then(Notice::from_code)
    }
}

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(auth::landing))
        .route("/auth/login", post(auth::login))
        .route("/auth/signup", post(auth::signup))
        .route("/auth/logout", post(auth::logout))
        .route("/doctor/dashboard", get(doctor::dashboard))
        .route(
            "/doctor/dashboard/upload",
            post(doctor::upload).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/doctor/dashboard/link", post(doctor::link))
        .route("/doctor/dashboard/uploaded-pdf", get(doctor::uploaded_pdfs))
        .route("/doctor/dashboard/linked-patients", get(doctor::linked_patients))
        .route(
            "/doctor/dashboard/linked-patients/{patient_id}/delete",
            post(doctor::unlink),
        )
        .route("/patient/dashboard", get(patient::dashboard))
        .route("/link", get(link::directory).post(link::link))
        .route("/profile", get(doctor::profile))
        .route("/api/me", get(auth::me))
        .route("/healthz", get(healthz))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "router_test.rs"]
mod tests;
