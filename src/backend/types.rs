//! Backend types: row models, auth payloads, errors, and the `Backend` trait.
//!
//! Row models mirror the hosted tables column for column so they can be
//! deserialized straight out of the row API. Insert shapes are separate
//! structs because the backend assigns the primary keys.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::query::Query;

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by backend client operations.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// A configuration value could not be parsed.
    #[error("config parse failed: {0}")]
    ConfigParse(String),

    /// A required environment variable is not set.
    #[error("missing config: env var {var} not set")]
    MissingEnv { var: String },

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),

    /// The HTTP request to the backend failed before a response arrived.
    #[error("backend request failed: {0}")]
    Request(String),

    /// The backend returned a non-success HTTP status.
    #[error("backend response error: status {status}: {body}")]
    Response { status: u16, body: String },

    /// The backend response body could not be deserialized.
    #[error("backend response parse failed: {0}")]
    Parse(String),

    /// Email/password pair rejected by the auth service.
    #[error("invalid login credentials")]
    InvalidCredentials,

    /// The resource already exists (duplicate account or storage object).
    #[error("already exists: {0}")]
    Conflict(String),

    /// The addressed resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),
}

impl BackendError {
    /// Transport failures and 429/5xx responses. Informational: nothing in
    /// the app retries, but the flag is logged alongside the error.
    #[must_use]
    pub fn retryable(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Response { status: 429 | 500..=599, .. })
    }
}

// =============================================================================
// TABLES
// =============================================================================

/// The fixed set of tables the application reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Doctors,
    Patients,
    DoctorPatient,
    Pdfs,
}

impl Table {
    #[cfg(test)]
    pub const ALL: [Self; 4] = [Self::Doctors, Self::Patients, Self::DoctorPatient, Self::Pdfs];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Doctors => "doctors",
            Self::Patients => "patients",
            Self::DoctorPatient => "doctorpatient",
            Self::Pdfs => "pdfs",
        }
    }

    /// Backend-assigned primary key column, if the table has one.
    #[must_use]
    pub fn id_column(self) -> Option<&'static str> {
        match self {
            Self::Doctors => Some("doctor_id"),
            Self::Patients => Some("patient_id"),
            Self::DoctorPatient => None,
            Self::Pdfs => Some("id"),
        }
    }
}

/// Storage bucket holding uploaded PDF documents.
pub const PDF_BUCKET: &str = "pdfs";

// =============================================================================
// AUTH
// =============================================================================

/// Account as known to the auth service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

/// A signed-in session issued by the auth service.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    pub user: AuthUser,
}

/// Result of creating an account. `session` is `None` when the auth service
/// requires the address to be confirmed before the first sign-in.
#[derive(Debug, Clone)]
pub struct SignUpOutcome {
    pub user: AuthUser,
    pub session: Option<AuthSession>,
}

// =============================================================================
// ROWS
// =============================================================================

/// Row of the `doctors` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Doctor {
    pub doctor_id: Uuid,
    pub uid: Uuid,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub specialty: Option<String>,
}

/// Row of the `patients` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Patient {
    pub patient_id: Uuid,
    pub uid: Uuid,
    pub name: String,
    pub email: String,
}

/// Row of the `doctorpatient` join table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoctorPatient {
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
}

/// Row of the `pdfs` table: metadata pointing at a stored object.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PdfRecord {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub filepath: String,
    #[serde(with = "time::serde::rfc3339")]
    pub uploaddate: OffsetDateTime,
}

/// Insert shape for `doctors`.
#[derive(Debug, Clone, Serialize)]
pub struct NewDoctor {
    pub uid: Uuid,
    pub name: String,
    pub email: String,
    pub passwordhash: String,
    pub specialty: String,
}

/// Insert shape for `patients`.
#[derive(Debug, Clone, Serialize)]
pub struct NewPatient {
    pub uid: Uuid,
    pub name: String,
    pub email: String,
    pub passwordhash: String,
}

/// Insert shape for `pdfs`.
#[derive(Debug, Clone, Serialize)]
pub struct NewPdfRecord {
    pub doctor_id: Uuid,
    pub filepath: String,
    #[serde(with = "time::serde::rfc3339")]
    pub uploaddate: OffsetDateTime,
}

// =============================================================================
// BACKEND TRAIT
// =============================================================================

/// Managed backend: password auth, table rows, object storage.
///
/// `token` is the caller's access token; `None` issues the call with the
/// public key only (used before sign-in). Implementations must be cheap to
/// share behind an `Arc`.
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    /// Create an account.
    ///
    /// # Errors
    ///
    /// [`BackendError::Conflict`] if the email is already registered.
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, BackendError>;

    /// Exchange an email/password pair for a session.
    ///
    /// # Errors
    ///
    /// [`BackendError::InvalidCredentials`] if the pair is rejected.
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthSession, BackendError>;

    /// Resolve an access token to its account. `Ok(None)` for an unknown or
    /// expired token.
    async fn get_user(&self, access_token: &str) -> Result<Option<AuthUser>, BackendError>;

    /// Revoke a session.
    async fn sign_out(&self, access_token: &str) -> Result<(), BackendError>;

    /// Select rows matching `query`.
    async fn select(
        &self,
        token: Option<&str>,
        table: Table,
        query: &Query,
    ) -> Result<Vec<serde_json::Value>, BackendError>;

    /// Insert one row.
    async fn insert(&self, token: Option<&str>, table: Table, row: serde_json::Value) -> Result<(), BackendError>;

    /// Delete every row matching `query`.
    async fn delete(&self, token: Option<&str>, table: Table, query: &Query) -> Result<(), BackendError>;

    /// Store an object, returning its path within the bucket.
    ///
    /// # Errors
    ///
    /// [`BackendError::Conflict`] if an object already exists at `path`.
    async fn upload(
        &self,
        token: Option<&str>,
        bucket: &str,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, BackendError>;

    /// Issue an absolute, time-limited URL for a stored object.
    async fn create_signed_url(
        &self,
        token: Option<&str>,
        bucket: &str,
        path: &str,
        expires_in_secs: u64,
    ) -> Result<String, BackendError>;
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
