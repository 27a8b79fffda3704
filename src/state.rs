//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds the backend client and a handful of settings read once at
//! startup. There is no in-process session store: the backend's access
//! token travels in the session cookie and is re-validated per request.

use std::sync::Arc;

use crate::backend::Backend;
use crate::backend::config::env_parse_u64;

pub const DEFAULT_PDF_SIGNED_URL_TTL_SECS: u64 = 60;

/// Settings read from the environment at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    /// Lifetime of signed PDF links, in seconds.
    pub pdf_url_ttl_secs: u64,
    /// Whether session cookies carry the `Secure` attribute.
    pub cookie_secure: bool,
}

impl Settings {
    /// - `PDF_SIGNED_URL_TTL_SECS`: default 60
    /// - `COOKIE_SECURE`: explicit bool, otherwise inferred from `PUBLIC_URL`
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            pdf_url_ttl_secs: env_parse_u64("PDF_SIGNED_URL_TTL_SECS", DEFAULT_PDF_SIGNED_URL_TTL_SECS),
            cookie_secure: crate::routes::auth::cookie_secure(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self { pdf_url_ttl_secs: DEFAULT_PDF_SIGNED_URL_TTL_SECS, cookie_secure: false }
    }
}

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; the backend is shared behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn Backend>,
    pub settings: Settings,
}

impl AppState {
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>, settings: Settings) -> Self {
        Self { backend, settings }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
pub mod test_helpers {
    use super::*;
    use crate::backend::memory::MemoryBackend;
    use crate::backend::{
        AuthSession, AuthUser, BackendError, Doctor, Patient, Query, SignUpOutcome, Table,
    };
    use crate::services::account::{self, SignUpForm};
    use crate::services::guard::Role;

    /// A seeded account: its role row and a live access token.
    pub struct Seeded<T> {
        pub row: T,
        pub token: String,
    }

    /// Create a test `AppState` backed by a fresh in-memory backend.
    #[must_use]
    pub fn test_app_state() -> (AppState, Arc<MemoryBackend>) {
        let memory = Arc::new(MemoryBackend::new("http://localhost:3000"));
        let state = AppState::new(memory.clone(), Settings::default());
        (state, memory)
    }

    /// A memory backend whose inserts into one table fail with a 500.
    /// Everything else, including storage, goes through.
    pub struct FailingInserts {
        pub memory: Arc<MemoryBackend>,
        pub table: Table,
    }

    #[async_trait::async_trait]
    impl Backend for FailingInserts {
        async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, BackendError> {
            self.memory.sign_up(email, password).await
        }

        async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthSession, BackendError> {
            self.memory.sign_in_with_password(email, password).await
        }

        async fn get_user(&self, access_token: &str) -> Result<Option<AuthUser>, BackendError> {
            self.memory.get_user(access_token).await
        }

        async fn sign_out(&self, access_token: &str) -> Result<(), BackendError> {
            self.memory.sign_out(access_token).await
        }

        async fn select(
            &self,
            token: Option<&str>,
            table: Table,
            query: &Query,
        ) -> Result<Vec<serde_json::Value>, BackendError> {
            self.memory.select(token, table, query).await
        }

        async fn insert(&self, token: Option<&str>, table: Table, row: serde_json::Value) -> Result<(), BackendError> {
            if table == self.table {
                return Err(BackendError::Response { status: 500, body: "insert refused".into() });
            }
            self.memory.insert(token, table, row).await
        }

        async fn delete(&self, token: Option<&str>, table: Table, query: &Query) -> Result<(), BackendError> {
            self.memory.delete(token, table, query).await
        }

        async fn upload(
            &self,
            token: Option<&str>,
            bucket: &str,
            path: &str,
            content_type: &str,
            bytes: Vec<u8>,
        ) -> Result<String, BackendError> {
            self.memory.upload(token, bucket, path, content_type, bytes).await
        }

        async fn create_signed_url(
            &self,
            token: Option<&str>,
            bucket: &str,
            path: &str,
            expires_in_secs: u64,
        ) -> Result<String, BackendError> {
            self.memory.create_signed_url(token, bucket, path, expires_in_secs).await
        }
    }

    /// Like [`test_app_state`], but inserts into `table` always fail.
    #[must_use]
    pub fn failing_inserts_state(table: Table) -> (AppState, Arc<MemoryBackend>) {
        let memory = Arc::new(MemoryBackend::new("http://localhost:3000"));
        let failing = FailingInserts { memory: memory.clone(), table };
        (AppState::new(Arc::new(failing), Settings::default()), memory)
    }

    #[must_use]
    pub fn signup_form(role: Role, name: &str, email: &str) -> SignUpForm {
        SignUpForm {
            role,
            name: name.into(),
            email: email.into(),
            password: "password123".into(),
            specialty: (role == Role::Doctor).then(|| "Cardiology".to_owned()),
        }
    }

    /// Sign up a doctor through the account service and return its row.
    pub async fn seed_doctor(state: &AppState, name: &str, email: &str) -> Seeded<Doctor> {
        let result = account::sign_up(state.backend.as_ref(), signup_form(Role::Doctor, name, email))
            .await
            .expect("doctor sign-up should succeed");
        let token = result.session.expect("memory backend issues sessions").access_token;
        let caller = crate::services::guard::authorize(state.backend.as_ref(), Some(&token), Role::Doctor)
            .await
            .expect("seeded doctor should pass the guard");
        Seeded { row: caller.doctor.expect("doctor row"), token }
    }

    /// Sign up a patient through the account service and return its row.
    pub async fn seed_patient(state: &AppState, name: &str, email: &str) -> Seeded<Patient> {
        let result = account::sign_up(state.backend.as_ref(), signup_form(Role::Patient, name, email))
            .await
            .expect("patient sign-up should succeed");
        let token = result.session.expect("memory backend issues sessions").access_token;
        let caller = crate::services::guard::authorize(state.backend.as_ref(), Some(&token), Role::Patient)
            .await
            .expect("seeded patient should pass the guard");
        Seeded { row: caller.patient.expect("patient row"), token }
    }
}
