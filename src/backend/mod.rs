//! Backend: the managed service that owns accounts, rows, and files.
//!
//! DESIGN
//! ======
//! Everything persistent lives behind the [`Backend`] trait: password auth,
//! table rows addressed by [`Table`] + [`Query`], and object storage with
//! signed URLs. [`connect`] picks the hosted Supabase client or the
//! in-process [`memory::MemoryBackend`] based on `MEDLINK_BACKEND`.
//!
//! The trait moves rows as `serde_json::Value` so it stays object safe;
//! [`select_rows`] and [`insert_row`] add the typed layer services use.

pub mod config;
pub mod memory;
pub mod query;
pub mod supabase;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use config::BackendConfig;
pub use query::{Filter, Query};
pub use types::{
    AuthSession, AuthUser, Backend, BackendError, Doctor, DoctorPatient, NewDoctor, NewPatient, NewPdfRecord,
    PDF_BUCKET, Patient, PdfRecord, SignUpOutcome, Table,
};

/// Build the configured backend.
///
/// # Errors
///
/// Returns an error if the hosted client cannot be constructed.
pub fn connect(config: BackendConfig) -> Result<Arc<dyn Backend>, BackendError> {
    match config {
        BackendConfig::Supabase { url, anon_key, timeouts } => {
            Ok(Arc::new(supabase::SupabaseClient::new(url, anon_key, timeouts)?))
        }
        BackendConfig::Memory { base_url, session_ttl_secs } => Ok(Arc::new(
            memory::MemoryBackend::new(base_url).with_session_ttl(Duration::from_secs(session_ttl_secs)),
        )),
    }
}

/// Select rows and deserialize each into `T`.
///
/// # Errors
///
/// Returns the backend error, or [`BackendError::Parse`] if a row does not
/// match `T`.
pub async fn select_rows<T: DeserializeOwned>(
    backend: &dyn Backend,
    token: Option<&str>,
    table: Table,
    query: &Query,
) -> Result<Vec<T>, BackendError> {
    backend
        .select(token, table, query)
        .await?
        .into_iter()
        .map(|row| serde_json::from_value(row).map_err(|e| BackendError::Parse(format!("{}: {e}", table.name()))))
        .collect()
}

/// Serialize `row` and insert it.
///
/// # Errors
///
/// Returns the backend error, or [`BackendError::Parse`] if `row` does not
/// serialize to JSON.
pub async fn insert_row<T: Serialize + Sync>(
    backend: &dyn Backend,
    token: Option<&str>,
    table: Table,
    row: &T,
) -> Result<(), BackendError> {
    let value = serde_json::to_value(row).map_err(|e| BackendError::Parse(e.to_string()))?;
    backend.insert(token, table, value).await
}
