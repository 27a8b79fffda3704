//! Linking doctors to patients, and the lookups that feed the link forms.

use uuid::Uuid;

use crate::backend::{self, Backend, BackendError, Doctor, DoctorPatient, Patient, Query, Table};

/// Shown after a successful link.
pub const LINK_SUCCESS: &str = "Successfully linked doctor and patient profiles.";
/// Shown after a failed link.
pub const LINK_FAILURE: &str = "Failed to link profiles. Please try again.";

/// Everyone who can be linked, for the directory page.
#[derive(Debug, Clone, Default)]
pub struct Directory {
    pub doctors: Vec<Doctor>,
    pub patients: Vec<Patient>,
}

/// Patients whose name or email contains `query`, case-insensitively.
/// A blank query returns nothing without calling the backend.
///
/// # Errors
///
/// Returns the backend error.
pub async fn search_patients(
    backend: &dyn Backend,
    token: Option<&str>,
    query: &str,
) -> Result<Vec<Patient>, BackendError> {
    let needle = strip_wildcards(query.trim());
    if needle.is_empty() {
        return Ok(Vec::new());
    }
    let pattern = format!("%{needle}%");
    let q = Query::all().or(|any| any.ilike("name", &pattern).ilike("email", &pattern));
    backend::select_rows(backend, token, Table::Patients, &q).await
}

/// Insert a link row. Duplicate links are not checked for.
///
/// # Errors
///
/// Returns the backend error; callers show [`LINK_FAILURE`].
pub async fn link_patient(
    backend: &dyn Backend,
    token: Option<&str>,
    doctor_id: Uuid,
    patient_id: Uuid,
) -> Result<(), BackendError> {
    backend::insert_row(backend, token, Table::DoctorPatient, &DoctorPatient { doctor_id, patient_id }).await?;
    tracing::info!(%doctor_id, %patient_id, "patient linked");
    Ok(())
}

/// Every doctor and patient.
///
/// # Errors
///
/// Returns the backend error from either lookup.
pub async fn directory(backend: &dyn Backend, token: Option<&str>) -> Result<Directory, BackendError> {
    let all = Query::all();
    let (doctors, patients) = futures::try_join!(
        backend::select_rows::<Doctor>(backend, token, Table::Doctors, &all),
        backend::select_rows::<Patient>(backend, token, Table::Patients, &all),
    )?;
    Ok(Directory { doctors, patients })
}

/// `%` and `_` typed into the search box are not wildcards.
fn strip_wildcards(text: &str) -> String {
    text.chars().filter(|c| !matches!(c, '%' | '_')).collect()
}
