//! Doctor-side reads and the unlink action.

use uuid::Uuid;

use crate::backend::{self, Backend, BackendError, Doctor, DoctorPatient, Patient, Query, Table};

#[derive(Debug, thiserror::Error)]
pub enum DoctorError {
    #[error("no doctor registered for account {0}")]
    NotRegistered(Uuid),
    #[error("{count} doctor rows for account {uid}")]
    Ambiguous { uid: Uuid, count: usize },
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
}

/// The single doctor row for auth account `uid`.
///
/// # Errors
///
/// [`DoctorError::NotRegistered`] for no row, [`DoctorError::Ambiguous`]
/// when several rows share the account.
pub async fn doctor_for_user(backend: &dyn Backend, token: Option<&str>, uid: Uuid) -> Result<Doctor, DoctorError> {
    let mut rows: Vec<Doctor> =
        backend::select_rows(backend, token, Table::Doctors, &Query::all().eq("uid", uid)).await?;
    match rows.len() {
        0 => Err(DoctorError::NotRegistered(uid)),
        1 => Ok(rows.remove(0)),
        count => Err(DoctorError::Ambiguous { uid, count }),
    }
}

/// Patients linked to `doctor_id`, in backend order.
///
/// # Errors
///
/// Returns the backend error from either lookup.
pub async fn linked_patients(
    backend: &dyn Backend,
    token: Option<&str>,
    doctor_id: Uuid,
) -> Result<Vec<Patient>, BackendError> {
    let links: Vec<DoctorPatient> = backend::select_rows(
        backend,
        token,
        Table::DoctorPatient,
        &Query::new("doctor_id,patient_id").eq("doctor_id", doctor_id),
    )
    .await?;
    if links.is_empty() {
        return Ok(Vec::new());
    }

    let ids = links.iter().map(|l| l.patient_id);
    backend::select_rows(backend, token, Table::Patients, &Query::all().is_in("patient_id", ids)).await
}

/// Remove every link between `doctor_id` and `patient_id`.
///
/// # Errors
///
/// Returns the backend error.
pub async fn unlink_patient(
    backend: &dyn Backend,
    token: Option<&str>,
    doctor_id: Uuid,
    patient_id: Uuid,
) -> Result<(), BackendError> {
    let pair = Query::all()
        .eq("doctor_id", doctor_id)
        .eq("patient_id", patient_id);
    backend.delete(token, Table::DoctorPatient, &pair).await?;
    tracing::info!(%doctor_id, %patient_id, "patient unlinked");
    Ok(())
}

#[cfg(test)]
#[path = "doctor_test.rs"]
mod tests;
