//! Patient-side reads.

use uuid::Uuid;

use crate::backend::{self, Backend, BackendError, Doctor, DoctorPatient, Query, Table};

/// Doctors linked to `patient_id`, in backend order.
///
/// # Errors
///
/// Returns the backend error from either lookup.
pub async fn linked_doctors(
    backend: &dyn Backend,
    token: Option<&str>,
    patient_id: Uuid,
) -> Result<Vec<Doctor>, BackendError> {
    let links: Vec<DoctorPatient> = backend::select_rows(
        backend,
        token,
        Table::DoctorPatient,
        &Query::new("doctor_id,patient_id").eq("patient_id", patient_id),
    )
    .await?;
    if links.is_empty() {
        return Ok(Vec::new());
    }

    let ids = links.iter().map(|l| l.doctor_id);
    backend::select_rows(backend, token, Table::Doctors, &Query::all().is_in("doctor_id", ids)).await
}
