//! PDF uploads and the doctor's document list.
//!
//! A PDF is two things: the object in the `pdfs` storage bucket, and a row
//! in the `pdfs` table pointing at it. Upload writes the object first and
//! the row second. If the row insert fails the object stays behind
//! (orphaned); that is logged with the storage path and reported to the
//! caller, nothing is deleted.

use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use crate::backend::{self, Backend, BackendError, NewPdfRecord, PDF_BUCKET, PdfRecord, Query, Table};

#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    #[error("no file selected")]
    NoFile,
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
    #[error("uploaded {path} but recording it failed: {source}")]
    MetadataInsert { path: String, source: BackendError },
}

/// A stored PDF ready for display.
#[derive(Debug, Clone)]
pub struct PdfListing {
    pub record: PdfRecord,
    pub file_name: String,
    /// `None` when the backend refused to sign this object.
    pub signed_url: Option<String>,
}

/// Last `/`- or `\`-separated segment of `path`.
#[must_use]
pub fn file_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Storage path for a doctor's file.
#[must_use]
pub fn storage_path(doctor_id: Uuid, name: &str) -> String {
    format!("pdfs/{doctor_id}/{name}")
}

/// Store `bytes` for `doctor_id` and record it. Returns the storage path.
///
/// # Errors
///
/// [`PdfError::NoFile`] for an empty name or body, [`PdfError::Backend`]
/// if the upload fails, [`PdfError::MetadataInsert`] if the object was
/// stored but its row was not.
pub async fn upload_pdf(
    backend: &dyn Backend,
    token: Option<&str>,
    doctor_id: Uuid,
    name: &str,
    content_type: &str,
    bytes: Vec<u8>,
) -> Result<String, PdfError> {
    let name = file_name(name.trim());
    if name.is_empty() || bytes.is_empty() {
        return Err(PdfError::NoFile);
    }

    let size = bytes.len();
    let path = backend
        .upload(token, PDF_BUCKET, &storage_path(doctor_id, name), content_type, bytes)
        .await?;

    let record = NewPdfRecord { doctor_id, filepath: path.clone(), uploaddate: OffsetDateTime::now_utc() };
    if let Err(source) = backend::insert_row(backend, token, Table::Pdfs, &record).await {
        warn!(%doctor_id, %path, error = %source, "pdf stored without metadata row");
        return Err(PdfError::MetadataInsert { path, source });
    }

    info!(%doctor_id, %path, size, "pdf uploaded");
    Ok(path)
}

/// Every PDF recorded for `doctor_id`, each with a signed URL valid for
/// `ttl_secs`. URLs are requested concurrently.
///
/// # Errors
///
/// Returns the backend error if the record lookup fails. Signing failures
/// are logged and leave that listing without a URL.
pub async fn list_pdfs(
    backend: &dyn Backend,
    token: Option<&str>,
    doctor_id: Uuid,
    ttl_secs: u64,
) -> Result<Vec<PdfListing>, BackendError> {
    let records: Vec<PdfRecord> =
        backend::select_rows(backend, token, Table::Pdfs, &Query::all().eq("doctor_id", doctor_id)).await?;

    let signing = records.iter().map(|r| backend.create_signed_url(token, PDF_BUCKET, &r.filepath, ttl_secs));
    let urls = futures::future::join_all(signing).await;

    Ok(records
        .into_iter()
        .zip(urls)
        .map(|(record, url)| {
            let signed_url = url
                .inspect_err(|e| warn!(path = %record.filepath, error = %e, "pdf signing failed"))
                .ok();
            PdfListing { file_name: file_name(&record.filepath).to_owned(), record, signed_url }
        })
        .collect())
}

#[cfg(test)]
#[path = "pdf_test.rs"]
mod tests;
