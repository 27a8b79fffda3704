use super::*;
use serde_json::json;

#[test]
fn table_names_match_backend_schema() {
    let names: Vec<&str> = Table::ALL.iter().map(|t| t.name()).collect();
    assert_eq!(names, ["doctors", "patients", "doctorpatient", "pdfs"]);
}

#[test]
fn join_table_has_no_id_column() {
    assert_eq!(Table::DoctorPatient.id_column(), None);
    assert_eq!(Table::Doctors.id_column(), Some("doctor_id"));
    assert_eq!(Table::Patients.id_column(), Some("patient_id"));
    assert_eq!(Table::Pdfs.id_column(), Some("id"));
}

#[test]
fn retryable_covers_transport_and_server_errors() {
    assert!(BackendError::Request("reset".into()).retryable());
    assert!(BackendError::Response { status: 503, body: String::new() }.retryable());
    assert!(BackendError::Response { status: 429, body: String::new() }.retryable());
    assert!(!BackendError::Response { status: 400, body: String::new() }.retryable());
    assert!(!BackendError::InvalidCredentials.retryable());
}

#[test]
fn doctor_row_ignores_password_hash_column() {
    let row = json!({
        "doctor_id": "6f1c1a52-5d43-4f7e-9a53-0d7d1e5f7b11",
        "uid": "0b0b5a4c-1d4a-4b8b-8d5b-7f4d8e2f9a01",
        "name": "Dr. Ada",
        "email": "ada@example.com",
        "passwordhash": "$argon2id$...",
        "specialty": "Cardiology"
    });
    let doctor: Doctor = serde_json::from_value(row).unwrap();
    assert_eq!(doctor.name, "Dr. Ada");
    assert_eq!(doctor.specialty.as_deref(), Some("Cardiology"));
}

#[test]
fn doctor_row_tolerates_null_specialty() {
    let row = json!({
        "doctor_id": "6f1c1a52-5d43-4f7e-9a53-0d7d1e5f7b11",
        "uid": "0b0b5a4c-1d4a-4b8b-8d5b-7f4d8e2f9a01",
        "name": "Dr. Ada",
        "email": "ada@example.com",
        "specialty": null
    });
    let doctor: Doctor = serde_json::from_value(row).unwrap();
    assert!(doctor.specialty.is_none());
}

#[test]
fn pdf_record_parses_backend_timestamp() {
    let row = json!({
        "id": "1e2d3c4b-5a69-4788-9a0b-1c2d3e4f5a6b",
        "doctor_id": "6f1c1a52-5d43-4f7e-9a53-0d7d1e5f7b11",
        "filepath": "pdfs/6f1c1a52-5d43-4f7e-9a53-0d7d1e5f7b11/labs.pdf",
        "uploaddate": "2024-05-01T10:20:30.123+00:00"
    });
    let record: PdfRecord = serde_json::from_value(row).unwrap();
    assert_eq!(record.uploaddate.year(), 2024);
    assert!(record.filepath.ends_with("labs.pdf"));
}

#[test]
fn new_pdf_record_serializes_rfc3339() {
    let record = NewPdfRecord {
        doctor_id: Uuid::nil(),
        filepath: "pdfs/x/a.pdf".into(),
        uploaddate: time::macros::datetime!(2024-01-02 03:04:05 UTC),
    };
    let value = serde_json::to_value(&record).unwrap();
    assert_eq!(value["uploaddate"], "2024-01-02T03:04:05Z");
}

#[test]
fn auth_user_email_is_optional() {
    let user: AuthUser = serde_json::from_value(json!({ "id": "0b0b5a4c-1d4a-4b8b-8d5b-7f4d8e2f9a01" })).unwrap();
    assert!(user.email.is_none());
}
