use super::*;
use crate::backend::{Doctor, Patient};
use crate::state::test_helpers::{self, signup_form};

#[tokio::test]
async fn doctor_sign_up_creates_doctor_row() {
    let (state, memory) = test_helpers::test_app_state();
    let result = sign_up(state.backend.as_ref(), signup_form(Role::Doctor, "Dr. Ada", "Ada@Example.com "))
        .await
        .unwrap();
    assert_eq!(result.role, Role::Doctor);
    assert!(result.session.is_some());
    assert_eq!(memory.row_count(Table::Doctors).await, 1);
    assert_eq!(memory.row_count(Table::Patients).await, 0);

    let doctors: Vec<Doctor> = backend::select_rows(state.backend.as_ref(), None, Table::Doctors, &Query::all())
        .await
        .unwrap();
    assert_eq!(doctors[0].email, "ada@example.com");
    assert_eq!(doctors[0].specialty.as_deref(), Some("Cardiology"));
    assert_eq!(doctors[0].uid, result.session.unwrap().user.id);
}

#[tokio::test]
async fn patient_sign_up_creates_patient_row_with_hash() {
    let (state, _) = test_helpers::test_app_state();
    sign_up(state.backend.as_ref(), signup_form(Role::Patient, "Pat", "pat@example.com"))
        .await
        .unwrap();

    let rows = state
        .backend
        .select(None, Table::Patients, &Query::new("passwordhash"))
        .await
        .unwrap();
    let hash = rows[0]["passwordhash"].as_str().unwrap();
    assert!(hash.starts_with("$argon2id$"));
    assert_ne!(hash, "password123");

    let patients: Vec<Patient> = backend::select_rows(state.backend.as_ref(), None, Table::Patients, &Query::all())
        .await
        .unwrap();
    assert_eq!(patients[0].name, "Pat");
}

#[tokio::test]
async fn sign_up_rejects_invalid_form() {
    let (state, memory) = test_helpers::test_app_state();
    let mut form = signup_form(Role::Patient, "  ", "not-an-email");
    form.password = "123".into();
    let err = sign_up(state.backend.as_ref(), form).await.unwrap_err();
    let AccountError::Invalid(message) = err else {
        panic!("expected Invalid");
    };
    assert!(message.contains("name is required"));
    assert!(message.contains("valid email"));
    assert!(message.contains("at least 6"));
    assert_eq!(memory.row_count(Table::Patients).await, 0);
}

#[tokio::test]
async fn doctor_sign_up_requires_specialty() {
    let (state, _) = test_helpers::test_app_state();
    let mut form = signup_form(Role::Doctor, "Dr. Ada", "ada@example.com");
    form.specialty = Some("   ".into());
    let err = sign_up(state.backend.as_ref(), form).await.unwrap_err();
    assert!(matches!(err, AccountError::Invalid(m) if m.contains("specialty")));
}

#[tokio::test]
async fn duplicate_sign_up_surfaces_conflict() {
    let (state, _) = test_helpers::test_app_state();
    sign_up(state.backend.as_ref(), signup_form(Role::Patient, "Pat", "pat@example.com"))
        .await
        .unwrap();
    let err = sign_up(state.backend.as_ref(), signup_form(Role::Doctor, "Dr. Pat", "pat@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, AccountError::Backend(BackendError::Conflict(_))));
}

#[tokio::test]
async fn sign_in_routes_by_role_table() {
    let (state, _) = test_helpers::test_app_state();
    test_helpers::seed_doctor(&state, "Dr. Ada", "ada@example.com").await;
    test_helpers::seed_patient(&state, "Pat", "pat@example.com").await;

    let doctor = sign_in(state.backend.as_ref(), "ADA@example.com", "password123")
        .await
        .unwrap();
    assert_eq!(doctor.role, Role::Doctor);
    assert_eq!(doctor.role.dashboard_path(), "/doctor/dashboard");

    let patient = sign_in(state.backend.as_ref(), "pat@example.com", "password123")
        .await
        .unwrap();
    assert_eq!(patient.role, Role::Patient);
}

#[tokio::test]
async fn sign_in_unknown_address_never_reaches_auth() {
    let (state, _) = test_helpers::test_app_state();
    // Auth account without any role row.
    state
        .backend
        .sign_up("ghost@example.com", "password123")
        .await
        .unwrap();
    let err = sign_in(state.backend.as_ref(), "ghost@example.com", "password123")
        .await
        .unwrap_err();
    assert!(matches!(err, AccountError::UnknownAccount(e) if e == "ghost@example.com"));
}

#[tokio::test]
async fn sign_in_wrong_password_is_invalid_credentials() {
    let (state, _) = test_helpers::test_app_state();
    test_helpers::seed_patient(&state, "Pat", "pat@example.com").await;
    let err = sign_in(state.backend.as_ref(), "pat@example.com", "wrong-password")
        .await
        .unwrap_err();
    assert!(matches!(err, AccountError::Backend(BackendError::InvalidCredentials)));
}

#[tokio::test]
async fn sign_out_revokes_token() {
    let (state, _) = test_helpers::test_app_state();
    let patient = test_helpers::seed_patient(&state, "Pat", "pat@example.com").await;
    sign_out(state.backend.as_ref(), &patient.token).await.unwrap();
    assert!(state.backend.get_user(&patient.token).await.unwrap().is_none());
}

#[test]
fn normalize_email_trims_and_lowercases() {
    assert_eq!(normalize_email("  Ada@Example.COM "), "ada@example.com");
}

#[tokio::test]
async fn role_row_failure_leaves_auth_account_without_row() {
    let (state, memory) = test_helpers::failing_inserts_state(Table::Doctors);
    let err = sign_up(state.backend.as_ref(), signup_form(Role::Doctor, "Dr. Ada", "ada@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, AccountError::Backend(BackendError::Response { status: 500, .. })));
    assert_eq!(memory.row_count(Table::Doctors).await, 0);

    // The auth account exists, but sign-in refuses an address with no role row.
    assert!(state.backend.sign_in_with_password("ada@example.com", "password123").await.is_ok());
    let err = sign_in(state.backend.as_ref(), "ada@example.com", "password123")
        .await
        .unwrap_err();
    assert!(matches!(err, AccountError::UnknownAccount(_)));

    // Retrying the same address now conflicts at the auth step.
    let err = sign_up(state.backend.as_ref(), signup_form(Role::Doctor, "Dr. Ada", "ada@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, AccountError::Backend(BackendError::Conflict(_))));
}

#[tokio::test]
async fn patient_row_failure_surfaces_backend_error() {
    let (state, memory) = test_helpers::failing_inserts_state(Table::Patients);
    let err = sign_up(state.backend.as_ref(), signup_form(Role::Patient, "Pat", "pat@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, AccountError::Backend(BackendError::Response { .. })));
    assert_eq!(memory.row_count(Table::Patients).await, 0);
}
