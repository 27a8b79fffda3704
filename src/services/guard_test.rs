use super::*;
use crate::state::test_helpers;

#[tokio::test]
async fn missing_token_is_unauthenticated() {
    let (state, _) = test_helpers::test_app_state();
    let err = authorize(state.backend.as_ref(), None, Role::Doctor)
        .await
        .unwrap_err();
    assert!(matches!(err, GuardRejection::Unauthenticated));

    let err = authorize(state.backend.as_ref(), Some(""), Role::Doctor)
        .await
        .unwrap_err();
    assert!(matches!(err, GuardRejection::Unauthenticated));
}

#[tokio::test]
async fn unknown_token_is_unauthenticated() {
    let (state, _) = test_helpers::test_app_state();
    let err = authorize(state.backend.as_ref(), Some("deadbeef"), Role::Patient)
        .await
        .unwrap_err();
    assert!(matches!(err, GuardRejection::Unauthenticated));
}

#[tokio::test]
async fn doctor_passes_doctor_guard_with_row_attached() {
    let (state, _) = test_helpers::test_app_state();
    let doctor = test_helpers::seed_doctor(&state, "Dr. Ada", "ada@example.com").await;

    let caller = authorize(state.backend.as_ref(), Some(&doctor.token), Role::Doctor)
        .await
        .unwrap();
    assert_eq!(caller.doctor.as_ref().map(|d| d.doctor_id), Some(doctor.row.doctor_id));
    assert!(caller.patient.is_none());
    assert_eq!(caller.roles(), vec![Role::Doctor]);
}

#[tokio::test]
async fn patient_is_forbidden_from_doctor_guard() {
    let (state, _) = test_helpers::test_app_state();
    let patient = test_helpers::seed_patient(&state, "Pat", "pat@example.com").await;

    let err = authorize(state.backend.as_ref(), Some(&patient.token), Role::Doctor)
        .await
        .unwrap_err();
    match err {
        GuardRejection::Forbidden { role, user_id } => {
            assert_eq!(role, Role::Doctor);
            assert_eq!(user_id, patient.row.uid);
        }
        other => panic!("expected Forbidden, got {other:?}"),
    }
}

#[tokio::test]
async fn resolve_admits_any_signed_in_account() {
    let (state, _) = test_helpers::test_app_state();
    let patient = test_helpers::seed_patient(&state, "Pat", "pat@example.com").await;
    let caller = resolve(state.backend.as_ref(), Some(&patient.token))
        .await
        .unwrap();
    assert!(caller.has_role(Role::Patient));
    assert!(!caller.has_role(Role::Doctor));
    assert_eq!(caller.token(), Some(patient.token.as_str()));
}

#[test]
fn dashboard_paths_per_role() {
    assert_eq!(Role::Doctor.dashboard_path(), "/doctor/dashboard");
    assert_eq!(Role::Patient.dashboard_path(), "/patient/dashboard");
}

#[test]
fn forbidden_message_names_role() {
    let err = GuardRejection::Forbidden { user_id: Uuid::nil(), role: Role::Patient };
    assert!(err.to_string().contains("patient role"));
}
