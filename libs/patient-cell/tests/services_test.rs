use assert_matches::assert_matches;
use tokio_test::assert_ok;

use patient_cell::models::{PatientError, PatientSurveyRequest};
use patient_cell::services::{PatientManagementService, PatientSurveyService};
use shared_models::profile::PatientStatus;
use shared_utils::test_utils::{patient_profile, test_state, TestConfig, TestUser};
use shared_utils::AppState;

async fn seeded(user: &TestUser) -> AppState {
    let (state, _) = test_state(&TestConfig::default());
    state.repos.users.insert_user(&user.to_user()).await.unwrap();
    state
}

fn survey() -> PatientSurveyRequest {
    PatientSurveyRequest {
        height: Some(172.0),
        weight: Some(68.5),
        has_diabetes: true,
        blood_type: Some("ab+".to_string()),
        allergies: Some("  penicillin ".to_string()),
        emergency_contact_name: Some("".to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_survey_activates_profile_immediately() {
    let user = TestUser::new("pat@clinic.test");
    let state = seeded(&user).await;

    let profile = PatientSurveyService::new(&state).submit(user.id, survey()).await.unwrap();

    assert_eq!(profile.status, PatientStatus::Active);
    assert_eq!(profile.blood_type.as_deref(), Some("AB+"));
    assert_eq!(profile.allergies.as_deref(), Some("penicillin"));
    assert_eq!(profile.emergency_contact_name, None);
    assert!(profile.has_diabetes);
}

#[tokio::test]
async fn test_second_survey_keeps_first_answers() {
    let user = TestUser::new("pat@clinic.test");
    let state = seeded(&user).await;
    let service = PatientSurveyService::new(&state);
    service.submit(user.id, survey()).await.unwrap();

    let second = PatientSurveyRequest {
        height: Some(190.0),
        ..Default::default()
    };
    let result = service.submit(user.id, second).await;

    assert_matches!(result, Err(PatientError::ProfileExists));
    let stored = service.get_profile(user.id).await.unwrap();
    assert_eq!(stored.height, Some(172.0));
}

#[tokio::test]
async fn test_unverified_user_cannot_submit() {
    let user = TestUser::unverified("pat@clinic.test");
    let state = seeded(&user).await;

    let result = PatientSurveyService::new(&state).submit(user.id, survey()).await;

    assert_matches!(result, Err(PatientError::NotVerified));
    assert!(state.repos.profiles.find_patient_profile(user.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_survey_rejects_out_of_range_values() {
    let user = TestUser::new("pat@clinic.test");
    let state = seeded(&user).await;
    let service = PatientSurveyService::new(&state);

    let tall = PatientSurveyRequest {
        height: Some(420.0),
        ..Default::default()
    };
    assert_matches!(service.submit(user.id, tall).await, Err(PatientError::InvalidSurvey(_)));

    let odd_blood = PatientSurveyRequest {
        blood_type: Some("C+".to_string()),
        ..Default::default()
    };
    assert_matches!(service.submit(user.id, odd_blood).await, Err(PatientError::InvalidSurvey(_)));
}

#[tokio::test]
async fn test_profile_missing_before_survey() {
    let user = TestUser::new("pat@clinic.test");
    let state = seeded(&user).await;

    let result = PatientSurveyService::new(&state).get_profile(user.id).await;

    assert_matches!(result, Err(PatientError::NotFound));
}

#[tokio::test]
async fn test_admin_suspends_and_reactivates() {
    let user = TestUser::new("pat@clinic.test");
    let state = seeded(&user).await;
    state
        .repos
        .profiles
        .insert_patient_profile(&patient_profile(user.id, PatientStatus::Active))
        .await
        .unwrap();
    let service = PatientManagementService::new(&state);

    let suspended = assert_ok!(service.set_status(user.id, PatientStatus::Suspended).await);
    assert_eq!(suspended.status, PatientStatus::Suspended);

    let active = service.set_status(user.id, PatientStatus::Active).await.unwrap();
    assert_eq!(active.status, PatientStatus::Active);

    let result = service.set_status(user.id, PatientStatus::IncompleteProfile).await;
    assert_matches!(
        result,
        Err(PatientError::InvalidStatus { from: "ACTIVE", to: "INCOMPLETE_PROFILE" })
    );
}

#[tokio::test]
async fn test_list_filters_by_status() {
    let (state, _) = test_state(&TestConfig::default());
    for (email, status) in [
        ("a@clinic.test", PatientStatus::Active),
        ("b@clinic.test", PatientStatus::Active),
        ("c@clinic.test", PatientStatus::Suspended),
    ] {
        let user = TestUser::new(email);
        state.repos.users.insert_user(&user.to_user()).await.unwrap();
        state
            .repos
            .profiles
            .insert_patient_profile(&patient_profile(user.id, status))
            .await
            .unwrap();
    }
    let service = PatientManagementService::new(&state);

    assert_eq!(service.list(None).await.unwrap().len(), 3);
    let suspended = service.list(Some(PatientStatus::Suspended)).await.unwrap();
    assert_eq!(suspended.len(), 1);
    assert_eq!(suspended[0].email, "c@clinic.test");
}
