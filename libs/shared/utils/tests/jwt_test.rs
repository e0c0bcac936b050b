use assert_matches::assert_matches;

use shared_utils::jwt::{decode_token_allow_expired, validate_token, JwtError};
use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestUser};

#[test]
fn valid_token_round_trips_claims() {
    let config = TestConfig::default().to_app_config();
    let user = TestUser::doctor("doctor@clinic.test");

    let token = JwtTestUtils::create_test_token(&user, &config, None);
    let claims = validate_token(&token, &config).unwrap();

    assert_eq!(claims.sub, user.id.to_string());
    assert_eq!(claims.doctor_status, user.doctor_status);
    assert!(claims.email_confirmed);
}

#[test]
fn expired_token_is_rejected_but_decodable_for_refresh() {
    let config = TestConfig::default().to_app_config();
    let user = TestUser::patient("patient@clinic.test");

    let token = JwtTestUtils::create_expired_token(&user, &config);

    assert_matches!(validate_token(&token, &config), Err(JwtError::Expired));
    assert!(decode_token_allow_expired(&token, &config).is_ok());
}

#[test]
fn tampered_tokens_are_rejected() {
    let config = TestConfig::default().to_app_config();
    let user = TestUser::admin("admin@clinic.test");

    let forged = JwtTestUtils::create_invalid_signature_token(&user, &config);
    assert_matches!(validate_token(&forged, &config), Err(JwtError::InvalidSignature));

    let malformed = JwtTestUtils::create_malformed_token();
    assert_matches!(validate_token(&malformed, &config), Err(JwtError::Malformed));
}

#[test]
fn token_for_another_audience_is_rejected() {
    let config = TestConfig::default().to_app_config();
    let mut other = config.clone();
    other.jwt_audience = "someone-else".to_string();

    let token = JwtTestUtils::create_test_token(&TestUser::default(), &other, None);

    assert_matches!(validate_token(&token, &config), Err(JwtError::WrongAudience));
}

#[test]
fn missing_secret_fails_closed() {
    let config = TestConfig::default().to_app_config();
    let token = JwtTestUtils::create_test_token(&TestUser::default(), &config, None);

    let mut unconfigured = config.clone();
    unconfigured.jwt_secret = String::new();

    assert_matches!(validate_token(&token, &unconfigured), Err(JwtError::MissingSecret));
}
