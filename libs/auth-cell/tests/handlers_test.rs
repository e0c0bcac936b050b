use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use auth_cell::{admin_user_routes, auth_routes};
use shared_utils::test_utils::{test_state, JwtTestUtils, TestConfig, TestUser, TEST_OTP_CODE};
use shared_utils::AppState;

fn app(state: AppState) -> Router {
    Router::new()
        .nest("/auth", auth_routes(state.clone()))
        .nest("/admin", admin_user_routes(state))
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn registration_body() -> Value {
    json!({
        "email": "jane@clinic.test",
        "password": "Str0ng!pass",
        "firstName": "Jane",
        "lastName": "Doe",
        "dateOfBirth": "1990-05-17",
        "gender": "FEMALE"
    })
}

#[tokio::test]
async fn test_register_verify_login_me() {
    let (state, _) = test_state(&TestConfig::default());
    let app = app(state);

    let (status, body) = send(&app, post_json("/auth/register", registration_body())).await;
    assert_eq!(status, StatusCode::OK);
    let user_id = body["userId"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        post_json("/auth/login", json!({ "email": "jane@clinic.test", "password": "Str0ng!pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "User.NotVerified");

    let (status, _) = send(&app, post_json("/auth/send-email-otp", json!({ "email": "jane@clinic.test" }))).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(
        &app,
        post_json("/auth/verify-email", json!({ "email": "jane@clinic.test", "code": TEST_OTP_CODE })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, session) = send(
        &app,
        post_json("/auth/login", json!({ "email": "jane@clinic.test", "password": "Str0ng!pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["patientStatus"], "INCOMPLETE_PROFILE");
    assert_eq!(session["doctorStatus"], "INCOMPLETE_PROFILE");
    assert!(session["refreshToken"].is_string());

    let request = Request::builder()
        .uri("/auth/me")
        .header("Authorization", JwtTestUtils::bearer(session["token"].as_str().unwrap()))
        .body(Body::empty())
        .unwrap();
    let (status, me) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["id"], user_id.as_str());
    assert_eq!(me["emailConfirmed"], true);
}

#[tokio::test]
async fn test_duplicate_registration_is_conflict() {
    let (state, _) = test_state(&TestConfig::default());
    let app = app(state);

    send(&app, post_json("/auth/register", registration_body())).await;
    let (status, body) = send(&app, post_json("/auth/register", registration_body())).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "User.EmailDuplicated");
    assert_eq!(body["status"], 409);
}

#[tokio::test]
async fn test_invalid_registration_is_bad_request() {
    let (state, _) = test_state(&TestConfig::default());
    let mut body = registration_body();
    body["password"] = json!("short");

    let (status, body) = send(&app(state), post_json("/auth/register", body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "User.InvalidRequest");
}

#[tokio::test]
async fn test_login_with_both_credentials_is_bad_request() {
    let (state, _) = test_state(&TestConfig::default());

    let (status, body) = send(
        &app(state),
        post_json(
            "/auth/login",
            json!({ "email": "jane@clinic.test", "password": "Str0ng!pass", "otp": "12345" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "Auth.AmbiguousCredentials");
}

#[tokio::test]
async fn test_verify_unknown_user_is_not_found() {
    let (state, _) = test_state(&TestConfig::default());

    let (status, body) = send(
        &app(state),
        post_json("/auth/verify-email", json!({ "email": "ghost@clinic.test", "code": "12345" })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "User.NotFound");
}

#[tokio::test]
async fn test_send_login_otp_always_ok() {
    let (state, delivery) = test_state(&TestConfig::default());

    let (status, _) = send(
        &app(state),
        post_json("/auth/send-login-otp", json!({ "email": "ghost@clinic.test" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(delivery.count().await, 0);
}

#[tokio::test]
async fn test_revoke_accepts_bearer_header() {
    let (state, _) = test_state(&TestConfig::default());
    let app = app(state);
    send(&app, post_json("/auth/register", registration_body())).await;
    send(&app, post_json("/auth/send-email-otp", json!({ "email": "jane@clinic.test" }))).await;
    send(
        &app,
        post_json("/auth/verify-email", json!({ "email": "jane@clinic.test", "code": TEST_OTP_CODE })),
    )
    .await;
    let (_, session) = send(
        &app,
        post_json("/auth/login", json!({ "email": "jane@clinic.test", "password": "Str0ng!pass" })),
    )
    .await;

    let request = Request::builder()
        .method("POST")
        .uri("/auth/revoke-refresh-token")
        .header("content-type", "application/json")
        .header("Authorization", JwtTestUtils::bearer(session["token"].as_str().unwrap()))
        .body(Body::from(json!({ "refreshToken": session["refreshToken"] }).to_string()))
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        post_json(
            "/auth/refresh",
            json!({ "token": session["token"], "refreshToken": session["refreshToken"] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "User.InvalidRefreshToken");
}

#[tokio::test]
async fn test_me_requires_token() {
    let (state, _) = test_state(&TestConfig::default());

    let request = Request::builder().uri("/auth/me").body(Body::empty()).unwrap();
    let (status, body) = send(&app(state), request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "User.InvalidJwtToken");
}

#[tokio::test]
async fn test_only_admins_can_disable_users() {
    let (state, _) = test_state(&TestConfig::default());
    let target = TestUser::patient("p@clinic.test");
    state.repos.users.insert_user(&target.to_user()).await.unwrap();
    let app = app(state.clone());

    let disable = |token: String| {
        Request::builder()
            .method("PUT")
            .uri(format!("/admin/users/{}/disabled", target.id))
            .header("content-type", "application/json")
            .header("Authorization", JwtTestUtils::bearer(&token))
            .body(Body::from(json!({ "disabled": true }).to_string()))
            .unwrap()
    };

    let patient_token = JwtTestUtils::create_test_token(&target, &state.config, None);
    let (status, body) = send(&app, disable(patient_token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "Auth.Forbidden");

    let admin_token = JwtTestUtils::create_test_token(&TestUser::admin("a@clinic.test"), &state.config, None);
    let (status, _) = send(&app, disable(admin_token)).await;
    assert_eq!(status, StatusCode::OK);

    let stored = state.repos.users.find_user_by_id(target.id).await.unwrap().unwrap();
    assert!(stored.is_disabled);
}
