use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use chat_cell::{admin_chat_routes, doctor_chat_routes, live_chat_routes, patient_chat_routes};
use shared_models::profile::DoctorStatus;
use shared_utils::test_utils::{doctor_profile, test_state, JwtTestUtils, TestConfig, TestUser};
use shared_utils::AppState;

fn app(state: AppState) -> Router {
    Router::new()
        .nest("/patient/chat", patient_chat_routes(state.clone()))
        .nest("/doctor/chat", doctor_chat_routes(state.clone()))
        .nest("/chat", live_chat_routes(state.clone()))
        .nest("/admin/chat", admin_chat_routes(state))
}

fn request(method: &str, uri: &str, token: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", JwtTestUtils::bearer(token));
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_patient_and_doctor_exchange_messages() {
    let (state, _) = test_state(&TestConfig::default());
    let doctor = TestUser::doctor("doc@clinic.test");
    let patient = TestUser::patient("pat@clinic.test");
    state.repos.users.insert_user(&doctor.to_user()).await.unwrap();
    state.repos.users.insert_user(&patient.to_user()).await.unwrap();
    state
        .repos
        .profiles
        .insert_doctor_profile(&doctor_profile(doctor.id, DoctorStatus::Active))
        .await
        .unwrap();
    let doctor_token = JwtTestUtils::create_test_token(&doctor, &state.config, None);
    let patient_token = JwtTestUtils::create_test_token(&patient, &state.config, None);
    let app = app(state);

    let body = json!({ "doctorId": doctor.id, "message": "Hello doctor" });
    let (status, started) = send(&app, request("POST", "/patient/chat/conversations", &patient_token, Some(body.clone()))).await;
    assert_eq!(status, StatusCode::OK);
    let conversation_id = started["conversationId"].as_str().unwrap().to_string();
    assert_eq!(started["message"]["senderType"], "PATIENT");

    let (status, response) = send(&app, request("POST", "/patient/chat/conversations", &patient_token, Some(body))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(response["code"], "Conversation.AlreadyExists");

    let (status, listed) = send(&app, request("GET", "/doctor/chat/conversations", &doctor_token, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed[0]["unreadCount"], 1);

    let uri = format!("/doctor/chat/conversations/{}/messages", conversation_id);
    let (status, reply) = send(&app, request("POST", &uri, &doctor_token, Some(json!({ "content": "Hi there" })))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["senderType"], "DOCTOR");

    let (status, messages) = send(&app, request("GET", &uri, &doctor_token, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(messages[0]["status"], "READ");
    assert_eq!(messages[1]["status"], "SENT");

    let (status, response) = send(&app, request("POST", &uri, &doctor_token, Some(json!({ "content": "" })))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["code"], "Conversation.InvalidMessage");
}

#[tokio::test]
async fn test_doctor_routes_need_active_doctor() {
    let (state, _) = test_state(&TestConfig::default());
    let patient = TestUser::patient("pat@clinic.test");
    let token = JwtTestUtils::create_test_token(&patient, &state.config, None);

    let (status, _) = send(&app(state), request("GET", "/doctor/chat/conversations", &token, None)).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_chat_listing() {
    let (state, _) = test_state(&TestConfig::default());
    let admin = TestUser::admin("admin@clinic.test");
    let token = JwtTestUtils::create_test_token(&admin, &state.config, None);
    let app = app(state);

    let (status, response) = send(&app, request("GET", "/admin/chat/conversations", &token, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["total"], 0);

    let uri = format!("/admin/chat/conversations/{}/messages", uuid::Uuid::new_v4());
    let (status, response) = send(&app, request("GET", &uri, &token, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(response["code"], "Conversation.NotFound");
}

#[tokio::test]
async fn test_live_requires_token() {
    let (state, _) = test_state(&TestConfig::default());
    let uri = format!("/chat/conversations/{}/live", uuid::Uuid::new_v4());

    let response = app(state)
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
