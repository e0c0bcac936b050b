use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;

use auth_cell::services::AccountService;
use clinic_api::router::create_router;
use shared_utils::test_utils::{test_state, JwtTestUtils, TestConfig, TEST_OTP_CODE};

async fn send(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", JwtTestUtils::bearer(token));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

/// Registers, verifies and logs in; returns the session body.
async fn onboard(app: &Router, email: &str, first_name: &str) -> Value {
    let registration = json!({
        "email": email,
        "password": "Str0ng!pass",
        "firstName": first_name,
        "lastName": "Tester",
        "dateOfBirth": "1988-02-11",
        "gender": "OTHER"
    });
    let (status, _) = send(app, "POST", "/auth/register", None, Some(registration)).await;
    assert_eq!(status, StatusCode::OK);

    send(app, "POST", "/auth/send-email-otp", None, Some(json!({ "email": email }))).await;
    let (status, _) = send(
        app,
        "POST",
        "/auth/verify-email",
        None,
        Some(json!({ "email": email, "code": TEST_OTP_CODE })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    login(app, email, "Str0ng!pass").await
}

async fn login(app: &Router, email: &str, password: &str) -> Value {
    let (status, session) = send(
        app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", session);
    session
}

/// Trades the session for a new one carrying the latest profile statuses.
async fn refresh(app: &Router, session: &Value) -> Value {
    let (status, session) = send(
        app,
        "POST",
        "/auth/refresh",
        None,
        Some(json!({ "token": session["token"], "refreshToken": session["refreshToken"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    session
}

fn token(session: &Value) -> &str {
    session["token"].as_str().unwrap()
}

#[tokio::test]
async fn test_health() {
    let (state, _) = test_state(&TestConfig::default());
    let (status, body) = send(&create_router(state), "GET", "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_doctor_onboarding_to_patient_booking_and_chat() {
    let (state, _) = test_state(&TestConfig::default());
    AccountService::new(&state)
        .seed_admin("admin@clinic.test", "Adm1n!secret")
        .await
        .unwrap();
    let app = create_router(state);

    let admin = login(&app, "admin@clinic.test", "Adm1n!secret").await;

    // Doctor: survey, admin approval, then schedules.
    let doctor = onboard(&app, "doc@clinic.test", "Doc").await;
    let (status, survey) = send(
        &app,
        "POST",
        "/doctor/survey",
        Some(token(&doctor)),
        Some(json!({
            "personalIdentityPhotoUrl": "https://files.test/id.png",
            "medicalLicenseUrl": "https://files.test/license.pdf",
            "specialization": "Dermatology",
            "licenseNumber": "DL-42"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let doctor_id = survey["profile"]["id"].as_str().unwrap().to_string();

    let (status, _) = send(&app, "GET", "/schedules/availability", Some(token(&doctor)), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, accepted) = send(
        &app,
        "POST",
        &format!("/admin/doctors/{}/accept", doctor_id),
        Some(token(&admin)),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(accepted["status"], "ACTIVE");

    let doctor = refresh(&app, &doctor).await;
    assert_eq!(doctor["doctorStatus"], "ACTIVE");

    let days = ["Sunday", "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday"];
    let availabilities: Vec<Value> = days
        .iter()
        .map(|day| json!({ "dayOfWeek": day, "startTime": "10:00:00", "endTime": "14:00:00", "maxBookings": 1 }))
        .collect();
    let (status, _) = send(
        &app,
        "POST",
        "/schedules/availability",
        Some(token(&doctor)),
        Some(json!({ "availabilities": availabilities })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let today = Utc::now().date_naive();
    let tomorrow = today + Duration::days(1);
    let uri = format!("/schedules/generate?startDate={}&endDate={}", today, today + Duration::days(6));
    let (status, generated) = send(&app, "POST", &uri, Some(token(&doctor)), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(generated["created"], 7);

    // Patient: survey, booking, chat.
    let patient = onboard(&app, "pat@clinic.test", "Pat").await;
    let (status, _) = send(
        &app,
        "POST",
        "/patient/survey",
        Some(token(&patient)),
        Some(json!({ "height": 180, "weight": 75, "hasDiabetes": false, "hasPressureIssues": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let patient = refresh(&app, &patient).await;
    assert_eq!(patient["patientStatus"], "ACTIVE");

    let (status, doctors) = send(
        &app,
        "GET",
        &format!("/bookings/doctors?date={}", tomorrow),
        Some(token(&patient)),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(doctors[0]["id"], doctor_id.as_str());

    let booking = json!({ "doctorId": doctor_id, "date": tomorrow });
    let (status, booked) = send(&app, "POST", "/bookings", Some(token(&patient)), Some(booking.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert!(booked["bookingId"].is_string());

    let (status, full) = send(&app, "POST", "/bookings", Some(token(&patient)), Some(booking)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(full["code"], "Booking.BookingLimitExceeded");

    let (status, started) = send(
        &app,
        "POST",
        "/patient/chat/conversations",
        Some(token(&patient)),
        Some(json!({ "doctorId": doctor_id, "message": "See you tomorrow" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let conversation_id = started["conversationId"].as_str().unwrap().to_string();

    let (status, inbox) = send(&app, "GET", "/doctor/chat/conversations", Some(token(&doctor)), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(inbox[0]["unreadCount"], 1);
    assert_eq!(inbox[0]["counterpartName"], "Pat Tester");

    let uri = format!("/doctor/chat/conversations/{}/messages", conversation_id);
    send(&app, "GET", &uri, Some(token(&doctor)), None).await;
    let (_, inbox) = send(&app, "GET", "/doctor/chat/conversations", Some(token(&doctor)), None).await;
    assert_eq!(inbox[0]["unreadCount"], 0);

    let (status, bookings) = send(&app, "GET", "/admin/bookings", Some(token(&admin)), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bookings["total"], 1);
    assert_eq!(bookings["bookings"][0]["doctorName"], "Doc Tester");
}
