use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::Value;
use skycast_domain::subscription::Frequency;
use skycast_testing::factory::{TEST_EMAIL, subscription};

use skycast_subscription::router::build_router;

use crate::helpers::{Harness, MockDb};

fn server(h: &Harness) -> TestServer {
    TestServer::new(build_router(h.state.clone())).unwrap()
}

fn form(email: &str, city: &str, frequency: &str) -> Vec<(&'static str, String)> {
    vec![
        ("email", email.to_owned()),
        ("city", city.to_owned()),
        ("frequency", frequency.to_owned()),
    ]
}

// ── POST /api/subscribe ──────────────────────────────────────────────────────

#[tokio::test]
async fn should_subscribe_then_conflict_on_repeat() {
    let h = Harness::new();
    let server = server(&h);

    let first = server
        .post("/api/subscribe")
        .form(&form(TEST_EMAIL, "London", "daily"))
        .await;
    assert_eq!(first.status_code(), StatusCode::OK);
    let json: Value = first.json();
    assert_eq!(
        json["message"],
        "Subscription successful. Confirmation email sent."
    );
    assert_eq!(h.db.rows().len(), 1);

    let second = server
        .post("/api/subscribe")
        .form(&form(TEST_EMAIL, "London", "daily"))
        .await;
    assert_eq!(second.status_code(), StatusCode::CONFLICT);
    let json: Value = second.json();
    assert_eq!(json["code"], "CONFLICT");
    assert_eq!(json["description"], "Email already subscribed");
    assert_eq!(json["path"], "/api/subscribe");
    assert_eq!(json["method"], "POST");
    assert_eq!(h.db.rows().len(), 1);
}

#[tokio::test]
async fn should_reject_missing_form_field() {
    let h = Harness::new();

    let resp = server(&h)
        .post("/api/subscribe")
        .form(&[("email", TEST_EMAIL), ("city", "London")])
        .await;

    assert_eq!(resp.status_code(), StatusCode::BAD_REQUEST);
    let json: Value = resp.json();
    assert_eq!(json["code"], "INVALID_INPUT");
    assert_eq!(json["description"], "frequency is required");
}

#[tokio::test]
async fn should_reject_unknown_city() {
    let h = Harness::new();

    let resp = server(&h)
        .post("/api/subscribe")
        .form(&form(TEST_EMAIL, "Atlantis", "daily"))
        .await;

    assert_eq!(resp.status_code(), StatusCode::BAD_REQUEST);
    let json: Value = resp.json();
    assert_eq!(json["description"], "Invalid city");
}

#[tokio::test]
async fn should_return_503_when_weather_service_is_down() {
    let h = Harness::new();
    h.validator.set_unavailable(true);

    let resp = server(&h)
        .post("/api/subscribe")
        .form(&form(TEST_EMAIL, "London", "daily"))
        .await;

    assert_eq!(resp.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    let json: Value = resp.json();
    assert_eq!(json["code"], "SERVICE_UNAVAILABLE");
}

// ── GET /api/confirm/{token}, /api/unsubscribe/{token} ───────────────────────

#[tokio::test]
async fn should_confirm_and_unsubscribe_by_token() {
    let sub = subscription(TEST_EMAIL, "Kyiv", Frequency::Daily);
    let token = sub.token.clone();
    let h = Harness::with_db(MockDb::with(vec![sub]));
    let server = server(&h);

    let resp = server.get(&format!("/api/confirm/{token}")).await;
    assert_eq!(resp.status_code(), StatusCode::OK);
    assert!(h.db.find(&token).unwrap().confirmed);

    let resp = server.get(&format!("/api/unsubscribe/{token}")).await;
    assert_eq!(resp.status_code(), StatusCode::OK);
    let json: Value = resp.json();
    assert_eq!(json["message"], "Unsubscribed successfully");
    assert!(h.db.rows().is_empty());
}

#[tokio::test]
async fn should_return_404_envelope_for_unknown_token() {
    let h = Harness::new();

    let resp = server(&h).get("/api/confirm/nope").await;

    assert_eq!(resp.status_code(), StatusCode::NOT_FOUND);
    let json: Value = resp.json();
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["description"], "Token not found");
    assert_eq!(json["path"], "/api/confirm/nope");
    assert!(json["timestamp"].as_str().unwrap().ends_with('Z'));
}

#[tokio::test]
async fn should_answer_healthz() {
    let h = Harness::new();

    let resp = server(&h).get("/healthz").await;

    assert_eq!(resp.status_code(), StatusCode::OK);
}
