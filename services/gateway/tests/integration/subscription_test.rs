use axum::http::StatusCode;
use serde_json::Value;
use skycast_core::error::AppError;

use skycast_gateway::domain::backend::SubscribeRequest;

use crate::helpers::{Call, Harness};

// ── POST /api/subscribe ──────────────────────────────────────────────────────

#[tokio::test]
async fn should_forward_trimmed_form() {
    let h = Harness::new();

    let resp = h
        .server
        .post("/api/subscribe")
        .form(&[
            ("email", " test@example.com "),
            ("city", "Kyiv"),
            ("frequency", "daily"),
        ])
        .await;

    assert_eq!(resp.status_code(), StatusCode::OK);
    let json: Value = resp.json();
    assert_eq!(json["message"], "Subscription successful. Confirmation email sent.");
    assert_eq!(
        h.subscriptions.calls(),
        vec![Call::Subscribe(SubscribeRequest {
            email: "test@example.com".into(),
            city: "Kyiv".into(),
            frequency: "daily".into(),
        })]
    );
}

#[tokio::test]
async fn should_reject_empty_field_without_calling_backend() {
    let h = Harness::new();

    let resp = h
        .server
        .post("/api/subscribe")
        .form(&[("email", "test@example.com"), ("city", "  "), ("frequency", "daily")])
        .await;

    assert_eq!(resp.status_code(), StatusCode::BAD_REQUEST);
    let json: Value = resp.json();
    assert_eq!(json["code"], "INVALID_INPUT");
    assert_eq!(json["description"], "city is required");
    assert!(h.subscriptions.calls().is_empty());
}

#[tokio::test]
async fn should_translate_backend_conflict() {
    let h = Harness::new();
    h.subscriptions
        .fail_next(AppError::Conflict("Email already subscribed".into()));

    let resp = h
        .server
        .post("/api/subscribe")
        .form(&[
            ("email", "test@example.com"),
            ("city", "Kyiv"),
            ("frequency", "daily"),
        ])
        .await;

    assert_eq!(resp.status_code(), StatusCode::CONFLICT);
    let json: Value = resp.json();
    assert_eq!(json["code"], "CONFLICT");
    assert_eq!(json["description"], "Email already subscribed");
    assert_eq!(json["path"], "/api/subscribe");
    assert_eq!(json["method"], "POST");
}

#[tokio::test]
async fn should_hide_backend_internal_errors() {
    let h = Harness::new();
    h.subscriptions
        .fail_next(AppError::Internal(anyhow::anyhow!("pq: relation missing")));

    let resp = h
        .server
        .post("/api/subscribe")
        .form(&[
            ("email", "test@example.com"),
            ("city", "Kyiv"),
            ("frequency", "hourly"),
        ])
        .await;

    assert_eq!(resp.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    let json: Value = resp.json();
    assert_eq!(json["description"], "internal error");
}

// ── GET /api/confirm/{token}, /api/unsubscribe/{token} ───────────────────────

#[tokio::test]
async fn should_forward_tokens() {
    let h = Harness::new();

    let resp = h.server.get("/api/confirm/abc123").await;
    assert_eq!(resp.status_code(), StatusCode::OK);
    let json: Value = resp.json();
    assert_eq!(json["message"], "Subscription confirmed successfully");

    let resp = h.server.get("/api/unsubscribe/abc123").await;
    assert_eq!(resp.status_code(), StatusCode::OK);

    assert_eq!(
        h.subscriptions.calls(),
        vec![
            Call::Confirm("abc123".into()),
            Call::Unsubscribe("abc123".into())
        ]
    );
}

#[tokio::test]
async fn should_reject_empty_token() {
    let h = Harness::new();

    for path in ["/api/confirm/", "/api/unsubscribe/", "/api/confirm/%20"] {
        let resp = h.server.get(path).await;
        assert_eq!(resp.status_code(), StatusCode::BAD_REQUEST, "{path}");
        let json: Value = resp.json();
        assert_eq!(json["description"], "token is required");
    }
    assert!(h.subscriptions.calls().is_empty());
}

#[tokio::test]
async fn should_translate_unknown_token() {
    let h = Harness::new();
    h.subscriptions
        .fail_next(AppError::NotFound("Token not found".into()));

    let resp = h.server.get("/api/unsubscribe/nope").await;

    assert_eq!(resp.status_code(), StatusCode::NOT_FOUND);
    let json: Value = resp.json();
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["path"], "/api/unsubscribe/nope");
}

#[tokio::test]
async fn should_answer_healthz() {
    let h = Harness::new();
    assert_eq!(h.server.get("/healthz").await.status_code(), StatusCode::OK);
}
