use skycast_domain::subscription::Frequency;
use skycast_testing::factory::{TEST_EMAIL, subscription};

use skycast_subscription::error::SubscriptionServiceError;

use crate::helpers::{Harness, MockDb};

fn seeded() -> (Harness, String) {
    let sub = subscription(TEST_EMAIL, "Kyiv", Frequency::Daily);
    let token = sub.token.clone();
    (Harness::with_db(MockDb::with(vec![sub])), token)
}

// ── Confirm ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_confirm_subscription() {
    let (h, token) = seeded();

    h.state.confirm_usecase().execute(&token).await.unwrap();

    assert!(h.db.find(&token).unwrap().confirmed);
}

#[tokio::test]
async fn should_treat_second_confirm_as_noop() {
    let (h, token) = seeded();
    let uc = h.state.confirm_usecase();

    uc.execute(&token).await.unwrap();
    let first = h.db.find(&token).unwrap();
    uc.execute(&token).await.unwrap();

    assert_eq!(h.db.find(&token).unwrap(), first);
}

#[tokio::test]
async fn should_return_not_found_for_unknown_token() {
    let (h, _) = seeded();

    let err = h.state.confirm_usecase().execute("missing").await.unwrap_err();

    assert!(matches!(err, SubscriptionServiceError::TokenNotFound));
    assert_eq!(err.to_string(), "Token not found");
}

#[tokio::test]
async fn should_reject_blank_token() {
    let (h, _) = seeded();

    let err = h.state.confirm_usecase().execute("  ").await.unwrap_err();

    assert!(matches!(err, SubscriptionServiceError::InvalidInput(ref m) if m == "token is required"));
}

// ── Unsubscribe ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_delete_subscription() {
    let (h, token) = seeded();

    h.state.unsubscribe_usecase().execute(&token).await.unwrap();

    assert!(h.db.rows().is_empty());
}

#[tokio::test]
async fn should_return_not_found_after_unsubscribe() {
    let (h, token) = seeded();
    let uc = h.state.unsubscribe_usecase();

    uc.execute(&token).await.unwrap();
    let err = uc.execute(&token).await.unwrap_err();

    assert!(matches!(err, SubscriptionServiceError::TokenNotFound));
}

#[tokio::test]
async fn should_not_confirm_after_unsubscribe() {
    let (h, token) = seeded();

    h.state.unsubscribe_usecase().execute(&token).await.unwrap();
    let err = h.state.confirm_usecase().execute(&token).await.unwrap_err();

    assert!(matches!(err, SubscriptionServiceError::TokenNotFound));
}
