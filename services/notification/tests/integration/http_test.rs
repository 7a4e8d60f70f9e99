use axum::http::StatusCode;
use axum_test::TestServer;

use skycast_notification::router::build_router;

#[tokio::test]
async fn should_answer_health_probe() {
    let server = TestServer::new(build_router()).unwrap();
    let resp = server.get("/healthz").await;
    assert_eq!(resp.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn should_not_expose_other_routes() {
    let server = TestServer::new(build_router()).unwrap();
    let resp = server.post("/api/subscribe").await;
    assert_eq!(resp.status_code(), StatusCode::NOT_FOUND);
}
