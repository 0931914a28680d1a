//! Registration and login integration tests.

mod common;

use common::TestHarness;
use serde_json::json;

#[tokio::test]
async fn register_login_me_round_trip() {
    let harness = TestHarness::new();
    let member = harness.register("Alice", "alice@example.com").await;

    // The token from registration works immediately.
    let response = harness
        .server
        .get("/v1/auth/me")
        .add_header("authorization", TestHarness::bearer(&member))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["email"], "alice@example.com");
    assert_eq!(body["points_balance"], 0);
    assert_eq!(body["tier"], "standard");

    // Logging in issues another working token.
    let response = harness
        .server
        .post("/v1/auth/login")
        .json(&json!({
            "email": "alice@example.com",
            "password": "hunter2"
        }))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["member_id"], member.member_id);
    assert!(body["token"].as_str().is_some());
}

#[tokio::test]
async fn register_rejects_duplicate_email() {
    let harness = TestHarness::new();
    harness.register("Alice", "alice@example.com").await;

    let response = harness
        .server
        .post("/v1/auth/register")
        .json(&json!({
            "name": "Eve",
            "email": "alice@example.com",
            "password": "hunter2"
        }))
        .await;
    response.assert_status(axum::http::StatusCode::CONFLICT);
}

#[tokio::test]
async fn register_validates_input() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/auth/register")
        .json(&json!({
            "name": "",
            "email": "blank@example.com",
            "password": "hunter2"
        }))
        .await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);

    let response = harness
        .server
        .post("/v1/auth/register")
        .json(&json!({
            "name": "Alice",
            "email": "alice@example.com",
            "password": "   "
        }))
        .await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_rejects_bad_credentials() {
    let harness = TestHarness::new();
    harness.register("Alice", "alice@example.com").await;

    // Wrong password and unknown email produce the same response.
    let wrong_password = harness
        .server
        .post("/v1/auth/login")
        .json(&json!({
            "email": "alice@example.com",
            "password": "wrong"
        }))
        .await;
    wrong_password.assert_status(axum::http::StatusCode::UNAUTHORIZED);

    let unknown_email = harness
        .server
        .post("/v1/auth/login")
        .json(&json!({
            "email": "nobody@example.com",
            "password": "hunter2"
        }))
        .await;
    unknown_email.assert_status(axum::http::StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let harness = TestHarness::new();

    harness
        .server
        .get("/v1/auth/me")
        .await
        .assert_status(axum::http::StatusCode::UNAUTHORIZED);

    harness
        .server
        .get("/v1/members")
        .await
        .assert_status(axum::http::StatusCode::UNAUTHORIZED);

    harness
        .server
        .get("/v1/auth/me")
        .add_header("authorization", "Bearer not-a-token")
        .await
        .assert_status(axum::http::StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_routes_require_the_admin_key() {
    let harness = TestHarness::new();
    let member = harness.register("Alice", "alice@example.com").await;

    // A bearer token is not enough for admin endpoints.
    let response = harness
        .server
        .post(&format!("/v1/members/{}/points/adjust", member.member_id))
        .add_header("authorization", TestHarness::bearer(&member))
        .json(&json!({ "delta": 100, "description": "Self-grant" }))
        .await;
    response.assert_status(axum::http::StatusCode::UNAUTHORIZED);

    // A wrong key is rejected too.
    let response = harness
        .server
        .post(&format!("/v1/members/{}/points/adjust", member.member_id))
        .add_header("x-admin-key", "wrong-key")
        .json(&json!({ "delta": 100, "description": "Self-grant" }))
        .await;
    response.assert_status(axum::http::StatusCode::UNAUTHORIZED);

    assert_eq!(harness.balance(&member).await, 0);
}
