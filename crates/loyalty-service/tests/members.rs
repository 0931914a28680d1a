//! Member, points, and tier integration tests.

mod common;

use axum::http::StatusCode;
use common::{TestHarness, ADMIN_KEY};
use serde_json::json;

#[tokio::test]
async fn points_adjustment_updates_balance_and_ledger() {
    let harness = TestHarness::new();
    let member = harness.register("Alice", "alice@example.com").await;

    harness.grant_points(&member, 500).await;
    assert_eq!(harness.balance(&member).await, 500);

    // The adjustment left a ledger entry.
    let response = harness
        .server
        .get(&format!("/v1/members/{}/ledger", member.member_id))
        .add_header("authorization", TestHarness::bearer(&member))
        .await;
    response.assert_status_ok();
    let entries: serde_json::Value = response.json();
    assert_eq!(entries.as_array().unwrap().len(), 1);
    assert_eq!(entries[0]["entry_type"], "earn");
    assert_eq!(entries[0]["points"], 500);
}

#[tokio::test]
async fn overdraw_is_declined_without_side_effects() {
    let harness = TestHarness::new();
    let member = harness.register("Alice", "alice@example.com").await;
    harness.grant_points(&member, 100).await;

    let response = harness
        .server
        .post(&format!("/v1/members/{}/points/adjust", member.member_id))
        .add_header("x-admin-key", ADMIN_KEY)
        .json(&json!({ "delta": -200, "description": "Too much" }))
        .await;
    response.assert_status(StatusCode::PAYMENT_REQUIRED);

    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "insufficient_points");
    assert_eq!(body["error"]["details"]["balance"], 100);
    assert_eq!(body["error"]["details"]["required"], 200);

    // Balance unchanged, and no spend entry was written.
    assert_eq!(harness.balance(&member).await, 100);
    let response = harness
        .server
        .get(&format!("/v1/members/{}/ledger", member.member_id))
        .add_header("authorization", TestHarness::bearer(&member))
        .await;
    let entries: serde_json::Value = response.json();
    assert_eq!(entries.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn adjustment_requires_a_description() {
    let harness = TestHarness::new();
    let member = harness.register("Alice", "alice@example.com").await;

    let response = harness
        .server
        .post(&format!("/v1/members/{}/points/adjust", member.member_id))
        .add_header("x-admin-key", ADMIN_KEY)
        .json(&json!({ "delta": 100, "description": "  " }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn tier_over_grant_is_rejected() {
    let harness = TestHarness::new();
    let member = harness.register("Alice", "alice@example.com").await;

    // No delivered spend, so Platinum exceeds the entitlement.
    let response = harness
        .server
        .put(&format!("/v1/members/{}/tier", member.member_id))
        .add_header("x-admin-key", ADMIN_KEY)
        .json(&json!({ "tier": "platinum" }))
        .await;
    response.assert_status(StatusCode::CONFLICT);

    let response = harness
        .server
        .get(&format!("/v1/members/{}/tier", member.member_id))
        .add_header("authorization", TestHarness::bearer(&member))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["tier"], "standard");
    assert_eq!(body["entitlement"], "standard");
}

#[tokio::test]
async fn tier_follows_delivered_spend() {
    let harness = TestHarness::new();
    let member = harness.register("Alice", "alice@example.com").await;
    let product = harness.create_product("Bundle", 1_200_00, 10).await;

    // Place and deliver a $1,200 order.
    let response = harness
        .server
        .post("/v1/orders")
        .add_header("authorization", TestHarness::bearer(&member))
        .json(&json!({ "items": [{ "product_id": product, "quantity": 1 }] }))
        .await;
    response.assert_status_ok();
    let order: serde_json::Value = response.json();
    let order_id = order["id"].as_str().unwrap();

    harness
        .server
        .put(&format!("/v1/orders/{order_id}/status"))
        .add_header("authorization", TestHarness::bearer(&member))
        .json(&json!({ "status": "delivered" }))
        .await
        .assert_status_ok();

    // Entitlement is now Silver, so the upgrade goes through.
    let response = harness
        .server
        .put(&format!("/v1/members/{}/tier", member.member_id))
        .add_header("x-admin-key", ADMIN_KEY)
        .json(&json!({ "tier": "silver" }))
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["tier"], "silver");
    assert_eq!(body["entitlement"], "silver");
}

#[tokio::test]
async fn profile_update_preserves_balance_and_tier() {
    let harness = TestHarness::new();
    let member = harness.register("Alice", "alice@example.com").await;
    harness.grant_points(&member, 750).await;

    let response = harness
        .server
        .put(&format!("/v1/members/{}", member.member_id))
        .add_header("authorization", TestHarness::bearer(&member))
        .json(&json!({
            "name": "Alice Smith",
            "email": "alice@example.com",
            "shipping_address": "1 Main St"
        }))
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["name"], "Alice Smith");
    assert_eq!(body["points_balance"], 750);
    assert_eq!(body["tier"], "standard");
    assert_eq!(body["shipping_address"], "1 Main St");
}

#[tokio::test]
async fn members_can_only_edit_their_own_profile() {
    let harness = TestHarness::new();
    let alice = harness.register("Alice", "alice@example.com").await;
    let bob = harness.register("Bob", "bob@example.com").await;

    let response = harness
        .server
        .put(&format!("/v1/members/{}", alice.member_id))
        .add_header("authorization", TestHarness::bearer(&bob))
        .json(&json!({ "name": "Mallory", "email": "alice@example.com" }))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn delete_is_restricted_to_members_without_activity() {
    let harness = TestHarness::new();
    let member = harness.register("Alice", "alice@example.com").await;
    harness.grant_points(&member, 10).await;

    let response = harness
        .server
        .delete(&format!("/v1/members/{}", member.member_id))
        .add_header("x-admin-key", ADMIN_KEY)
        .await;
    response.assert_status(StatusCode::CONFLICT);

    let idle = harness.register("Idle", "idle@example.com").await;
    let response = harness
        .server
        .delete(&format!("/v1/members/{}", idle.member_id))
        .add_header("x-admin-key", ADMIN_KEY)
        .await;
    response.assert_status_ok();
}

#[tokio::test]
async fn member_listing_filters_by_tier() {
    let harness = TestHarness::new();
    let member = harness.register("Alice", "alice@example.com").await;
    harness.register("Bob", "bob@example.com").await;

    let response = harness
        .server
        .get("/v1/members?tier=standard")
        .add_header("authorization", TestHarness::bearer(&member))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body.as_array().unwrap().len(), 2);

    let response = harness
        .server
        .get("/v1/members?tier=gold")
        .add_header("authorization", TestHarness::bearer(&member))
        .await;
    let body: serde_json::Value = response.json();
    assert!(body.as_array().unwrap().is_empty());
}
