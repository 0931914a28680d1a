//! Common test utilities for loyalty-service integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use axum::Router;
use axum_test::TestServer;
use serde_json::json;

use loyalty_service::{create_router, AppState, ServiceConfig};
use loyalty_store::MemoryStore;

/// Admin API key configured on every test server.
pub const ADMIN_KEY: &str = "test-admin-key";

/// An authenticated member registered through the API.
pub struct TestMember {
    /// Bearer token from registration.
    pub token: String,
    /// The member id as returned by the API.
    pub member_id: String,
    /// Email used at registration.
    pub email: String,
}

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
}

impl TestHarness {
    /// Create a new test harness over a fresh in-memory store.
    pub fn new() -> Self {
        let config = ServiceConfig {
            admin_api_key: Some(ADMIN_KEY.into()),
            ..ServiceConfig::default()
        };

        let state = AppState::new(Arc::new(MemoryStore::new()), config);
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");

        Self { server }
    }

    /// Register a member through the API and return their token and id.
    pub async fn register(&self, name: &str, email: &str) -> TestMember {
        let response = self
            .server
            .post("/v1/auth/register")
            .json(&json!({
                "name": name,
                "email": email,
                "password": "hunter2"
            }))
            .await;
        response.assert_status_ok();

        let body: serde_json::Value = response.json();
        TestMember {
            token: body["token"].as_str().expect("token in response").to_string(),
            member_id: body["member_id"]
                .as_str()
                .expect("member_id in response")
                .to_string(),
            email: email.to_string(),
        }
    }

    /// Bearer authorization header value for a member.
    pub fn bearer(member: &TestMember) -> String {
        format!("Bearer {}", member.token)
    }

    /// Create a product through the admin API and return its id.
    pub async fn create_product(&self, name: &str, price_cents: i64, stock: u32) -> String {
        let response = self
            .server
            .post("/v1/products")
            .add_header("x-admin-key", ADMIN_KEY)
            .json(&json!({
                "name": name,
                "description": format!("{name} description"),
                "price_cents": price_cents,
                "sku": format!("SKU-{name}"),
                "stock_quantity": stock,
                "category": "test"
            }))
            .await;
        response.assert_status_ok();

        let body: serde_json::Value = response.json();
        body["id"].as_str().expect("product id").to_string()
    }

    /// Create a reward through the admin API and return its id.
    pub async fn create_reward(&self, name: &str, points_cost: i64, stock: Option<u32>) -> String {
        let response = self
            .server
            .post("/v1/rewards")
            .add_header("x-admin-key", ADMIN_KEY)
            .json(&json!({
                "name": name,
                "description": format!("{name} description"),
                "points_cost": points_cost,
                "kind": "discount",
                "stock_quantity": stock
            }))
            .await;
        response.assert_status_ok();

        let body: serde_json::Value = response.json();
        body["id"].as_str().expect("reward id").to_string()
    }

    /// Grant points to a member through the admin adjustment endpoint.
    pub async fn grant_points(&self, member: &TestMember, points: i64) {
        self.server
            .post(&format!("/v1/members/{}/points/adjust", member.member_id))
            .add_header("x-admin-key", ADMIN_KEY)
            .json(&json!({
                "delta": points,
                "description": "Test funding"
            }))
            .await
            .assert_status_ok();
    }

    /// Current points balance of a member, read through the API.
    pub async fn balance(&self, member: &TestMember) -> i64 {
        let response = self
            .server
            .get(&format!("/v1/members/{}/points", member.member_id))
            .add_header("authorization", Self::bearer(member))
            .await;
        response.assert_status_ok();

        let body: serde_json::Value = response.json();
        body["balance"].as_i64().expect("balance in response")
    }

    /// Current stock of a product, read through the API.
    pub async fn product_stock(&self, member: &TestMember, product_id: &str) -> i64 {
        let response = self
            .server
            .get(&format!("/v1/products/{product_id}/stock"))
            .add_header("authorization", Self::bearer(member))
            .await;
        response.assert_status_ok();

        let body: serde_json::Value = response.json();
        body["stock_quantity"].as_i64().expect("stock in response")
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
