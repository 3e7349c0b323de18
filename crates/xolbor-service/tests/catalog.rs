//! Catalog integration tests.

mod common;

use axum::http::{HeaderValue, StatusCode};
use common::{admin_key_header, TestHarness, ADMIN_KEY};
use serde_json::{json, Value};

fn names(body: &Value) -> Vec<String> {
    body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["name"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn list_default_catalog_cheapest_first() {
    let harness = TestHarness::new().await;

    let response = harness.server.get("/v1/catalog/items").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["total"], 10);
    let prices: Vec<_> = body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["price"].as_i64().unwrap())
        .collect();
    let mut sorted = prices.clone();
    sorted.sort_unstable();
    assert_eq!(prices, sorted);
    assert_eq!(body["items"][0]["name"], "Pirate");
    assert_eq!(body["items"][0]["rarity"], "common");
    assert_eq!(body["items"][0]["category"], "historical");
}

#[tokio::test]
async fn list_filters_by_rarity_and_search() {
    let harness = TestHarness::new().await;

    let response = harness
        .server
        .get("/v1/catalog/items?rarity=Epic")
        .await;
    response.assert_status_ok();
    assert_eq!(names(&response.json()), ["Sorcerer", "Alien"]);

    let response = harness.server.get("/v1/catalog/items?search=ROB").await;
    response.assert_status_ok();
    assert_eq!(names(&response.json()), ["Robot"]);
}

#[tokio::test]
async fn unknown_rarity_is_a_validation_error() {
    let harness = TestHarness::new().await;

    let response = harness.server.get("/v1/catalog/items?rarity=mythic").await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "ValidationError");
}

#[tokio::test]
async fn get_item_by_id() {
    let harness = TestHarness::new().await;

    let response = harness.server.get("/v1/catalog/items/5").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["id"], 5);
    assert_eq!(body["name"], "Astronaut");
    assert_eq!(body["price"], 800);
}

#[tokio::test]
async fn missing_item_is_not_found() {
    let harness = TestHarness::new().await;

    let response = harness.server.get("/v1/catalog/items/999").await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "ItemNotFound");
}

#[tokio::test]
async fn malformed_item_id_is_a_validation_error() {
    let harness = TestHarness::new().await;

    for path in ["/v1/catalog/items/abc", "/v1/catalog/items/0"] {
        let response = harness.server.get(path).await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }
}

// ============================================================================
// Admin
// ============================================================================

#[tokio::test]
async fn admin_registers_item() {
    let harness = TestHarness::new().await;

    let response = harness
        .server
        .post("/v1/catalog/items")
        .add_header(admin_key_header(), HeaderValue::from_static(ADMIN_KEY))
        .json(&json!({
            "id": 42,
            "name": "Viking",
            "price": 450,
            "rarity": "rare",
            "category": "historical",
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["id"], 42);

    harness
        .server
        .get("/v1/catalog/items/42")
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn item_registration_requires_admin_key() {
    let harness = TestHarness::new().await;
    let item = json!({ "id": 42, "name": "Viking", "price": 450, "rarity": "rare" });

    harness
        .server
        .post("/v1/catalog/items")
        .json(&item)
        .await
        .assert_status_unauthorized();

    harness
        .server
        .post("/v1/catalog/items")
        .add_header(admin_key_header(), HeaderValue::from_static("wrong"))
        .json(&item)
        .await
        .assert_status_unauthorized();
}

#[tokio::test]
async fn non_positive_price_is_invalid_item() {
    let harness = TestHarness::new().await;

    let response = harness
        .server
        .post("/v1/catalog/items")
        .add_header(admin_key_header(), HeaderValue::from_static(ADMIN_KEY))
        .json(&json!({ "id": 42, "name": "Freebie", "price": 0, "rarity": "common" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "InvalidItem");
}

#[tokio::test]
async fn duplicate_item_id_conflicts() {
    let harness = TestHarness::new().await;

    let response = harness
        .server
        .post("/v1/catalog/items")
        .add_header(admin_key_header(), HeaderValue::from_static(ADMIN_KEY))
        .json(&json!({ "id": 1, "name": "Blue Dragon", "price": 100, "rarity": "epic" }))
        .await;

    response.assert_status(StatusCode::CONFLICT);
    let body: Value = response.json();
    assert_eq!(body["error"], "ItemAlreadyExists");
}
