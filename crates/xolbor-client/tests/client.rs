//! Client tests against a mocked Xolbor API.

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use xolbor_client::{ClientError, ItemQuery, Rarity, RegisterRequest, TransactionKind, XolborClient};

const ACCOUNT_ID: &str = "6f1c1f0e-8a53-4a52-9d0e-3c1b7c2f6a10";

fn session_body() -> serde_json::Value {
    json!({
        "account": {
            "id": ACCOUNT_ID,
            "username": "ninja",
            "email": "ninja@example.com",
            "balance": 100,
            "createdAt": "2026-01-01T00:00:00Z"
        },
        "token": "jwt-token",
        "expiresAt": "2026-01-08T00:00:00Z"
    })
}

fn error_body(code: &str, message: &str) -> serde_json::Value {
    json!({ "success": false, "error": code, "message": message })
}

fn error_body_with_details(
    code: &str,
    message: &str,
    details: serde_json::Value,
) -> serde_json::Value {
    json!({ "success": false, "error": code, "message": message, "details": details })
}

#[tokio::test]
async fn register_posts_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts"))
        .and(body_json(json!({
            "username": "ninja",
            "email": "ninja@example.com",
            "password": "correct horse battery"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(session_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = XolborClient::new(server.uri()).unwrap();
    let session = client
        .register(&RegisterRequest {
            username: "ninja".into(),
            email: "ninja@example.com".into(),
            password: "correct horse battery".into(),
        })
        .await
        .unwrap();

    assert_eq!(session.token, "jwt-token");
    assert_eq!(session.account.id, ACCOUNT_ID);
    assert_eq!(session.account.balance, 100);
}

#[tokio::test]
async fn login_failure_is_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(error_body("InvalidCredentials", "invalid credentials")),
        )
        .mount(&server)
        .await;

    let client = XolborClient::new(server.uri()).unwrap();
    let err = client.login("ninja", "wrong").await.unwrap_err();

    assert!(matches!(err, ClientError::Unauthorized { .. }));
}

#[tokio::test]
async fn balance_sends_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/accounts/me/balance"))
        .and(header("authorization", "Bearer jwt-token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "accountId": ACCOUNT_ID, "balance": 600 })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = XolborClient::new(server.uri()).unwrap();
    let balance = client.balance("jwt-token").await.unwrap();

    assert_eq!(balance.balance, 600);
}

#[tokio::test]
async fn list_items_sends_filters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/catalog/items"))
        .and(query_param("rarity", "legendary"))
        .and(query_param("limit", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{
                "id": 8,
                "name": "Robot",
                "price": 900,
                "rarity": "legendary",
                "category": "futuristic",
                "createdAt": "2026-01-01T00:00:00Z"
            }],
            "total": 1
        })))
        .mount(&server)
        .await;

    let client = XolborClient::new(server.uri()).unwrap();
    let page = client
        .list_items(&ItemQuery {
            rarity: Some(Rarity::Legendary),
            limit: Some(5),
            ..ItemQuery::default()
        })
        .await
        .unwrap();

    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].name, "Robot");
    assert_eq!(page.items[0].rarity, Rarity::Legendary);
}

#[tokio::test]
async fn purchase_returns_receipt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/purchases"))
        .and(header("authorization", "Bearer jwt-token"))
        .and(body_json(json!({ "itemId": 5 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "newBalance": 400,
            "itemId": 5,
            "transactionId": "01HZX3K9Q8W5V2T7R6P4N3M2L1"
        })))
        .mount(&server)
        .await;

    let client = XolborClient::new(server.uri()).unwrap();
    let receipt = client.purchase("jwt-token", 5).await.unwrap();

    assert_eq!(receipt.new_balance, 400);
    assert_eq!(receipt.item_id, 5);
}

#[tokio::test]
async fn purchase_rejections_are_typed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/purchases"))
        .and(body_json(json!({ "itemId": 7 })))
        .respond_with(ResponseTemplate::new(400).set_body_json(error_body_with_details(
            "InsufficientBalance",
            "not enough Xubor for this skin",
            json!({ "balance": 100, "required": 150 }),
        )))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/purchases"))
        .and(body_json(json!({ "itemId": 5 })))
        .respond_with(ResponseTemplate::new(400).set_body_json(error_body(
            "AlreadyOwned",
            "item 5 already owned",
        )))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/purchases"))
        .and(body_json(json!({ "itemId": 99 })))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(error_body("ItemNotFound", "item not found: 99")),
        )
        .mount(&server)
        .await;

    let client = XolborClient::new(server.uri()).unwrap();

    assert!(matches!(
        client.purchase("jwt-token", 7).await.unwrap_err(),
        ClientError::InsufficientBalance {
            balance: 100,
            required: 150
        }
    ));
    assert!(matches!(
        client.purchase("jwt-token", 5).await.unwrap_err(),
        ClientError::AlreadyOwned { .. }
    ));
    assert!(matches!(
        client.purchase("jwt-token", 99).await.unwrap_err(),
        ClientError::ItemNotFound { .. }
    ));
}

#[tokio::test]
async fn topup_sends_idempotency_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/topups"))
        .and(header("x-admin-key", "admin-key"))
        .and(body_json(json!({
            "accountId": ACCOUNT_ID,
            "amount": 500,
            "idempotencyKey": "pay_123"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "newBalance": 600,
            "transactionId": "01HZX3K9Q8W5V2T7R6P4N3M2L1",
            "replayed": true
        })))
        .mount(&server)
        .await;

    let client = XolborClient::new(server.uri()).unwrap();
    let receipt = client
        .topup("admin-key", ACCOUNT_ID, 500, "pay_123")
        .await
        .unwrap();

    assert_eq!(receipt.new_balance, 600);
    assert!(receipt.replayed);
}

#[tokio::test]
async fn topup_conflict_is_typed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/topups"))
        .respond_with(ResponseTemplate::new(409).set_body_json(error_body(
            "IdempotencyConflict",
            "idempotency key pay_123 was already used with a different amount",
        )))
        .mount(&server)
        .await;

    let client = XolborClient::new(server.uri()).unwrap();
    let err = client
        .topup("admin-key", ACCOUNT_ID, 900, "pay_123")
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::IdempotencyConflict { .. }));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn transactions_pass_paging() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/accounts/me/transactions"))
        .and(query_param("limit", "1"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "transactions": [{
                "id": "01HZX3K9Q8W5V2T7R6P4N3M2L1",
                "kind": "purchase",
                "amount": -600,
                "itemId": 5,
                "balanceAfter": 400,
                "idempotencyKey": null,
                "description": "Purchase of Astronaut",
                "createdAt": "2026-01-01T00:00:00Z"
            }],
            "hasMore": true
        })))
        .mount(&server)
        .await;

    let client = XolborClient::new(server.uri()).unwrap();
    let page = client.transactions("jwt-token", 1, 0).await.unwrap();

    assert!(page.has_more);
    assert_eq!(page.transactions[0].kind, TransactionKind::Purchase);
    assert_eq!(page.transactions[0].item_id, Some(5));
}

#[tokio::test]
async fn non_envelope_errors_are_generic() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/accounts/me/balance"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
        .mount(&server)
        .await;

    let client = XolborClient::new(server.uri()).unwrap();
    let err = client.balance("jwt-token").await.unwrap_err();

    assert!(matches!(err, ClientError::Api { status: 503, .. }));
    assert!(err.is_retryable());
}
