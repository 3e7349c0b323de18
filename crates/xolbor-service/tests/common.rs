//! Common test utilities for xolbor integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use argon2::Params;
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::Router;
use axum_test::{TestResponse, TestServer};
use serde_json::{json, Value};

use xolbor_core::AccountId;
use xolbor_service::crypto::sign_payload;
use xolbor_service::{create_router, AppState, Argon2Credentials, ServiceConfig, TokenIssuer};
use xolbor_store::{MemoryStore, Store};

pub const ADMIN_KEY: &str = "test-admin-key";
pub const WEBHOOK_SECRET: &str = "whsec_test";
pub const PASSWORD: &str = "correct horse battery";

/// A registered account and its bearer token.
pub struct TestAccount {
    pub id: AccountId,
    pub username: String,
    pub token: String,
}

impl TestAccount {
    pub fn bearer(&self) -> HeaderValue {
        bearer(&self.token)
    }
}

pub fn bearer(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("Bearer {token}")).unwrap()
}

pub fn admin_key_header() -> HeaderName {
    HeaderName::from_static("x-admin-key")
}

pub fn signature_header() -> HeaderName {
    HeaderName::from_static(xolbor_service::crypto::SIGNATURE_HEADER)
}

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// Direct access to the ledger store.
    pub store: Arc<dyn Store>,
    /// Issues tokens for arbitrary account IDs.
    pub tokens: TokenIssuer,
}

impl TestHarness {
    /// Create a harness over a fresh in-memory store with the default catalog.
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    pub async fn with_config(config: ServiceConfig) -> Self {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let credentials = Arc::new(Argon2Credentials::with_params(
            Params::new(1024, 1, 1, None).expect("argon2 params"),
        ));
        let state = AppState::with_credentials(Arc::clone(&store), config, credentials);
        state
            .catalog
            .seed_default_catalog()
            .await
            .expect("Failed to seed catalog");

        let tokens = state.tokens.clone();
        let router: Router = create_router(state);
        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            store,
            tokens,
        }
    }

    /// Register an account through the API.
    pub async fn register(&self, username: &str) -> TestAccount {
        let response = self
            .server
            .post("/v1/accounts")
            .json(&json!({
                "username": username,
                "email": format!("{username}@example.com"),
                "password": PASSWORD,
            }))
            .await;
        response.assert_status(StatusCode::CREATED);

        let body: Value = response.json();
        TestAccount {
            id: body["account"]["id"]
                .as_str()
                .expect("account id")
                .parse()
                .expect("uuid"),
            username: username.to_string(),
            token: body["token"].as_str().expect("token").to_string(),
        }
    }

    /// Register an account and top it up to `balance`.
    pub async fn funded_account(&self, username: &str, balance: i64) -> TestAccount {
        let account = self.register(username).await;
        let current = self.store.get_account_balance(&account.id).unwrap();
        if balance > current {
            self.admin_topup(&account.id, balance - current, &format!("fund-{username}"))
                .await
                .assert_status_ok();
        }
        account
    }

    /// Credit an account through the admin top-up route.
    pub async fn admin_topup(
        &self,
        account_id: &AccountId,
        amount: i64,
        key: &str,
    ) -> TestResponse {
        self.server
            .post("/v1/topups")
            .add_header(admin_key_header(), HeaderValue::from_static(ADMIN_KEY))
            .json(&json!({
                "accountId": account_id.to_string(),
                "amount": amount,
                "idempotencyKey": key,
            }))
            .await
    }

    /// Bearer header for an account that may not exist.
    pub fn bearer_for(&self, account_id: &AccountId) -> HeaderValue {
        bearer(&self.tokens.issue(account_id).unwrap().token)
    }

    pub fn balance(&self, account: &TestAccount) -> i64 {
        self.store.get_account_balance(&account.id).unwrap()
    }
}

pub fn test_config() -> ServiceConfig {
    ServiceConfig {
        listen_addr: "127.0.0.1:0".into(),
        jwt_secret: Some("test-jwt-secret".into()),
        admin_api_key: Some(ADMIN_KEY.into()),
        payment_webhook_secret: Some(WEBHOOK_SECRET.into()),
        cors_origins: vec!["*".into()],
        ..ServiceConfig::default()
    }
}

/// Signature header for a webhook body signed now.
pub fn sign(body: &str) -> String {
    sign_payload(WEBHOOK_SECRET, chrono::Utc::now().timestamp(), body).unwrap()
}
