//! Xolbor HTTP client implementation.

use reqwest::{Client, RequestBuilder};
use std::time::Duration;

use crate::error::ClientError;
use crate::types::{
    ApiErrorResponse, Balance, ItemPage, ItemQuery, LoginRequest, PurchaseReceipt,
    PurchaseRequest, RegisterRequest, Session, TopupReceipt, TopupRequest, TransactionPage,
};

/// Header carrying the admin API key.
const ADMIN_KEY_HEADER: &str = "x-admin-key";

/// Xolbor API client.
///
/// Account-scoped calls take the bearer token returned by
/// [`XolborClient::register`] or [`XolborClient::login`].
#[derive(Debug, Clone)]
pub struct XolborClient {
    client: Client,
    base_url: String,
}

impl XolborClient {
    /// Create a new client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the Xolbor service (e.g., `"http://xolbor:8080"`)
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Configuration` if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::with_options(base_url, ClientOptions::default())
    }

    /// Create a new client with custom options.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Configuration` if the HTTP client cannot be built.
    pub fn with_options(
        base_url: impl Into<String>,
        options: ClientOptions,
    ) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_seconds))
            .user_agent(options.user_agent)
            .build()
            .map_err(|e| ClientError::Configuration(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Register an account. The session token is ready to use.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it.
    pub async fn register(&self, request: &RegisterRequest) -> Result<Session, ClientError> {
        let builder = self.client.post(self.url("/v1/accounts")).json(request);
        self.send(builder).await
    }

    /// Log in with a username or email.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Unauthorized` for wrong credentials.
    pub async fn login(&self, login: &str, password: &str) -> Result<Session, ClientError> {
        let builder = self
            .client
            .post(self.url("/v1/auth/login"))
            .json(&LoginRequest { login, password });
        self.send(builder).await
    }

    /// Get the account's balance.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it.
    pub async fn balance(&self, token: &str) -> Result<Balance, ClientError> {
        let builder = self
            .client
            .get(self.url("/v1/accounts/me/balance"))
            .bearer_auth(token);
        self.send(builder).await
    }

    /// List catalog items.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it.
    pub async fn list_items(&self, query: &ItemQuery) -> Result<ItemPage, ClientError> {
        let builder = self.client.get(self.url("/v1/catalog/items")).query(query);
        self.send(builder).await
    }

    /// Buy a skin.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientBalance`, `AlreadyOwned` or `ItemNotFound` when
    /// the ledger rejects the purchase.
    pub async fn purchase(&self, token: &str, item_id: u64) -> Result<PurchaseReceipt, ClientError> {
        let builder = self
            .client
            .post(self.url("/v1/purchases"))
            .bearer_auth(token)
            .json(&PurchaseRequest { item_id });
        self.send(builder).await
    }

    /// Credit Xubor to an account once per idempotency key (admin only).
    ///
    /// Safe to retry with the same key: a repeat returns the original
    /// transaction with `replayed` set.
    ///
    /// # Errors
    ///
    /// Returns `IdempotencyConflict` if the key was used with another amount,
    /// or `Unauthorized` if the admin key is rejected.
    pub async fn topup(
        &self,
        admin_key: &str,
        account_id: &str,
        amount: i64,
        idempotency_key: &str,
    ) -> Result<TopupReceipt, ClientError> {
        let builder = self
            .client
            .post(self.url("/v1/topups"))
            .header(ADMIN_KEY_HEADER, admin_key)
            .json(&TopupRequest {
                account_id,
                amount,
                idempotency_key,
            });
        self.send(builder).await
    }

    /// List the account's transactions, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it.
    pub async fn transactions(
        &self,
        token: &str,
        limit: usize,
        offset: usize,
    ) -> Result<TransactionPage, ClientError> {
        let builder = self
            .client
            .get(self.url("/v1/accounts/me/transactions"))
            .bearer_auth(token)
            .query(&[("limit", limit), ("offset", offset)]);
        self.send(builder).await
    }

    async fn send<T: serde::de::DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = builder.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response.json().await?);
        }

        let body = response.text().await?;
        match serde_json::from_str::<ApiErrorResponse>(&body) {
            Ok(api_error) => {
                tracing::debug!(
                    status = status.as_u16(),
                    code = %api_error.error,
                    "Xolbor API error"
                );
                Err(ClientError::from_api(
                    &api_error.error,
                    api_error.message,
                    api_error.details.as_ref(),
                    status.as_u16(),
                ))
            }
            Err(_) => Err(ClientError::Api {
                code: "unknown".to_string(),
                message: format!("HTTP {status}"),
                status: status.as_u16(),
            }),
        }
    }
}

/// Client options for customization.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Request timeout in seconds (default: 30).
    pub timeout_seconds: u64,
    /// User agent sent with every request.
    pub user_agent: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            user_agent: concat!("xolbor-client/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}
