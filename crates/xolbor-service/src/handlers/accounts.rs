//! Account, login and wallet handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use xolbor_core::{Account, ItemId, LedgerTransaction};

use super::catalog::ItemResponse;
use crate::auth::AuthAccount;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::services::{InventoryEntry, Reconciliation, RegisterAccount};
use crate::state::AppState;

/// Default page size for transaction history.
const DEFAULT_TRANSACTIONS_LIMIT: usize = 20;

/// Largest page of transaction history.
const MAX_TRANSACTIONS_LIMIT: usize = 100;

/// Account response. Never includes the credential.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    /// Account ID.
    pub id: String,
    /// Username.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Current Xubor balance.
    pub balance: i64,
    /// Created timestamp.
    pub created_at: String,
}

impl From<&Account> for AccountResponse {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id.to_string(),
            username: account.username.clone(),
            email: account.email.clone(),
            balance: account.balance,
            created_at: account.created_at.to_rfc3339(),
        }
    }
}

/// Response of register and login.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    /// The account.
    pub account: AccountResponse,
    /// Bearer access token.
    pub token: String,
    /// When the token expires.
    pub expires_at: String,
}

fn session(state: &AppState, account: &Account) -> Result<SessionResponse, ApiError> {
    let issued = state
        .tokens
        .issue(&account.id)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(SessionResponse {
        account: AccountResponse::from(account),
        token: issued.token,
        expires_at: issued.expires_at.to_rfc3339(),
    })
}

/// Registration request.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    /// Desired username.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Password.
    pub password: String,
}

/// Register a new account.
pub async fn register(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    let account = state
        .accounts
        .register(RegisterAccount {
            username: body.username,
            email: body.email,
            password: body.password,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(session(&state, &account)?)))
}

/// Login request. `login` is a username or an email address.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Username or email.
    #[serde(alias = "username", alias = "email")]
    pub login: String,
    /// Password.
    pub password: String,
}

/// Exchange credentials for an access token.
pub async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let account = state
        .accounts
        .authenticate(&body.login, &body.password)
        .await?;

    Ok(Json(session(&state, &account)?))
}

/// Username availability response.
#[derive(Debug, Serialize)]
pub struct UsernameAvailability {
    /// The username as requested, trimmed.
    pub username: String,
    /// Whether it can be registered.
    pub available: bool,
}

/// Check whether a username is free.
pub async fn check_username(
    State(state): State<Arc<AppState>>,
    ApiPath(username): ApiPath<String>,
) -> Result<Json<UsernameAvailability>, ApiError> {
    let available = state.accounts.username_available(&username).await?;
    Ok(Json(UsernameAvailability {
        username: username.trim().to_string(),
        available,
    }))
}

/// Get the current account.
pub async fn get_account(
    State(state): State<Arc<AppState>>,
    auth: AuthAccount,
) -> Result<Json<AccountResponse>, ApiError> {
    let account = state.accounts.get_account(auth.account_id).await?;
    Ok(Json(AccountResponse::from(&account)))
}

/// Balance response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    /// Account ID.
    pub account_id: String,
    /// Current Xubor balance.
    pub balance: i64,
}

/// Get the current balance.
pub async fn get_balance(
    State(state): State<Arc<AppState>>,
    auth: AuthAccount,
) -> Result<Json<BalanceResponse>, ApiError> {
    let balance = state.accounts.get_balance(auth.account_id).await?;
    Ok(Json(BalanceResponse {
        account_id: auth.account_id.to_string(),
        balance,
    }))
}

/// One owned skin.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    /// The catalog item.
    #[serde(flatten)]
    pub item: ItemResponse,
    /// When it was bought.
    pub acquired_at: String,
    /// The purchase transaction.
    pub transaction_id: String,
}

impl From<&InventoryEntry> for InventoryItem {
    fn from(entry: &InventoryEntry) -> Self {
        Self {
            item: ItemResponse::from(&entry.item),
            acquired_at: entry.acquired_at.to_rfc3339(),
            transaction_id: entry.transaction_id.to_string(),
        }
    }
}

/// Inventory response.
#[derive(Debug, Serialize)]
pub struct InventoryResponse {
    /// Owned skins.
    pub items: Vec<InventoryItem>,
}

/// List the skins the current account owns.
pub async fn get_inventory(
    State(state): State<Arc<AppState>>,
    auth: AuthAccount,
) -> Result<Json<InventoryResponse>, ApiError> {
    let entries = state.accounts.inventory(auth.account_id).await?;
    Ok(Json(InventoryResponse {
        items: entries.iter().map(InventoryItem::from).collect(),
    }))
}

/// Transaction response.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    /// Transaction ID.
    pub id: String,
    /// `purchase` or `topup`.
    pub kind: String,
    /// Signed amount in Xubor.
    pub amount: i64,
    /// Purchased item, for purchases.
    pub item_id: Option<u64>,
    /// Balance after the transaction.
    pub balance_after: i64,
    /// Idempotency key, for top-ups.
    pub idempotency_key: Option<String>,
    /// Description.
    pub description: String,
    /// Created timestamp.
    pub created_at: String,
}

impl From<&LedgerTransaction> for TransactionResponse {
    fn from(tx: &LedgerTransaction) -> Self {
        Self {
            id: tx.id.to_string(),
            kind: tx.kind.as_str().to_string(),
            amount: tx.amount,
            item_id: tx.item_id.map(ItemId::get),
            balance_after: tx.balance_after,
            idempotency_key: tx.idempotency_key.clone(),
            description: tx.description.clone(),
            created_at: tx.created_at.to_rfc3339(),
        }
    }
}

/// Transaction history query.
#[derive(Debug, Default, Deserialize)]
pub struct TransactionsQuery {
    /// Page size.
    pub limit: Option<usize>,
    /// Transactions to skip.
    pub offset: Option<usize>,
}

/// Transaction history response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionsResponse {
    /// Transactions, newest first.
    pub transactions: Vec<TransactionResponse>,
    /// Whether older transactions exist.
    pub has_more: bool,
}

/// List the current account's transactions, newest first.
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    auth: AuthAccount,
    ApiQuery(query): ApiQuery<TransactionsQuery>,
) -> Result<Json<TransactionsResponse>, ApiError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_TRANSACTIONS_LIMIT)
        .clamp(1, MAX_TRANSACTIONS_LIMIT);
    let offset = query.offset.unwrap_or(0);

    // One extra row tells whether there is another page.
    let mut transactions = state
        .accounts
        .transactions(auth.account_id, limit + 1, offset)
        .await?;
    let has_more = transactions.len() > limit;
    transactions.truncate(limit);

    Ok(Json(TransactionsResponse {
        transactions: transactions.iter().map(TransactionResponse::from).collect(),
        has_more,
    }))
}

/// Reconciliation response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationResponse {
    /// Account ID.
    pub account_id: String,
    /// The report.
    #[serde(flatten)]
    pub report: Reconciliation,
}

/// Compare the current balance with the transaction history.
pub async fn get_reconciliation(
    State(state): State<Arc<AppState>>,
    auth: AuthAccount,
) -> Result<Json<ReconciliationResponse>, ApiError> {
    let report = state.accounts.reconcile(auth.account_id).await?;
    Ok(Json(ReconciliationResponse {
        account_id: auth.account_id.to_string(),
        report,
    }))
}
