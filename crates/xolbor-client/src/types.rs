//! Request and response types for the Xolbor client.

use serde::{Deserialize, Serialize};

pub use xolbor_core::Rarity;

/// Registration request.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    /// Desired username.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Password.
    pub password: String,
}

/// Login request.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub login: &'a str,
    pub password: &'a str,
}

/// An account as returned by the API.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Account ID.
    pub id: String,
    /// Username.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Xubor balance when the response was built.
    pub balance: i64,
    /// Created timestamp (RFC 3339).
    pub created_at: String,
}

/// Result of register or login.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// The account.
    pub account: Account,
    /// Bearer access token.
    pub token: String,
    /// Token expiry (RFC 3339).
    pub expires_at: String,
}

/// Balance response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Balance {
    /// Account ID.
    pub account_id: String,
    /// Current Xubor balance.
    pub balance: i64,
}

/// A catalog item.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Item ID.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// Price in Xubor.
    pub price: i64,
    /// Rarity tier.
    pub rarity: Rarity,
    /// Category, if any.
    #[serde(default)]
    pub category: Option<String>,
    /// Created timestamp (RFC 3339).
    pub created_at: String,
}

/// Catalog listing filter.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ItemQuery {
    /// Only items of this rarity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rarity: Option<Rarity>,
    /// Name substring.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    /// Page size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    /// Items to skip.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
}

/// One page of the catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemPage {
    /// Items on this page.
    pub items: Vec<Item>,
    /// Items matching the filter.
    pub total: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PurchaseRequest {
    pub item_id: u64,
}

/// A committed purchase.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseReceipt {
    /// Balance after the debit.
    pub new_balance: i64,
    /// The purchased item.
    pub item_id: u64,
    /// The purchase transaction.
    pub transaction_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TopupRequest<'a> {
    pub account_id: &'a str,
    pub amount: i64,
    pub idempotency_key: &'a str,
}

/// A committed (or replayed) top-up.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopupReceipt {
    /// Balance right after the credit.
    pub new_balance: i64,
    /// The top-up transaction.
    pub transaction_id: String,
    /// True if the key had already been credited.
    pub replayed: bool,
}

/// Transaction kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Skin purchase.
    Purchase,
    /// Xubor credit.
    Topup,
}

/// A ledger transaction.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Transaction ID.
    pub id: String,
    /// Kind.
    pub kind: TransactionKind,
    /// Signed amount in Xubor.
    pub amount: i64,
    /// Purchased item, for purchases.
    #[serde(default)]
    pub item_id: Option<u64>,
    /// Balance after the transaction.
    pub balance_after: i64,
    /// Idempotency key, for top-ups.
    #[serde(default)]
    pub idempotency_key: Option<String>,
    /// Description.
    pub description: String,
    /// Created timestamp (RFC 3339).
    pub created_at: String,
}

/// One page of transaction history, newest first.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPage {
    /// Transactions.
    pub transactions: Vec<Transaction>,
    /// Whether older transactions exist.
    pub has_more: bool,
}

/// Error envelope returned by the API.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(default)]
    pub details: Option<serde_json::Value>,
}
