//! Top-up handler.
//!
//! Players are credited by the signed payment webhook. This route lets an
//! operator credit an account directly, e.g. to replay a payment by hand.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use xolbor_core::AccountId;

use crate::auth::AdminAuth;
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::services::TopupReceipt;
use crate::state::AppState;

/// Top-up request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopupRequest {
    /// The account to credit.
    pub account_id: AccountId,
    /// Xubor to credit.
    pub amount: i64,
    /// Caller-chosen de-duplication key, e.g. the payment reference.
    pub idempotency_key: String,
}

/// Top-up response.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopupResponse {
    /// Always true; failures use the error envelope.
    pub success: bool,
    /// Balance right after the credit.
    pub new_balance: i64,
    /// The top-up transaction.
    pub transaction_id: String,
    /// True if this key was already credited.
    pub replayed: bool,
}

impl From<TopupReceipt> for TopupResponse {
    fn from(receipt: TopupReceipt) -> Self {
        Self {
            success: true,
            new_balance: receipt.new_balance,
            transaction_id: receipt.transaction_id.to_string(),
            replayed: receipt.replayed,
        }
    }
}

/// Credit Xubor to an account (admin only).
pub async fn topup(
    State(state): State<Arc<AppState>>,
    admin: AdminAuth,
    ApiJson(body): ApiJson<TopupRequest>,
) -> Result<Json<TopupResponse>, ApiError> {
    let receipt = state
        .topups
        .topup(body.account_id, body.amount, &body.idempotency_key)
        .await?;

    tracing::info!(
        admin_id = %admin.admin_id,
        account_id = %body.account_id,
        amount = body.amount,
        replayed = receipt.replayed,
        "Top-up by admin"
    );

    Ok(Json(receipt.into()))
}
