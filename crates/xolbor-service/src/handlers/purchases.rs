//! Skin purchase handler.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use xolbor_core::ItemId;

use crate::auth::AuthAccount;
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::state::AppState;

/// Purchase request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRequest {
    /// The skin to buy.
    pub item_id: ItemId,
}

/// Purchase response.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseResponse {
    /// Always true; failures use the error envelope.
    pub success: bool,
    /// Balance after the debit.
    pub new_balance: i64,
    /// The purchased skin.
    pub item_id: u64,
    /// The purchase transaction.
    pub transaction_id: String,
}

/// Buy a skin for the current account.
pub async fn purchase(
    State(state): State<Arc<AppState>>,
    auth: AuthAccount,
    ApiJson(body): ApiJson<PurchaseRequest>,
) -> Result<Json<PurchaseResponse>, ApiError> {
    let receipt = state
        .purchases
        .purchase(auth.account_id, body.item_id)
        .await?;

    Ok(Json(PurchaseResponse {
        success: true,
        new_balance: receipt.new_balance,
        item_id: receipt.item_id.get(),
        transaction_id: receipt.transaction_id.to_string(),
    }))
}
