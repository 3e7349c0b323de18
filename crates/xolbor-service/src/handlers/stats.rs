//! Platform and per-account statistics.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::auth::AuthAccount;
use crate::error::ApiError;
use crate::services::{run_blocking, AccountStats};
use crate::state::AppState;

/// Platform counts.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    /// Registered accounts.
    pub accounts: u64,
    /// Catalog items.
    pub items: u64,
}

/// Get platform counts.
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Result<Json<StatsResponse>, ApiError> {
    let (accounts, items) = run_blocking(&state.store, |store| {
        Ok((store.account_count()?, store.item_count()?))
    })
    .await?;

    Ok(Json(StatsResponse { accounts, items }))
}

/// Per-account statistics.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountStatsResponse {
    /// Account ID.
    pub account_id: String,
    /// The summary.
    #[serde(flatten)]
    pub stats: AccountStats,
}

/// Get the current account's statistics.
pub async fn get_account_stats(
    State(state): State<Arc<AppState>>,
    auth: AuthAccount,
) -> Result<Json<AccountStatsResponse>, ApiError> {
    let stats = state.accounts.stats(auth.account_id).await?;
    Ok(Json(AccountStatsResponse {
        account_id: auth.account_id.to_string(),
        stats,
    }))
}
