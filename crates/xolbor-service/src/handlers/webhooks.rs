//! Payment provider webhook.
//!
//! A confirmed payment credits Xubor through the top-up handler, using the
//! payment reference as the idempotency key so provider retries never credit
//! twice.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use xolbor_core::AccountId;

use super::topups::TopupResponse;
use crate::crypto::{verify_signature, SIGNATURE_HEADER};
use crate::error::ApiError;
use crate::state::AppState;

/// Event type that credits an account.
pub const PAYMENT_SUCCEEDED: &str = "payment.succeeded";

/// Payment confirmation payload.
#[derive(Debug, Deserialize)]
pub struct PaymentEvent {
    /// Payment reference, unique per payment.
    pub id: String,
    /// Event type.
    #[serde(rename = "type")]
    pub event_type: String,
    /// The account to credit.
    #[serde(default, alias = "accountId")]
    pub account_id: Option<AccountId>,
    /// Xubor to credit.
    #[serde(default)]
    pub amount: Option<i64>,
}

/// Webhook response.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    /// Whether the webhook was accepted.
    pub received: bool,
    /// The resulting top-up, for payment confirmations.
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub topup: Option<TopupResponse>,
}

/// Handle a payment provider webhook.
pub async fn payment_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<WebhookResponse>, ApiError> {
    if let Some(secret) = &state.config.payment_webhook_secret {
        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                tracing::warn!("Payment webhook without signature");
                ApiError::Unauthorized
            })?;

        verify_signature(
            secret,
            signature,
            &body,
            chrono::Utc::now().timestamp(),
            state.config.webhook_tolerance_seconds,
        )
        .map_err(|e| {
            tracing::warn!(error = %e, "Invalid payment webhook signature");
            ApiError::Unauthorized
        })?;
    }

    let event: PaymentEvent =
        serde_json::from_str(&body).map_err(|e| ApiError::Validation(e.to_string()))?;

    tracing::info!(
        event_type = %event.event_type,
        event_id = %event.id,
        "Received payment webhook"
    );

    if event.event_type != PAYMENT_SUCCEEDED {
        tracing::debug!(event_type = %event.event_type, "Ignoring payment event");
        return Ok(Json(WebhookResponse {
            received: true,
            topup: None,
        }));
    }

    let account_id = event
        .account_id
        .ok_or_else(|| ApiError::Validation("account_id is required".into()))?;
    let amount = event
        .amount
        .ok_or_else(|| ApiError::Validation("amount is required".into()))?;

    let receipt = state.topups.topup(account_id, amount, &event.id).await?;

    Ok(Json(WebhookResponse {
        received: true,
        topup: Some(receipt.into()),
    }))
}
