//! Authentication extractors.
//!
//! This module provides extractors for:
//! - `AuthAccount` - Player authentication via bearer access token
//! - `AdminAuth` - Admin authentication for catalog management

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use xolbor_core::AccountId;

use crate::crypto::constant_time_eq;
use crate::error::ApiError;
use crate::state::AppState;
use crate::tokens::TokenError;

/// An authenticated account extracted from a bearer token.
#[derive(Debug, Clone, Copy)]
pub struct AuthAccount {
    /// The account ID.
    pub account_id: AccountId,
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for AuthAccount {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        // Extract the Authorization header
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        // Extract the Bearer token
        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::Unauthorized)?;

        // Allow test tokens in testing only.
        // This bypass is gated behind #[cfg(test)] or the "test-auth" feature
        // to ensure it is never active in production builds.
        #[cfg(any(test, feature = "test-auth"))]
        if let Some(account_id) = token.strip_prefix("test-token:") {
            let account_id = account_id
                .parse::<AccountId>()
                .map_err(|_| ApiError::Unauthorized)?;

            return Ok(Self { account_id });
        }

        let account_id = state.tokens.verify(token).map_err(|e| {
            match e {
                TokenError::Expired => tracing::debug!("Expired access token"),
                _ => tracing::debug!(error = %e, "Access token rejected"),
            }
            ApiError::Unauthorized
        })?;

        Ok(Self { account_id })
    }
}

/// Admin authentication via API key.
///
/// Requires the `X-Admin-Key` header to match the configured admin key.
#[derive(Debug, Clone)]
pub struct AdminAuth {
    /// Admin identifier (for audit logging).
    pub admin_id: String,
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for AdminAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let admin_key = parts
            .headers
            .get("x-admin-key")
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        let expected_key = state
            .config
            .admin_api_key
            .as_ref()
            .ok_or(ApiError::Unauthorized)?;

        if !constant_time_eq(admin_key, expected_key) {
            tracing::warn!("Rejected admin request with wrong key");
            return Err(ApiError::Unauthorized);
        }

        let admin_id = parts
            .headers
            .get("x-admin-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("admin")
            .to_string();

        tracing::info!(admin_id = %admin_id, "Admin authenticated");

        Ok(Self { admin_id })
    }
}
