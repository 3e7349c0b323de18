//! Top-up handler: idempotent Xubor credits from confirmed payments.

use std::sync::Arc;

use serde::Serialize;

use xolbor_core::{
    AccountId, LedgerError, LedgerOperation, Result, TransactionId, SIGNUP_BONUS_KEY,
};
use xolbor_store::Store;

use super::run_blocking;

/// Maximum idempotency key length in characters.
pub const IDEMPOTENCY_KEY_MAX_LEN: usize = 128;

/// Result of a top-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopupReceipt {
    /// Balance right after the credit.
    pub new_balance: i64,
    /// The top-up transaction.
    pub transaction_id: TransactionId,
    /// True if the key was seen before and nothing was credited this time.
    pub replayed: bool,
}

/// Credits Xubor to accounts.
#[derive(Clone)]
pub struct TopupHandler {
    store: Arc<dyn Store>,
}

impl TopupHandler {
    /// Create the handler.
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Credit `amount` to `account_id` once per `idempotency_key`.
    ///
    /// Repeating a key with the same amount returns the original transaction
    /// and its balance without crediting again.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a bad key, `InvalidAmount` for a non-positive
    /// amount or overflow, `IdempotencyConflict` if the key was used with a
    /// different amount, and `AccountNotFound`.
    pub async fn topup(
        &self,
        account_id: AccountId,
        amount: i64,
        idempotency_key: &str,
    ) -> Result<TopupReceipt> {
        validate_idempotency_key(idempotency_key)?;

        let operation = LedgerOperation::Topup {
            amount,
            idempotency_key: idempotency_key.to_string(),
        };
        let result = run_blocking(&self.store, move |store| {
            store.run_transaction(&account_id, &operation)
        })
        .await;

        let committed = match result {
            Ok(committed) => committed,
            Err(e) => {
                tracing::warn!(
                    account_id = %account_id,
                    amount,
                    idempotency_key,
                    error = e.code(),
                    "Top-up rejected"
                );
                return Err(e);
            }
        };

        let receipt = TopupReceipt {
            new_balance: committed.new_balance(),
            transaction_id: committed.transaction.id,
            replayed: committed.replayed,
        };

        if receipt.replayed {
            tracing::debug!(
                account_id = %account_id,
                idempotency_key,
                transaction_id = %receipt.transaction_id,
                "Top-up replayed"
            );
        } else {
            tracing::info!(
                account_id = %account_id,
                amount,
                new_balance = receipt.new_balance,
                transaction_id = %receipt.transaction_id,
                "Top-up committed"
            );
        }
        Ok(receipt)
    }
}

fn validate_idempotency_key(key: &str) -> Result<()> {
    if key.trim().is_empty() {
        return Err(LedgerError::Validation("idempotency key is required".into()));
    }
    if key.chars().count() > IDEMPOTENCY_KEY_MAX_LEN {
        return Err(LedgerError::Validation(format!(
            "idempotency key must be at most {IDEMPOTENCY_KEY_MAX_LEN} characters"
        )));
    }
    if key.chars().any(char::is_control) {
        return Err(LedgerError::Validation(
            "idempotency key must not contain control characters".into(),
        ));
    }
    // Reserved for the opening credit.
    if key == SIGNUP_BONUS_KEY {
        return Err(LedgerError::Validation(format!(
            "idempotency key {SIGNUP_BONUS_KEY:?} is reserved"
        )));
    }
    Ok(())
}
