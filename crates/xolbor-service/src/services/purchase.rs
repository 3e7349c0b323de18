//! Purchase engine.
//!
//! A purchase is a single [`LedgerOperation::Purchase`] committed by the store
//! under the buyer's account lock. The item lookup, the ownership check and the
//! balance check all happen inside that unit, so two concurrent requests can
//! never both pass a check the other invalidates.

use std::sync::Arc;

use serde::Serialize;

use xolbor_core::{AccountId, ItemId, LedgerOperation, Result, TransactionId};
use xolbor_store::Store;

use super::run_blocking;

/// Result of a committed purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseReceipt {
    /// Balance after the debit.
    pub new_balance: i64,
    /// The purchase transaction.
    pub transaction_id: TransactionId,
    /// The purchased item.
    pub item_id: ItemId,
}

/// Buys skins with Xubor.
#[derive(Clone)]
pub struct PurchaseEngine {
    store: Arc<dyn Store>,
}

impl PurchaseEngine {
    /// Create the engine.
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Buy `item_id` for `account_id`.
    ///
    /// No retries happen here; a rejected purchase has written nothing.
    ///
    /// # Errors
    ///
    /// Returns, in check order, `AccountNotFound`, `ItemNotFound`,
    /// `AlreadyOwned` or `InsufficientBalance`.
    pub async fn purchase(&self, account_id: AccountId, item_id: ItemId) -> Result<PurchaseReceipt> {
        let operation = LedgerOperation::Purchase { item_id };
        let result = run_blocking(&self.store, move |store| {
            store.run_transaction(&account_id, &operation)
        })
        .await;

        match result {
            Ok(committed) => {
                let receipt = PurchaseReceipt {
                    new_balance: committed.new_balance(),
                    transaction_id: committed.transaction.id,
                    item_id,
                };
                tracing::info!(
                    account_id = %account_id,
                    item_id = %item_id,
                    amount = committed.transaction.amount,
                    new_balance = receipt.new_balance,
                    transaction_id = %receipt.transaction_id,
                    "Purchase committed"
                );
                Ok(receipt)
            }
            Err(e) => {
                tracing::warn!(
                    account_id = %account_id,
                    item_id = %item_id,
                    error = e.code(),
                    "Purchase rejected"
                );
                Err(e)
            }
        }
    }
}
