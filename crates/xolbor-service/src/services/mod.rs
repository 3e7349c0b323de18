//! Ledger services.
//!
//! Services are stateless orchestrators over the shared [`Store`]. Store calls
//! block, so they run on tokio's blocking pool; a blocking task runs to
//! completion even if the request that started it is dropped, so a commit is
//! never cut short by a client timeout.

pub mod accounts;
pub mod catalog;
pub mod purchase;
pub mod topup;

pub use accounts::{
    AccountService, AccountStats, InventoryEntry, Reconciliation, RegisterAccount,
};
pub use catalog::{CatalogFilter, CatalogPage, CatalogService, NewItem};
pub use purchase::{PurchaseEngine, PurchaseReceipt};
pub use topup::{TopupHandler, TopupReceipt};

use std::sync::Arc;

use xolbor_core::LedgerError;
use xolbor_store::Store;

/// Run a blocking store call on the blocking pool.
///
/// # Errors
///
/// Returns the call's ledger rejection, or `StoreUnavailable` for storage
/// failures and a panicked task.
pub async fn run_blocking<T, F>(store: &Arc<dyn Store>, f: F) -> Result<T, LedgerError>
where
    T: Send + 'static,
    F: FnOnce(&dyn Store) -> xolbor_store::Result<T> + Send + 'static,
{
    let store = Arc::clone(store);
    tokio::task::spawn_blocking(move || f(store.as_ref()))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Blocking store task failed");
            LedgerError::StoreUnavailable("the ledger store is temporarily unavailable".into())
        })?
        .map_err(LedgerError::from)
}
