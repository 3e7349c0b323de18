//! Application state.

use std::sync::Arc;

use xolbor_store::{MemoryStore, Store, StoreError};

use crate::config::{ServiceConfig, StoreBackend};
use crate::credentials::{Argon2Credentials, CredentialProvider};
use crate::services::{AccountService, CatalogService, PurchaseEngine, TopupHandler};
use crate::tokens::TokenIssuer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The ledger store.
    pub store: Arc<dyn Store>,

    /// Service configuration.
    pub config: ServiceConfig,

    /// Access token issuer.
    pub tokens: TokenIssuer,

    /// Registration, login and account reads.
    pub accounts: AccountService,

    /// Skin catalog.
    pub catalog: CatalogService,

    /// Skin purchases.
    pub purchases: PurchaseEngine,

    /// Xubor top-ups.
    pub topups: TopupHandler,
}

impl AppState {
    /// Create a new application state with Argon2id credentials.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, config: ServiceConfig) -> Self {
        Self::with_credentials(store, config, Arc::new(Argon2Credentials::new()))
    }

    /// Create a new application state with a custom credential provider.
    #[must_use]
    pub fn with_credentials(
        store: Arc<dyn Store>,
        config: ServiceConfig,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        if config.admin_api_key.is_none() {
            tracing::warn!("ADMIN_API_KEY not configured - catalog management is disabled");
        }
        if config.payment_webhook_secret.is_none() {
            tracing::warn!("PAYMENT_WEBHOOK_SECRET not configured - webhook signatures are not checked");
        }

        Self {
            tokens: TokenIssuer::from_config(&config),
            accounts: AccountService::new(Arc::clone(&store), credentials, config.starting_bonus),
            catalog: CatalogService::new(Arc::clone(&store)),
            purchases: PurchaseEngine::new(Arc::clone(&store)),
            topups: TopupHandler::new(Arc::clone(&store)),
            store,
            config,
        }
    }
}

/// Open the configured ledger store.
///
/// # Errors
///
/// Returns an error if the database cannot be opened, or if `RocksDB` was
/// requested from a build without the `rocksdb-backend` feature.
pub fn open_store(config: &ServiceConfig) -> Result<Arc<dyn Store>, StoreError> {
    match config.store_backend {
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory ledger store - data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        #[cfg(feature = "rocksdb-backend")]
        StoreBackend::Rocksdb => {
            tracing::info!(path = %config.data_dir, "Opening RocksDB store");
            Ok(Arc::new(xolbor_store::RocksStore::open(&config.data_dir)?))
        }
        #[cfg(not(feature = "rocksdb-backend"))]
        StoreBackend::Rocksdb => Err(StoreError::Database(
            "this build does not include the rocksdb-backend feature".into(),
        )),
    }
}
