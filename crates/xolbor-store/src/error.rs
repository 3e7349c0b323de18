//! Error types for Xolbor storage.

use xolbor_core::LedgerError;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The operation was rejected by a ledger rule; nothing was written.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl StoreError {
    /// The ledger rejection, if this is one.
    #[must_use]
    pub const fn as_ledger(&self) -> Option<&LedgerError> {
        match self {
            Self::Ledger(err) => Some(err),
            Self::Database(_) | Self::Serialization(_) => None,
        }
    }
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Ledger(err) => err,
            other => {
                tracing::error!(error = %other, "ledger store failure");
                Self::StoreUnavailable("the ledger store is temporarily unavailable".into())
            }
        }
    }
}
