//! Error types for the Xolbor ledger.

use crate::ids::{AccountId, IdError, ItemId};

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors that can occur in ledger operations.
///
/// Every variant except `StoreUnavailable` is a precondition failure detected
/// before anything is written.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// Account not found.
    #[error("account not found: {account_id}")]
    AccountNotFound {
        /// The account ID that was not found.
        account_id: AccountId,
    },

    /// Catalog item not found.
    #[error("item not found: {item_id}")]
    ItemNotFound {
        /// The item ID that was not found.
        item_id: ItemId,
    },

    /// Username is already registered.
    #[error("username already taken: {username}")]
    DuplicateUsername {
        /// The conflicting username.
        username: String,
    },

    /// Email is already registered.
    #[error("email already registered: {email}")]
    DuplicateEmail {
        /// The conflicting email.
        email: String,
    },

    /// Account already exists.
    #[error("account already exists: {account_id}")]
    AccountAlreadyExists {
        /// The account ID that already exists.
        account_id: AccountId,
    },

    /// The account already owns the item.
    #[error("item {item_id} already owned by {account_id}")]
    AlreadyOwned {
        /// The purchasing account.
        account_id: AccountId,
        /// The item already in its inventory.
        item_id: ItemId,
    },

    /// Balance too low for the debit.
    #[error("insufficient balance: balance={balance}, required={required}")]
    InsufficientBalance {
        /// Current balance.
        balance: i64,
        /// Required amount.
        required: i64,
    },

    /// Invalid credit amount.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Item rejected at catalog registration.
    #[error("invalid item: {0}")]
    InvalidItem(String),

    /// Catalog item ID already in use.
    #[error("item already exists: {item_id}")]
    ItemAlreadyExists {
        /// The item ID already in use.
        item_id: ItemId,
    },

    /// Idempotency key reused with different parameters.
    #[error("idempotency key {key} was already used with a different amount")]
    IdempotencyConflict {
        /// The reused key.
        key: String,
    },

    /// Malformed or missing request field.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Login or password did not match.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Persistence layer failure.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// Invalid identifier.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] IdError),
}

impl LedgerError {
    /// Stable machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::AccountNotFound { .. } => "AccountNotFound",
            Self::ItemNotFound { .. } => "ItemNotFound",
            Self::DuplicateUsername { .. } => "DuplicateUsername",
            Self::DuplicateEmail { .. } => "DuplicateEmail",
            Self::AccountAlreadyExists { .. } => "AccountAlreadyExists",
            Self::AlreadyOwned { .. } => "AlreadyOwned",
            Self::InsufficientBalance { .. } => "InsufficientBalance",
            Self::InvalidAmount(_) => "InvalidAmount",
            Self::InvalidItem(_) => "InvalidItem",
            Self::ItemAlreadyExists { .. } => "ItemAlreadyExists",
            Self::IdempotencyConflict { .. } => "IdempotencyConflict",
            Self::Validation(_) | Self::InvalidId(_) => "ValidationError",
            Self::InvalidCredentials => "InvalidCredentials",
            Self::StoreUnavailable(_) => "StoreUnavailable",
        }
    }

    /// Whether retrying the same request later might succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        let item_id = ItemId::new(5).unwrap();
        assert_eq!(LedgerError::ItemNotFound { item_id }.code(), "ItemNotFound");
        assert_eq!(
            LedgerError::InsufficientBalance {
                balance: 100,
                required: 150
            }
            .code(),
            "InsufficientBalance"
        );
        assert_eq!(
            LedgerError::InvalidId(IdError::InvalidUuid).code(),
            "ValidationError"
        );
    }

    #[test]
    fn only_store_failures_are_retryable() {
        assert!(LedgerError::StoreUnavailable("io".into()).is_retryable());
        assert!(!LedgerError::InvalidAmount("zero".into()).is_retryable());
    }
}
