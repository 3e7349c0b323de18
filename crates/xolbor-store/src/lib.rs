//! Ledger storage for Xolbor.
//!
//! This crate owns every persistent record of the ledger: accounts, catalog
//! items, ownership records and the append-only transaction log.
//!
//! # Atomicity
//!
//! Balance changes go through [`Store::run_transaction`]. Each backend runs the
//! whole read-check-write sequence under the account's lock from
//! [`AccountLocks`] and persists the result in one atomic write, so concurrent
//! operations on one account serialize while different accounts proceed in
//! parallel.
//!
//! # Backends
//!
//! - [`MemoryStore`]: tables behind an `RwLock`, used by tests and ephemeral
//!   deployments.
//! - `RocksStore` (feature `rocksdb-backend`): column families with
//!   CBOR-encoded values, see [`schema`].
//!
//! # Example
//!
//! ```
//! use xolbor_core::{Account, LedgerOperation, LedgerTransaction};
//! use xolbor_store::{MemoryStore, Store};
//!
//! let store = MemoryStore::new();
//! let account = Account::new("player", "player@example.com", "hash".into(), 100).unwrap();
//! let opening = LedgerTransaction::opening(account.id, 100);
//! store.create_account(&account, Some(&opening)).unwrap();
//!
//! let committed = store
//!     .run_transaction(
//!         &account.id,
//!         &LedgerOperation::Topup { amount: 500, idempotency_key: "pay_123".into() },
//!     )
//!     .unwrap();
//! assert_eq!(committed.new_balance(), 600);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod locks;
pub mod memory;
mod operation;
#[cfg(feature = "rocksdb-backend")]
pub mod rocks;
pub mod schema;

pub use error::{Result, StoreError};
pub use locks::AccountLocks;
pub use memory::MemoryStore;
#[cfg(feature = "rocksdb-backend")]
pub use rocks::RocksStore;

use xolbor_core::{
    Account, AccountId, Committed, Item, ItemId, LedgerError, LedgerOperation, LedgerTransaction,
    Ownership, TransactionId,
};

/// An account's balance and full history, read together.
#[derive(Debug, Clone)]
pub struct AccountLedger {
    /// Balance at the time of the read.
    pub balance: i64,
    /// Every transaction of the account, newest first.
    pub transactions: Vec<LedgerTransaction>,
}

/// The storage trait defining all ledger operations.
///
/// Implementations are synchronous; async callers run them on a blocking
/// thread.
pub trait Store: Send + Sync {
    // =========================================================================
    // Account Operations
    // =========================================================================

    /// Insert a new account together with its opening transaction.
    ///
    /// The account, its username and email index entries and the opening row
    /// are written atomically.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateUsername`, `DuplicateEmail` or `AccountAlreadyExists`
    /// wrapped in `StoreError::Ledger`, or a database error.
    fn create_account(&self, account: &Account, opening: Option<&LedgerTransaction>)
        -> Result<()>;

    /// Get an account by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_account(&self, account_id: &AccountId) -> Result<Option<Account>>;

    /// Find an account by username, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn find_account_by_username(&self, username: &str) -> Result<Option<Account>>;

    /// Find an account by email, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn find_account_by_email(&self, email: &str) -> Result<Option<Account>>;

    /// Get the current balance of an account.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::AccountNotFound` if the account doesn't exist.
    fn get_account_balance(&self, account_id: &AccountId) -> Result<i64> {
        self.get_account(account_id)?
            .map(|account| account.balance)
            .ok_or_else(|| {
                LedgerError::AccountNotFound {
                    account_id: *account_id,
                }
                .into()
            })
    }

    /// Number of registered accounts.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn account_count(&self) -> Result<u64>;

    // =========================================================================
    // Catalog Operations
    // =========================================================================

    /// Insert a catalog item.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::ItemAlreadyExists` if the ID is taken.
    fn insert_item(&self, item: &Item) -> Result<()>;

    /// Get a catalog item by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_item(&self, item_id: ItemId) -> Result<Option<Item>>;

    /// List all catalog items, cheapest first, ties broken by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_items(&self) -> Result<Vec<Item>>;

    /// Number of catalog items.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn item_count(&self) -> Result<u64>;

    // =========================================================================
    // Ownership Operations
    // =========================================================================

    /// Check whether an account owns an item.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn has_ownership(&self, account_id: &AccountId, item_id: ItemId) -> Result<bool>;

    /// List the ownership records of an account, ordered by item ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_ownerships(&self, account_id: &AccountId) -> Result<Vec<Ownership>>;

    // =========================================================================
    // Transaction Operations
    // =========================================================================

    /// Get a transaction by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_transaction(&self, transaction_id: &TransactionId) -> Result<Option<LedgerTransaction>>;

    /// List transactions for an account, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_transactions_by_account(
        &self,
        account_id: &AccountId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<LedgerTransaction>>;

    /// Find the transaction an account committed under an idempotency key.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn find_transaction_by_idempotency_key(
        &self,
        account_id: &AccountId,
        key: &str,
    ) -> Result<Option<LedgerTransaction>>;

    /// Read an account's balance and history under the account's lock.
    ///
    /// No operation on the account can commit between the two reads.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::AccountNotFound` if the account doesn't exist.
    fn account_ledger(&self, account_id: &AccountId) -> Result<AccountLedger>;

    // =========================================================================
    // Compound Operations
    // =========================================================================

    /// Run a balance-changing operation atomically under the account's lock.
    ///
    /// Returns the committed transaction, or the earlier one if the operation
    /// is an idempotent replay.
    ///
    /// # Errors
    ///
    /// - `AccountNotFound` if the account doesn't exist.
    /// - `ItemNotFound`, `AlreadyOwned`, `InsufficientBalance` for purchases.
    /// - `InvalidAmount`, `IdempotencyConflict` for top-ups.
    ///
    /// On any error nothing is written.
    fn run_transaction(
        &self,
        account_id: &AccountId,
        operation: &LedgerOperation,
    ) -> Result<Committed>;
}
