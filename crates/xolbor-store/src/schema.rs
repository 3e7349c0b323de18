//! Database schema definitions and column families.
//!
//! Each logical table of the ledger maps to one column family. Index families
//! store the primary key of the indexed record as their value, or nothing when
//! the key itself carries the reference.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Primary account records, keyed by `account_id`.
    pub const ACCOUNTS: &str = "accounts";

    /// Index: lower-cased username to `account_id`.
    pub const ACCOUNTS_BY_USERNAME: &str = "accounts_by_username";

    /// Index: lower-cased email to `account_id`.
    pub const ACCOUNTS_BY_EMAIL: &str = "accounts_by_email";

    /// Catalog items, keyed by big-endian `item_id`.
    pub const ITEMS: &str = "items";

    /// Ownership records, keyed by `account_id || item_id`.
    pub const OWNERSHIPS: &str = "ownerships";

    /// Ledger transactions, keyed by `transaction_id` (ULID).
    pub const TRANSACTIONS: &str = "transactions";

    /// Index: transactions by account, keyed by `account_id || transaction_id`.
    /// Value is empty (index only).
    pub const TRANSACTIONS_BY_ACCOUNT: &str = "transactions_by_account";

    /// Index: `account_id || idempotency_key` to `transaction_id`.
    pub const IDEMPOTENCY_KEYS: &str = "idempotency_keys";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        cf::ACCOUNTS,
        cf::ACCOUNTS_BY_USERNAME,
        cf::ACCOUNTS_BY_EMAIL,
        cf::ITEMS,
        cf::OWNERSHIPS,
        cf::TRANSACTIONS,
        cf::TRANSACTIONS_BY_ACCOUNT,
        cf::IDEMPOTENCY_KEYS,
    ]
}
