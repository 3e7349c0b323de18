//! `RocksDB` storage implementation.
//!
//! This module provides the `RocksStore` implementation of the `Store` trait.
//! Every mutation is a single `WriteBatch`; balance changes additionally hold
//! the account's lock from [`AccountLocks`] for the whole read-check-write.

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, Direction, IteratorMode,
    MultiThreaded, Options, WriteBatch,
};

use xolbor_core::{
    Account, AccountId, Commit, Committed, Item, ItemId, LedgerError, LedgerOperation,
    LedgerTransaction, Ownership, TransactionId,
};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::operation::{read_ledger_locked, run_locked};
use crate::schema::{all_column_families, cf};
use crate::{AccountLedger, AccountLocks, Store};

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
    locks: AccountLocks,
    /// Serializes uniqueness checks with the inserts that depend on them.
    registration: Mutex<()>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path.as_ref(), cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        tracing::info!(path = %path.as_ref().display(), "opened RocksDB ledger store");

        Ok(Self {
            db: Arc::new(db),
            locks: AccountLocks::new(),
            registration: Mutex::new(()),
        })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn get_raw(&self, cf_name: &str, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let cf = self.cf(cf_name)?;
        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn get_value<T: serde::de::DeserializeOwned>(
        &self,
        cf_name: &str,
        key: &[u8],
    ) -> Result<Option<T>> {
        self.get_raw(cf_name, key)?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    /// Resolve an index entry whose value is an account ID.
    fn account_via_index(&self, cf_name: &str, key: &[u8]) -> Result<Option<Account>> {
        let Some(raw) = self.get_raw(cf_name, key)? else {
            return Ok(None);
        };
        let account_id = keys::account_id_from_bytes(&raw)
            .ok_or_else(|| StoreError::Serialization(format!("corrupt {cf_name} entry")))?;
        self.get_account(&account_id)
    }

    /// Decode every value of a column family, in key order.
    fn scan_values<T: serde::de::DeserializeOwned>(
        &self,
        cf_name: &str,
        prefix: &[u8],
    ) -> Result<Vec<T>> {
        let cf = self.cf(cf_name)?;
        let iter = self
            .db
            .iterator_cf(&cf, IteratorMode::From(prefix, Direction::Forward));

        let mut values = Vec::new();
        for entry in iter {
            let (key, value) = entry.map_err(|e| StoreError::Database(e.to_string()))?;
            if !key.starts_with(prefix) {
                break;
            }
            values.push(Self::deserialize(&value)?);
        }
        Ok(values)
    }

    fn count(&self, cf_name: &str) -> Result<u64> {
        let cf = self.cf(cf_name)?;
        let mut count = 0;
        for entry in self.db.iterator_cf(&cf, IteratorMode::Start) {
            entry.map_err(|e| StoreError::Database(e.to_string()))?;
            count += 1;
        }
        Ok(count)
    }

    /// Stage a transaction row and its indexes.
    fn stage_transaction(
        &self,
        batch: &mut WriteBatch,
        transaction: &LedgerTransaction,
    ) -> Result<()> {
        let cf_tx = self.cf(cf::TRANSACTIONS)?;
        let cf_tx_by_account = self.cf(cf::TRANSACTIONS_BY_ACCOUNT)?;

        let tx_key = keys::transaction_key(&transaction.id);
        let account_tx_key = keys::account_transaction_key(&transaction.account_id, &transaction.id);

        batch.put_cf(&cf_tx, &tx_key, Self::serialize(transaction)?);
        batch.put_cf(&cf_tx_by_account, &account_tx_key, []); // Index entry (empty value)

        if let Some(key) = &transaction.idempotency_key {
            let cf_idem = self.cf(cf::IDEMPOTENCY_KEYS)?;
            batch.put_cf(
                &cf_idem,
                keys::idempotency_key(&transaction.account_id, key),
                &tx_key,
            );
        }
        Ok(())
    }

    /// Write every record of a commit in one batch.
    fn persist(&self, commit: &Commit) -> Result<()> {
        let cf_accounts = self.cf(cf::ACCOUNTS)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(
            &cf_accounts,
            keys::account_key(&commit.account.id),
            Self::serialize(&commit.account)?,
        );
        if let Some(ownership) = &commit.ownership {
            let cf_owned = self.cf(cf::OWNERSHIPS)?;
            batch.put_cf(
                &cf_owned,
                keys::ownership_key(&ownership.account_id, ownership.item_id),
                Self::serialize(ownership)?,
            );
        }
        self.stage_transaction(&mut batch, &commit.transaction)?;

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn registration_lock(&self) -> std::sync::MutexGuard<'_, ()> {
        self.registration
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Store for RocksStore {
    // =========================================================================
    // Account Operations
    // =========================================================================

    fn create_account(
        &self,
        account: &Account,
        opening: Option<&LedgerTransaction>,
    ) -> Result<()> {
        if let Some(opening) = opening {
            if opening.account_id != account.id {
                return Err(LedgerError::Validation(
                    "opening transaction belongs to another account".into(),
                )
                .into());
            }
        }

        let account_key = keys::account_key(&account.id);
        let username_key = keys::username_key(&account.username);
        let email_key = keys::email_key(&account.email);

        let _registration = self.registration_lock();

        if self.get_raw(cf::ACCOUNTS, &account_key)?.is_some() {
            return Err(LedgerError::AccountAlreadyExists {
                account_id: account.id,
            }
            .into());
        }
        if self.get_raw(cf::ACCOUNTS_BY_USERNAME, &username_key)?.is_some() {
            return Err(LedgerError::DuplicateUsername {
                username: account.username.clone(),
            }
            .into());
        }
        if self.get_raw(cf::ACCOUNTS_BY_EMAIL, &email_key)?.is_some() {
            return Err(LedgerError::DuplicateEmail {
                email: account.email.clone(),
            }
            .into());
        }

        let cf_accounts = self.cf(cf::ACCOUNTS)?;
        let cf_by_username = self.cf(cf::ACCOUNTS_BY_USERNAME)?;
        let cf_by_email = self.cf(cf::ACCOUNTS_BY_EMAIL)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_accounts, &account_key, Self::serialize(account)?);
        batch.put_cf(&cf_by_username, &username_key, &account_key);
        batch.put_cf(&cf_by_email, &email_key, &account_key);
        if let Some(opening) = opening {
            self.stage_transaction(&mut batch, opening)?;
        }

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn get_account(&self, account_id: &AccountId) -> Result<Option<Account>> {
        self.get_value(cf::ACCOUNTS, &keys::account_key(account_id))
    }

    fn find_account_by_username(&self, username: &str) -> Result<Option<Account>> {
        self.account_via_index(cf::ACCOUNTS_BY_USERNAME, &keys::username_key(username))
    }

    fn find_account_by_email(&self, email: &str) -> Result<Option<Account>> {
        self.account_via_index(cf::ACCOUNTS_BY_EMAIL, &keys::email_key(email))
    }

    fn account_count(&self) -> Result<u64> {
        self.count(cf::ACCOUNTS)
    }

    // =========================================================================
    // Catalog Operations
    // =========================================================================

    fn insert_item(&self, item: &Item) -> Result<()> {
        let key = keys::item_key(item.id);
        let _registration = self.registration_lock();

        if self.get_raw(cf::ITEMS, &key)?.is_some() {
            return Err(LedgerError::ItemAlreadyExists { item_id: item.id }.into());
        }

        let cf = self.cf(cf::ITEMS)?;
        self.db
            .put_cf(&cf, key, Self::serialize(item)?)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn get_item(&self, item_id: ItemId) -> Result<Option<Item>> {
        self.get_value(cf::ITEMS, &keys::item_key(item_id))
    }

    fn list_items(&self) -> Result<Vec<Item>> {
        let mut items: Vec<Item> = self.scan_values(cf::ITEMS, &[])?;
        items.sort_by_key(|item| (item.price, item.id));
        Ok(items)
    }

    fn item_count(&self) -> Result<u64> {
        self.count(cf::ITEMS)
    }

    // =========================================================================
    // Ownership Operations
    // =========================================================================

    fn has_ownership(&self, account_id: &AccountId, item_id: ItemId) -> Result<bool> {
        Ok(self
            .get_raw(cf::OWNERSHIPS, &keys::ownership_key(account_id, item_id))?
            .is_some())
    }

    fn list_ownerships(&self, account_id: &AccountId) -> Result<Vec<Ownership>> {
        self.scan_values(cf::OWNERSHIPS, &keys::account_key(account_id))
    }

    // =========================================================================
    // Transaction Operations
    // =========================================================================

    fn get_transaction(&self, transaction_id: &TransactionId) -> Result<Option<LedgerTransaction>> {
        self.get_value(cf::TRANSACTIONS, &keys::transaction_key(transaction_id))
    }

    fn list_transactions_by_account(
        &self,
        account_id: &AccountId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<LedgerTransaction>> {
        let cf_by_account = self.cf(cf::TRANSACTIONS_BY_ACCOUNT)?;
        let prefix = keys::account_key(account_id);
        let upper = keys::account_transactions_upper_bound(account_id);

        // Walk backwards from the end of the account's range: newest first.
        let iter = self
            .db
            .iterator_cf(&cf_by_account, IteratorMode::From(&upper, Direction::Reverse));

        let mut transactions = Vec::new();
        let mut skipped = 0;
        for entry in iter {
            if transactions.len() >= limit {
                break;
            }

            let (key, _) = entry.map_err(|e| StoreError::Database(e.to_string()))?;
            if !key.starts_with(&prefix) {
                break;
            }

            if skipped < offset {
                skipped += 1;
                continue;
            }

            let tx_id = keys::transaction_id_from_account_key(&key).ok_or_else(|| {
                StoreError::Serialization("corrupt transactions_by_account key".into())
            })?;
            if let Some(tx) = self.get_transaction(&tx_id)? {
                transactions.push(tx);
            }
        }

        Ok(transactions)
    }

    fn find_transaction_by_idempotency_key(
        &self,
        account_id: &AccountId,
        key: &str,
    ) -> Result<Option<LedgerTransaction>> {
        let Some(raw) = self.get_raw(cf::IDEMPOTENCY_KEYS, &keys::idempotency_key(account_id, key))?
        else {
            return Ok(None);
        };
        let tx_id = keys::transaction_id_from_bytes(&raw)
            .ok_or_else(|| StoreError::Serialization("corrupt idempotency_keys entry".into()))?;
        self.get_transaction(&tx_id)
    }

    // =========================================================================
    // Compound Operations
    // =========================================================================

    fn account_ledger(&self, account_id: &AccountId) -> Result<AccountLedger> {
        read_ledger_locked(self, &self.locks, account_id)
    }

    fn run_transaction(
        &self,
        account_id: &AccountId,
        operation: &LedgerOperation,
    ) -> Result<Committed> {
        run_locked(self, &self.locks, account_id, operation, |commit| {
            self.persist(commit)
        })
    }
}
