//! In-memory storage implementation.
//!
//! Tables live behind one `RwLock`. A commit applies all of its writes under a
//! single write-lock acquisition, so readers observe either the state before
//! an operation or the state after it.

use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use xolbor_core::{
    normalize_email, normalize_username, Account, AccountId, Commit, Committed, Item, ItemId,
    LedgerError, LedgerOperation, LedgerTransaction, Ownership, TransactionId,
};

use crate::error::Result;
use crate::operation::{read_ledger_locked, run_locked};
use crate::{AccountLedger, AccountLocks, Store};

#[derive(Debug, Default)]
struct Tables {
    accounts: HashMap<AccountId, Account>,
    accounts_by_username: HashMap<String, AccountId>,
    accounts_by_email: HashMap<String, AccountId>,
    items: BTreeMap<ItemId, Item>,
    ownerships: HashMap<AccountId, BTreeMap<ItemId, Ownership>>,
    transactions: HashMap<TransactionId, LedgerTransaction>,
    /// Per-account transaction IDs in commit order.
    transactions_by_account: HashMap<AccountId, Vec<TransactionId>>,
    idempotency_keys: HashMap<(AccountId, String), TransactionId>,
}

impl Tables {
    fn append_transaction(&mut self, transaction: &LedgerTransaction) {
        self.transactions_by_account
            .entry(transaction.account_id)
            .or_default()
            .push(transaction.id);
        if let Some(key) = &transaction.idempotency_key {
            self.idempotency_keys
                .insert((transaction.account_id, key.clone()), transaction.id);
        }
        self.transactions
            .insert(transaction.id, transaction.clone());
    }

    fn apply(&mut self, commit: &Commit) {
        self.accounts
            .insert(commit.account.id, commit.account.clone());
        if let Some(ownership) = &commit.ownership {
            self.ownerships
                .entry(ownership.account_id)
                .or_default()
                .insert(ownership.item_id, ownership.clone());
        }
        self.append_transaction(&commit.transaction);
    }
}

/// Memory-backed storage implementation.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    locks: AccountLocks,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Store for MemoryStore {
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

        let username = normalize_username(&account.username);
        let email = normalize_email(&account.email);

        // The write lock doubles as the registration lock.
        let mut tables = self.write();
        if tables.accounts.contains_key(&account.id) {
            return Err(LedgerError::AccountAlreadyExists {
                account_id: account.id,
            }
            .into());
        }
        if tables.accounts_by_username.contains_key(&username) {
            return Err(LedgerError::DuplicateUsername {
                username: account.username.clone(),
            }
            .into());
        }
        if tables.accounts_by_email.contains_key(&email) {
            return Err(LedgerError::DuplicateEmail {
                email: account.email.clone(),
            }
            .into());
        }

        tables.accounts.insert(account.id, account.clone());
        tables.accounts_by_username.insert(username, account.id);
        tables.accounts_by_email.insert(email, account.id);
        if let Some(opening) = opening {
            tables.append_transaction(opening);
        }
        Ok(())
    }

    fn get_account(&self, account_id: &AccountId) -> Result<Option<Account>> {
        Ok(self.read().accounts.get(account_id).cloned())
    }

    fn find_account_by_username(&self, username: &str) -> Result<Option<Account>> {
        let tables = self.read();
        Ok(tables
            .accounts_by_username
            .get(&normalize_username(username))
            .and_then(|id| tables.accounts.get(id))
            .cloned())
    }

    fn find_account_by_email(&self, email: &str) -> Result<Option<Account>> {
        let tables = self.read();
        Ok(tables
            .accounts_by_email
            .get(&normalize_email(email))
            .and_then(|id| tables.accounts.get(id))
            .cloned())
    }

    fn account_count(&self) -> Result<u64> {
        Ok(self.read().accounts.len() as u64)
    }

    // =========================================================================
    // Catalog Operations
    // =========================================================================

    fn insert_item(&self, item: &Item) -> Result<()> {
        let mut tables = self.write();
        if tables.items.contains_key(&item.id) {
            return Err(LedgerError::ItemAlreadyExists { item_id: item.id }.into());
        }
        tables.items.insert(item.id, item.clone());
        Ok(())
    }

    fn get_item(&self, item_id: ItemId) -> Result<Option<Item>> {
        Ok(self.read().items.get(&item_id).cloned())
    }

    fn list_items(&self) -> Result<Vec<Item>> {
        let mut items: Vec<Item> = self.read().items.values().cloned().collect();
        items.sort_by_key(|item| (item.price, item.id));
        Ok(items)
    }

    fn item_count(&self) -> Result<u64> {
        Ok(self.read().items.len() as u64)
    }

    // =========================================================================
    // Ownership Operations
    // =========================================================================

    fn has_ownership(&self, account_id: &AccountId, item_id: ItemId) -> Result<bool> {
        Ok(self
            .read()
            .ownerships
            .get(account_id)
            .is_some_and(|owned| owned.contains_key(&item_id)))
    }

    fn list_ownerships(&self, account_id: &AccountId) -> Result<Vec<Ownership>> {
        Ok(self
            .read()
            .ownerships
            .get(account_id)
            .map(|owned| owned.values().cloned().collect())
            .unwrap_or_default())
    }

    // =========================================================================
    // Transaction Operations
    // =========================================================================

    fn get_transaction(&self, transaction_id: &TransactionId) -> Result<Option<LedgerTransaction>> {
        Ok(self.read().transactions.get(transaction_id).cloned())
    }

    fn list_transactions_by_account(
        &self,
        account_id: &AccountId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<LedgerTransaction>> {
        let tables = self.read();
        let Some(ids) = tables.transactions_by_account.get(account_id) else {
            return Ok(Vec::new());
        };

        Ok(ids
            .iter()
            .rev()
            .skip(offset)
            .take(limit)
            .filter_map(|id| tables.transactions.get(id).cloned())
            .collect())
    }

    fn find_transaction_by_idempotency_key(
        &self,
        account_id: &AccountId,
        key: &str,
    ) -> Result<Option<LedgerTransaction>> {
        let tables = self.read();
        Ok(tables
            .idempotency_keys
            .get(&(*account_id, key.to_string()))
            .and_then(|id| tables.transactions.get(id))
            .cloned())
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
            self.write().apply(commit);
            Ok(())
        })
    }
}
