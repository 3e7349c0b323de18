//! Account service: registration, login and account reads.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use xolbor_core::{
    validate_username, Account, AccountId, Item, LedgerError, LedgerTransaction, Result,
    TransactionId,
};
use xolbor_store::Store;

use super::run_blocking;
use crate::credentials::CredentialProvider;

/// Minimum password length in characters.
pub const PASSWORD_MIN_LEN: usize = 8;

/// Maximum password length in characters.
pub const PASSWORD_MAX_LEN: usize = 128;

/// Registration input.
#[derive(Debug, Clone)]
pub struct RegisterAccount {
    /// Desired username.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Plaintext password.
    pub password: String,
}

/// An owned item joined with its catalog entry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryEntry {
    /// The owned item.
    pub item: Item,
    /// When it was bought.
    pub acquired_at: DateTime<Utc>,
    /// The purchase transaction.
    pub transaction_id: TransactionId,
}

/// Comparison of an account's balance with its transaction history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reconciliation {
    /// Stored balance.
    pub balance: i64,
    /// Sum of every transaction amount, opening credit included.
    pub ledger_sum: i64,
    /// Amount of the opening credit.
    pub starting_bonus: i64,
    /// Number of transactions, opening credit included.
    pub transaction_count: usize,
    /// Whether `balance == ledger_sum`.
    pub consistent: bool,
}

/// Per-account activity summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountStats {
    /// Current balance.
    pub balance: i64,
    /// Items owned.
    pub owned_items: usize,
    /// Transactions recorded, including the opening credit.
    pub transactions: usize,
}

/// Account service.
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn Store>,
    credentials: Arc<dyn CredentialProvider>,
    starting_bonus: i64,
}

impl AccountService {
    /// Create the service.
    #[must_use]
    pub fn new(
        store: Arc<dyn Store>,
        credentials: Arc<dyn CredentialProvider>,
        starting_bonus: i64,
    ) -> Self {
        Self {
            store,
            credentials,
            starting_bonus,
        }
    }

    /// Register a new account holding the starting bonus.
    ///
    /// The account and its opening credit are written in one atomic step.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for malformed fields and `DuplicateUsername` or
    /// `DuplicateEmail` if either is taken.
    pub async fn register(&self, input: RegisterAccount) -> Result<Account> {
        validate_password(&input.password)?;
        // Validates username and email before paying for the hash.
        let mut account = Account::new(
            &input.username,
            &input.email,
            String::new(),
            self.starting_bonus,
        )?;
        account.password_credential = self.credentials.set_credential(&input.password).await?;

        let opening = LedgerTransaction::opening(account.id, self.starting_bonus);
        let created = account.clone();
        let result = run_blocking(&self.store, move |store| {
            store.create_account(&created, Some(&opening))
        })
        .await;

        match result {
            Ok(()) => {
                tracing::info!(
                    account_id = %account.id,
                    username = %account.username,
                    starting_bonus = self.starting_bonus,
                    "Account registered"
                );
                Ok(account)
            }
            Err(e) => {
                tracing::warn!(username = %account.username, error = %e, "Registration rejected");
                Err(e)
            }
        }
    }

    /// Authenticate by username or email.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCredentials` if the login is unknown or the password is
    /// wrong, without saying which.
    pub async fn authenticate(&self, login: &str, password: &str) -> Result<Account> {
        let login_key = login.trim().to_string();
        let found = run_blocking(&self.store, move |store| {
            if login_key.contains('@') {
                store.find_account_by_email(&login_key)
            } else {
                store.find_account_by_username(&login_key)
            }
        })
        .await?;

        let Some(account) = found else {
            tracing::debug!("Login for unknown account");
            return Err(LedgerError::InvalidCredentials);
        };

        if self
            .credentials
            .verify_credential(password, &account.password_credential)
            .await?
        {
            tracing::debug!(account_id = %account.id, "Login succeeded");
            Ok(account)
        } else {
            tracing::warn!(account_id = %account.id, "Login with wrong password");
            Err(LedgerError::InvalidCredentials)
        }
    }

    /// Whether a username is free to register, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if the username could never be registered.
    pub async fn username_available(&self, username: &str) -> Result<bool> {
        validate_username(username)?;
        let username = username.trim().to_string();
        let found = run_blocking(&self.store, move |store| {
            store.find_account_by_username(&username)
        })
        .await?;
        Ok(found.is_none())
    }

    /// Get an account.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if the account doesn't exist.
    pub async fn get_account(&self, account_id: AccountId) -> Result<Account> {
        run_blocking(&self.store, move |store| store.get_account(&account_id))
            .await?
            .ok_or(LedgerError::AccountNotFound { account_id })
    }

    /// Get an account's balance.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if the account doesn't exist.
    pub async fn get_balance(&self, account_id: AccountId) -> Result<i64> {
        run_blocking(&self.store, move |store| {
            store.get_account_balance(&account_id)
        })
        .await
    }

    /// List the items an account owns, ordered by item ID.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if the account doesn't exist.
    pub async fn inventory(&self, account_id: AccountId) -> Result<Vec<InventoryEntry>> {
        run_blocking(&self.store, move |store| {
            if store.get_account(&account_id)?.is_none() {
                return Err(LedgerError::AccountNotFound { account_id }.into());
            }

            let mut entries = Vec::new();
            for ownership in store.list_ownerships(&account_id)? {
                // Items are never deleted; a miss means the catalog was reset.
                if let Some(item) = store.get_item(ownership.item_id)? {
                    entries.push(InventoryEntry {
                        item,
                        acquired_at: ownership.acquired_at,
                        transaction_id: ownership.transaction_id,
                    });
                }
            }
            Ok(entries)
        })
        .await
    }

    /// List an account's transactions, newest first.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if the account doesn't exist.
    pub async fn transactions(
        &self,
        account_id: AccountId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<LedgerTransaction>> {
        run_blocking(&self.store, move |store| {
            if store.get_account(&account_id)?.is_none() {
                return Err(LedgerError::AccountNotFound { account_id }.into());
            }
            store.list_transactions_by_account(&account_id, limit, offset)
        })
        .await
    }

    /// Summarize an account's balance, inventory and history.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if the account doesn't exist.
    pub async fn stats(&self, account_id: AccountId) -> Result<AccountStats> {
        run_blocking(&self.store, move |store| {
            let ledger = store.account_ledger(&account_id)?;
            let owned_items = store.list_ownerships(&account_id)?.len();
            Ok(AccountStats {
                balance: ledger.balance,
                owned_items,
                transactions: ledger.transactions.len(),
            })
        })
        .await
    }

    /// Check that an account's balance equals the sum of its transactions.
    ///
    /// Balance and history are read under the account's lock, so a mismatch
    /// is a real ledger fault and never a commit landing between two reads.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if the account doesn't exist.
    pub async fn reconcile(&self, account_id: AccountId) -> Result<Reconciliation> {
        let report = run_blocking(&self.store, move |store| {
            let ledger = store.account_ledger(&account_id)?;
            Ok(reconciliation(ledger.balance, &ledger.transactions))
        })
        .await?;

        if report.consistent {
            tracing::debug!(account_id = %account_id, balance = report.balance, "Account reconciled");
        } else {
            tracing::error!(
                account_id = %account_id,
                balance = report.balance,
                ledger_sum = report.ledger_sum,
                "Account balance does not match its ledger"
            );
        }
        Ok(report)
    }
}

fn reconciliation(balance: i64, history: &[LedgerTransaction]) -> Reconciliation {
    let ledger_sum = history.iter().map(|tx| tx.amount).sum();
    let starting_bonus = history
        .iter()
        .find(|tx| tx.is_opening())
        .map_or(0, |tx| tx.amount);

    Reconciliation {
        balance,
        ledger_sum,
        starting_bonus,
        transaction_count: history.len(),
        consistent: balance == ledger_sum && balance >= 0,
    }
}

fn validate_password(password: &str) -> Result<()> {
    let len = password.chars().count();
    if !(PASSWORD_MIN_LEN..=PASSWORD_MAX_LEN).contains(&len) {
        return Err(LedgerError::Validation(format!(
            "password must be between {PASSWORD_MIN_LEN} and {PASSWORD_MAX_LEN} characters"
        )));
    }
    Ok(())
}
