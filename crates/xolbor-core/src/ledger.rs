//! Ledger transactions and the balance state transition.
//!
//! Every balance change is described by a [`LedgerOperation`]. The store loads
//! an [`AccountSnapshot`] while holding the account's lock, calls
//! [`LedgerOperation::apply`], and persists the resulting [`Commit`] in a single
//! atomic write. `apply` performs no I/O, so a rejected operation has nothing to
//! undo.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};
use crate::{Account, AccountId, Item, ItemId, TransactionId};

/// Idempotency key of the opening credit written at registration.
pub const SIGNUP_BONUS_KEY: &str = "signup-bonus";

/// A ledger row representing one balance change.
///
/// Rows are append-only. For every account, the sum of `amount` over all rows
/// equals the current balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerTransaction {
    /// Unique transaction ID (ULID for time-ordering).
    pub id: TransactionId,

    /// The account whose balance was affected.
    pub account_id: AccountId,

    /// Type of transaction.
    pub kind: TransactionKind,

    /// Amount in Xubor. Positive = credit, negative = debit.
    pub amount: i64,

    /// The purchased item, for purchases.
    pub item_id: Option<ItemId>,

    /// Balance after this transaction.
    pub balance_after: i64,

    /// Caller-supplied de-duplication key, for top-ups.
    pub idempotency_key: Option<String>,

    /// Human-readable description.
    pub description: String,

    /// When the transaction was committed.
    pub created_at: DateTime<Utc>,
}

impl LedgerTransaction {
    /// Create a purchase (debit) transaction for `item`.
    #[must_use]
    pub fn purchase(account_id: AccountId, item: &Item, balance_after: i64) -> Self {
        Self {
            id: TransactionId::generate(),
            account_id,
            kind: TransactionKind::Purchase,
            amount: -item.price,
            item_id: Some(item.id),
            balance_after,
            idempotency_key: None,
            description: format!("Purchase of {}", item.name),
            created_at: Utc::now(),
        }
    }

    /// Create a top-up (credit) transaction.
    #[must_use]
    pub fn topup(
        account_id: AccountId,
        amount: i64,
        balance_after: i64,
        idempotency_key: String,
    ) -> Self {
        Self {
            id: TransactionId::generate(),
            account_id,
            kind: TransactionKind::Topup,
            amount,
            item_id: None,
            balance_after,
            idempotency_key: Some(idempotency_key),
            description: format!("Top-up of {amount} Xubor"),
            created_at: Utc::now(),
        }
    }

    /// Create the opening credit for a newly registered account.
    #[must_use]
    pub fn opening(account_id: AccountId, starting_bonus: i64) -> Self {
        Self {
            description: "Welcome bonus".to_string(),
            ..Self::topup(
                account_id,
                starting_bonus,
                starting_bonus,
                SIGNUP_BONUS_KEY.to_string(),
            )
        }
    }

    /// Check if this is the opening credit.
    #[must_use]
    pub fn is_opening(&self) -> bool {
        self.kind == TransactionKind::Topup
            && self.idempotency_key.as_deref() == Some(SIGNUP_BONUS_KEY)
    }
}

/// Type of ledger transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Item bought with Xubor.
    Purchase,

    /// Xubor credited from a payment.
    Topup,
}

impl TransactionKind {
    /// Get the kind name as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Purchase => "purchase",
            Self::Topup => "topup",
        }
    }
}

/// Proof that an account owns an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ownership {
    /// The owning account.
    pub account_id: AccountId,

    /// The owned item.
    pub item_id: ItemId,

    /// The purchase that created this record.
    pub transaction_id: TransactionId,

    /// When the item was acquired.
    pub acquired_at: DateTime<Utc>,
}

/// A requested balance change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerOperation {
    /// Buy a catalog item.
    Purchase {
        /// The item to buy.
        item_id: ItemId,
    },

    /// Credit Xubor from a confirmed payment.
    Topup {
        /// Amount to credit.
        amount: i64,
        /// Per-account de-duplication key.
        idempotency_key: String,
    },
}

/// Everything `apply` needs to know about an account, read under its lock.
#[derive(Debug, Clone, Copy)]
pub struct AccountSnapshot<'a> {
    /// Current account state.
    pub account: &'a Account,

    /// The catalog item, for purchases. `None` if it does not exist.
    pub item: Option<&'a Item>,

    /// Whether the account already owns the item.
    pub already_owned: bool,

    /// A prior transaction of this account with the same idempotency key.
    pub prior: Option<&'a LedgerTransaction>,
}

/// The records a successful operation writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    /// The account with its new balance.
    pub account: Account,

    /// The appended ledger row.
    pub transaction: LedgerTransaction,

    /// The new ownership record, for purchases.
    pub ownership: Option<Ownership>,
}

/// Result of applying an operation to a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// New records to persist atomically.
    Commit(Commit),

    /// The operation was already committed; nothing to write.
    Replay(LedgerTransaction),
}

/// What the store returns after running an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Committed {
    /// The committed (or previously committed) transaction.
    pub transaction: LedgerTransaction,

    /// True when an earlier commit was returned instead of a new one.
    pub replayed: bool,
}

impl Committed {
    /// Balance right after the transaction.
    #[must_use]
    pub const fn new_balance(&self) -> i64 {
        self.transaction.balance_after
    }
}

impl LedgerOperation {
    /// The item the store must load for this operation.
    #[must_use]
    pub const fn item_id(&self) -> Option<ItemId> {
        match self {
            Self::Purchase { item_id } => Some(*item_id),
            Self::Topup { .. } => None,
        }
    }

    /// The idempotency key the store must look up for this operation.
    #[must_use]
    pub fn idempotency_key(&self) -> Option<&str> {
        match self {
            Self::Purchase { .. } => None,
            Self::Topup {
                idempotency_key, ..
            } => Some(idempotency_key),
        }
    }

    /// Decide the effect of this operation on `snapshot`.
    ///
    /// Purchase checks run in order: item exists, not already owned, balance
    /// covers the price.
    ///
    /// # Errors
    ///
    /// Returns `ItemNotFound`, `AlreadyOwned`, `InsufficientBalance`,
    /// `InvalidAmount` or `IdempotencyConflict`. On error nothing may be written.
    pub fn apply(&self, snapshot: &AccountSnapshot<'_>) -> Result<Outcome> {
        let account = snapshot.account;

        match self {
            Self::Purchase { item_id } => {
                let item = snapshot
                    .item
                    .filter(|item| item.id == *item_id)
                    .ok_or(LedgerError::ItemNotFound { item_id: *item_id })?;

                if snapshot.already_owned {
                    return Err(LedgerError::AlreadyOwned {
                        account_id: account.id,
                        item_id: *item_id,
                    });
                }

                if !account.can_afford(item.price) {
                    return Err(LedgerError::InsufficientBalance {
                        balance: account.balance,
                        required: item.price,
                    });
                }

                let new_balance = account.balance - item.price;
                let transaction = LedgerTransaction::purchase(account.id, item, new_balance);
                let ownership = Ownership {
                    account_id: account.id,
                    item_id: item.id,
                    transaction_id: transaction.id,
                    acquired_at: transaction.created_at,
                };

                Ok(Outcome::Commit(Commit {
                    account: with_balance(account, new_balance, transaction.created_at),
                    transaction,
                    ownership: Some(ownership),
                }))
            }

            Self::Topup {
                amount,
                idempotency_key,
            } => {
                if *amount <= 0 {
                    return Err(LedgerError::InvalidAmount(format!(
                        "top-up amount must be positive, got {amount}"
                    )));
                }

                if let Some(prior) = snapshot.prior {
                    if prior.amount == *amount {
                        return Ok(Outcome::Replay(prior.clone()));
                    }
                    return Err(LedgerError::IdempotencyConflict {
                        key: idempotency_key.clone(),
                    });
                }

                let new_balance = account.balance.checked_add(*amount).ok_or_else(|| {
                    LedgerError::InvalidAmount("top-up would overflow the balance".into())
                })?;
                let transaction = LedgerTransaction::topup(
                    account.id,
                    *amount,
                    new_balance,
                    idempotency_key.clone(),
                );

                Ok(Outcome::Commit(Commit {
                    account: with_balance(account, new_balance, transaction.created_at),
                    transaction,
                    ownership: None,
                }))
            }
        }
    }
}

fn with_balance(account: &Account, balance: i64, at: DateTime<Utc>) -> Account {
    Account {
        balance,
        updated_at: at,
        ..account.clone()
    }
}
