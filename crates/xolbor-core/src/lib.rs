//! Core types for the Xolbor ledger.
//!
//! This crate provides the foundational types shared by the store, the service and
//! the client SDK:
//!
//! - **Identifiers**: `AccountId`, `ItemId`, `TransactionId`
//! - **Accounts**: `Account`, registration validation, `STARTING_BONUS`
//! - **Catalog**: `Item`, `Rarity`, the default skin catalog
//! - **Ledger**: `LedgerTransaction`, `Ownership`, `LedgerOperation`
//!
//! # Xubor
//!
//! Xubor is the platform currency. Balances and prices are stored as `i64`
//! whole units; there are no fractional Xubor.
//!
//! A balance only ever changes through [`LedgerOperation::apply`], which either
//! rejects the operation or produces the complete set of records to persist.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod account;
pub mod error;
pub mod ids;
pub mod item;
pub mod ledger;

pub use account::{
    normalize_email, normalize_username, validate_username, Account, STARTING_BONUS,
};
pub use error::{LedgerError, Result};
pub use ids::{AccountId, IdError, ItemId, TransactionId};
pub use item::{default_catalog, Item, Rarity};
pub use ledger::{
    AccountSnapshot, Commit, Committed, LedgerOperation, LedgerTransaction, Outcome, Ownership,
    TransactionKind, SIGNUP_BONUS_KEY,
};
