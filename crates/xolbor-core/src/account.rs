//! Account types for the Xolbor ledger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};
use crate::AccountId;

/// Xubor credited to every new account.
pub const STARTING_BONUS: i64 = 100;

/// Minimum username length in characters.
pub const USERNAME_MIN_LEN: usize = 3;

/// Maximum username length in characters.
pub const USERNAME_MAX_LEN: usize = 20;

/// Maximum email length in characters.
pub const EMAIL_MAX_LEN: usize = 254;

/// A player account.
///
/// The balance is only written by the store while it holds the account's lock,
/// as part of committing a [`crate::LedgerOperation`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// The account ID.
    pub id: AccountId,

    /// Display username, unique case-insensitively.
    pub username: String,

    /// Email address, unique case-insensitively.
    pub email: String,

    /// Opaque credential hash produced by the credential provider.
    pub password_credential: String,

    /// Current Xubor balance. Never negative.
    pub balance: i64,

    /// When the account was created.
    pub created_at: DateTime<Utc>,

    /// When the balance last changed.
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Create a new account holding `opening_balance`.
    ///
    /// Username and email are trimmed and validated.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Validation` if the username or email is malformed, or
    /// `LedgerError::InvalidAmount` if the opening balance is negative.
    pub fn new(
        username: &str,
        email: &str,
        password_credential: String,
        opening_balance: i64,
    ) -> Result<Self> {
        validate_username(username)?;
        validate_email(email)?;
        if opening_balance < 0 {
            return Err(LedgerError::InvalidAmount(
                "opening balance cannot be negative".into(),
            ));
        }

        let now = Utc::now();
        Ok(Self {
            id: AccountId::generate(),
            username: username.trim().to_string(),
            email: email.trim().to_string(),
            password_credential,
            balance: opening_balance,
            created_at: now,
            updated_at: now,
        })
    }

    /// Check if the account can pay `amount`.
    #[must_use]
    pub fn can_afford(&self, amount: i64) -> bool {
        self.balance >= amount
    }
}

/// Uniqueness key for a username.
#[must_use]
pub fn normalize_username(username: &str) -> String {
    username.trim().to_lowercase()
}

/// Uniqueness key for an email address.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Check a username against the registration rules.
///
/// # Errors
///
/// Returns `LedgerError::Validation` describing the first rule broken.
pub fn validate_username(username: &str) -> Result<()> {
    let username = username.trim();
    let len = username.chars().count();
    if !(USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&len) {
        return Err(LedgerError::Validation(format!(
            "username must be between {USERNAME_MIN_LEN} and {USERNAME_MAX_LEN} characters"
        )));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        return Err(LedgerError::Validation(
            "username may only contain letters, digits, '_', '-' and '.'".into(),
        ));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<()> {
    let email = email.trim();
    if email.is_empty() || email.len() > EMAIL_MAX_LEN || email.chars().any(char::is_whitespace) {
        return Err(LedgerError::Validation("invalid email address".into()));
    }
    let valid = email.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty()
            && !domain.contains('@')
            && domain
                .split_once('.')
                .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
    });
    if !valid {
        return Err(LedgerError::Validation("invalid email address".into()));
    }
    Ok(())
}
