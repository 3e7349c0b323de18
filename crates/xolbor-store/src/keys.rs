//! Key encoding utilities for `RocksDB`.
//!
//! Composite keys start with the 16 account bytes so that a prefix scan
//! returns everything belonging to one account.

use xolbor_core::{normalize_email, normalize_username, AccountId, ItemId, TransactionId};

/// Create an account key from an account ID.
#[must_use]
pub fn account_key(account_id: &AccountId) -> Vec<u8> {
    account_id.as_bytes().to_vec()
}

/// Decode an account ID stored as an index value.
#[must_use]
pub fn account_id_from_bytes(bytes: &[u8]) -> Option<AccountId> {
    let bytes: [u8; 16] = bytes.try_into().ok()?;
    Some(AccountId::from_bytes(bytes))
}

/// Create a username index key.
#[must_use]
pub fn username_key(username: &str) -> Vec<u8> {
    normalize_username(username).into_bytes()
}

/// Create an email index key.
#[must_use]
pub fn email_key(email: &str) -> Vec<u8> {
    normalize_email(email).into_bytes()
}

/// Create an item key from an item ID.
#[must_use]
pub fn item_key(item_id: ItemId) -> Vec<u8> {
    item_id.to_be_bytes().to_vec()
}

/// Create an ownership key.
///
/// Format: `account_id (16 bytes) || item_id (8 bytes, big-endian)`
#[must_use]
pub fn ownership_key(account_id: &AccountId, item_id: ItemId) -> Vec<u8> {
    let mut key = Vec::with_capacity(24);
    key.extend_from_slice(account_id.as_bytes());
    key.extend_from_slice(&item_id.to_be_bytes());
    key
}

/// Create a transaction key from a transaction ID.
#[must_use]
pub fn transaction_key(transaction_id: &TransactionId) -> Vec<u8> {
    transaction_id.to_bytes().to_vec()
}

/// Decode a transaction ID stored as an index value.
#[must_use]
pub fn transaction_id_from_bytes(bytes: &[u8]) -> Option<TransactionId> {
    let bytes: [u8; 16] = bytes.try_into().ok()?;
    Some(TransactionId::from_bytes(bytes))
}

/// Create an account-transaction index key.
///
/// Format: `account_id (16 bytes) || transaction_id (16 bytes)`
///
/// Since ULIDs are time-ordered, transactions for an account sort by time.
#[must_use]
pub fn account_transaction_key(account_id: &AccountId, transaction_id: &TransactionId) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(account_id.as_bytes());
    key.extend_from_slice(&transaction_id.to_bytes());
    key
}

/// The greatest possible account-transaction key for an account.
///
/// A reverse scan seeded here walks the account's transactions newest first.
#[must_use]
pub fn account_transactions_upper_bound(account_id: &AccountId) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(account_id.as_bytes());
    key.extend_from_slice(&[0xFF; 16]);
    key
}

/// Extract the transaction ID from an account-transaction index key.
///
/// Returns `None` if the key is not 32 bytes long.
#[must_use]
pub fn transaction_id_from_account_key(key: &[u8]) -> Option<TransactionId> {
    if key.len() != 32 {
        return None;
    }
    transaction_id_from_bytes(&key[16..])
}

/// Create an idempotency key index entry.
///
/// Format: `account_id (16 bytes) || key (UTF-8)`
#[must_use]
pub fn idempotency_key(account_id: &AccountId, key: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(16 + key.len());
    out.extend_from_slice(account_id.as_bytes());
    out.extend_from_slice(key.as_bytes());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_key_length() {
        let account_id = AccountId::generate();
        assert_eq!(account_key(&account_id).len(), 16);
        assert_eq!(
            account_id_from_bytes(&account_key(&account_id)),
            Some(account_id)
        );
    }

    #[test]
    fn index_keys_are_case_insensitive() {
        assert_eq!(username_key("Ninja"), username_key(" ninja "));
        assert_eq!(email_key("A@Example.com"), email_key("a@example.com"));
    }

    #[test]
    fn ownership_key_format() {
        let account_id = AccountId::generate();
        let item_id = ItemId::new(5).unwrap();
        let key = ownership_key(&account_id, item_id);

        assert_eq!(key.len(), 24);
        assert_eq!(&key[..16], account_id.as_bytes());
        assert_eq!(&key[16..], &5u64.to_be_bytes());
    }

    #[test]
    fn account_transaction_key_format() {
        let account_id = AccountId::generate();
        let tx_id = TransactionId::generate();
        let key = account_transaction_key(&account_id, &tx_id);

        assert_eq!(key.len(), 32);
        assert_eq!(&key[..16], account_id.as_bytes());
        assert_eq!(transaction_id_from_account_key(&key), Some(tx_id));
        assert!(key < account_transactions_upper_bound(&account_id));
    }

    #[test]
    fn malformed_index_key_is_rejected() {
        assert_eq!(transaction_id_from_account_key(&[0u8; 20]), None);
    }

    #[test]
    fn idempotency_keys_are_scoped_per_account() {
        let a = AccountId::generate();
        let b = AccountId::generate();
        assert_ne!(idempotency_key(&a, "pay_123"), idempotency_key(&b, "pay_123"));
    }
}
