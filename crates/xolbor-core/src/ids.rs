//! Identifier types for the Xolbor ledger.
//!
//! Accounts are keyed by UUID, catalog items by a positive integer and ledger
//! transactions by a monotonic ULID so that a per-account scan returns them in
//! commit order.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::{Mutex, OnceLock, PoisonError};
use ulid::{Generator, Ulid};

/// An account identifier (UUID v4).
///
/// Account IDs are assigned at registration and appear as the `sub` claim of
/// issued access tokens.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId(uuid::Uuid);

impl AccountId {
    /// Create a new identifier from a UUID.
    #[must_use]
    pub const fn from_uuid(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }

    /// Generate a new random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Return the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }

    /// Return the bytes of the UUID (16 bytes).
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }

    /// Create an `AccountId` from bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(uuid::Uuid::from_bytes(bytes))
    }
}

impl FromStr for AccountId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid = uuid::Uuid::parse_str(s).map_err(|_| IdError::InvalidUuid)?;
        Ok(Self(uuid))
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({})", self.0)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for AccountId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AccountId> for String {
    fn from(id: AccountId) -> Self {
        id.0.to_string()
    }
}

/// A catalog item identifier.
///
/// Item IDs are small positive integers assigned by whoever seeds the catalog.
/// Zero is never a valid item ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct ItemId(u64);

impl ItemId {
    /// Create an item ID.
    ///
    /// # Errors
    ///
    /// Returns `IdError::InvalidItemId` for zero.
    pub const fn new(value: u64) -> Result<Self, IdError> {
        if value == 0 {
            return Err(IdError::InvalidItemId);
        }
        Ok(Self(value))
    }

    /// Return the numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Big-endian bytes, so that byte order matches numeric order in key scans.
    #[must_use]
    pub const fn to_be_bytes(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }

    /// Decode from big-endian bytes.
    ///
    /// # Errors
    ///
    /// Returns `IdError::InvalidItemId` if the decoded value is zero.
    pub const fn from_be_bytes(bytes: [u8; 8]) -> Result<Self, IdError> {
        Self::new(u64::from_be_bytes(bytes))
    }
}

impl FromStr for ItemId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: u64 = s.parse().map_err(|_| IdError::InvalidItemId)?;
        Self::new(value)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u64> for ItemId {
    type Error = IdError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ItemId> for u64 {
    fn from(id: ItemId) -> Self {
        id.0
    }
}

/// Process-wide monotonic ULID source.
fn monotonic() -> &'static Mutex<Generator> {
    static GENERATOR: OnceLock<Mutex<Generator>> = OnceLock::new();
    GENERATOR.get_or_init(|| Mutex::new(Generator::new()))
}

/// A transaction identifier using ULID for time-ordering.
///
/// IDs generated in the same process are strictly increasing, even within a
/// single millisecond, so an account's transaction index sorts in commit order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TransactionId(Ulid);

impl TransactionId {
    /// Create a new `TransactionId` from a ULID.
    #[must_use]
    pub const fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid)
    }

    /// Generate a new `TransactionId` greater than every ID generated before it.
    #[must_use]
    pub fn generate() -> Self {
        let mut generator = monotonic().lock().unwrap_or_else(PoisonError::into_inner);
        // Overflow needs 2^80 IDs in one millisecond; fall back to a fresh ULID.
        Self(generator.generate().unwrap_or_else(|_| Ulid::new()))
    }

    /// Return the underlying ULID.
    #[must_use]
    pub const fn as_ulid(&self) -> &Ulid {
        &self.0
    }

    /// Return the bytes of the ULID (16 bytes).
    #[must_use]
    pub fn to_bytes(&self) -> [u8; 16] {
        self.0.to_bytes()
    }

    /// Create a `TransactionId` from bytes.
    #[must_use]
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Ulid::from_bytes(bytes))
    }
}

impl FromStr for TransactionId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ulid = Ulid::from_string(s).map_err(|_| IdError::InvalidUlid)?;
        Ok(Self(ulid))
    }
}

impl fmt::Debug for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransactionId({})", self.0)
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for TransactionId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TransactionId> for String {
    fn from(id: TransactionId) -> Self {
        id.0.to_string()
    }
}

/// Errors that can occur when parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The input is not a valid UUID.
    #[error("invalid UUID format")]
    InvalidUuid,

    /// The input is not a valid ULID.
    #[error("invalid ULID format")]
    InvalidUlid,

    /// The input is not a positive item number.
    #[error("item id must be a positive integer")]
    InvalidItemId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_id_roundtrip() {
        let id = AccountId::generate();
        let parsed = AccountId::from_str(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn account_id_rejects_garbage() {
        assert_eq!(AccountId::from_str("not-a-uuid"), Err(IdError::InvalidUuid));
    }

    #[test]
    fn item_id_rejects_zero() {
        assert_eq!(ItemId::new(0), Err(IdError::InvalidItemId));
        assert_eq!(ItemId::from_str("0"), Err(IdError::InvalidItemId));
        assert_eq!(ItemId::from_str("-3"), Err(IdError::InvalidItemId));
        assert_eq!(ItemId::from_str("5").unwrap().get(), 5);
    }

    #[test]
    fn item_id_serializes_as_number() {
        let id = ItemId::new(5).unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "5");
        assert!(serde_json::from_str::<ItemId>("0").is_err());
    }

    #[test]
    fn item_id_bytes_sort_numerically() {
        let small = ItemId::new(2).unwrap().to_be_bytes();
        let large = ItemId::new(300).unwrap().to_be_bytes();
        assert!(small < large);
    }

    #[test]
    fn transaction_ids_are_strictly_increasing() {
        let ids: Vec<_> = (0..1000).map(|_| TransactionId::generate()).collect();
        assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
        assert!(ids
            .windows(2)
            .all(|pair| pair[0].to_bytes() < pair[1].to_bytes()));
    }

    #[test]
    fn transaction_id_serde_json() {
        let id = TransactionId::generate();
        let json = serde_json::to_string(&id).unwrap();
        let parsed: TransactionId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }
}
