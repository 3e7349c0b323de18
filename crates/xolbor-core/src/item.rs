//! Catalog item (skin) types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};
use crate::ItemId;

/// Maximum length of an item name.
pub const ITEM_NAME_MAX_LEN: usize = 64;

/// A purchasable skin.
///
/// Items are immutable once registered in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// The item ID.
    pub id: ItemId,

    /// Display name.
    pub name: String,

    /// Price in Xubor. Always positive.
    pub price: i64,

    /// Rarity tier.
    pub rarity: Rarity,

    /// Free-form category (e.g. "futuristic").
    pub category: Option<String>,

    /// When the item was added to the catalog.
    pub created_at: DateTime<Utc>,
}

impl Item {
    /// Create a validated item.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::InvalidItem` if the price is not positive or the
    /// name is empty or too long.
    pub fn new(
        id: ItemId,
        name: &str,
        price: i64,
        rarity: Rarity,
        category: Option<String>,
    ) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() || name.chars().count() > ITEM_NAME_MAX_LEN {
            return Err(LedgerError::InvalidItem(format!(
                "name must be between 1 and {ITEM_NAME_MAX_LEN} characters"
            )));
        }
        if price <= 0 {
            return Err(LedgerError::InvalidItem(format!(
                "price must be positive, got {price}"
            )));
        }

        Ok(Self {
            id,
            name: name.to_string(),
            price,
            rarity,
            category: category
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
            created_at: Utc::now(),
        })
    }
}

/// Rarity tier of a skin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    /// Common.
    Common,
    /// Rare.
    Rare,
    /// Epic.
    Epic,
    /// Legendary.
    Legendary,
}

impl Rarity {
    /// Get the rarity name as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::Rare => "rare",
            Self::Epic => "epic",
            Self::Legendary => "legendary",
        }
    }
}

impl std::str::FromStr for Rarity {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "common" => Ok(Self::Common),
            "rare" => Ok(Self::Rare),
            "epic" => Ok(Self::Epic),
            "legendary" => Ok(Self::Legendary),
            other => Err(LedgerError::Validation(format!("unknown rarity: {other}"))),
        }
    }
}

/// The launch catalog: `(id, name, price, rarity, category)`.
const DEFAULT_SKINS: [(u64, &str, i64, Rarity, &str); 10] = [
    (1, "Red Dragon", 1000, Rarity::Legendary, "animals"),
    (2, "Samurai", 500, Rarity::Rare, "characters"),
    (3, "Cyborg", 750, Rarity::Rare, "futuristic"),
    (4, "Pirate", 300, Rarity::Common, "historical"),
    (5, "Astronaut", 800, Rarity::Rare, "space"),
    (6, "Ninja", 400, Rarity::Common, "characters"),
    (7, "Sorcerer", 600, Rarity::Epic, "fantasy"),
    (8, "Robot", 900, Rarity::Legendary, "futuristic"),
    (9, "Knight", 350, Rarity::Common, "historical"),
    (10, "Alien", 700, Rarity::Epic, "space"),
];

/// Build the launch catalog.
#[must_use]
pub fn default_catalog() -> Vec<Item> {
    DEFAULT_SKINS
        .iter()
        .filter_map(|&(id, name, price, rarity, category)| {
            let id = ItemId::new(id).ok()?;
            Item::new(id, name, price, rarity, Some(category.to_string())).ok()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u64) -> ItemId {
        ItemId::new(n).unwrap()
    }

    #[test]
    fn price_must_be_positive() {
        assert!(Item::new(id(1), "Pirate", 0, Rarity::Common, None).is_err());
        assert!(Item::new(id(1), "Pirate", -5, Rarity::Common, None).is_err());
        assert!(Item::new(id(1), "Pirate", 1, Rarity::Common, None).is_ok());
    }

    #[test]
    fn name_must_not_be_blank() {
        let err = Item::new(id(1), "   ", 10, Rarity::Common, None).unwrap_err();
        assert_eq!(err.code(), "InvalidItem");
    }

    #[test]
    fn blank_category_is_dropped() {
        let item = Item::new(id(1), "Pirate", 300, Rarity::Common, Some("  ".into())).unwrap();
        assert!(item.category.is_none());
    }

    #[test]
    fn default_catalog_is_complete_and_valid() {
        let catalog = default_catalog();
        assert_eq!(catalog.len(), DEFAULT_SKINS.len());
        assert!(catalog.iter().all(|item| item.price > 0));

        let astronaut = catalog.iter().find(|item| item.id == id(5)).unwrap();
        assert_eq!(astronaut.price, 800);
    }

    #[test]
    fn rarity_parses_case_insensitively() {
        assert_eq!("Legendary".parse::<Rarity>().unwrap(), Rarity::Legendary);
        assert!("mythic".parse::<Rarity>().is_err());
        assert_eq!(Rarity::Epic.as_str(), "epic");
    }
}
