//! Catalog service: skin registration and listing.

use std::sync::Arc;

use serde::Serialize;

use xolbor_core::{default_catalog, Item, ItemId, LedgerError, Rarity, Result};
use xolbor_store::Store;

use super::run_blocking;

/// Default page size for listings.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Largest page a listing returns.
pub const MAX_PAGE_SIZE: usize = 100;

/// Input for registering a catalog item.
#[derive(Debug, Clone)]
pub struct NewItem {
    /// Item ID.
    pub id: ItemId,
    /// Display name.
    pub name: String,
    /// Price in Xubor.
    pub price: i64,
    /// Rarity tier.
    pub rarity: Rarity,
    /// Optional category.
    pub category: Option<String>,
}

/// Listing filter.
#[derive(Debug, Clone, Default)]
pub struct CatalogFilter {
    /// Only items of this rarity.
    pub rarity: Option<Rarity>,
    /// Case-insensitive substring of the name.
    pub search: Option<String>,
    /// Page size; defaults to [`DEFAULT_PAGE_SIZE`], capped at [`MAX_PAGE_SIZE`].
    pub limit: Option<usize>,
    /// Items to skip.
    pub offset: Option<usize>,
}

impl CatalogFilter {
    fn matches(&self, item: &Item, search: Option<&str>) -> bool {
        self.rarity.map_or(true, |rarity| item.rarity == rarity)
            && search.map_or(true, |needle| item.name.to_lowercase().contains(needle))
    }
}

/// One page of a listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogPage {
    /// Items on this page, cheapest first.
    pub items: Vec<Item>,
    /// Number of items matching the filter across all pages.
    pub total: usize,
}

/// Catalog service.
#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn Store>,
}

impl CatalogService {
    /// Create the service.
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Register a new item.
    ///
    /// # Errors
    ///
    /// Returns `InvalidItem` for a non-positive price or bad name, and
    /// `ItemAlreadyExists` if the ID is taken.
    pub async fn register_item(&self, new: NewItem) -> Result<Item> {
        let item = Item::new(new.id, &new.name, new.price, new.rarity, new.category)?;
        let stored = item.clone();
        run_blocking(&self.store, move |store| store.insert_item(&stored)).await?;

        tracing::info!(
            item_id = %item.id,
            name = %item.name,
            price = item.price,
            rarity = item.rarity.as_str(),
            "Catalog item registered"
        );
        Ok(item)
    }

    /// Get an item.
    ///
    /// # Errors
    ///
    /// Returns `ItemNotFound` if the item doesn't exist.
    pub async fn get_item(&self, item_id: ItemId) -> Result<Item> {
        run_blocking(&self.store, move |store| store.get_item(item_id))
            .await?
            .ok_or(LedgerError::ItemNotFound { item_id })
    }

    /// List items matching `filter`, cheapest first.
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if the catalog cannot be read.
    pub async fn list_items(&self, filter: CatalogFilter) -> Result<CatalogPage> {
        let items = run_blocking(&self.store, |store| store.list_items()).await?;

        let search = filter
            .search
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());
        let matching: Vec<Item> = items
            .into_iter()
            .filter(|item| filter.matches(item, search.as_deref()))
            .collect();

        let total = matching.len();
        let limit = filter
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .min(MAX_PAGE_SIZE);
        let items = matching
            .into_iter()
            .skip(filter.offset.unwrap_or(0))
            .take(limit)
            .collect();

        Ok(CatalogPage { items, total })
    }

    /// Insert the default skins that are not in the catalog yet.
    ///
    /// Returns the number of items inserted.
    ///
    /// # Errors
    ///
    /// Returns `StoreUnavailable` if the catalog cannot be written.
    pub async fn seed_default_catalog(&self) -> Result<usize> {
        let inserted = run_blocking(&self.store, |store| {
            let mut inserted = 0;
            for item in default_catalog() {
                match store.insert_item(&item) {
                    Ok(()) => inserted += 1,
                    Err(e) if matches!(e.as_ledger(), Some(LedgerError::ItemAlreadyExists { .. })) => {}
                    Err(e) => return Err(e),
                }
            }
            Ok(inserted)
        })
        .await?;

        tracing::info!(inserted, "Default catalog seeded");
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xolbor_store::MemoryStore;

    fn service() -> CatalogService {
        CatalogService::new(Arc::new(MemoryStore::new()))
    }

    fn new_item(id: u64, price: i64) -> NewItem {
        NewItem {
            id: ItemId::new(id).unwrap(),
            name: format!("Skin {id}"),
            price,
            rarity: Rarity::Common,
            category: None,
        }
    }

    #[tokio::test]
    async fn register_and_get_item() {
        let catalog = service();
        let item = catalog.register_item(new_item(42, 250)).await.unwrap();

        let fetched = catalog.get_item(item.id).await.unwrap();
        assert_eq!(fetched, item);
    }

    #[tokio::test]
    async fn non_positive_price_is_rejected() {
        let catalog = service();
        for price in [0, -10] {
            let err = catalog.register_item(new_item(1, price)).await.unwrap_err();
            assert_eq!(err.code(), "InvalidItem");
        }
        assert_eq!(catalog.list_items(CatalogFilter::default()).await.unwrap().total, 0);
    }

    #[tokio::test]
    async fn duplicate_id_is_rejected() {
        let catalog = service();
        catalog.register_item(new_item(1, 100)).await.unwrap();
        let err = catalog.register_item(new_item(1, 200)).await.unwrap_err();
        assert_eq!(err.code(), "ItemAlreadyExists");
    }

    #[tokio::test]
    async fn missing_item_is_not_found() {
        let err = service().get_item(ItemId::new(99).unwrap()).await.unwrap_err();
        assert_eq!(err.code(), "ItemNotFound");
    }

    #[tokio::test]
    async fn seeding_is_idempotent() {
        let catalog = service();
        assert_eq!(catalog.seed_default_catalog().await.unwrap(), 10);
        assert_eq!(catalog.seed_default_catalog().await.unwrap(), 0);
        assert_eq!(catalog.list_items(CatalogFilter::default()).await.unwrap().total, 10);
    }

    #[tokio::test]
    async fn listing_filters_and_pages() {
        let catalog = service();
        catalog.seed_default_catalog().await.unwrap();

        let legendary = catalog
            .list_items(CatalogFilter {
                rarity: Some(Rarity::Legendary),
                ..CatalogFilter::default()
            })
            .await
            .unwrap();
        let names: Vec<_> = legendary.items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["Robot", "Red Dragon"]);

        let search = catalog
            .list_items(CatalogFilter {
                search: Some("  NIN ".into()),
                ..CatalogFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(search.total, 1);
        assert_eq!(search.items[0].name, "Ninja");

        let page = catalog
            .list_items(CatalogFilter {
                limit: Some(3),
                offset: Some(1),
                ..CatalogFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 10);
        let prices: Vec<_> = page.items.iter().map(|i| i.price).collect();
        assert_eq!(prices, [350, 400, 500]);
    }
}
