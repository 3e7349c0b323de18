//! Skin catalog handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use xolbor_core::{Item, ItemId, Rarity};

use crate::auth::AdminAuth;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::services::{CatalogFilter, NewItem};
use crate::state::AppState;

/// Catalog item response.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemResponse {
    /// Item ID.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// Price in Xubor.
    pub price: i64,
    /// Rarity tier.
    pub rarity: Rarity,
    /// Category, if any.
    pub category: Option<String>,
    /// Created timestamp.
    pub created_at: String,
}

impl From<&Item> for ItemResponse {
    fn from(item: &Item) -> Self {
        Self {
            id: item.id.get(),
            name: item.name.clone(),
            price: item.price,
            rarity: item.rarity,
            category: item.category.clone(),
            created_at: item.created_at.to_rfc3339(),
        }
    }
}

/// Listing query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ListItemsQuery {
    /// Rarity name, case-insensitive.
    pub rarity: Option<String>,
    /// Name substring.
    pub search: Option<String>,
    /// Page size.
    pub limit: Option<usize>,
    /// Items to skip.
    pub offset: Option<usize>,
}

/// Listing response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListItemsResponse {
    /// Items on this page.
    pub items: Vec<ItemResponse>,
    /// Items matching the filter.
    pub total: usize,
}

/// List catalog items.
pub async fn list_items(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<ListItemsQuery>,
) -> Result<Json<ListItemsResponse>, ApiError> {
    let rarity = query
        .rarity
        .as_deref()
        .filter(|r| !r.trim().is_empty())
        .map(str::parse::<Rarity>)
        .transpose()?;

    let page = state
        .catalog
        .list_items(CatalogFilter {
            rarity,
            search: query.search,
            limit: query.limit,
            offset: query.offset,
        })
        .await?;

    Ok(Json(ListItemsResponse {
        items: page.items.iter().map(ItemResponse::from).collect(),
        total: page.total,
    }))
}

/// Get one catalog item.
pub async fn get_item(
    State(state): State<Arc<AppState>>,
    ApiPath(item_id): ApiPath<ItemId>,
) -> Result<Json<ItemResponse>, ApiError> {
    let item = state.catalog.get_item(item_id).await?;
    Ok(Json(ItemResponse::from(&item)))
}

/// Register item request.
#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    /// Item ID.
    pub id: ItemId,
    /// Display name.
    pub name: String,
    /// Price in Xubor.
    pub price: i64,
    /// Rarity tier.
    pub rarity: String,
    /// Optional category.
    #[serde(default)]
    pub category: Option<String>,
}

/// Register a catalog item (admin only).
pub async fn create_item(
    State(state): State<Arc<AppState>>,
    admin: AdminAuth,
    ApiJson(body): ApiJson<CreateItemRequest>,
) -> Result<(StatusCode, Json<ItemResponse>), ApiError> {
    let item = state
        .catalog
        .register_item(NewItem {
            id: body.id,
            name: body.name,
            price: body.price,
            rarity: body.rarity.parse()?,
            category: body.category,
        })
        .await?;

    tracing::info!(admin_id = %admin.admin_id, item_id = %item.id, "Item added by admin");

    Ok((StatusCode::CREATED, Json(ItemResponse::from(&item))))
}
