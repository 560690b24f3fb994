//! Product route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use shopfront_core::{ProductListModel, ProductModel};
use tracing::instrument;

use super::ApiQuery;
use crate::commerce::ProductQuery;
use crate::error::Result;
use crate::mappers::{map_product, map_product_list};
use crate::state::AppState;

const DEFAULT_LIMIT: i64 = 20;
const MAX_LIMIT: i64 = 100;

/// Query for `GET /api/products`.
#[derive(Debug, Default, Deserialize)]
pub struct ProductListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    /// Full-text search term.
    pub q: Option<String>,
    pub category: Option<String>,
}

impl ProductListQuery {
    fn to_query(&self, locale: &str) -> ProductQuery {
        ProductQuery {
            limit: self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
            offset: self.offset.unwrap_or(0).max(0),
            text: self
                .q
                .as_deref()
                .map(str::trim)
                .filter(|q| !q.is_empty())
                .map(str::to_string),
            text_locale: Some(locale.to_string()),
            category: self.category.clone().filter(|c| !c.is_empty()),
        }
    }
}

/// List or search products.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ProductListQuery>,
) -> Result<Json<ProductListModel>> {
    let page = state
        .commerce()
        .search_products(&query.to_query(&state.shop().locale))
        .await?;
    Ok(Json(map_product_list(&page, state.shop())))
}

/// Get a product by ID.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<ProductModel>> {
    let product = state.commerce().get_product(&id).await?;
    Ok(Json(map_product(&product, state.shop())))
}

/// Get a product by key.
#[instrument(skip(state))]
pub async fn by_key(State(state): State<AppState>, Path(key): Path<String>) -> Result<Json<ProductModel>> {
    let product = state.commerce().get_product_by_key(&key).await?;
    Ok(Json(map_product(&product, state.shop())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_defaults_and_clamping() {
        let query = ProductListQuery::default().to_query("en-GB");
        assert_eq!(query.limit, DEFAULT_LIMIT);
        assert_eq!(query.offset, 0);
        assert!(query.text.is_none());

        let query = ProductListQuery {
            limit: Some(500),
            offset: Some(-3),
            q: Some("  ".to_string()),
            category: Some(String::new()),
        }
        .to_query("en-GB");
        assert_eq!(query.limit, MAX_LIMIT);
        assert_eq!(query.offset, 0);
        assert!(query.text.is_none());
        assert!(query.category.is_none());
    }
}
