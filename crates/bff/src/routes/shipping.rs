//! Shipping method route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use shopfront_core::ShippingMethodModel;
use tracing::instrument;

use super::ApiQuery;
use crate::error::{Result, require};
use crate::mappers::map_shipping_method;
use crate::state::AppState;

/// Query for `GET /api/shipping-methods`.
#[derive(Debug, Deserialize)]
pub struct ShippingQuery {
    #[serde(default)]
    pub cart_id: String,
}

/// Shipping methods for a cart (path form).
#[instrument(skip(state))]
pub async fn for_cart(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ShippingMethodModel>>> {
    methods_for(&state, &id).await.map(Json)
}

/// Shipping methods for a cart (query form).
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ShippingQuery>,
) -> Result<Json<Vec<ShippingMethodModel>>> {
    let cart_id = require(&query.cart_id, "cart_id")?;
    methods_for(&state, cart_id).await.map(Json)
}

async fn methods_for(state: &AppState, cart_id: &str) -> Result<Vec<ShippingMethodModel>> {
    let cart = state.commerce().get_cart(cart_id).await?;
    let methods = state.commerce().shipping_methods_for_cart(&cart.id).await?;

    let currency = &cart.total_price.currency_code;
    Ok(methods
        .iter()
        .map(|m| map_shipping_method(m, currency, &state.shop().locale))
        .collect())
}
