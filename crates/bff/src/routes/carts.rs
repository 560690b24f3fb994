//! Cart route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use shopfront_core::{CartModel, CreateCartRequest, UpdateCartRequest};
use tracing::instrument;

use super::ApiJson;
use crate::cart_update::CartUpdater;
use crate::commerce::types::{CartDraft, LineItemDraft};
use crate::error::{AppError, Result, require};
use crate::mappers::map_cart;
use crate::state::AppState;

/// Create a cart, defaulting currency and country to the shop's.
#[instrument(skip(state, request))]
pub async fn create(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateCartRequest>,
) -> Result<(StatusCode, Json<CartModel>)> {
    let shop = state.shop();

    let mut line_items = Vec::with_capacity(request.line_items.len());
    for line in &request.line_items {
        let sku = require(&line.sku, "sku")?;
        if line.quantity < 0 {
            return Err(AppError::BadRequest(format!(
                "Quantity must not be negative, got {}",
                line.quantity
            )));
        }
        if line.quantity > 0 {
            line_items.push(LineItemDraft {
                sku: sku.to_string(),
                quantity: line.quantity,
            });
        }
    }

    let draft = CartDraft {
        currency: request
            .currency
            .map_or_else(|| shop.currency.clone(), |c| c.to_uppercase()),
        country: Some(
            request
                .country
                .map_or_else(|| shop.country.clone(), |c| c.to_uppercase()),
        ),
        customer_email: request.customer_email.filter(|e| !e.trim().is_empty()),
        line_items,
    };

    let cart = state.commerce().create_cart(&draft).await?;
    tracing::info!(cart_id = %cart.id, "Cart created");
    Ok((StatusCode::CREATED, Json(map_cart(&cart, &shop.locale))))
}

/// Get a cart.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<CartModel>> {
    let cart = state.commerce().get_cart(&id).await?;
    Ok(Json(map_cart(&cart, &state.shop().locale)))
}

/// Apply cart actions.
#[instrument(skip(state, request), fields(actions = request.actions.len()))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateCartRequest>,
) -> Result<Json<CartModel>> {
    let cart = CartUpdater::new(state.commerce())
        .apply(&id, request.version, &request.actions)
        .await?;
    Ok(Json(map_cart(&cart, &state.shop().locale)))
}

/// Delete a cart at its current version.
#[instrument(skip(state))]
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<CartModel>> {
    let cart = state.commerce().get_cart(&id).await?;
    let deleted = state.commerce().delete_cart(&cart.id, cart.version).await?;
    tracing::info!(cart_id = %deleted.id, "Cart deleted");
    Ok(Json(map_cart(&deleted, &state.shop().locale)))
}
