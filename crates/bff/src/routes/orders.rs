//! Order route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use shopfront_core::{CreateOrderRequest, OrderModel};
use tracing::instrument;

use super::ApiJson;
use super::payments::AUTHORIZATION;
use crate::commerce::types::{Cart, CommerceMoney, Payment};
use crate::error::{AppError, Result, require};
use crate::mappers::map_order;
use crate::state::AppState;

/// Place an order from a cart at its current version.
///
/// The cart must carry a payment whose authorization succeeded for exactly
/// the cart total; a cart edited after paying is refused.
#[instrument(skip(state, request), fields(cart_id = %request.cart_id))]
pub async fn create(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderModel>)> {
    let cart_id = require(&request.cart_id, "cart_id")?;

    let cart = state.commerce().get_cart(cart_id).await?;
    if cart.line_items.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".to_string()));
    }
    ensure_paid(&state, &cart).await?;

    let order = state
        .commerce()
        .create_order_from_cart(&cart.id, cart.version)
        .await?;
    tracing::info!(order_id = %order.id, cart_id = %cart.id, "Order placed");

    Ok((StatusCode::CREATED, Json(map_order(&order, &state.shop().locale))))
}

async fn ensure_paid(state: &AppState, cart: &Cart) -> Result<()> {
    let payments = cart
        .payment_info
        .as_ref()
        .map(|info| info.payments.as_slice())
        .unwrap_or_default();

    // Most recent payment first
    for reference in payments.iter().rev() {
        let payment = state.commerce().get_payment(&reference.id).await?;
        if covers_total(&payment, &cart.total_price) {
            return Ok(());
        }
    }

    tracing::warn!(cart_id = %cart.id, total = cart.total_price.cent_amount, "No authorised payment covers the cart");
    Err(AppError::BadRequest(
        "Cart has no authorised payment for its total".to_string(),
    ))
}

fn covers_total(payment: &Payment, total: &CommerceMoney) -> bool {
    payment.transactions.iter().any(|t| {
        t.kind == AUTHORIZATION
            && t.state == "Success"
            && t.amount.cent_amount == total.cent_amount
            && t.amount.currency_code == total.currency_code
    })
}

/// Get an order.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<OrderModel>> {
    let order = state.commerce().get_order(&id).await?;
    Ok(Json(map_order(&order, &state.shop().locale)))
}
