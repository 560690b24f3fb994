//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Product listing (?page=)
//! GET  /health                 - Health check
//!
//! # Products
//! GET  /products/{id}          - Product detail
//!
//! # Cart (forms redirect back to /cart)
//! GET  /cart                   - Cart page
//! POST /cart/add               - Add variant (creates cart on first add)
//! POST /cart/update            - Change quantity
//! POST /cart/remove            - Remove line
//! POST /cart/discount          - Apply discount code
//! POST /cart/discount/remove   - Remove discount code
//!
//! # Checkout
//! GET  /checkout               - Current wizard step
//! POST /checkout/address       - Email and address → shipping
//! POST /checkout/shipping      - Shipping method → payment
//! POST /checkout/payment       - Start payment, hand off to the gateway
//! GET  /checkout/return        - Gateway return, place order
//! GET  /checkout/back/{step}   - Back to an earlier step
//!
//! # Orders
//! GET  /orders/{id}            - Order confirmation
//! ```

pub mod cart;
pub mod checkout;
pub mod home;
pub mod orders;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/discount", post(cart::apply_discount))
        .route("/discount/remove", post(cart::remove_discount))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::show))
        .route("/address", post(checkout::address))
        .route("/shipping", post(checkout::shipping))
        .route("/payment", post(checkout::payment))
        .route("/return", get(checkout::payment_return))
        .route("/back/{step}", get(checkout::back))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/health", get(health))
        .route("/products/{id}", get(products::show))
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
        .route("/orders/{id}", get(orders::show))
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}
