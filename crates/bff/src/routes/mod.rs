//! JSON API route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                          - Liveness
//! GET    /health/ready                    - Readiness (commerce token fetch)
//!
//! # Carts
//! POST   /api/carts                       - Create cart
//! GET    /api/carts/{id}                  - Get cart
//! POST   /api/carts/{id}                  - Apply cart actions
//! DELETE /api/carts/{id}                  - Delete cart
//! GET    /api/carts/{id}/shipping-methods - Shipping methods for cart
//! GET    /api/shipping-methods?cart_id=   - Shipping methods for cart
//!
//! # Orders
//! POST   /api/orders                      - Place order from cart
//! GET    /api/orders/{id}                 - Get order
//!
//! # Payments
//! GET    /api/payments/methods?cart_id=   - Payment methods for cart total
//! POST   /api/payments                    - Start payment
//! GET    /api/payments/{id}               - Get payment
//! POST   /api/payments/{id}/details       - Complete redirect payment
//!
//! # Products
//! GET    /api/products                    - Product listing / search
//! GET    /api/products/{id}               - Product by ID
//! GET    /api/products/key/{key}          - Product by key
//! ```

pub mod carts;
pub mod orders;
pub mod payments;
pub mod products;
pub mod shipping;

use axum::{
    Json, Router,
    extract::{FromRequest, FromRequestParts, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;

use crate::error::AppError;
use crate::state::AppState;

/// JSON body extractor whose rejections use the API error envelope.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

impl<T: Serialize> IntoResponse for ApiJson<T> {
    fn into_response(self) -> Response {
        Json(self.0).into_response()
    }
}

/// Query string extractor whose rejections use the API error envelope.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(carts::create))
        .route(
            "/{id}",
            get(carts::show).post(carts::update).delete(carts::delete),
        )
        .route("/{id}/shipping-methods", get(shipping::for_cart))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(orders::create))
        .route("/{id}", get(orders::show))
}

/// Create the payment routes router.
pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(payments::start))
        .route("/methods", get(payments::methods))
        .route("/{id}", get(payments::show))
        .route("/{id}/details", post(payments::details))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
        .route("/key/{key}", get(products::by_key))
}

/// Create all routes for the BFF.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/api/carts", cart_routes())
        .route("/api/shipping-methods", get(shipping::index))
        .nest("/api/orders", order_routes())
        .nest("/api/payments", payment_routes())
        .nest("/api/products", product_routes())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies that a commerce access token can be obtained.
/// Returns 503 Service Unavailable otherwise.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.commerce().check_auth().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
