//! Session-related types.
//!
//! The session only holds UI state: which cart belongs to the visitor and
//! where they are in the checkout wizard. Carts, payments and orders live in
//! the commerce platform.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

/// Session keys.
pub mod keys {
    /// Key for the visitor's cart ID.
    pub const CART_ID: &str = "cart_id";

    /// Key for the current checkout wizard step.
    pub const CHECKOUT_STEP: &str = "checkout_step";

    /// Key for the payment awaiting the gateway's return.
    pub const PAYMENT_ID: &str = "payment_id";

    /// Key for the most recently placed order (confirmation page access).
    pub const LAST_ORDER_ID: &str = "last_order_id";

    /// Key for a one-shot message shown on the next page render.
    pub const FLASH: &str = "flash";
}

/// Checkout wizard step.
///
/// Steps only move forward through form submissions; going back is always
/// allowed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStep {
    #[default]
    Address,
    Shipping,
    Payment,
}

impl CheckoutStep {
    /// Path segment used in `/checkout/back/{step}`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Address => "address",
            Self::Shipping => "shipping",
            Self::Payment => "payment",
        }
    }

    /// Parse a path segment.
    #[must_use]
    pub fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "address" => Some(Self::Address),
            "shipping" => Some(Self::Shipping),
            "payment" => Some(Self::Payment),
            _ => None,
        }
    }
}

/// Kind of flash message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlashKind {
    Info,
    Error,
}

/// One-shot message carried across a redirect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Info,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            message: message.into(),
        }
    }

    /// CSS modifier for the message box.
    #[must_use]
    pub const fn css_class(&self) -> &'static str {
        match self.kind {
            FlashKind::Info => "flash-info",
            FlashKind::Error => "flash-error",
        }
    }
}

// =============================================================================
// Session Helpers
// =============================================================================

/// Read a value, treating store errors as absent.
async fn get<T: serde::de::DeserializeOwned>(session: &Session, key: &str) -> Option<T> {
    match session.get::<T>(key).await {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(key, error = %e, "Failed to read session value");
            None
        }
    }
}

/// Write a value, logging store errors.
async fn set<T: Serialize + Send + Sync>(session: &Session, key: &str, value: T) {
    if let Err(e) = session.insert(key, value).await {
        tracing::error!(key, error = %e, "Failed to write session value");
    }
}

/// Remove a value, logging store errors.
async fn clear(session: &Session, key: &str) {
    if let Err(e) = session.remove_value(key).await {
        tracing::error!(key, error = %e, "Failed to remove session value");
    }
}

/// Get the cart ID from the session.
pub async fn get_cart_id(session: &Session) -> Option<String> {
    get(session, keys::CART_ID).await
}

/// Set the cart ID in the session.
pub async fn set_cart_id(session: &Session, cart_id: &str) {
    set(session, keys::CART_ID, cart_id).await;
}

/// Forget the cart (after an order is placed or the cart vanished).
pub async fn clear_cart_id(session: &Session) {
    clear(session, keys::CART_ID).await;
}

/// Current checkout step, defaulting to the first.
pub async fn get_checkout_step(session: &Session) -> CheckoutStep {
    get(session, keys::CHECKOUT_STEP).await.unwrap_or_default()
}

/// Set the checkout step.
pub async fn set_checkout_step(session: &Session, step: CheckoutStep) {
    set(session, keys::CHECKOUT_STEP, step).await;
}

/// Restart the checkout wizard.
pub async fn reset_checkout(session: &Session) {
    clear(session, keys::CHECKOUT_STEP).await;
    clear(session, keys::PAYMENT_ID).await;
}

/// Payment awaiting the gateway's return.
pub async fn get_payment_id(session: &Session) -> Option<String> {
    get(session, keys::PAYMENT_ID).await
}

/// Remember the payment that was sent to the gateway.
pub async fn set_payment_id(session: &Session, payment_id: &str) {
    set(session, keys::PAYMENT_ID, payment_id).await;
}

/// Forget the pending payment; it no longer matches the cart.
pub async fn clear_payment_id(session: &Session) {
    clear(session, keys::PAYMENT_ID).await;
}

/// Most recently placed order.
pub async fn get_last_order_id(session: &Session) -> Option<String> {
    get(session, keys::LAST_ORDER_ID).await
}

/// Remember a placed order.
pub async fn set_last_order_id(session: &Session, order_id: &str) {
    set(session, keys::LAST_ORDER_ID, order_id).await;
}

/// Queue a message for the next page render.
pub async fn set_flash(session: &Session, flash: Flash) {
    set(session, keys::FLASH, flash).await;
}

/// Take the queued message, if any.
pub async fn take_flash(session: &Session) -> Option<Flash> {
    match session.remove::<Flash>(keys::FLASH).await {
        Ok(flash) => flash,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read flash message");
            None
        }
    }
}
