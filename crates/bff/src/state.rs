//! Application state shared across handlers.

use std::sync::Arc;

use crate::commerce::CommerceClient;
use crate::config::{BffConfig, ShopConfig};
use crate::payments::PaymentGateway;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`; holds the vendor clients and shop defaults.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    shop: ShopConfig,
    commerce: CommerceClient,
    payments: PaymentGateway,
}

impl AppState {
    /// Create the state, building both vendor clients from configuration.
    #[must_use]
    pub fn new(config: &BffConfig) -> Self {
        Self::from_parts(
            config.shop.clone(),
            CommerceClient::new(&config.commerce),
            PaymentGateway::new(&config.payment),
        )
    }

    /// Create the state from already-built clients.
    #[must_use]
    pub fn from_parts(shop: ShopConfig, commerce: CommerceClient, payments: PaymentGateway) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                shop,
                commerce,
                payments,
            }),
        }
    }

    /// Shop-wide defaults (locale, currency, country, PIM settings).
    #[must_use]
    pub fn shop(&self) -> &ShopConfig {
        &self.inner.shop
    }

    /// Commerce platform client.
    #[must_use]
    pub fn commerce(&self) -> &CommerceClient {
        &self.inner.commerce
    }

    /// Payment gateway client.
    #[must_use]
    pub fn payments(&self) -> &PaymentGateway {
        &self.inner.payments
    }
}
