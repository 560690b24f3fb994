//! Application state shared across handlers.

use std::sync::Arc;

use crate::bff::BffClient;
use crate::config::StorefrontConfig;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    bff: BffClient,
}

impl AppState {
    /// Create a new application state with a BFF client for `config.bff_url`.
    #[must_use]
    pub fn new(config: StorefrontConfig) -> Self {
        let bff = BffClient::new(&config.bff_url);
        Self {
            inner: Arc::new(AppStateInner { config, bff }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the BFF client.
    #[must_use]
    pub fn bff(&self) -> &BffClient {
        &self.inner.bff
    }
}
