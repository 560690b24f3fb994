//! Commerce platform REST API client.
//!
//! # Architecture
//!
//! - Plain REST over `reqwest`; JSON bodies mirror the vendor schema in [`types`]
//! - The commerce platform is the source of truth - NO local state
//! - Bearer tokens from the OAuth client-credentials flow, cached until expiry
//! - Single product projections cached in memory via `moka` (5 minute TTL);
//!   listings and searches always hit the platform
//! - Carts, orders and payments are never cached (mutable, versioned state)
//! - Resource ids are percent-encoded into one path segment
//!
//! # Example
//!
//! ```rust,ignore
//! use shopfront_bff::commerce::CommerceClient;
//!
//! let client = CommerceClient::new(&config.commerce);
//! let cart = client.get_cart("cart-id").await?;
//! let cart = client
//!     .update_cart(&cart.id, cart.version, &[CartUpdateAction::AddLineItem {
//!         sku: "SKU-1".to_string(),
//!         quantity: 1,
//!     }])
//!     .await?;
//! ```

pub mod actions;
mod auth;
mod cache;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::CommerceConfig;

pub use actions::{CartUpdateAction, PaymentUpdateAction};
use actions::UpdateRequest;
use auth::TokenProvider;
use cache::CacheValue;
use types::{
    ApiErrorItem, ApiErrorResponse, Cart, CartDraft, Order, OrderFromCartDraft,
    PagedQueryResponse, Payment, PaymentDraft, ProductProjection, ShippingMethod,
};

/// Expansion applied to every cart and order read so discount codes carry their code.
const DISCOUNT_CODE_EXPANSION: &str = "discountCodes[*].discountCode";

/// Errors that can occur when interacting with the commerce platform.
#[derive(Debug, Error)]
pub enum CommerceError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error {status}: {}", .body.message)]
    Api { status: u16, body: ApiErrorResponse },

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The resource version sent with an update is stale.
    #[error("Concurrent modification (current version {current_version:?})")]
    ConcurrentModification {
        current_version: Option<i64>,
        body: ApiErrorResponse,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Access token could not be obtained.
    #[error("Authentication failed: {0}")]
    Auth(String),
}

impl CommerceError {
    /// Upstream HTTP status, if the error carries one.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            Self::Api { status, .. } => Some(*status),
            Self::NotFound(_) => Some(404),
            Self::ConcurrentModification { .. } => Some(409),
            Self::Parse(_) | Self::Auth(_) => None,
        }
    }

    /// Vendor error entries, if any.
    #[must_use]
    pub fn details(&self) -> &[ApiErrorItem] {
        match self {
            Self::Api { body, .. } | Self::ConcurrentModification { body, .. } => &body.errors,
            _ => &[],
        }
    }

    /// Replace a 404 API error with a descriptive `NotFound`.
    fn or_not_found(self, what: impl FnOnce() -> String) -> Self {
        match self {
            Self::Api { status: 404, .. } => Self::NotFound(what()),
            other => other,
        }
    }
}

/// Build a `CommerceError` from a non-success response body.
fn api_error(status: StatusCode, body: &str) -> CommerceError {
    let parsed: ApiErrorResponse =
        serde_json::from_str(body).unwrap_or_else(|_| ApiErrorResponse {
            status_code: status.as_u16(),
            message: body.chars().take(200).collect(),
            errors: Vec::new(),
        });

    if status == StatusCode::CONFLICT
        && let Some(conflict) = parsed
            .errors
            .iter()
            .find(|e| e.code == "ConcurrentModification")
    {
        return CommerceError::ConcurrentModification {
            current_version: conflict.current_version,
            body: parsed,
        };
    }

    CommerceError::Api {
        status: status.as_u16(),
        body: parsed,
    }
}

/// Product search parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductQuery {
    pub limit: i64,
    pub offset: i64,
    /// Full-text search term.
    pub text: Option<String>,
    /// Language for the full-text search (e.g. `en-GB`).
    pub text_locale: Option<String>,
    /// Category ID filter.
    pub category: Option<String>,
}

impl ProductQuery {
    fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("limit".to_string(), self.limit.to_string()),
            ("offset".to_string(), self.offset.to_string()),
            ("staged".to_string(), "false".to_string()),
            ("markMatchingVariants".to_string(), "false".to_string()),
        ];
        if let Some(text) = &self.text {
            let locale = self.text_locale.as_deref().unwrap_or("en");
            params.push((format!("text.{locale}"), text.clone()));
        }
        if let Some(category) = &self.category {
            params.push((
                "filter.query".to_string(),
                format!("categories.id:\"{category}\""),
            ));
        }
        params
    }
}

/// Path to one resource of a collection.
///
/// The id becomes a single percent-encoded segment. Empty and dot-segment ids
/// would resolve to a different resource and yield `None`.
fn resource_path(collection: &str, id: &str) -> Option<String> {
    if matches!(id, "" | "." | "..") {
        return None;
    }
    Some(format!("{collection}/{}", urlencoding::encode(id)))
}

// =============================================================================
// CommerceClient
// =============================================================================

/// Client for the commerce platform REST API.
///
/// Cheaply cloneable; all clones share the HTTP connection pool, the token
/// and the product cache.
#[derive(Clone)]
pub struct CommerceClient {
    inner: Arc<CommerceClientInner>,
}

struct CommerceClientInner {
    client: reqwest::Client,
    base_url: String,
    auth: TokenProvider,
    cache: Cache<String, CacheValue>,
}

impl CommerceClient {
    /// Create a new commerce API client.
    #[must_use]
    pub fn new(config: &CommerceConfig) -> Self {
        let client = reqwest::Client::new();
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        let auth = TokenProvider::new(
            client.clone(),
            &config.auth_url,
            config.client_id.clone(),
            config.client_secret.clone(),
            config.scopes.clone(),
        );

        Self {
            inner: Arc::new(CommerceClientInner {
                base_url: format!(
                    "{}/{}",
                    config.api_url.trim_end_matches('/'),
                    config.project_key
                ),
                client,
                auth,
                cache,
            }),
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.inner
            .client
            .request(method, format!("{}/{path}", self.inner.base_url))
    }

    /// Authorize, send and decode a request.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, CommerceError> {
        let token = self.inner.auth.access_token().await?;
        let response = request.bearer_auth(token).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::UNAUTHORIZED {
            // Token revoked or expired early; the next request fetches a new one
            self.inner.auth.invalidate().await;
        }

        if !status.is_success() {
            tracing::warn!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Commerce API returned non-success status"
            );
            return Err(api_error(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse commerce API response"
            );
            CommerceError::Parse(e)
        })
    }

    fn update_request<A: Serialize>(&self, path: &str, version: i64, actions: &[A]) -> RequestBuilder {
        self.request(Method::POST, path)
            .json(&UpdateRequest { version, actions })
    }

    /// Verify that credentials are valid by obtaining a token.
    ///
    /// # Errors
    ///
    /// Returns an error if no token can be obtained.
    pub async fn check_auth(&self) -> Result<(), CommerceError> {
        self.inner.auth.access_token().await.map(|_| ())
    }

    // =========================================================================
    // Cart Methods (not cached - mutable state)
    // =========================================================================

    /// Get a cart by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart is not found or the API request fails.
    #[instrument(skip(self), fields(cart_id = %cart_id))]
    pub async fn get_cart(&self, cart_id: &str) -> Result<Cart, CommerceError> {
        let path = resource_path("carts", cart_id)
            .ok_or_else(|| CommerceError::NotFound(format!("Cart not found: {cart_id}")))?;
        self.send(
            self.request(Method::GET, &path)
                .query(&[("expand", DISCOUNT_CODE_EXPANSION)]),
        )
        .await
        .map_err(|e| e.or_not_found(|| format!("Cart not found: {cart_id}")))
    }

    /// Create a cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the draft.
    #[instrument(skip(self, draft))]
    pub async fn create_cart(&self, draft: &CartDraft) -> Result<Cart, CommerceError> {
        self.send(
            self.request(Method::POST, "carts")
                .query(&[("expand", DISCOUNT_CODE_EXPANSION)])
                .json(draft),
        )
        .await
    }

    /// Apply update actions to a cart at the given version.
    ///
    /// # Errors
    ///
    /// Returns `ConcurrentModification` if `version` is stale, or another
    /// error if the API rejects an action.
    #[instrument(skip(self, actions), fields(cart_id = %cart_id, actions = actions.len()))]
    pub async fn update_cart(
        &self,
        cart_id: &str,
        version: i64,
        actions: &[CartUpdateAction],
    ) -> Result<Cart, CommerceError> {
        let path = resource_path("carts", cart_id)
            .ok_or_else(|| CommerceError::NotFound(format!("Cart not found: {cart_id}")))?;
        self.send(
            self.update_request(&path, version, actions)
                .query(&[("expand", DISCOUNT_CODE_EXPANSION)]),
        )
        .await
        .map_err(|e| e.or_not_found(|| format!("Cart not found: {cart_id}")))
    }

    /// Delete a cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart is not found or the version is stale.
    #[instrument(skip(self), fields(cart_id = %cart_id))]
    pub async fn delete_cart(&self, cart_id: &str, version: i64) -> Result<Cart, CommerceError> {
        let path = resource_path("carts", cart_id)
            .ok_or_else(|| CommerceError::NotFound(format!("Cart not found: {cart_id}")))?;
        self.send(
            self.request(Method::DELETE, &path)
                .query(&[("version", version.to_string())]),
        )
        .await
        .map_err(|e| e.or_not_found(|| format!("Cart not found: {cart_id}")))
    }

    // =========================================================================
    // Order Methods
    // =========================================================================

    /// Create an order from a cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be ordered (stale version,
    /// missing shipping address, ...).
    #[instrument(skip(self), fields(cart_id = %cart_id))]
    pub async fn create_order_from_cart(
        &self,
        cart_id: &str,
        version: i64,
    ) -> Result<Order, CommerceError> {
        let draft = OrderFromCartDraft {
            id: cart_id.to_string(),
            version,
        };
        self.send(
            self.request(Method::POST, "orders")
                .query(&[("expand", DISCOUNT_CODE_EXPANSION)])
                .json(&draft),
        )
        .await
    }

    /// Get an order by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the order is not found or the API request fails.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get_order(&self, order_id: &str) -> Result<Order, CommerceError> {
        let path = resource_path("orders", order_id)
            .ok_or_else(|| CommerceError::NotFound(format!("Order not found: {order_id}")))?;
        self.send(
            self.request(Method::GET, &path)
                .query(&[("expand", DISCOUNT_CODE_EXPANSION)]),
        )
        .await
        .map_err(|e| e.or_not_found(|| format!("Order not found: {order_id}")))
    }

    // =========================================================================
    // Payment Methods
    // =========================================================================

    /// Create a payment.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the draft.
    #[instrument(skip(self, draft))]
    pub async fn create_payment(&self, draft: &PaymentDraft) -> Result<Payment, CommerceError> {
        self.send(self.request(Method::POST, "payments").json(draft))
            .await
    }

    /// Get a payment by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the payment is not found or the API request fails.
    #[instrument(skip(self), fields(payment_id = %payment_id))]
    pub async fn get_payment(&self, payment_id: &str) -> Result<Payment, CommerceError> {
        let path = resource_path("payments", payment_id)
            .ok_or_else(|| CommerceError::NotFound(format!("Payment not found: {payment_id}")))?;
        self.send(self.request(Method::GET, &path))
            .await
            .map_err(|e| e.or_not_found(|| format!("Payment not found: {payment_id}")))
    }

    /// Apply update actions to a payment.
    ///
    /// # Errors
    ///
    /// Returns an error if the version is stale or an action is rejected.
    #[instrument(skip(self, actions), fields(payment_id = %payment_id))]
    pub async fn update_payment(
        &self,
        payment_id: &str,
        version: i64,
        actions: &[PaymentUpdateAction],
    ) -> Result<Payment, CommerceError> {
        let path = resource_path("payments", payment_id)
            .ok_or_else(|| CommerceError::NotFound(format!("Payment not found: {payment_id}")))?;
        self.send(self.update_request(&path, version, actions))
            .await
            .map_err(|e| e.or_not_found(|| format!("Payment not found: {payment_id}")))
    }

    // =========================================================================
    // Product Methods (cached)
    // =========================================================================

    /// Get a published product by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found or the API request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn get_product(&self, product_id: &str) -> Result<ProductProjection, CommerceError> {
        let cache_key = cache::product_key(product_id);
        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let path = resource_path("product-projections", product_id)
            .ok_or_else(|| CommerceError::NotFound(format!("Product not found: {product_id}")))?;
        let product: ProductProjection = self
            .send(
                self.request(Method::GET, &path)
                    .query(&[("staged", "false")]),
            )
            .await
            .map_err(|e| e.or_not_found(|| format!("Product not found: {product_id}")))?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;
        Ok(product)
    }

    /// Get a published product by its key.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found or the API request fails.
    #[instrument(skip(self), fields(key = %key))]
    pub async fn get_product_by_key(&self, key: &str) -> Result<ProductProjection, CommerceError> {
        let cache_key = cache::product_by_key_key(key);
        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product key");
            return Ok(*product);
        }

        let path = format!("product-projections/key={}", urlencoding::encode(key));
        let product: ProductProjection = self
            .send(
                self.request(Method::GET, &path)
                    .query(&[("staged", "false")]),
            )
            .await
            .map_err(|e| e.or_not_found(|| format!("Product not found: {key}")))?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;
        Ok(product)
    }

    /// Search published products. Results are not cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn search_products(
        &self,
        query: &ProductQuery,
    ) -> Result<PagedQueryResponse<ProductProjection>, CommerceError> {
        self.send(
            self.request(Method::GET, "product-projections/search")
                .query(&query.to_params()),
        )
        .await
    }

    // =========================================================================
    // Shipping Methods
    // =========================================================================

    /// Shipping methods that can ship the given cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart has no shipping address or the request fails.
    #[instrument(skip(self), fields(cart_id = %cart_id))]
    pub async fn shipping_methods_for_cart(
        &self,
        cart_id: &str,
    ) -> Result<Vec<ShippingMethod>, CommerceError> {
        let page: PagedQueryResponse<ShippingMethod> = self
            .send(
                self.request(Method::GET, "shipping-methods/matching-cart")
                    .query(&[("cartId", cart_id)]),
            )
            .await?;
        Ok(page.results)
    }
}
