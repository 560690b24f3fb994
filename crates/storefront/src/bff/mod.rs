//! Client for the Shopfront BFF JSON API.
//!
//! The storefront never talks to the commerce platform or the payment
//! gateway directly. Every page handler goes through [`BffClient`], which
//! forwards the current request ID so a page view can be followed through
//! both services.
//!
//! # Example
//!
//! ```rust,ignore
//! use shopfront_storefront::bff::BffClient;
//!
//! let bff = BffClient::new(&config.bff_url);
//! let cart = bff.create_cart(&CreateCartRequest::default()).await?;
//! let cart = bff
//!     .update_cart(&cart.id, Some(cart.version), vec![CartAction::AddLineItem {
//!         sku: "TR-42".to_string(),
//!         quantity: 1,
//!     }])
//!     .await?;
//! ```

use std::sync::Arc;

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use shopfront_core::{
    CartAction, CartModel, CreateCartRequest, CreateOrderRequest, ErrorBody, OrderModel,
    PaymentDetailsRequest, PaymentMethodModel, PaymentModel, ProductListModel, ProductModel,
    ShippingMethodModel, StartPaymentRequest, UpdateCartRequest,
};
use thiserror::Error;
use tracing::instrument;

use crate::middleware::{REQUEST_ID_HEADER, current_request_id};

/// Errors that can occur when calling the BFF.
#[derive(Debug, Error)]
pub enum BffError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The BFF answered with an error envelope.
    #[error("BFF error ({status}): {}", .body.message)]
    Api { status: u16, body: ErrorBody },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl BffError {
    /// Whether the BFF reported the resource as missing.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { status: 404, .. })
    }

    /// Message suitable for showing to the shopper, when there is one.
    ///
    /// Only client errors carry a message meant for the shopper; server
    /// errors are reported generically.
    #[must_use]
    pub fn user_message(&self) -> Option<&str> {
        match self {
            Self::Api { status, body } if (400..500).contains(status) => {
                Some(body.message.as_str())
            }
            _ => None,
        }
    }
}

/// Decode a non-success response into [`BffError::Api`].
///
/// Bodies that are not the error envelope keep the status and a truncated
/// copy of the text.
fn api_error(status: StatusCode, body: &str) -> BffError {
    let body = serde_json::from_str::<ErrorBody>(body).unwrap_or_else(|_| {
        ErrorBody::new(
            "InternalServerError",
            body.chars().take(200).collect::<String>(),
        )
    });
    BffError::Api {
        status: status.as_u16(),
        body,
    }
}

/// Client for the BFF JSON API.
///
/// Cheaply cloneable; clones share the HTTP connection pool.
#[derive(Clone)]
pub struct BffClient {
    inner: Arc<BffClientInner>,
}

struct BffClientInner {
    client: reqwest::Client,
    base_url: String,
}

impl BffClient {
    /// Create a client for the BFF at `base_url`.
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            inner: Arc::new(BffClientInner {
                client: reqwest::Client::new(),
                base_url: base_url.trim_end_matches('/').to_string(),
            }),
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let request = self
            .inner
            .client
            .request(method, format!("{}/api/{path}", self.inner.base_url));
        match current_request_id() {
            Some(id) => request.header(REQUEST_ID_HEADER, id),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, BffError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let error = api_error(status, &body);
            if status.is_server_error() {
                tracing::error!(status = %status, error = %error, "BFF request failed");
            } else {
                tracing::debug!(status = %status, error = %error, "BFF rejected request");
            }
            return Err(error);
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse BFF response"
            );
            BffError::Parse(e)
        })
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Get one page of the product listing.
    ///
    /// # Errors
    ///
    /// Returns an error if the BFF call fails.
    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<ProductListModel, BffError> {
        self.send(
            self.request(Method::GET, "products")
                .query(&[("limit", limit), ("offset", offset)]),
        )
        .await
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the product does not exist or the call fails.
    #[instrument(skip(self))]
    pub async fn get_product(&self, id: &str) -> Result<ProductModel, BffError> {
        self.send(self.request(
            Method::GET,
            &format!("products/{}", urlencoding::encode(id)),
        ))
        .await
    }

    // =========================================================================
    // Carts
    // =========================================================================

    /// Create a cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the BFF call fails.
    #[instrument(skip(self, request))]
    pub async fn create_cart(&self, request: &CreateCartRequest) -> Result<CartModel, BffError> {
        self.send(self.request(Method::POST, "carts").json(request))
            .await
    }

    /// Get a cart by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart does not exist or the call fails.
    #[instrument(skip(self))]
    pub async fn get_cart(&self, id: &str) -> Result<CartModel, BffError> {
        self.send(self.request(
            Method::GET,
            &format!("carts/{}", urlencoding::encode(id)),
        ))
        .await
    }

    /// Apply cart actions.
    ///
    /// `version` is the version the page was rendered with; the BFF always
    /// refreshes it before updating.
    ///
    /// # Errors
    ///
    /// Returns an error if the update is rejected or the call fails.
    #[instrument(skip(self, actions), fields(actions = actions.len()))]
    pub async fn update_cart(
        &self,
        id: &str,
        version: Option<i64>,
        actions: Vec<CartAction>,
    ) -> Result<CartModel, BffError> {
        self.send(
            self.request(Method::POST, &format!("carts/{}", urlencoding::encode(id)))
                .json(&UpdateCartRequest { version, actions }),
        )
        .await
    }

    /// Shipping methods that can ship the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the BFF call fails.
    #[instrument(skip(self))]
    pub async fn shipping_methods(&self, cart_id: &str) -> Result<Vec<ShippingMethodModel>, BffError> {
        self.send(
            self.request(Method::GET, "shipping-methods")
                .query(&[("cart_id", cart_id)]),
        )
        .await
    }

    // =========================================================================
    // Payments
    // =========================================================================

    /// Redirect payment methods for the cart total.
    ///
    /// # Errors
    ///
    /// Returns an error if the BFF call fails.
    #[instrument(skip(self))]
    pub async fn payment_methods(&self, cart_id: &str) -> Result<Vec<PaymentMethodModel>, BffError> {
        self.send(
            self.request(Method::GET, "payments/methods")
                .query(&[("cart_id", cart_id)]),
        )
        .await
    }

    /// Start a payment for a cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the payment cannot be started.
    #[instrument(skip(self, request), fields(cart_id = %request.cart_id))]
    pub async fn start_payment(&self, request: &StartPaymentRequest) -> Result<PaymentModel, BffError> {
        self.send(self.request(Method::POST, "payments").json(request))
            .await
    }

    /// Get a payment.
    ///
    /// # Errors
    ///
    /// Returns an error if the payment does not exist or the call fails.
    #[instrument(skip(self))]
    pub async fn get_payment(&self, id: &str) -> Result<PaymentModel, BffError> {
        self.send(self.request(
            Method::GET,
            &format!("payments/{}", urlencoding::encode(id)),
        ))
        .await
    }

    /// Complete a redirect payment with the gateway's `redirectResult`.
    ///
    /// # Errors
    ///
    /// Returns an error if the gateway rejects the result or the call fails.
    #[instrument(skip(self, redirect_result))]
    pub async fn submit_payment_details(
        &self,
        id: &str,
        redirect_result: &str,
    ) -> Result<PaymentModel, BffError> {
        self.send(
            self.request(
                Method::POST,
                &format!("payments/{}/details", urlencoding::encode(id)),
            )
            .json(&PaymentDetailsRequest {
                redirect_result: redirect_result.to_string(),
            }),
        )
        .await
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Place an order from a cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the order cannot be created.
    #[instrument(skip(self))]
    pub async fn create_order(&self, cart_id: &str) -> Result<OrderModel, BffError> {
        self.send(self.request(Method::POST, "orders").json(&CreateOrderRequest {
            cart_id: cart_id.to_string(),
        }))
        .await
    }

    /// Get an order by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the order does not exist or the call fails.
    #[instrument(skip(self))]
    pub async fn get_order(&self, id: &str) -> Result<OrderModel, BffError> {
        self.send(self.request(
            Method::GET,
            &format!("orders/{}", urlencoding::encode(id)),
        ))
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_decodes_envelope() {
        let err = api_error(
            StatusCode::BAD_REQUEST,
            r#"{"code":"BadRequest","message":"The discount code was not found.","errors":[]}"#,
        );
        assert_eq!(err.user_message(), Some("The discount code was not found."));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_api_error_not_found() {
        let err = api_error(
            StatusCode::NOT_FOUND,
            r#"{"code":"NotFound","message":"Product not found: p-1","errors":[]}"#,
        );
        assert!(err.is_not_found());
    }

    #[test]
    fn test_server_errors_have_no_user_message() {
        let err = api_error(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>");
        assert!(err.user_message().is_none());
        match err {
            BffError::Api { status, body } => {
                assert_eq!(status, 502);
                assert_eq!(body.message, "<html>bad gateway</html>");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
