//! Shopfront BFF - JSON backend-for-frontend.
//!
//! Sits between the storefront and two vendors:
//!
//! - the commerce platform (carts, orders, payments, products, shipping)
//! - the payment gateway (redirect payment methods and results)
//!
//! Vendor responses are mapped to the view models in `shopfront_core`, and
//! every failure is rendered as the `{code, message, errors[]}` envelope.
//!
//! Cart updates go through [`cart_update::CartUpdater`], which always works
//! from the freshly fetched cart version and drops actions that would not
//! change anything.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart_update;
pub mod commerce;
pub mod config;
pub mod error;
pub mod mappers;
pub mod middleware;
pub mod payments;
pub mod pim;
pub mod routes;
pub mod state;

use axum::Router;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

pub use config::BffConfig;
pub use state::AppState;

/// Build the BFF application router.
pub fn app(state: AppState) -> Router {
    routes::routes()
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        #[allow(clippy::cast_possible_truncation)]
                        span.record("latency_ms", latency.as_millis() as u64);
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use secrecy::SecretString;
    use shopfront_core::ErrorBody;
    use tower::ServiceExt;

    use crate::commerce::CommerceClient;
    use crate::config::{CommerceConfig, PaymentConfig, ShopConfig};
    use crate::payments::PaymentGateway;

    /// State pointing at an address nothing listens on; only routes that
    /// fail before any vendor call are exercised here.
    fn test_state() -> AppState {
        let commerce = CommerceClient::new(&CommerceConfig {
            api_url: "http://127.0.0.1:9".to_string(),
            auth_url: "http://127.0.0.1:9".to_string(),
            project_key: "shop".to_string(),
            client_id: "client".to_string(),
            client_secret: SecretString::from("Zq8#kLp2!vR7@xW4"),
            scopes: "manage_project:shop".to_string(),
        });
        let payments = PaymentGateway::new(&PaymentConfig {
            api_url: "http://127.0.0.1:9".to_string(),
            api_key: SecretString::from("Zq8#kLp2!vR7@xW4"),
            merchant_account: "ShopECOM".to_string(),
        });
        AppState::from_parts(ShopConfig::default(), commerce, payments)
    }

    async fn error_body(response: axum::response::Response) -> ErrorBody {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(test_state())
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_shipping_methods_require_cart_id() {
        let response = app(test_state())
            .oneshot(
                Request::get("/api/shipping-methods")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = error_body(response).await;
        assert_eq!(body.code, "RequiredField");
        assert_eq!(body.errors[0].field.as_deref(), Some("cart_id"));
    }

    #[tokio::test]
    async fn test_malformed_json_uses_envelope() {
        let response = app(test_state())
            .oneshot(
                Request::post("/api/carts/cart-1")
                    .header("content-type", "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_body(response).await.code, "BadRequest");
    }

    #[tokio::test]
    async fn test_empty_actions_rejected_before_vendor_call() {
        let response = app(test_state())
            .oneshot(
                Request::post("/api/carts/cart-1")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"actions": []}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = error_body(response).await;
        assert_eq!(body.code, "RequiredField");
        assert_eq!(body.errors[0].field.as_deref(), Some("actions"));
    }

    #[tokio::test]
    async fn test_payment_start_requires_method() {
        let response = app(test_state())
            .oneshot(
                Request::post("/api/payments")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"cart_id": "cart-1", "return_url": "https://shop.test/r"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_body(response).await.message, "method is required");
    }
}
