//! End-to-end tests for the Shopfront BFF and storefront.
//!
//! The commerce platform and the payment gateway are replaced by an
//! in-memory [`FakeVendor`] served by axum on an ephemeral port. The BFF and
//! the storefront run in-process against it, so the tests need neither
//! network access nor vendor credentials.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p shopfront-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `bff_carts` - cart creation, update planning, version handling, errors
//! - `bff_checkout` - products, shipping, payments and order placement
//! - `storefront_checkout` - the HTML checkout driven with a cookie jar

pub mod commerce;
pub mod gateway;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    Json, Router,
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use secrecy::SecretString;
use serde_json::{Value, json};
use shopfront_bff::commerce::CommerceClient;
use shopfront_bff::config::{CommerceConfig, PaymentConfig, ShopConfig};
use shopfront_bff::payments::PaymentGateway;
use shopfront_core::CartModel;
use tokio::net::TcpListener;

/// Project key of the fake commerce platform.
pub const PROJECT_KEY: &str = "test-project";

/// A request the fake vendor received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
}

/// Mutable vendor state shared by the fake handlers.
#[derive(Debug, Default)]
pub(crate) struct Store {
    pub carts: HashMap<String, Value>,
    pub orders: HashMap<String, Value>,
    pub payments: HashMap<String, Value>,
    /// PSP reference → merchant reference
    pub psp_references: HashMap<String, String>,
    pub requests: Vec<RecordedRequest>,
    pub cart_updates: Vec<Value>,
    pub gateway_requests: Vec<Value>,
    pub token_requests: usize,
    pub conflict_on_next_update: bool,
    pub post_redirects: bool,
    pub order_count: u64,
    pub psp_count: u64,
}

/// In-memory commerce platform and payment gateway.
///
/// Cheap to clone; all clones share one store.
#[derive(Debug, Clone, Default)]
pub struct FakeVendor {
    store: Arc<Mutex<Store>>,
}

impl FakeVendor {
    pub(crate) fn with<R>(&self, f: impl FnOnce(&mut Store) -> R) -> R {
        f(&mut self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().expect("fake vendor state poisoned")
    }

    /// Router serving the commerce API at `/` and the gateway at `/gateway`.
    pub fn router(&self) -> Router {
        Router::new()
            .merge(commerce::router())
            .nest("/gateway", gateway::router())
            .layer(axum::middleware::from_fn_with_state(
                self.clone(),
                authenticate_and_record,
            ))
            .with_state(self.clone())
    }

    /// Every request received so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock().requests.clone()
    }

    /// Number of requests matching a method and path.
    #[must_use]
    pub fn count(&self, method: &str, path: &str) -> usize {
        self.lock()
            .requests
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    /// Number of writes received for a cart.
    #[must_use]
    pub fn cart_writes(&self, cart_id: &str) -> usize {
        self.count("POST", &format!("/{PROJECT_KEY}/carts/{cart_id}"))
    }

    /// Bodies of every cart update, in order.
    #[must_use]
    pub fn cart_updates(&self) -> Vec<Value> {
        self.lock().cart_updates.clone()
    }

    /// Action names of the most recent cart update.
    #[must_use]
    pub fn last_update_actions(&self) -> Vec<String> {
        self.lock()
            .cart_updates
            .last()
            .and_then(|body| body["actions"].as_array())
            .map(|actions| {
                actions
                    .iter()
                    .filter_map(|a| a["action"].as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Request bodies received by the gateway.
    #[must_use]
    pub fn gateway_requests(&self) -> Vec<Value> {
        self.lock().gateway_requests.clone()
    }

    #[must_use]
    pub fn token_requests(&self) -> usize {
        self.lock().token_requests
    }

    #[must_use]
    pub fn cart(&self, id: &str) -> Option<Value> {
        self.lock().carts.get(id).cloned()
    }

    /// Ids of every cart the vendor holds.
    #[must_use]
    pub fn cart_ids(&self) -> Vec<String> {
        self.lock().carts.keys().cloned().collect()
    }

    #[must_use]
    pub fn payment(&self, id: &str) -> Option<Value> {
        self.lock().payments.get(id).cloned()
    }

    /// Simulate a write by another client.
    pub fn bump_cart_version(&self, id: &str) {
        if let Some(cart) = self.lock().carts.get_mut(id) {
            let version = cart["version"].as_i64().unwrap_or(0);
            cart["version"] = json!(version + 1);
        }
    }

    /// Reject the next cart update with a version conflict.
    pub fn conflict_on_next_cart_update(&self) {
        self.lock().conflict_on_next_update = true;
    }

    /// Ask shoppers to be redirected with a form POST to the bank.
    pub fn redirect_with_post(&self) {
        self.lock().post_redirects = true;
    }
}

/// Check credentials the way the vendors do and record the request.
async fn authenticate_and_record(
    State(vendor): State<FakeVendor>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let headers = request.headers();

    if path.starts_with("/gateway") {
        let key = headers.get("x-api-key").and_then(|v| v.to_str().ok());
        if key != Some(gateway::API_KEY) {
            return gateway::error(StatusCode::UNAUTHORIZED, "000", "HTTP Status Response - Unauthorized");
        }
    } else if path != "/oauth/token" {
        let bearer = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));
        if bearer != Some(commerce::TOKEN) {
            return vendor_error(StatusCode::UNAUTHORIZED, "invalid_token", "invalid_token");
        }
    }

    vendor.with(|store| {
        store.requests.push(RecordedRequest {
            method: request.method().to_string(),
            path,
        });
    });
    next.run(request).await
}

/// Commerce platform error body.
pub(crate) fn vendor_error(status: StatusCode, code: &str, message: impl Into<String>) -> Response {
    let message = message.into();
    (
        status,
        Json(json!({
            "statusCode": status.as_u16(),
            "message": message,
            "errors": [{"code": code, "message": message}]
        })),
    )
        .into_response()
}

async fn bind() -> TcpListener {
    TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener")
}

fn spawn(listener: TcpListener, router: Router) {
    tokio::spawn(async move {
        axum::serve(listener, router)
            .await
            .expect("Test server failed");
    });
}

async fn serve(router: Router) -> String {
    let listener = bind().await;
    let addr = listener.local_addr().expect("Test listener has no address");
    spawn(listener, router);
    format!("http://{addr}")
}

/// A BFF wired to a fresh [`FakeVendor`].
pub struct TestContext {
    pub client: reqwest::Client,
    pub vendor: FakeVendor,
    pub bff_url: String,
}

impl TestContext {
    /// Start the fake vendor and a BFF talking to it.
    pub async fn start() -> Self {
        let vendor = FakeVendor::default();
        let vendor_url = serve(vendor.router()).await;

        let commerce = CommerceConfig {
            api_url: vendor_url.clone(),
            auth_url: vendor_url.clone(),
            project_key: PROJECT_KEY.to_string(),
            client_id: "test-client".to_string(),
            client_secret: SecretString::from("k7Qz2mVw9RtX4pLs8NcB"),
            scopes: format!("manage_project:{PROJECT_KEY}"),
        };
        let payment = PaymentConfig {
            api_url: format!("{vendor_url}/gateway"),
            api_key: SecretString::from(gateway::API_KEY),
            merchant_account: gateway::MERCHANT_ACCOUNT.to_string(),
        };

        let state = shopfront_bff::AppState::from_parts(
            ShopConfig::default(),
            CommerceClient::new(&commerce),
            PaymentGateway::new(&payment),
        );
        let bff_url = serve(shopfront_bff::app(state)).await;

        Self {
            client: reqwest::Client::new(),
            vendor,
            bff_url,
        }
    }

    /// Absolute BFF URL for a path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.bff_url)
    }

    /// Start a storefront in front of this BFF and return its base URL.
    pub async fn start_storefront(&self) -> String {
        let listener = bind().await;
        let addr = listener.local_addr().expect("Test listener has no address");
        let base_url = format!("http://{addr}");

        let state = shopfront_storefront::AppState::new(shopfront_storefront::StorefrontConfig {
            host: addr.ip(),
            port: addr.port(),
            base_url: base_url.clone(),
            bff_url: self.bff_url.clone(),
            sentry_dsn: None,
            sentry_environment: None,
            json_logs: false,
        });
        spawn(listener, shopfront_storefront::app(state));
        base_url
    }

    /// Create a cart through the BFF.
    pub async fn create_cart(&self, lines: &[(&str, i64)]) -> CartModel {
        let line_items: Vec<Value> = lines
            .iter()
            .map(|(sku, quantity)| json!({"sku": sku, "quantity": quantity}))
            .collect();
        let response = self
            .client
            .post(self.url("/api/carts"))
            .json(&json!({"line_items": line_items}))
            .send()
            .await
            .expect("Failed to create cart");
        assert_eq!(response.status(), reqwest::StatusCode::CREATED);
        response.json().await.expect("Invalid cart body")
    }

    /// Send cart actions through the BFF.
    pub async fn update_cart(&self, id: &str, version: Option<i64>, actions: Value) -> reqwest::Response {
        self.client
            .post(self.url(&format!("/api/carts/{id}")))
            .json(&json!({"version": version, "actions": actions}))
            .send()
            .await
            .expect("Failed to update cart")
    }

    /// Give a cart a German shipping address and the standard method.
    pub async fn prepare_for_checkout(&self, cart: &CartModel) -> CartModel {
        let response = self
            .update_cart(
                &cart.id,
                Some(cart.version),
                json!([
                    {"action": "setCustomerEmail", "email": "ada@example.test"},
                    {"action": "setShippingAddress", "address": test_address()},
                    {"action": "setBillingAddress", "address": test_address()},
                    {"action": "setShippingMethod", "shippingMethodId": commerce::SHIPPING_METHOD_ID}
                ]),
            )
            .await;
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        response.json().await.expect("Invalid cart body")
    }
}

/// Address in the shape the BFF accepts.
#[must_use]
pub fn test_address() -> Value {
    json!({
        "first_name": "Ada",
        "last_name": "Lovelace",
        "street_name": "Unter den Linden",
        "street_number": "1",
        "postal_code": "10117",
        "city": "Berlin",
        "country": "DE"
    })
}
