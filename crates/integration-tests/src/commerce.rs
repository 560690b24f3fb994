//! Fake commerce platform REST API.
//!
//! Implements the subset of endpoints the BFF calls, with the platform's
//! optimistic concurrency: every update must carry the current version and
//! bumps it by one.

use std::collections::HashMap;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Map, Value, json};

use crate::{FakeVendor, PROJECT_KEY, vendor_error};

/// Access token handed out by `/oauth/token`.
pub const TOKEN: &str = "test-token";
/// The only discount code the fake platform knows.
pub const DISCOUNT_CODE: &str = "WELCOME";
pub const SHIPPING_METHOD_ID: &str = "sm-standard";
pub const DISCOUNT_CENTS: i64 = 500;
pub const SHIPPING_CENTS: i64 = 495;

const DISCOUNT_CODE_ID: &str = "dc-welcome";

const PIM_BLOB: &str = r#"{
  "identifier": "TEE-001",
  "family": "apparel",
  "values": {
    "description": [
      {"locale": "en_GB", "scope": "ecommerce", "data": "A heavyweight tee cut from organic cotton."},
      {"locale": "de_DE", "scope": "ecommerce", "data": "Ein schweres T-Shirt aus Bio-Baumwolle."}
    ],
    "bullet_points": [{"locale": "en_GB", "scope": null, "data": "- Organic cotton\n- Relaxed fit"}],
    "material": [{"locale": null, "scope": null, "data": "Cotton, Elastane"}],
    "care_instructions": [{"locale": "en_GB", "scope": null, "data": "Machine wash at 30 degrees."}],
    "country_of_origin": [{"locale": null, "scope": null, "data": "Portugal"}]
  }
}"#;

type Reply = Result<Json<Value>, Response>;

pub(crate) fn router() -> Router<FakeVendor> {
    let api = Router::new()
        .route("/carts", post(create_cart))
        .route(
            "/carts/{id}",
            get(get_cart).post(update_cart).delete(delete_cart),
        )
        .route("/orders", post(create_order))
        .route("/orders/{id}", get(get_order))
        .route("/payments", post(create_payment))
        .route("/payments/{id}", get(get_payment).post(update_payment))
        .route("/product-projections/search", get(search_products))
        .route("/product-projections/{id}", get(get_product))
        .route(
            "/shipping-methods/matching-cart",
            get(matching_shipping_methods),
        );

    Router::new()
        .route("/oauth/token", post(token))
        .nest(&format!("/{PROJECT_KEY}"), api)
}

/// Money in the platform's centPrecision format.
#[must_use]
pub fn money(cents: i64) -> Value {
    json!({
        "type": "centPrecision",
        "currencyCode": "EUR",
        "centAmount": cents,
        "fractionDigits": 2
    })
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn not_found(id: &str) -> Response {
    vendor_error(
        StatusCode::NOT_FOUND,
        "ResourceNotFound",
        format!("The Resource with ID '{id}' was not found."),
    )
}

fn invalid(message: impl Into<String>) -> Response {
    vendor_error(StatusCode::BAD_REQUEST, "InvalidOperation", message)
}

fn conflict(current_version: i64) -> Response {
    let message = format!(
        "Object has a different version than expected. Current version is {current_version}."
    );
    (
        StatusCode::CONFLICT,
        Json(json!({
            "statusCode": 409,
            "message": message,
            "errors": [{
                "code": "ConcurrentModification",
                "message": message,
                "currentVersion": current_version
            }]
        })),
    )
        .into_response()
}

fn version_of(value: &Value) -> i64 {
    value["version"].as_i64().unwrap_or(0)
}

/// Array field of an object, created on first use.
fn array_mut<'a>(value: &'a mut Value, key: &str) -> &'a mut Vec<Value> {
    if !value[key].is_array() {
        value[key] = json!([]);
    }
    value[key]
        .as_array_mut()
        .expect("field was just set to an array")
}

fn remove_field(value: &mut Value, key: &str) {
    if let Some(object) = value.as_object_mut() {
        object.remove(key);
    }
}

// =============================================================================
// Catalog
// =============================================================================

fn variant(id: i64, sku: &str, cents: i64, attributes: &Value) -> Value {
    json!({
        "id": id,
        "sku": sku,
        "prices": [{"id": format!("price-{sku}"), "value": money(cents), "country": "DE"}],
        "images": [{"url": format!("https://images.example.test/{}.jpg", sku.to_lowercase())}],
        "attributes": attributes,
        "availability": {"isOnStock": true, "availableQuantity": 25}
    })
}

/// Products the fake platform sells.
#[must_use]
pub fn catalog() -> Vec<Value> {
    vec![
        json!({
            "id": "prod-tee",
            "key": "organic-tee",
            "version": 4,
            "name": {"en-GB": "Organic Tee", "de-DE": "Bio-T-Shirt"},
            "description": {"en-GB": "Everyday tee."},
            "slug": {"en-GB": "organic-tee"},
            "masterVariant": variant(1, "TEE-M", 2500, &json!([
                {"name": "size", "value": "M"},
                {"name": "pimData", "value": PIM_BLOB}
            ])),
            "variants": [variant(2, "TEE-L", 2500, &json!([{"name": "size", "value": "L"}]))]
        }),
        json!({
            "id": "prod-mug",
            "key": "enamel-mug",
            "version": 2,
            "name": {"en-GB": "Enamel Mug"},
            "slug": {"en-GB": "enamel-mug"},
            "masterVariant": variant(1, "MUG", 1200, &json!([])),
            "variants": []
        }),
    ]
}

fn line_item(sku: &str, quantity: i64) -> Option<Value> {
    catalog().into_iter().find_map(|product| {
        let variant = std::iter::once(&product["masterVariant"])
            .chain(product["variants"].as_array().into_iter().flatten())
            .find(|v| v["sku"] == sku)?
            .clone();
        Some(json!({
            "id": new_id(),
            "productId": product["id"],
            "productKey": product["key"],
            "name": product["name"],
            "price": variant["prices"][0],
            "quantity": quantity,
            "totalPrice": money(0),
            "variant": variant
        }))
    })
}

// =============================================================================
// Auth
// =============================================================================

async fn token(State(vendor): State<FakeVendor>) -> Json<Value> {
    vendor.with(|store| store.token_requests += 1);
    Json(json!({
        "access_token": TOKEN,
        "token_type": "Bearer",
        "expires_in": 172_800,
        "scope": format!("manage_project:{PROJECT_KEY}")
    }))
}

// =============================================================================
// Carts
// =============================================================================

fn recompute(cart: &mut Value) {
    let mut subtotal = 0;
    for line in array_mut(cart, "lineItems") {
        let unit = line["price"]["value"]["centAmount"].as_i64().unwrap_or(0);
        let total = unit * line["quantity"].as_i64().unwrap_or(0);
        line["totalPrice"] = money(total);
        subtotal += total;
    }

    let has_code = cart["discountCodes"]
        .as_array()
        .is_some_and(|codes| !codes.is_empty());
    let discount = if has_code { DISCOUNT_CENTS.min(subtotal) } else { 0 };
    if discount > 0 {
        cart["discountOnTotalPrice"] = json!({"discountedAmount": money(discount)});
    } else {
        remove_field(cart, "discountOnTotalPrice");
    }

    let shipping = cart["shippingInfo"]["price"]["centAmount"]
        .as_i64()
        .unwrap_or(0);
    cart["totalPrice"] = money(subtotal - discount + shipping);
}

fn add_line_item(cart: &mut Value, sku: &str, quantity: i64) -> Result<(), Response> {
    let lines = array_mut(cart, "lineItems");
    if let Some(line) = lines.iter_mut().find(|l| l["variant"]["sku"] == sku) {
        let current = line["quantity"].as_i64().unwrap_or(0);
        line["quantity"] = json!(current + quantity);
        return Ok(());
    }
    let line = line_item(sku, quantity).ok_or_else(|| {
        vendor_error(
            StatusCode::BAD_REQUEST,
            "InvalidInput",
            format!("A product with SKU '{sku}' does not exist."),
        )
    })?;
    lines.push(line);
    Ok(())
}

fn apply_cart_action(cart: &mut Value, action: &Value) -> Result<(), Response> {
    let name = action["action"].as_str().unwrap_or_default();
    match name {
        "addLineItem" => {
            let sku = action["sku"].as_str().unwrap_or_default();
            add_line_item(cart, sku, action["quantity"].as_i64().unwrap_or(1))?;
        }
        "changeLineItemQuantity" => {
            let id = action["lineItemId"].as_str().unwrap_or_default();
            let quantity = action["quantity"].as_i64().unwrap_or(0);
            let lines = array_mut(cart, "lineItems");
            if quantity == 0 {
                lines.retain(|l| l["id"] != id);
            } else if let Some(line) = lines.iter_mut().find(|l| l["id"] == id) {
                line["quantity"] = json!(quantity);
            } else {
                return Err(invalid(format!("Line item '{id}' not found.")));
            }
        }
        "removeLineItem" => {
            let id = action["lineItemId"].as_str().unwrap_or_default();
            let lines = array_mut(cart, "lineItems");
            let before = lines.len();
            lines.retain(|l| l["id"] != id);
            if lines.len() == before {
                return Err(invalid(format!("Line item '{id}' not found.")));
            }
        }
        "setShippingAddress" | "setBillingAddress" => {
            let key = if name == "setShippingAddress" {
                "shippingAddress"
            } else {
                "billingAddress"
            };
            match action.get("address") {
                Some(address) if !address.is_null() => cart[key] = address.clone(),
                _ => remove_field(cart, key),
            }
        }
        "setCustomerEmail" => cart["customerEmail"] = action["email"].clone(),
        "setShippingMethod" => match action.get("shippingMethod") {
            Some(reference) if !reference.is_null() => {
                if reference["id"] != SHIPPING_METHOD_ID {
                    return Err(invalid("The shipping method does not match the cart."));
                }
                cart["shippingInfo"] = json!({
                    "shippingMethodName": "Standard",
                    "price": money(SHIPPING_CENTS),
                    "shippingMethod": reference
                });
            }
            _ => remove_field(cart, "shippingInfo"),
        },
        "addDiscountCode" => {
            let code = action["code"].as_str().unwrap_or_default();
            if !code.eq_ignore_ascii_case(DISCOUNT_CODE) {
                return Err(vendor_error(
                    StatusCode::BAD_REQUEST,
                    "DiscountCodeNonApplicable",
                    format!("The discount code '{code}' was not found."),
                ));
            }
            array_mut(cart, "discountCodes").push(json!({
                "discountCode": {
                    "typeId": "discount-code",
                    "id": DISCOUNT_CODE_ID,
                    "obj": {"id": DISCOUNT_CODE_ID, "code": DISCOUNT_CODE}
                },
                "state": "MatchesCart"
            }));
        }
        "removeDiscountCode" => {
            let id = action["discountCode"]["id"].clone();
            array_mut(cart, "discountCodes").retain(|c| c["discountCode"]["id"] != id);
        }
        "addPayment" => {
            if !cart["paymentInfo"].is_object() {
                cart["paymentInfo"] = json!({});
            }
            array_mut(&mut cart["paymentInfo"], "payments").push(action["payment"].clone());
        }
        "recalculate" => {}
        other => return Err(invalid(format!("Unknown update action '{other}'."))),
    }
    Ok(())
}

async fn create_cart(State(vendor): State<FakeVendor>, Json(draft): Json<Value>) -> Reply {
    let mut cart = json!({
        "id": new_id(),
        "version": 1,
        "cartState": "Active",
        "country": draft["country"],
        "customerEmail": draft["customerEmail"],
        "lineItems": [],
        "totalPrice": money(0),
        "discountCodes": []
    });
    for line in draft["lineItems"].as_array().into_iter().flatten() {
        let sku = line["sku"].as_str().unwrap_or_default();
        add_line_item(&mut cart, sku, line["quantity"].as_i64().unwrap_or(1))?;
    }
    recompute(&mut cart);

    vendor.with(|store| {
        let id = cart["id"].as_str().unwrap_or_default().to_string();
        store.carts.insert(id, cart.clone());
    });
    Ok(Json(cart))
}

async fn get_cart(State(vendor): State<FakeVendor>, Path(id): Path<String>) -> Reply {
    vendor
        .cart(&id)
        .map(Json)
        .ok_or_else(|| not_found(&id))
}

async fn update_cart(
    State(vendor): State<FakeVendor>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Reply {
    vendor.with(|store| {
        store.cart_updates.push(body.clone());
        let forced_conflict = std::mem::take(&mut store.conflict_on_next_update);

        let Some(mut cart) = store.carts.get(&id).cloned() else {
            return Err(not_found(&id));
        };
        let current_version = version_of(&cart);
        if forced_conflict || body["version"].as_i64() != Some(current_version) {
            return Err(conflict(current_version));
        }

        for action in body["actions"].as_array().into_iter().flatten() {
            apply_cart_action(&mut cart, action)?;
        }
        cart["version"] = json!(current_version + 1);
        recompute(&mut cart);

        store.carts.insert(id, cart.clone());
        Ok(Json(cart))
    })
}

async fn delete_cart(
    State(vendor): State<FakeVendor>,
    Path(id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Reply {
    vendor.with(|store| {
        let Some(cart) = store.carts.get(&id) else {
            return Err(not_found(&id));
        };
        let current_version = version_of(cart);
        let requested = params.get("version").and_then(|v| v.parse::<i64>().ok());
        if requested != Some(current_version) {
            return Err(conflict(current_version));
        }
        store.carts.remove(&id).map(Json).ok_or_else(|| not_found(&id))
    })
}

// =============================================================================
// Orders
// =============================================================================

const ORDER_FIELDS: &[&str] = &[
    "customerEmail",
    "lineItems",
    "totalPrice",
    "taxedPrice",
    "shippingAddress",
    "billingAddress",
    "shippingInfo",
    "discountCodes",
    "discountOnTotalPrice",
];

async fn create_order(State(vendor): State<FakeVendor>, Json(draft): Json<Value>) -> Reply {
    let cart_id = draft["id"].as_str().unwrap_or_default().to_string();
    vendor.with(|store| {
        let Some(cart) = store.carts.get_mut(&cart_id) else {
            return Err(not_found(&cart_id));
        };
        let current_version = version_of(cart);
        if draft["version"].as_i64() != Some(current_version) {
            return Err(conflict(current_version));
        }
        if cart["cartState"] == "Ordered" {
            return Err(invalid("The cart has already been ordered."));
        }
        cart["cartState"] = json!("Ordered");
        cart["version"] = json!(current_version + 1);

        let mut order = Map::new();
        for field in ORDER_FIELDS {
            if let Some(value) = cart.get(*field) {
                order.insert((*field).to_string(), value.clone());
            }
        }

        store.order_count += 1;
        let id = new_id();
        order.insert("id".to_string(), json!(id));
        order.insert("version".to_string(), json!(1));
        order.insert(
            "orderNumber".to_string(),
            json!(format!("SF-{:05}", store.order_count)),
        );
        order.insert("createdAt".to_string(), json!("2026-10-19T09:30:00.000Z"));
        order.insert("orderState".to_string(), json!("Open"));
        order.insert("paymentState".to_string(), json!("Pending"));

        let order = Value::Object(order);
        store.orders.insert(id, order.clone());
        Ok(Json(order))
    })
}

async fn get_order(State(vendor): State<FakeVendor>, Path(id): Path<String>) -> Reply {
    vendor.with(|store| {
        store
            .orders
            .get(&id)
            .cloned()
            .map(Json)
            .ok_or_else(|| not_found(&id))
    })
}

// =============================================================================
// Payments
// =============================================================================

async fn create_payment(State(vendor): State<FakeVendor>, Json(draft): Json<Value>) -> Reply {
    let payment = json!({
        "id": new_id(),
        "version": 1,
        "amountPlanned": draft["amountPlanned"],
        "paymentMethodInfo": draft["paymentMethodInfo"],
        "transactions": []
    });
    vendor.with(|store| {
        let id = payment["id"].as_str().unwrap_or_default().to_string();
        store.payments.insert(id, payment.clone());
    });
    Ok(Json(payment))
}

async fn get_payment(State(vendor): State<FakeVendor>, Path(id): Path<String>) -> Reply {
    vendor
        .payment(&id)
        .map(Json)
        .ok_or_else(|| not_found(&id))
}

fn apply_payment_action(payment: &mut Value, action: &Value) -> Result<(), Response> {
    match action["action"].as_str().unwrap_or_default() {
        "addTransaction" => {
            let mut transaction = action["transaction"].clone();
            transaction["id"] = json!(new_id());
            array_mut(payment, "transactions").push(transaction);
        }
        "changeTransactionState" => {
            let id = action["transactionId"].as_str().unwrap_or_default();
            let transaction = array_mut(payment, "transactions")
                .iter_mut()
                .find(|t| t["id"] == id)
                .ok_or_else(|| invalid(format!("Transaction '{id}' not found.")))?;
            transaction["state"] = action["state"].clone();
        }
        "setStatusInterfaceCode" => {
            payment["paymentStatus"]["interfaceCode"] = action["interfaceCode"].clone();
        }
        "setStatusInterfaceText" => {
            payment["paymentStatus"]["interfaceText"] = action["interfaceText"].clone();
        }
        other => return Err(invalid(format!("Unknown update action '{other}'."))),
    }
    Ok(())
}

async fn update_payment(
    State(vendor): State<FakeVendor>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Reply {
    vendor.with(|store| {
        let Some(mut payment) = store.payments.get(&id).cloned() else {
            return Err(not_found(&id));
        };
        let current_version = version_of(&payment);
        if body["version"].as_i64() != Some(current_version) {
            return Err(conflict(current_version));
        }
        for action in body["actions"].as_array().into_iter().flatten() {
            apply_payment_action(&mut payment, action)?;
        }
        payment["version"] = json!(current_version + 1);
        store.payments.insert(id, payment.clone());
        Ok(Json(payment))
    })
}

// =============================================================================
// Products & Shipping
// =============================================================================

async fn search_products(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let param = |name: &str, default: usize| {
        params
            .get(name)
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(default)
    };
    let limit = param("limit", 20);
    let offset = param("offset", 0);

    let products = catalog();
    let total = products.len();
    let results: Vec<Value> = products.into_iter().skip(offset).take(limit).collect();

    Json(json!({
        "limit": limit,
        "offset": offset,
        "count": results.len(),
        "total": total,
        "results": results
    }))
}

async fn get_product(Path(id): Path<String>) -> Reply {
    let key = id.strip_prefix("key=");
    catalog()
        .into_iter()
        .find(|p| match key {
            Some(key) => p["key"] == key,
            None => p["id"] == id.as_str(),
        })
        .map(Json)
        .ok_or_else(|| not_found(&id))
}

async fn matching_shipping_methods(
    State(vendor): State<FakeVendor>,
    Query(params): Query<HashMap<String, String>>,
) -> Reply {
    let cart_id = params.get("cartId").cloned().unwrap_or_default();
    let cart = vendor.cart(&cart_id).ok_or_else(|| {
        vendor_error(
            StatusCode::BAD_REQUEST,
            "InvalidInput",
            format!("Cart with ID '{cart_id}' not found."),
        )
    })?;

    let results = if cart["shippingAddress"].is_object() {
        vec![json!({
            "id": SHIPPING_METHOD_ID,
            "key": "standard",
            "name": "Standard",
            "localizedDescription": {"en-GB": "3-5 working days"},
            "isDefault": true,
            "zoneRates": [{
                "zone": {"typeId": "zone", "id": "zone-eu"},
                "shippingRates": [{"price": money(SHIPPING_CENTS), "isMatching": true}]
            }]
        })]
    } else {
        Vec::new()
    };

    Ok(Json(json!({
        "limit": 20,
        "offset": 0,
        "count": results.len(),
        "total": results.len(),
        "results": results
    })))
}
