//! Cart endpoints of the BFF against the fake commerce platform.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use serde_json::json;
use shopfront_core::{CartModel, ErrorBody};
use shopfront_integration_tests::{TestContext, commerce, test_address};

#[tokio::test]
async fn test_create_and_fetch_cart() {
    let ctx = TestContext::start().await;
    let cart = ctx.create_cart(&[("TEE-M", 2)]).await;

    assert_eq!(cart.line_items.len(), 1);
    assert_eq!(cart.item_count, 2);
    assert_eq!(cart.line_items[0].sku.as_deref(), Some("TEE-M"));
    assert_eq!(cart.line_items[0].name, "Organic Tee");
    assert_eq!(cart.total.cent_amount, 5000);
    assert_eq!(cart.currency, "EUR");

    let fetched: CartModel = ctx
        .client
        .get(ctx.url(&format!("/api/carts/{}", cart.id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched.id, cart.id);
    assert_eq!(fetched.version, cart.version);
}

#[tokio::test]
async fn test_unknown_cart_returns_not_found_envelope() {
    let ctx = TestContext::start().await;

    let response = ctx
        .client
        .get(ctx.url("/api/carts/does-not-exist"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: ErrorBody = response.json().await.unwrap();
    assert_eq!(body.code, "NotFound");
    assert!(body.message.contains("does-not-exist"));
}

#[tokio::test]
async fn test_update_without_changes_does_not_write() {
    let ctx = TestContext::start().await;
    let cart = ctx.create_cart(&[("TEE-M", 2)]).await;
    let line_id = cart.line_items[0].id.clone();

    let response = ctx
        .update_cart(
            &cart.id,
            Some(cart.version),
            json!([{"action": "changeLineItemQuantity", "lineItemId": line_id, "quantity": 2}]),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let unchanged: CartModel = response.json().await.unwrap();
    assert_eq!(unchanged.version, cart.version);
    assert_eq!(ctx.vendor.cart_writes(&cart.id), 0);
}

#[tokio::test]
async fn test_stale_client_version_is_refreshed() {
    let ctx = TestContext::start().await;
    let cart = ctx.create_cart(&[("TEE-M", 1)]).await;
    ctx.vendor.bump_cart_version(&cart.id);

    let response = ctx
        .update_cart(
            &cart.id,
            Some(cart.version),
            json!([{"action": "addLineItem", "sku": "MUG", "quantity": 1}]),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let updated: CartModel = response.json().await.unwrap();
    assert_eq!(updated.line_items.len(), 2);
    assert_eq!(updated.version, cart.version + 2);

    let sent = ctx.vendor.cart_updates();
    assert_eq!(sent.last().unwrap()["version"], cart.version + 1);
}

#[tokio::test]
async fn test_concurrent_modification_is_surfaced() {
    let ctx = TestContext::start().await;
    let cart = ctx.create_cart(&[("TEE-M", 1)]).await;
    ctx.vendor.conflict_on_next_cart_update();

    let response = ctx
        .update_cart(
            &cart.id,
            None,
            json!([{"action": "addLineItem", "sku": "MUG"}]),
        )
        .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: ErrorBody = response.json().await.unwrap();
    assert_eq!(body.code, "ConcurrentModification");
    assert_eq!(body.errors[0].code, "ConcurrentModification");

    // No retry: exactly one write reached the platform
    assert_eq!(ctx.vendor.cart_writes(&cart.id), 1);
}

#[tokio::test]
async fn test_line_change_reprices_shipping_and_recalculates() {
    let ctx = TestContext::start().await;
    let cart = ctx.create_cart(&[("TEE-M", 1)]).await;
    let cart = ctx.prepare_for_checkout(&cart).await;

    let response = ctx
        .update_cart(
            &cart.id,
            Some(cart.version),
            json!([{"action": "addDiscountCode", "code": commerce::DISCOUNT_CODE}]),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let cart: CartModel = response.json().await.unwrap();
    assert!(cart.discounts.iter().any(|d| d.applied));

    let line_id = cart.line_items[0].id.clone();
    let response = ctx
        .update_cart(
            &cart.id,
            Some(cart.version),
            json!([{"action": "changeLineItemQuantity", "lineItemId": line_id, "quantity": 3}]),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(
        ctx.vendor.last_update_actions(),
        ["changeLineItemQuantity", "setShippingMethod", "recalculate"]
    );
    let updated: CartModel = response.json().await.unwrap();
    assert_eq!(
        updated.total.cent_amount,
        3 * 2500 - commerce::DISCOUNT_CENTS + commerce::SHIPPING_CENTS
    );
}

#[tokio::test]
async fn test_country_change_unsets_shipping_method() {
    let ctx = TestContext::start().await;
    let cart = ctx.create_cart(&[("MUG", 1)]).await;
    let cart = ctx.prepare_for_checkout(&cart).await;
    assert!(cart.shipping_info.is_some());

    let mut address = test_address();
    address["country"] = json!("AT");
    address["city"] = json!("Wien");
    let response = ctx
        .update_cart(
            &cart.id,
            Some(cart.version),
            json!([{"action": "setShippingAddress", "address": address}]),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        ctx.vendor.last_update_actions(),
        ["setShippingAddress", "setShippingMethod"]
    );
    let updated: CartModel = response.json().await.unwrap();
    assert!(updated.shipping_info.is_none());
}

#[tokio::test]
async fn test_vendor_validation_errors_are_passed_through() {
    let ctx = TestContext::start().await;
    let cart = ctx.create_cart(&[("TEE-M", 1)]).await;

    let response = ctx
        .update_cart(
            &cart.id,
            Some(cart.version),
            json!([{"action": "addDiscountCode", "code": "BOGUS"}]),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ErrorBody = response.json().await.unwrap();
    assert_eq!(body.code, "BadRequest");
    assert_eq!(body.errors[0].code, "DiscountCodeNonApplicable");
}

#[tokio::test]
async fn test_invalid_actions_are_rejected_before_reaching_the_platform() {
    let ctx = TestContext::start().await;
    let cart = ctx.create_cart(&[("TEE-M", 1)]).await;

    let response = ctx
        .update_cart(
            &cart.id,
            None,
            json!([{"action": "changeLineItemQuantity", "lineItemId": "x", "quantity": -1}]),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(ctx.vendor.count("GET", &format!("/test-project/carts/{}", cart.id)), 0);
}

#[tokio::test]
async fn test_delete_cart() {
    let ctx = TestContext::start().await;
    let cart = ctx.create_cart(&[("MUG", 1)]).await;

    let response = ctx
        .client
        .delete(ctx.url(&format!("/api/carts/{}", cart.id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(ctx.vendor.cart(&cart.id).is_none());
}

#[tokio::test]
async fn test_access_token_is_reused() {
    let ctx = TestContext::start().await;
    let cart = ctx.create_cart(&[("MUG", 1)]).await;
    for _ in 0..3 {
        ctx.client
            .get(ctx.url(&format!("/api/carts/{}", cart.id)))
            .send()
            .await
            .unwrap();
    }

    assert_eq!(ctx.vendor.token_requests(), 1);
}
