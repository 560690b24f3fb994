//! Wire types for the commerce platform REST API.
//!
//! These mirror the subset of the vendor schema the BFF reads. Fields the
//! vendor may omit are `Option` or `#[serde(default)]`; unknown fields are
//! ignored.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Localized text keyed by locale (e.g. `en-GB`).
pub type LocalizedString = BTreeMap<String, String>;

// =============================================================================
// Money & References
// =============================================================================

/// Vendor money representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommerceMoney {
    /// `centPrecision` or `highPrecision`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub currency_code: String,
    pub cent_amount: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fraction_digits: Option<u32>,
}

impl CommerceMoney {
    /// Create a cent-precision amount.
    #[must_use]
    pub fn cents(cent_amount: i64, currency_code: impl Into<String>) -> Self {
        Self {
            kind: None,
            currency_code: currency_code.into(),
            cent_amount,
            fraction_digits: None,
        }
    }
}

/// Reference to another resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    pub type_id: String,
    pub id: String,
}

impl Reference {
    #[must_use]
    pub fn new(type_id: &str, id: impl Into<String>) -> Self {
        Self {
            type_id: type_id.to_string(),
            id: id.into(),
        }
    }
}

// =============================================================================
// Address
// =============================================================================

/// Postal address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_address_info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

// =============================================================================
// Products
// =============================================================================

/// Product image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub url: String,
    #[serde(default)]
    pub label: Option<String>,
}

/// Product attribute with an arbitrary JSON value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub value: serde_json::Value,
}

/// Discount applied to a product price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountedPrice {
    pub value: CommerceMoney,
    #[serde(default)]
    pub discount: Option<Reference>,
}

/// Price of a variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Price {
    #[serde(default)]
    pub id: Option<String>,
    pub value: CommerceMoney,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub discounted: Option<DiscountedPrice>,
}

/// Stock information for a variant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    #[serde(default)]
    pub is_on_stock: Option<bool>,
    #[serde(default)]
    pub available_quantity: Option<i64>,
}

/// Product variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductVariant {
    pub id: i64,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub prices: Vec<Price>,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    #[serde(default)]
    pub availability: Option<Availability>,
}

/// Published product projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductProjection {
    pub id: String,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub version: i64,
    pub name: LocalizedString,
    #[serde(default)]
    pub description: Option<LocalizedString>,
    #[serde(default)]
    pub slug: LocalizedString,
    pub master_variant: ProductVariant,
    #[serde(default)]
    pub variants: Vec<ProductVariant>,
}

/// Paged query result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedQueryResponse<T> {
    pub limit: i64,
    pub offset: i64,
    pub count: i64,
    #[serde(default)]
    pub total: Option<i64>,
    pub results: Vec<T>,
}

// =============================================================================
// Carts & Orders
// =============================================================================

/// Discount applied to a line item quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountedLineItemPortion {
    pub discount: Reference,
    pub discounted_amount: CommerceMoney,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountedLineItemPrice {
    pub value: CommerceMoney,
    #[serde(default)]
    pub included_discounts: Vec<DiscountedLineItemPortion>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountedLineItemPriceForQuantity {
    pub quantity: i64,
    pub discounted_price: DiscountedLineItemPrice,
}

/// Cart or order line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub id: String,
    pub product_id: String,
    #[serde(default)]
    pub product_key: Option<String>,
    pub name: LocalizedString,
    pub variant: ProductVariant,
    pub price: Price,
    pub quantity: i64,
    pub total_price: CommerceMoney,
    #[serde(default)]
    pub discounted_price_per_quantity: Vec<DiscountedLineItemPriceForQuantity>,
}

/// Net/gross totals once taxes are calculated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxedPrice {
    pub total_net: CommerceMoney,
    pub total_gross: CommerceMoney,
    #[serde(default)]
    pub total_tax: Option<CommerceMoney>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountedShippingPrice {
    pub value: CommerceMoney,
}

/// Shipping method selected on a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingInfo {
    pub shipping_method_name: String,
    pub price: CommerceMoney,
    #[serde(default)]
    pub shipping_method: Option<Reference>,
    #[serde(default)]
    pub discounted_price: Option<DiscountedShippingPrice>,
}

/// Expanded discount code resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountCode {
    pub id: String,
    pub code: String,
    #[serde(default)]
    pub name: Option<LocalizedString>,
}

/// Discount code reference, expanded when requested with `expand`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountCodeReference {
    pub type_id: String,
    pub id: String,
    #[serde(default)]
    pub obj: Option<DiscountCode>,
}

/// Discount code attached to a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountCodeInfo {
    pub discount_code: DiscountCodeReference,
    #[serde(default)]
    pub state: Option<String>,
}

/// Cart-level discount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountOnTotalPrice {
    pub discounted_amount: CommerceMoney,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInfo {
    #[serde(default)]
    pub payments: Vec<Reference>,
}

/// Shopping cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub id: String,
    pub version: i64,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub cart_state: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    pub total_price: CommerceMoney,
    #[serde(default)]
    pub taxed_price: Option<TaxedPrice>,
    #[serde(default)]
    pub shipping_address: Option<Address>,
    #[serde(default)]
    pub billing_address: Option<Address>,
    #[serde(default)]
    pub shipping_info: Option<ShippingInfo>,
    #[serde(default)]
    pub discount_codes: Vec<DiscountCodeInfo>,
    #[serde(default)]
    pub discount_on_total_price: Option<DiscountOnTotalPrice>,
    #[serde(default)]
    pub payment_info: Option<PaymentInfo>,
}

impl Cart {
    /// Currently selected shipping method ID.
    #[must_use]
    pub fn shipping_method_id(&self) -> Option<&str> {
        self.shipping_info
            .as_ref()
            .and_then(|info| info.shipping_method.as_ref())
            .map(|r| r.id.as_str())
    }

    /// Find a line by ID.
    #[must_use]
    pub fn line_item(&self, id: &str) -> Option<&LineItem> {
        self.line_items.iter().find(|line| line.id == id)
    }
}

/// Line to create with a new cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemDraft {
    pub sku: String,
    pub quantity: i64,
}

/// Body for creating a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartDraft {
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub line_items: Vec<LineItemDraft>,
}

/// Placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub version: i64,
    #[serde(default)]
    pub order_number: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    pub order_state: String,
    #[serde(default)]
    pub payment_state: Option<String>,
    #[serde(default)]
    pub shipment_state: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    pub total_price: CommerceMoney,
    #[serde(default)]
    pub taxed_price: Option<TaxedPrice>,
    #[serde(default)]
    pub shipping_address: Option<Address>,
    #[serde(default)]
    pub billing_address: Option<Address>,
    #[serde(default)]
    pub shipping_info: Option<ShippingInfo>,
    #[serde(default)]
    pub discount_codes: Vec<DiscountCodeInfo>,
    #[serde(default)]
    pub discount_on_total_price: Option<DiscountOnTotalPrice>,
}

/// Body for creating an order from a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderFromCartDraft {
    /// Cart ID.
    pub id: String,
    pub version: i64,
}

// =============================================================================
// Shipping Methods
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingRate {
    pub price: CommerceMoney,
    #[serde(default)]
    pub free_above: Option<CommerceMoney>,
    /// Set by `matching-cart` queries on the rate that applies.
    #[serde(default)]
    pub is_matching: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneRate {
    pub zone: Reference,
    #[serde(default)]
    pub shipping_rates: Vec<ShippingRate>,
}

/// Shipping method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingMethod {
    pub id: String,
    #[serde(default)]
    pub key: Option<String>,
    pub name: String,
    #[serde(default)]
    pub localized_description: Option<LocalizedString>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub zone_rates: Vec<ZoneRate>,
}

// =============================================================================
// Payments
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethodInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_interface: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatusInfo {
    #[serde(default)]
    pub interface_code: Option<String>,
    #[serde(default)]
    pub interface_text: Option<String>,
}

/// Payment transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub amount: CommerceMoney,
    #[serde(default)]
    pub interaction_id: Option<String>,
    pub state: String,
}

/// Payment resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: String,
    pub version: i64,
    pub amount_planned: CommerceMoney,
    #[serde(default)]
    pub payment_method_info: PaymentMethodInfo,
    #[serde(default)]
    pub payment_status: Option<PaymentStatusInfo>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

impl Payment {
    /// Latest transaction with an interaction ID (the gateway reference).
    #[must_use]
    pub fn gateway_transaction(&self) -> Option<&Transaction> {
        self.transactions
            .iter()
            .rev()
            .find(|t| t.interaction_id.is_some())
    }
}

/// Body for creating a payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDraft {
    pub amount_planned: CommerceMoney,
    pub payment_method_info: PaymentMethodInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDraft {
    #[serde(rename = "type")]
    pub kind: String,
    pub amount: CommerceMoney,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interaction_id: Option<String>,
    pub state: String,
}

// =============================================================================
// Auth & Errors
// =============================================================================

/// OAuth token endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    pub expires_in: u64,
    #[serde(default)]
    pub scope: Option<String>,
}

/// Individual vendor error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorItem {
    pub code: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub current_version: Option<i64>,
    #[serde(default)]
    pub field: Option<String>,
}

/// Vendor error envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorResponse {
    pub status_code: u16,
    pub message: String,
    #[serde(default)]
    pub errors: Vec<ApiErrorItem>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_deserializes_minimal_payload() {
        let cart: Cart = serde_json::from_value(serde_json::json!({
            "id": "cart-1",
            "version": 3,
            "totalPrice": {"type": "centPrecision", "currencyCode": "EUR", "centAmount": 0, "fractionDigits": 2}
        }))
        .unwrap();
        assert_eq!(cart.version, 3);
        assert!(cart.line_items.is_empty());
        assert!(cart.shipping_method_id().is_none());
    }

    #[test]
    fn test_address_skips_empty_fields() {
        let address = Address {
            city: Some("Berlin".to_string()),
            country: "DE".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_value(&address).unwrap();
        assert_eq!(json, serde_json::json!({"city": "Berlin", "country": "DE"}));
    }

    #[test]
    fn test_gateway_transaction_picks_latest_with_interaction() {
        let payment: Payment = serde_json::from_value(serde_json::json!({
            "id": "pay-1",
            "version": 2,
            "amountPlanned": {"currencyCode": "EUR", "centAmount": 1000},
            "transactions": [
                {"id": "t1", "type": "Authorization", "amount": {"currencyCode": "EUR", "centAmount": 1000}, "interactionId": "psp-1", "state": "Failure"},
                {"id": "t2", "type": "Authorization", "amount": {"currencyCode": "EUR", "centAmount": 1000}, "interactionId": "psp-2", "state": "Initial"},
                {"id": "t3", "type": "Charge", "amount": {"currencyCode": "EUR", "centAmount": 1000}, "state": "Initial"}
            ]
        }))
        .unwrap();
        assert_eq!(payment.gateway_transaction().unwrap().id, "t2");
    }
}
