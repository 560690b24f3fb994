//! Request bodies accepted by the BFF.
//!
//! The storefront builds these and the BFF deserializes them.

use serde::{Deserialize, Serialize};

use super::address::AddressModel;

const fn default_quantity() -> i64 {
    1
}

/// A change to a cart, as requested by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "action",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum CartAction {
    AddLineItem {
        sku: String,
        #[serde(default = "default_quantity")]
        quantity: i64,
    },
    /// Quantity 0 removes the line.
    ChangeLineItemQuantity { line_item_id: String, quantity: i64 },
    RemoveLineItem { line_item_id: String },
    AddDiscountCode { code: String },
    RemoveDiscountCode { discount_code_id: String },
    SetShippingAddress { address: AddressModel },
    SetBillingAddress { address: AddressModel },
    SetShippingMethod { shipping_method_id: String },
    SetCustomerEmail { email: String },
    AddPayment { payment_id: String },
}

/// Body of `POST /api/carts/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateCartRequest {
    /// Version the client last saw. Advisory; the BFF always refreshes it.
    #[serde(default)]
    pub version: Option<i64>,
    pub actions: Vec<CartAction>,
}

/// A line for a new cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLineItem {
    pub sku: String,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
}

/// Body of `POST /api/carts`. Omitted fields use the shop defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateCartRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub line_items: Vec<NewLineItem>,
}

/// Body of `POST /api/orders`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub cart_id: String,
}

/// Body of `POST /api/payments`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartPaymentRequest {
    #[serde(default)]
    pub cart_id: String,
    /// Gateway payment method type (e.g. `ideal`).
    #[serde(default)]
    pub method: String,
    /// Where the gateway sends the shopper back to.
    #[serde(default)]
    pub return_url: String,
}

/// Body of `POST /api/payments/{id}/details`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentDetailsRequest {
    #[serde(default)]
    pub redirect_result: String,
}
