//! Cart view model.

use serde::{Deserialize, Serialize};

use super::address::AddressModel;
use super::price::PriceModel;
use crate::types::Money;

/// A discount code attached to a cart or order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountModel {
    /// Discount code resource ID (used to remove the code).
    pub id: String,
    /// The code the customer typed, or the ID when the code was not expanded.
    pub code: String,
    /// Vendor state, e.g. `MatchesCart`, `DoesNotMatchCart`.
    pub state: String,
    /// Whether the code currently reduces the cart total.
    pub applied: bool,
}

/// A cart or order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemModel {
    pub id: String,
    pub product_id: String,
    pub product_key: Option<String>,
    pub name: String,
    pub sku: Option<String>,
    pub variant_id: i64,
    pub image_url: Option<String>,
    pub quantity: i64,
    pub unit_price: PriceModel,
    /// Line total after line-level discounts.
    pub total: Money,
    pub formatted_total: String,
}

/// Selected shipping method and its (possibly discounted) price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingInfoModel {
    pub shipping_method_id: Option<String>,
    pub name: String,
    pub price: Money,
    pub formatted_price: String,
}

/// A shopping cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartModel {
    pub id: String,
    /// Optimistic-concurrency version of the vendor cart.
    pub version: i64,
    pub currency: String,
    pub customer_email: Option<String>,
    pub state: String,
    pub line_items: Vec<LineItemModel>,
    /// Sum of line quantities.
    pub item_count: i64,
    /// Undiscounted merchandise total.
    pub subtotal: Money,
    pub discount_total: Money,
    pub shipping: Option<Money>,
    pub tax: Option<Money>,
    pub total: Money,
    pub formatted_subtotal: String,
    pub formatted_discount_total: String,
    pub formatted_shipping: Option<String>,
    pub formatted_tax: Option<String>,
    pub formatted_total: String,
    pub discounts: Vec<DiscountModel>,
    pub shipping_address: Option<AddressModel>,
    pub billing_address: Option<AddressModel>,
    pub shipping_info: Option<ShippingInfoModel>,
    pub payment_ids: Vec<String>,
}

impl CartModel {
    /// Whether the cart has no lines.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.line_items.is_empty()
    }

    /// Whether any discount is reducing the total.
    #[must_use]
    pub const fn has_discount(&self) -> bool {
        self.discount_total.cent_amount > 0
    }
}
