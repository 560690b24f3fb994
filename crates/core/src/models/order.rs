//! Order view model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::address::AddressModel;
use super::cart::{DiscountModel, LineItemModel, ShippingInfoModel};
use crate::types::Money;

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderModel {
    pub id: String,
    pub order_number: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub order_state: String,
    pub payment_state: Option<String>,
    pub shipment_state: Option<String>,
    pub customer_email: Option<String>,
    pub line_items: Vec<LineItemModel>,
    pub item_count: i64,
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
}

impl OrderModel {
    /// Reference shown to customers: order number, falling back to the ID.
    #[must_use]
    pub fn reference(&self) -> &str {
        self.order_number.as_deref().unwrap_or(&self.id)
    }

    /// Placement date formatted for display.
    #[must_use]
    pub fn placed_on(&self) -> String {
        self.created_at
            .map(|d| d.format("%B %-d, %Y").to_string())
            .unwrap_or_default()
    }
}
