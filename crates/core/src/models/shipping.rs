//! Shipping method view model.

use serde::{Deserialize, Serialize};

use crate::types::Money;

/// A shipping method available for a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingMethodModel {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    /// Rate for the cart's shipping zone, if one matched.
    pub price: Option<Money>,
    pub formatted_price: Option<String>,
    pub is_default: bool,
}
