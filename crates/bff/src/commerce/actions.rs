//! Update actions sent to the commerce platform.
//!
//! Every update is `POST /{resource}/{id}` with `{ "version": n, "actions": [...] }`.
//! Actions are tagged by their `action` field.

use serde::Serialize;

use super::types::{Address, Reference, TransactionDraft};

/// Cart update action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(
    tag = "action",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum CartUpdateAction {
    AddLineItem {
        sku: String,
        quantity: i64,
    },
    ChangeLineItemQuantity {
        line_item_id: String,
        quantity: i64,
    },
    RemoveLineItem {
        line_item_id: String,
    },
    AddDiscountCode {
        code: String,
    },
    RemoveDiscountCode {
        discount_code: Reference,
    },
    SetShippingAddress {
        #[serde(skip_serializing_if = "Option::is_none")]
        address: Option<Address>,
    },
    SetBillingAddress {
        #[serde(skip_serializing_if = "Option::is_none")]
        address: Option<Address>,
    },
    /// Omitting the method unsets it.
    SetShippingMethod {
        #[serde(skip_serializing_if = "Option::is_none")]
        shipping_method: Option<Reference>,
    },
    SetCustomerEmail {
        #[serde(skip_serializing_if = "Option::is_none")]
        email: Option<String>,
    },
    AddPayment {
        payment: Reference,
    },
    Recalculate {
        update_product_data: bool,
    },
}

impl CartUpdateAction {
    /// Whether the action changes the cart's lines.
    #[must_use]
    pub const fn touches_line_items(&self) -> bool {
        matches!(
            self,
            Self::AddLineItem { .. }
                | Self::ChangeLineItemQuantity { .. }
                | Self::RemoveLineItem { .. }
        )
    }

    /// Whether the action changes the cart's discount codes.
    #[must_use]
    pub const fn touches_discount_codes(&self) -> bool {
        matches!(
            self,
            Self::AddDiscountCode { .. } | Self::RemoveDiscountCode { .. }
        )
    }
}

/// Payment update action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(
    tag = "action",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum PaymentUpdateAction {
    AddTransaction {
        transaction: TransactionDraft,
    },
    ChangeTransactionState {
        transaction_id: String,
        state: String,
    },
    SetStatusInterfaceCode {
        interface_code: String,
    },
    SetStatusInterfaceText {
        interface_text: String,
    },
}

/// Update request body.
#[derive(Debug, Serialize)]
pub struct UpdateRequest<'a, A> {
    pub version: i64,
    pub actions: &'a [A],
}
