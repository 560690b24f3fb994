//! Payment view models.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::Money;

/// Customer-facing payment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Created but not yet sent to the gateway, or awaiting a final result.
    Pending,
    /// The shopper must be redirected to complete the payment.
    RedirectRequired,
    Authorised,
    Refused,
    Cancelled,
    Error,
}

impl PaymentStatus {
    /// Whether the payment reached a final state.
    #[must_use]
    pub const fn is_final(self) -> bool {
        matches!(
            self,
            Self::Authorised | Self::Refused | Self::Cancelled | Self::Error
        )
    }

    /// Whether an order may be placed.
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Authorised)
    }
}

/// Where to send the shopper to complete a redirect payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectAction {
    pub url: String,
    /// HTTP method the gateway expects (`GET` or `POST`).
    pub method: String,
    /// Form fields to post along with a `POST` redirect.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, String>,
}

/// A payment on a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentModel {
    pub id: String,
    pub status: PaymentStatus,
    pub method: Option<String>,
    pub amount: Money,
    pub formatted_amount: String,
    pub psp_reference: Option<String>,
    pub redirect: Option<RedirectAction>,
}

/// A payment method offered by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethodModel {
    /// Gateway method type (e.g. `ideal`, `paypal`).
    pub kind: String,
    pub name: String,
}
