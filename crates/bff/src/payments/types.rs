//! Wire types for the payment gateway checkout API.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Amount in minor units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amount {
    pub currency: String,
    pub value: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethodsRequest<'a> {
    pub merchant_account: &'a str,
    pub amount: &'a Amount,
    pub country_code: &'a str,
    pub shopper_locale: &'a str,
    pub channel: &'static str,
}

/// Payment method offered for a given amount and country.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GatewayPaymentMethod {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethodsResponse {
    #[serde(default)]
    pub payment_methods: Vec<GatewayPaymentMethod>,
}

/// Selected payment method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentMethodSelection {
    #[serde(rename = "type")]
    pub kind: String,
}

/// Request to start a payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub amount: Amount,
    /// Merchant-side reference; the commerce payment ID.
    pub reference: String,
    pub payment_method: PaymentMethodSelection,
    pub return_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shopper_locale: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shopper_email: Option<String>,
}

/// Body actually sent: the request plus the merchant account.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct MerchantPaymentRequest<'a> {
    pub merchant_account: &'a str,
    #[serde(flatten)]
    pub request: &'a PaymentRequest,
}

/// Follow-up the shopper must perform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayAction {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    /// Form fields for `POST` redirects.
    #[serde(default)]
    pub data: BTreeMap<String, String>,
}

/// Result of `/payments` or `/payments/details`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayResult {
    #[serde(default)]
    pub psp_reference: Option<String>,
    pub result_code: String,
    #[serde(default)]
    pub action: Option<GatewayAction>,
    #[serde(default)]
    pub merchant_reference: Option<String>,
    #[serde(default)]
    pub refusal_reason: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct DetailsRequest<'a> {
    pub details: RedirectDetails<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RedirectDetails<'a> {
    pub redirect_result: &'a str,
}

/// Gateway error body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayErrorBody {
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_request_flattens_merchant_account() {
        let request = PaymentRequest {
            amount: Amount {
                currency: "EUR".to_string(),
                value: 2599,
            },
            reference: "pay-1".to_string(),
            payment_method: PaymentMethodSelection {
                kind: "ideal".to_string(),
            },
            return_url: "https://shop.test/checkout/return".to_string(),
            country_code: Some("NL".to_string()),
            shopper_locale: None,
            shopper_email: None,
        };
        let body = MerchantPaymentRequest {
            merchant_account: "ShopECOM",
            request: &request,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({
                "merchantAccount": "ShopECOM",
                "amount": {"currency": "EUR", "value": 2599},
                "reference": "pay-1",
                "paymentMethod": {"type": "ideal"},
                "returnUrl": "https://shop.test/checkout/return",
                "countryCode": "NL"
            })
        );
    }

    #[test]
    fn test_redirect_result_deserializes() {
        let result: GatewayResult = serde_json::from_value(serde_json::json!({
            "resultCode": "RedirectShopper",
            "action": {"type": "redirect", "url": "https://pay.test/r", "method": "GET"}
        }))
        .unwrap();
        assert!(result.psp_reference.is_none());
        assert_eq!(result.action.unwrap().url.as_deref(), Some("https://pay.test/r"));
    }
}
