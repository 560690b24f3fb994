//! Payment mapping.

use shopfront_core::{PaymentMethodModel, PaymentModel, PaymentStatus, RedirectAction};

use super::price::map_money;
use crate::commerce::types::Payment;
use crate::payments::types::{GatewayPaymentMethod, GatewayResult};

/// Map a gateway result code.
///
/// In-flight codes are `RedirectRequired` when the gateway sent an action for
/// the shopper, otherwise `Pending`. Unknown codes are errors.
#[must_use]
pub fn map_result_code(result_code: &str, has_action: bool) -> PaymentStatus {
    match result_code {
        "Authorised" => PaymentStatus::Authorised,
        "Refused" => PaymentStatus::Refused,
        "Cancelled" => PaymentStatus::Cancelled,
        "RedirectShopper" | "Pending" | "Received" if has_action => PaymentStatus::RedirectRequired,
        "RedirectShopper" | "Pending" | "Received" => PaymentStatus::Pending,
        _ => PaymentStatus::Error,
    }
}

/// Status from the commerce payment alone.
///
/// Uses the gateway result code recorded as the interface code, then the
/// state of the gateway transaction.
fn stored_status(payment: &Payment) -> PaymentStatus {
    if let Some(code) = payment
        .payment_status
        .as_ref()
        .and_then(|s| s.interface_code.as_deref())
    {
        return map_result_code(code, false);
    }

    match payment.gateway_transaction().map(|t| t.state.as_str()) {
        Some("Success") => PaymentStatus::Authorised,
        Some("Failure") => PaymentStatus::Refused,
        _ => PaymentStatus::Pending,
    }
}

/// Map a commerce payment, optionally enriched with a fresh gateway result.
#[must_use]
pub fn map_payment(payment: &Payment, gateway: Option<&GatewayResult>) -> PaymentModel {
    let amount = map_money(&payment.amount_planned);

    let status = gateway.map_or_else(
        || stored_status(payment),
        |result| map_result_code(&result.result_code, result.action.is_some()),
    );

    let redirect = gateway
        .and_then(|result| result.action.as_ref())
        .and_then(|action| {
            action.url.as_ref().map(|url| RedirectAction {
                url: url.clone(),
                method: action.method.clone().unwrap_or_else(|| "GET".to_string()),
                data: action.data.clone(),
            })
        });

    let psp_reference = gateway
        .and_then(|result| result.psp_reference.clone())
        .or_else(|| {
            payment
                .gateway_transaction()
                .and_then(|t| t.interaction_id.clone())
        });

    PaymentModel {
        id: payment.id.clone(),
        status,
        method: payment.payment_method_info.method.clone(),
        formatted_amount: amount.display(),
        amount,
        psp_reference,
        redirect,
    }
}

/// Map a gateway payment method.
#[must_use]
pub fn map_payment_method(method: &GatewayPaymentMethod) -> PaymentMethodModel {
    PaymentMethodModel {
        kind: method.kind.clone(),
        name: method.name.clone(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::payments::types::GatewayAction;

    fn payment(transactions: &serde_json::Value) -> Payment {
        serde_json::from_value(serde_json::json!({
            "id": "pay-1",
            "version": 2,
            "amountPlanned": {"currencyCode": "EUR", "centAmount": 2599, "fractionDigits": 2},
            "paymentMethodInfo": {"paymentInterface": "gateway", "method": "ideal"},
            "transactions": transactions
        }))
        .unwrap()
    }

    #[test]
    fn test_result_codes() {
        assert_eq!(map_result_code("Authorised", false), PaymentStatus::Authorised);
        assert_eq!(map_result_code("Refused", true), PaymentStatus::Refused);
        assert_eq!(map_result_code("Cancelled", false), PaymentStatus::Cancelled);
        assert_eq!(map_result_code("RedirectShopper", true), PaymentStatus::RedirectRequired);
        assert_eq!(map_result_code("Received", false), PaymentStatus::Pending);
        assert_eq!(map_result_code("Pending", true), PaymentStatus::RedirectRequired);
        assert_eq!(map_result_code("IdentifyShopper", false), PaymentStatus::Error);
    }

    #[test]
    fn test_map_payment_with_redirect() {
        let result = GatewayResult {
            psp_reference: Some("PSP1".to_string()),
            result_code: "RedirectShopper".to_string(),
            action: Some(GatewayAction {
                kind: "redirect".to_string(),
                url: Some("https://pay.test/r".to_string()),
                method: None,
                data: std::collections::BTreeMap::new(),
            }),
            merchant_reference: None,
            refusal_reason: None,
        };
        let model = map_payment(&payment(&serde_json::json!([])), Some(&result));

        assert_eq!(model.status, PaymentStatus::RedirectRequired);
        assert_eq!(model.redirect.unwrap().method, "GET");
        assert_eq!(model.psp_reference.as_deref(), Some("PSP1"));
        assert_eq!(model.formatted_amount, "€25.99");
        assert_eq!(model.method.as_deref(), Some("ideal"));
    }

    #[test]
    fn test_map_payment_from_transaction_state() {
        let model = map_payment(
            &payment(&serde_json::json!([{
                "id": "tx-1",
                "type": "Authorization",
                "amount": {"currencyCode": "EUR", "centAmount": 2599},
                "interactionId": "PSP9",
                "state": "Success"
            }])),
            None,
        );
        assert_eq!(model.status, PaymentStatus::Authorised);
        assert_eq!(model.psp_reference.as_deref(), Some("PSP9"));
        assert!(model.redirect.is_none());
    }

    #[test]
    fn test_map_payment_prefers_interface_code() {
        let mut p = payment(&serde_json::json!([]));
        p.payment_status = Some(crate::commerce::types::PaymentStatusInfo {
            interface_code: Some("Refused".to_string()),
            interface_text: None,
        });
        assert_eq!(map_payment(&p, None).status, PaymentStatus::Refused);
    }
}
