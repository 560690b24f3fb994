//! Payment route handlers.
//!
//! Starting a payment:
//!
//! 1. load the cart (a zero total cannot be paid);
//! 2. create a commerce payment for the cart total;
//! 3. start the payment at the gateway with the commerce payment ID as the
//!    merchant reference;
//! 4. record an `Authorization` transaction in state `Initial` carrying the
//!    gateway's PSP reference;
//! 5. attach the payment to the cart.
//!
//! Completing a payment submits the shopper's `redirectResult` and moves the
//! transaction to `Success` or `Failure`.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use shopfront_core::{
    CartAction, PaymentDetailsRequest, PaymentMethodModel, PaymentModel, PaymentStatus,
    StartPaymentRequest,
};
use tracing::instrument;

use super::{ApiJson, ApiQuery};
use crate::cart_update::CartUpdater;
use crate::commerce::PaymentUpdateAction;
use crate::commerce::types::{Cart, CommerceMoney, Payment, PaymentDraft, PaymentMethodInfo, TransactionDraft};
use crate::error::{AppError, Result, require};
use crate::mappers::{map_payment, map_payment_method, map_result_code};
use crate::payments::types::{Amount, PaymentMethodSelection, PaymentRequest};
use crate::state::AppState;

/// Payment interface name recorded on commerce payments.
const PAYMENT_INTERFACE: &str = "gateway";
pub(crate) const AUTHORIZATION: &str = "Authorization";

/// Query for `GET /api/payments/methods`.
#[derive(Debug, Deserialize)]
pub struct MethodsQuery {
    #[serde(default)]
    pub cart_id: String,
}

/// Redirect payment methods available for a cart's total.
#[instrument(skip(state))]
pub async fn methods(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<MethodsQuery>,
) -> Result<Json<Vec<PaymentMethodModel>>> {
    let cart_id = require(&query.cart_id, "cart_id")?;
    let cart = state.commerce().get_cart(cart_id).await?;

    let methods = state
        .payments()
        .payment_methods(
            &gateway_amount(&cart.total_price),
            &cart_country(&cart, &state.shop().country),
            &state.shop().locale,
        )
        .await?;

    Ok(Json(methods.iter().map(map_payment_method).collect()))
}

/// Start a redirect payment for a cart.
#[instrument(skip(state, request), fields(cart_id = %request.cart_id, method = %request.method))]
pub async fn start(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<StartPaymentRequest>,
) -> Result<(StatusCode, Json<PaymentModel>)> {
    let cart_id = require(&request.cart_id, "cart_id")?;
    let method = require(&request.method, "method")?;
    let return_url = require(&request.return_url, "return_url")?;

    let cart = state.commerce().get_cart(cart_id).await?;
    if cart.total_price.cent_amount <= 0 {
        return Err(AppError::BadRequest(
            "Cart total must be greater than zero".to_string(),
        ));
    }

    let payment = state
        .commerce()
        .create_payment(&PaymentDraft {
            amount_planned: cart.total_price.clone(),
            payment_method_info: PaymentMethodInfo {
                payment_interface: Some(PAYMENT_INTERFACE.to_string()),
                method: Some(method.to_string()),
            },
        })
        .await?;

    let result = state
        .payments()
        .create_payment(&PaymentRequest {
            amount: gateway_amount(&cart.total_price),
            reference: payment.id.clone(),
            payment_method: PaymentMethodSelection {
                kind: method.to_string(),
            },
            return_url: return_url.to_string(),
            country_code: Some(cart_country(&cart, &state.shop().country)),
            shopper_locale: Some(state.shop().locale.clone()),
            shopper_email: cart.customer_email.clone(),
        })
        .await?;

    tracing::info!(
        payment_id = %payment.id,
        result_code = %result.result_code,
        "Payment started"
    );

    let payment = state
        .commerce()
        .update_payment(
            &payment.id,
            payment.version,
            &[
                PaymentUpdateAction::AddTransaction {
                    transaction: TransactionDraft {
                        kind: AUTHORIZATION.to_string(),
                        amount: cart.total_price.clone(),
                        interaction_id: result.psp_reference.clone(),
                        state: "Initial".to_string(),
                    },
                },
                PaymentUpdateAction::SetStatusInterfaceCode {
                    interface_code: result.result_code.clone(),
                },
            ],
        )
        .await?;

    CartUpdater::new(state.commerce())
        .apply(
            &cart.id,
            Some(cart.version),
            &[CartAction::AddPayment {
                payment_id: payment.id.clone(),
            }],
        )
        .await?;

    Ok((StatusCode::CREATED, Json(map_payment(&payment, Some(&result)))))
}

/// Get a payment.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<PaymentModel>> {
    let payment = state.commerce().get_payment(&id).await?;
    Ok(Json(map_payment(&payment, None)))
}

/// Complete a redirect payment with the shopper's `redirectResult`.
#[instrument(skip(state, request))]
pub async fn details(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<PaymentDetailsRequest>,
) -> Result<Json<PaymentModel>> {
    let redirect_result = require(&request.redirect_result, "redirect_result")?;
    let payment = state.commerce().get_payment(&id).await?;

    let result = state.payments().submit_details(redirect_result).await?;
    if let Some(reference) = &result.merchant_reference
        && reference != &payment.id
    {
        return Err(AppError::BadRequest(format!(
            "Payment result belongs to {reference}, not {}",
            payment.id
        )));
    }

    let status = map_result_code(&result.result_code, result.action.is_some());
    tracing::info!(payment_id = %payment.id, status = ?status, "Payment details submitted");

    let actions = completion_actions(&payment, status, &result.result_code);
    let payment = state
        .commerce()
        .update_payment(&payment.id, payment.version, &actions)
        .await?;

    Ok(Json(map_payment(&payment, Some(&result))))
}

/// Actions recording a gateway outcome on the commerce payment.
fn completion_actions(payment: &Payment, status: PaymentStatus, result_code: &str) -> Vec<PaymentUpdateAction> {
    let mut actions = Vec::with_capacity(2);

    let new_state = match status {
        PaymentStatus::Authorised => Some("Success"),
        PaymentStatus::Refused | PaymentStatus::Cancelled | PaymentStatus::Error => Some("Failure"),
        PaymentStatus::Pending | PaymentStatus::RedirectRequired => None,
    };

    if let Some(new_state) = new_state
        && let Some(transaction) = payment
            .transactions
            .iter()
            .rev()
            .find(|t| t.kind == AUTHORIZATION)
        && transaction.state != new_state
    {
        actions.push(PaymentUpdateAction::ChangeTransactionState {
            transaction_id: transaction.id.clone(),
            state: new_state.to_string(),
        });
    }

    actions.push(PaymentUpdateAction::SetStatusInterfaceCode {
        interface_code: result_code.to_string(),
    });
    actions
}

fn gateway_amount(money: &CommerceMoney) -> Amount {
    Amount {
        currency: money.currency_code.clone(),
        value: money.cent_amount,
    }
}

fn cart_country(cart: &Cart, default: &str) -> String {
    cart.shipping_address
        .as_ref()
        .map(|a| a.country.clone())
        .or_else(|| cart.country.clone())
        .unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn payment_with_state(state: &str) -> Payment {
        serde_json::from_value(serde_json::json!({
            "id": "pay-1",
            "version": 2,
            "amountPlanned": {"currencyCode": "EUR", "centAmount": 2599},
            "transactions": [{
                "id": "tx-1",
                "type": "Authorization",
                "amount": {"currencyCode": "EUR", "centAmount": 2599},
                "interactionId": "PSP1",
                "state": state
            }]
        }))
        .unwrap()
    }

    #[test]
    fn test_authorised_marks_transaction_success() {
        let actions = completion_actions(&payment_with_state("Initial"), PaymentStatus::Authorised, "Authorised");
        assert_eq!(
            actions[0],
            PaymentUpdateAction::ChangeTransactionState {
                transaction_id: "tx-1".to_string(),
                state: "Success".to_string()
            }
        );
        assert_eq!(actions.len(), 2);
    }

    #[test]
    fn test_refused_marks_transaction_failure() {
        let actions = completion_actions(&payment_with_state("Initial"), PaymentStatus::Refused, "Refused");
        assert!(matches!(
            &actions[0],
            PaymentUpdateAction::ChangeTransactionState { state, .. } if state == "Failure"
        ));
    }

    #[test]
    fn test_pending_only_records_code() {
        let actions = completion_actions(&payment_with_state("Initial"), PaymentStatus::Pending, "Received");
        assert_eq!(
            actions,
            vec![PaymentUpdateAction::SetStatusInterfaceCode {
                interface_code: "Received".to_string()
            }]
        );
    }

    #[test]
    fn test_unchanged_state_is_not_resent() {
        let actions = completion_actions(&payment_with_state("Success"), PaymentStatus::Authorised, "Authorised");
        assert_eq!(actions.len(), 1);
    }

    #[test]
    fn test_cart_country_fallbacks() {
        let cart: Cart = serde_json::from_value(serde_json::json!({
            "id": "cart-1",
            "version": 1,
            "country": "NL",
            "totalPrice": {"currencyCode": "EUR", "centAmount": 100}
        }))
        .unwrap();
        assert_eq!(cart_country(&cart, "DE"), "NL");
    }
}
