//! Checkout wizard.
//!
//! Three steps, kept in the session: address → shipping → payment. Each step
//! posts a form that updates the cart through the BFF and moves the wizard
//! forward. The step shown never runs ahead of what the cart actually holds,
//! so a cart edited in another tab sends the shopper back to the first
//! incomplete step.
//!
//! Payment hands the shopper over to the gateway's hosted page. The gateway
//! sends them back to `/checkout/return` with a `redirectResult`, which is
//! submitted to complete the payment before the order is placed.

use std::collections::BTreeMap;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use shopfront_core::{
    AddressModel, CartAction, CartModel, PaymentMethodModel, PaymentModel, PaymentStatus,
    ShippingMethodModel, StartPaymentRequest,
};
use tower_sessions::Session;
use tracing::instrument;

use super::cart::{apply_cart_actions, load_cart, report_failure};
use crate::error::add_breadcrumb;
use crate::filters;
use crate::models::session::{
    clear_cart_id, clear_payment_id, get_cart_id, get_checkout_step, get_last_order_id,
    get_payment_id, reset_checkout, set_checkout_step, set_flash, set_last_order_id,
    set_payment_id, take_flash,
};
use crate::models::{CheckoutStep, Flash};
use crate::state::AppState;

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    /// `address`, `shipping` or `payment`.
    pub step: &'static str,
    pub cart: CartModel,
    pub email: String,
    pub address: AddressModel,
    pub shipping_methods: Vec<ShippingMethodModel>,
    pub selected_shipping_method: String,
    pub payment_methods: Vec<PaymentMethodModel>,
    pub flash: Option<Flash>,
}

/// Hand-off page for gateways that expect a POST.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/redirect.html")]
pub struct PaymentRedirectTemplate {
    pub url: String,
    /// Hidden fields posted to `url`.
    pub data: BTreeMap<String, String>,
    pub formatted_amount: String,
}

/// Address step form data. Billing uses the shipping address.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AddressForm {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub street_name: String,
    pub street_number: String,
    pub additional_address_info: String,
    pub postal_code: String,
    pub city: String,
    pub region: String,
    pub country: String,
    pub phone: String,
    pub version: Option<i64>,
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl AddressForm {
    /// First problem with the form, if any.
    fn validate(&self) -> Option<&'static str> {
        if !self.email.contains('@') {
            return Some("Please enter a valid email address.");
        }
        if self.street_name.trim().is_empty()
            || self.postal_code.trim().is_empty()
            || self.city.trim().is_empty()
        {
            return Some("Please enter your street, postal code and city.");
        }
        if self.country.trim().len() != 2 {
            return Some("Please choose a country.");
        }
        None
    }

    fn to_address(&self) -> AddressModel {
        AddressModel {
            first_name: non_blank(&self.first_name),
            last_name: non_blank(&self.last_name),
            street_name: non_blank(&self.street_name),
            street_number: non_blank(&self.street_number),
            additional_address_info: non_blank(&self.additional_address_info),
            postal_code: non_blank(&self.postal_code),
            city: non_blank(&self.city),
            region: non_blank(&self.region),
            country: self.country.trim().to_uppercase(),
            email: non_blank(&self.email),
            phone: non_blank(&self.phone),
        }
    }

    fn to_actions(&self) -> Vec<CartAction> {
        let address = self.to_address();
        vec![
            CartAction::SetCustomerEmail {
                email: self.email.trim().to_string(),
            },
            CartAction::SetShippingAddress {
                address: address.clone(),
            },
            CartAction::SetBillingAddress { address },
        ]
    }
}

/// Shipping step form data.
#[derive(Debug, Deserialize)]
pub struct ShippingForm {
    #[serde(default)]
    pub shipping_method_id: String,
    pub version: Option<i64>,
}

/// Payment step form data.
#[derive(Debug, Deserialize)]
pub struct PaymentForm {
    #[serde(default)]
    pub method: String,
}

/// Query the gateway appends to the return URL.
#[derive(Debug, Deserialize)]
pub struct ReturnQuery {
    #[serde(rename = "redirectResult")]
    pub redirect_result: Option<String>,
}

const CART_CHANGED: &str = "Your cart changed during payment. Please pay again.";

/// Step to show: the stored step, capped at the first step the cart has
/// not completed.
fn effective_step(stored: CheckoutStep, has_address: bool, has_shipping: bool) -> CheckoutStep {
    let reachable = if !has_address {
        CheckoutStep::Address
    } else if !has_shipping {
        CheckoutStep::Shipping
    } else {
        CheckoutStep::Payment
    };
    stored.min(reachable)
}

/// Display the current checkout step.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Response {
    let Some(cart) = load_cart(&state, &session).await else {
        return Redirect::to("/cart").into_response();
    };
    if cart.is_empty() {
        return Redirect::to("/cart").into_response();
    }

    let step = effective_step(
        get_checkout_step(&session).await,
        cart.shipping_address.is_some() && cart.customer_email.is_some(),
        cart.shipping_info.is_some(),
    );

    let shipping_methods = if step == CheckoutStep::Shipping {
        state
            .bff()
            .shipping_methods(&cart.id)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to fetch shipping methods: {e}");
                Vec::new()
            })
    } else {
        Vec::new()
    };

    let payment_methods = if step == CheckoutStep::Payment {
        state
            .bff()
            .payment_methods(&cart.id)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to fetch payment methods: {e}");
                Vec::new()
            })
    } else {
        Vec::new()
    };

    let selected_shipping_method = cart
        .shipping_info
        .as_ref()
        .and_then(|info| info.shipping_method_id.clone())
        .or_else(|| {
            shipping_methods
                .iter()
                .find(|m| m.is_default)
                .map(|m| m.id.clone())
        })
        .unwrap_or_default();

    CheckoutTemplate {
        step: step.as_str(),
        email: cart.customer_email.clone().unwrap_or_default(),
        address: cart.shipping_address.clone().unwrap_or_default(),
        shipping_methods,
        selected_shipping_method,
        payment_methods,
        flash: take_flash(&session).await,
        cart,
    }
    .into_response()
}

/// Save email and address, then move to shipping.
#[instrument(skip(state, session, form))]
pub async fn address(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AddressForm>,
) -> Redirect {
    if let Some(problem) = form.validate() {
        set_flash(&session, Flash::error(problem)).await;
        return Redirect::to("/checkout");
    }

    if apply_cart_actions(&state, &session, form.version, form.to_actions())
        .await
        .is_some()
    {
        set_checkout_step(&session, CheckoutStep::Shipping).await;
    }
    Redirect::to("/checkout")
}

/// Save the shipping method, then move to payment.
#[instrument(skip(state, session))]
pub async fn shipping(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ShippingForm>,
) -> Redirect {
    let Some(shipping_method_id) = non_blank(&form.shipping_method_id) else {
        set_flash(&session, Flash::error("Please choose a shipping method.")).await;
        return Redirect::to("/checkout");
    };

    let action = CartAction::SetShippingMethod { shipping_method_id };
    if apply_cart_actions(&state, &session, form.version, vec![action])
        .await
        .is_some()
    {
        set_checkout_step(&session, CheckoutStep::Payment).await;
    }
    Redirect::to("/checkout")
}

/// Start the payment and send the shopper to the gateway.
#[instrument(skip(state, session))]
pub async fn payment(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<PaymentForm>,
) -> Response {
    let Some(cart_id) = get_cart_id(&session).await else {
        return Redirect::to("/cart").into_response();
    };
    let Some(method) = non_blank(&form.method) else {
        set_flash(&session, Flash::error("Please choose a payment method.")).await;
        return Redirect::to("/checkout").into_response();
    };

    let request = StartPaymentRequest {
        cart_id: cart_id.clone(),
        method,
        return_url: state.config().checkout_return_url(),
    };
    let payment = match state.bff().start_payment(&request).await {
        Ok(payment) => payment,
        Err(e) => {
            report_failure(&session, &e, "Failed to start payment").await;
            return Redirect::to("/checkout").into_response();
        }
    };

    set_payment_id(&session, &payment.id).await;
    add_breadcrumb(
        "checkout",
        "Payment started",
        Some(&[("payment_id", payment.id.as_str())]),
    );

    match payment.status {
        PaymentStatus::RedirectRequired => match &payment.redirect {
            Some(redirect) if redirect.method.eq_ignore_ascii_case("POST") => {
                PaymentRedirectTemplate {
                    url: redirect.url.clone(),
                    data: redirect.data.clone(),
                    formatted_amount: payment.formatted_amount.clone(),
                }
                .into_response()
            }
            Some(redirect) => Redirect::to(&redirect.url).into_response(),
            None => {
                tracing::error!(payment_id = %payment.id, "Gateway asked for a redirect without a URL");
                set_flash(&session, Flash::error("Payment could not be started. Please try again.")).await;
                Redirect::to("/checkout").into_response()
            }
        },
        _ => finish_payment(&state, &session, &cart_id, &payment).await,
    }
}

/// Gateway return: complete the payment and place the order.
#[instrument(skip(state, session, query))]
pub async fn payment_return(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ReturnQuery>,
) -> Response {
    let Some(cart_id) = get_cart_id(&session).await else {
        // Reloading the return page after the order was placed
        if let Some(order_id) = get_last_order_id(&session).await {
            return Redirect::to(&format!("/orders/{order_id}")).into_response();
        }
        return Redirect::to("/cart").into_response();
    };
    let Some(payment_id) = get_payment_id(&session).await else {
        // The cart was edited while the shopper was at the gateway
        set_flash(&session, Flash::error(CART_CHANGED)).await;
        return Redirect::to("/checkout").into_response();
    };

    let Some(redirect_result) = query.redirect_result.as_deref().and_then(non_blank) else {
        set_flash(&session, Flash::error("Payment was not completed.")).await;
        return Redirect::to("/checkout").into_response();
    };

    match state
        .bff()
        .submit_payment_details(&payment_id, &redirect_result)
        .await
    {
        Ok(payment) => finish_payment(&state, &session, &cart_id, &payment).await,
        Err(e) => {
            report_failure(&session, &e, "Failed to complete payment").await;
            Redirect::to("/checkout").into_response()
        }
    }
}

/// Place the order for an authorised payment, or explain why not.
async fn finish_payment(
    state: &AppState,
    session: &Session,
    cart_id: &str,
    payment: &PaymentModel,
) -> Response {
    match payment.status {
        PaymentStatus::Authorised => {
            if cart_total_matches(state, cart_id, payment).await {
                place_order(state, session, cart_id).await
            } else {
                tracing::warn!(payment_id = %payment.id, "Authorised amount no longer matches the cart");
                clear_payment_id(session).await;
                set_flash(session, Flash::error(CART_CHANGED)).await;
                Redirect::to("/checkout").into_response()
            }
        }
        PaymentStatus::Pending | PaymentStatus::RedirectRequired => {
            set_flash(
                session,
                Flash::info("Your payment is still being processed. Please check back shortly."),
            )
            .await;
            Redirect::to("/checkout").into_response()
        }
        PaymentStatus::Refused | PaymentStatus::Cancelled | PaymentStatus::Error => {
            tracing::info!(payment_id = %payment.id, status = ?payment.status, "Payment not authorised");
            set_flash(
                session,
                Flash::error("Your payment was not authorised. Please choose another method."),
            )
            .await;
            Redirect::to("/checkout").into_response()
        }
    }
}

/// Whether the cart still costs what the payment authorised.
async fn cart_total_matches(state: &AppState, cart_id: &str, payment: &PaymentModel) -> bool {
    match state.bff().get_cart(cart_id).await {
        Ok(cart) => cart.total == payment.amount,
        Err(e) => {
            tracing::warn!("Failed to fetch cart {cart_id}: {e}");
            false
        }
    }
}

async fn place_order(state: &AppState, session: &Session, cart_id: &str) -> Response {
    match state.bff().create_order(cart_id).await {
        Ok(order) => {
            tracing::info!(order_id = %order.id, "Order placed");
            add_breadcrumb("checkout", "Order placed", Some(&[("order_id", order.id.as_str())]));
            set_last_order_id(session, &order.id).await;
            clear_cart_id(session).await;
            reset_checkout(session).await;
            Redirect::to(&format!("/orders/{}", order.id)).into_response()
        }
        Err(e) => {
            report_failure(session, &e, "Failed to place order").await;
            Redirect::to("/checkout").into_response()
        }
    }
}

/// Go back to an earlier step. Moving forward only happens through forms.
#[instrument(skip(session))]
pub async fn back(session: Session, Path(step): Path<String>) -> Redirect {
    if let Some(target) = CheckoutStep::from_segment(&step)
        && target < get_checkout_step(&session).await
    {
        set_checkout_step(&session, target).await;
    }
    Redirect::to("/checkout")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form() -> AddressForm {
        AddressForm {
            email: " ada@example.test ".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            street_name: "Unter den Linden".to_string(),
            street_number: "1".to_string(),
            postal_code: "10117".to_string(),
            city: "Berlin".to_string(),
            country: "de".to_string(),
            version: Some(3),
            ..AddressForm::default()
        }
    }

    #[test]
    fn test_effective_step_caps_at_cart_progress() {
        assert_eq!(
            effective_step(CheckoutStep::Payment, false, false),
            CheckoutStep::Address
        );
        assert_eq!(
            effective_step(CheckoutStep::Payment, true, false),
            CheckoutStep::Shipping
        );
        assert_eq!(
            effective_step(CheckoutStep::Payment, true, true),
            CheckoutStep::Payment
        );
        assert_eq!(
            effective_step(CheckoutStep::Address, true, true),
            CheckoutStep::Address
        );
    }

    #[test]
    fn test_address_form_validation() {
        assert!(valid_form().validate().is_none());

        let form = AddressForm {
            email: "not-an-email".to_string(),
            ..valid_form()
        };
        assert_eq!(form.validate(), Some("Please enter a valid email address."));

        let form = AddressForm {
            country: String::new(),
            ..valid_form()
        };
        assert_eq!(form.validate(), Some("Please choose a country."));
    }

    #[test]
    fn test_address_form_actions() {
        let actions = valid_form().to_actions();
        assert_eq!(actions.len(), 3);
        assert_eq!(
            actions[0],
            CartAction::SetCustomerEmail {
                email: "ada@example.test".to_string()
            }
        );
        match &actions[1] {
            CartAction::SetShippingAddress { address } => {
                assert_eq!(address.country, "DE");
                assert_eq!(address.region, None);
                assert_eq!(address.city.as_deref(), Some("Berlin"));
            }
            other => panic!("unexpected action: {other:?}"),
        }
    }
}
