//! Fake payment gateway checkout API.
//!
//! Every payment asks for a redirect. The redirect URL is the shopper's
//! `returnUrl` with `redirectResult` set to the PSP reference, as if the bank
//! approved instantly. Submitting `refused:<psp>` as the redirect result
//! simulates a declined payment.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use serde_json::{Value, json};

use crate::FakeVendor;

pub const API_KEY: &str = "AQEyhmfxK4rGbhFGw0m";
pub const MERCHANT_ACCOUNT: &str = "ShopfrontECOM";

/// Bank page shoppers are posted to when POST redirects are switched on.
pub const BANK_URL: &str = "https://bank.example.test/ideal/authorise";

/// Prefix of redirect results that decline the payment.
pub const REFUSED_PREFIX: &str = "refused:";

type Reply = Result<Json<Value>, Response>;

pub(crate) fn router() -> Router<FakeVendor> {
    Router::new()
        .route("/paymentMethods", post(payment_methods))
        .route("/payments", post(payments))
        .route("/payments/details", post(details))
}

/// Gateway error body.
pub(crate) fn error(status: StatusCode, code: &str, message: &str) -> Response {
    (
        status,
        Json(json!({
            "status": status.as_u16(),
            "errorCode": code,
            "message": message,
            "errorType": "validation"
        })),
    )
        .into_response()
}

fn check_merchant(request: &Value) -> Result<(), Response> {
    if request["merchantAccount"] == MERCHANT_ACCOUNT {
        Ok(())
    } else {
        Err(error(StatusCode::FORBIDDEN, "901", "Invalid Merchant Account"))
    }
}

async fn payment_methods(State(vendor): State<FakeVendor>, Json(request): Json<Value>) -> Reply {
    check_merchant(&request)?;
    vendor.with(|store| store.gateway_requests.push(request));

    Ok(Json(json!({
        "paymentMethods": [
            {"type": "scheme", "name": "Cards", "brands": ["visa", "mc"]},
            {"type": "ideal", "name": "iDEAL"},
            {"type": "paypal", "name": "PayPal"},
            {"type": "applepay", "name": "Apple Pay"}
        ]
    })))
}

async fn payments(State(vendor): State<FakeVendor>, Json(request): Json<Value>) -> Reply {
    check_merchant(&request)?;
    let reference = request["reference"].as_str().unwrap_or_default().to_string();
    let return_url = request["returnUrl"].as_str().unwrap_or_default().to_string();
    if reference.is_empty() || return_url.is_empty() {
        return Err(error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "14_0",
            "Required field missing",
        ));
    }

    let (psp_reference, post) = vendor.with(|store| {
        store.gateway_requests.push(request);
        store.psp_count += 1;
        let psp_reference = format!("PSP{:012}", store.psp_count);
        store
            .psp_references
            .insert(psp_reference.clone(), reference.clone());
        (psp_reference, store.post_redirects)
    });

    let action = if post {
        json!({
            "type": "redirect",
            "paymentMethodType": "ideal",
            "method": "POST",
            "url": BANK_URL,
            "data": {"PaReq": psp_reference, "TermUrl": return_url}
        })
    } else {
        json!({
            "type": "redirect",
            "paymentMethodType": "ideal",
            "method": "GET",
            "url": format!("{return_url}?redirectResult={psp_reference}")
        })
    };

    Ok(Json(json!({
        "pspReference": psp_reference,
        "resultCode": "RedirectShopper",
        "merchantReference": reference,
        "action": action
    })))
}

async fn details(State(vendor): State<FakeVendor>, Json(request): Json<Value>) -> Reply {
    let redirect_result = request["details"]["redirectResult"]
        .as_str()
        .unwrap_or_default()
        .to_string();
    let (refused, psp_reference) = redirect_result
        .strip_prefix(REFUSED_PREFIX)
        .map_or((false, redirect_result.as_str()), |psp| (true, psp));

    let reference = vendor.with(|store| {
        store.gateway_requests.push(request.clone());
        store.psp_references.get(psp_reference).cloned()
    });
    let Some(reference) = reference else {
        return Err(error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "14_018",
            "Invalid payload provided",
        ));
    };

    let mut result = json!({
        "pspReference": psp_reference,
        "merchantReference": reference,
        "resultCode": if refused { "Refused" } else { "Authorised" }
    });
    if refused {
        result["refusalReason"] = json!("Refused");
    }
    Ok(Json(result))
}
