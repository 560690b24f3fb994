//! Cart route handlers.
//!
//! Cart forms post here and are redirected back to `/cart`. The cart ID is
//! kept in the session; the cart itself lives in the commerce platform and
//! is reached through the BFF. Every form carries the version the page was
//! rendered with, which the BFF treats as advisory.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use shopfront_core::{CartAction, CartModel, CreateCartRequest, NewLineItem};
use tower_sessions::Session;
use tracing::instrument;

use crate::bff::BffError;
use crate::filters;
use crate::models::Flash;
use crate::models::session::{
    clear_cart_id, clear_payment_id, get_cart_id, set_cart_id, set_flash, take_flash,
};
use crate::state::AppState;

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub sku: String,
    pub quantity: Option<i64>,
}

/// Update quantity form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub line_item_id: String,
    pub quantity: i64,
    pub version: Option<i64>,
}

/// Remove line form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub line_item_id: String,
    pub version: Option<i64>,
}

/// Apply discount code form data.
#[derive(Debug, Deserialize)]
pub struct DiscountForm {
    pub code: String,
    pub version: Option<i64>,
}

/// Remove discount code form data.
#[derive(Debug, Deserialize)]
pub struct RemoveDiscountForm {
    pub discount_code_id: String,
    pub version: Option<i64>,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    /// `None` renders the empty cart.
    pub cart: Option<CartModel>,
    pub flash: Option<Flash>,
}

/// Load the session's cart for display.
///
/// Missing carts are forgotten; other failures are logged and render as an
/// empty cart.
pub(crate) async fn load_cart(state: &AppState, session: &Session) -> Option<CartModel> {
    let cart_id = get_cart_id(session).await?;
    match state.bff().get_cart(&cart_id).await {
        Ok(cart) => Some(cart),
        Err(e) if e.is_not_found() => {
            tracing::info!(cart_id = %cart_id, "Cart no longer exists, clearing session");
            clear_cart_id(session).await;
            None
        }
        Err(e) => {
            tracing::warn!("Failed to fetch cart {cart_id}: {e}");
            None
        }
    }
}

/// Apply actions to the session's cart, reporting failures as a flash.
///
/// A successful update forgets any pending payment, whose amount was fixed
/// when it started. Returns the updated cart, or `None` when there is no
/// cart or the update failed.
pub(crate) async fn apply_cart_actions(
    state: &AppState,
    session: &Session,
    version: Option<i64>,
    actions: Vec<CartAction>,
) -> Option<CartModel> {
    let Some(cart_id) = get_cart_id(session).await else {
        set_flash(session, Flash::error("Your cart is empty.")).await;
        return None;
    };

    match state.bff().update_cart(&cart_id, version, actions).await {
        Ok(cart) => {
            clear_payment_id(session).await;
            Some(cart)
        }
        Err(e) => {
            if e.is_not_found() {
                clear_cart_id(session).await;
            }
            report_failure(session, &e, "Failed to update cart").await;
            None
        }
    }
}

/// Log a BFF failure and show the shopper what went wrong.
pub(crate) async fn report_failure(session: &Session, error: &BffError, context: &str) {
    match error.user_message() {
        Some(message) => {
            tracing::info!(error = %error, "{context}");
            set_flash(session, Flash::error(message)).await;
        }
        None => {
            tracing::error!(error = %error, "{context}");
            set_flash(
                session,
                Flash::error("Something went wrong. Please try again."),
            )
            .await;
        }
    }
}

/// Display cart page.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> impl IntoResponse {
    let cart = load_cart(&state, &session).await;
    let flash = take_flash(&session).await;
    CartShowTemplate { cart, flash }
}

/// Add a variant to the cart.
///
/// Creates a new cart on the first add, or when the session's cart has
/// disappeared.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AddToCartForm>,
) -> Response {
    let quantity = form.quantity.unwrap_or(1).max(1);
    let sku = form.sku.trim().to_string();

    if let Some(cart_id) = get_cart_id(&session).await {
        let action = CartAction::AddLineItem {
            sku: sku.clone(),
            quantity,
        };
        match state.bff().update_cart(&cart_id, None, vec![action]).await {
            Ok(_) => {
                clear_payment_id(&session).await;
                return Redirect::to("/cart").into_response();
            }
            Err(e) if e.is_not_found() => {
                tracing::info!(cart_id = %cart_id, "Cart no longer exists, creating a new one");
                clear_cart_id(&session).await;
            }
            Err(e) => {
                report_failure(&session, &e, "Failed to add item to cart").await;
                return Redirect::to("/cart").into_response();
            }
        }
    }

    let request = CreateCartRequest {
        line_items: vec![NewLineItem { sku, quantity }],
        ..CreateCartRequest::default()
    };
    match state.bff().create_cart(&request).await {
        Ok(cart) => {
            set_cart_id(&session, &cart.id).await;
            clear_payment_id(&session).await;
        }
        Err(e) => report_failure(&session, &e, "Failed to create cart").await,
    }

    Redirect::to("/cart").into_response()
}

/// Change a line's quantity; zero removes the line.
#[instrument(skip(state, session))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<UpdateCartForm>,
) -> Redirect {
    let action = CartAction::ChangeLineItemQuantity {
        line_item_id: form.line_item_id,
        quantity: form.quantity.max(0),
    };
    apply_cart_actions(&state, &session, form.version, vec![action]).await;
    Redirect::to("/cart")
}

/// Remove a line.
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RemoveFromCartForm>,
) -> Redirect {
    let action = CartAction::RemoveLineItem {
        line_item_id: form.line_item_id,
    };
    apply_cart_actions(&state, &session, form.version, vec![action]).await;
    Redirect::to("/cart")
}

/// Apply a discount code.
#[instrument(skip(state, session))]
pub async fn apply_discount(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<DiscountForm>,
) -> Redirect {
    let code = form.code.trim();
    if code.is_empty() {
        set_flash(&session, Flash::error("Please enter a discount code.")).await;
        return Redirect::to("/cart");
    }

    let action = CartAction::AddDiscountCode {
        code: code.to_string(),
    };
    if let Some(cart) = apply_cart_actions(&state, &session, form.version, vec![action]).await {
        let applied = cart
            .discounts
            .iter()
            .any(|d| d.applied && d.code.eq_ignore_ascii_case(code));
        let flash = if applied {
            Flash::info(format!("Discount code {code} applied."))
        } else {
            Flash::error(format!("Discount code {code} does not apply to this cart."))
        };
        set_flash(&session, flash).await;
    }
    Redirect::to("/cart")
}

/// Remove a discount code.
#[instrument(skip(state, session))]
pub async fn remove_discount(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RemoveDiscountForm>,
) -> Redirect {
    let action = CartAction::RemoveDiscountCode {
        discount_code_id: form.discount_code_id,
    };
    apply_cart_actions(&state, &session, form.version, vec![action]).await;
    Redirect::to("/cart")
}
