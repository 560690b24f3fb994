//! Order confirmation page.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, State};
use shopfront_core::OrderModel;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::filters;
use crate::models::session::get_last_order_id;
use crate::state::AppState;

/// Order confirmation template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/show.html")]
pub struct OrderShowTemplate {
    pub order: OrderModel,
}

/// Display the confirmation for an order placed in this session.
///
/// # Errors
///
/// Returns 404 for unknown orders and for orders placed in another session.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<OrderShowTemplate> {
    if get_last_order_id(&session).await.as_deref() != Some(id.as_str()) {
        return Err(AppError::NotFound(format!("Order {id}")));
    }

    let order = state.bff().get_order(&id).await.map_err(|e| {
        if e.is_not_found() {
            AppError::NotFound(format!("Order {id}"))
        } else {
            AppError::Bff(e)
        }
    })?;

    Ok(OrderShowTemplate { order })
}
