//! Product detail page.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, State};
use shopfront_core::{ProductModel, VariantModel};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::filters;
use crate::state::AppState;

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub product: ProductModel,
    /// Master variant first, then the others.
    pub variants: Vec<VariantModel>,
}

/// Display a product.
///
/// # Errors
///
/// Returns 404 when the BFF does not know the product.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ProductShowTemplate> {
    let product = state.bff().get_product(&id).await.map_err(|e| {
        if e.is_not_found() {
            AppError::NotFound(format!("Product {id}"))
        } else {
            AppError::Bff(e)
        }
    })?;

    let variants = product.all_variants().cloned().collect();
    Ok(ProductShowTemplate { product, variants })
}
