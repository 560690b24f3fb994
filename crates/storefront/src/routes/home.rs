//! Home page: the product listing.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use shopfront_core::{ProductListModel, ProductModel};
use tracing::instrument;

use crate::filters;
use crate::state::AppState;

/// Products per listing page.
const PAGE_SIZE: i64 = 12;

/// Pagination query parameters.
#[derive(Debug, Deserialize)]
pub struct PaginationQuery {
    pub page: Option<u32>,
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub products: Vec<ProductModel>,
    pub current_page: u32,
    pub has_previous: bool,
    pub has_next: bool,
}

impl ProductsIndexTemplate {
    fn new(list: ProductListModel, current_page: u32) -> Self {
        Self {
            has_previous: current_page > 1,
            has_next: list.has_more(),
            products: list.products,
            current_page,
        }
    }

    fn empty(current_page: u32) -> Self {
        Self {
            products: Vec::new(),
            current_page,
            has_previous: current_page > 1,
            has_next: false,
        }
    }
}

/// Display the product listing.
#[instrument(skip(state))]
pub async fn home(
    State(state): State<AppState>,
    Query(query): Query<PaginationQuery>,
) -> impl IntoResponse {
    let current_page = query.page.unwrap_or(1).max(1);
    let offset = i64::from(current_page - 1) * PAGE_SIZE;

    match state.bff().list_products(PAGE_SIZE, offset).await {
        Ok(list) => ProductsIndexTemplate::new(list, current_page),
        Err(e) => {
            tracing::warn!("Failed to fetch product listing: {e}");
            ProductsIndexTemplate::empty(current_page)
        }
    }
}
