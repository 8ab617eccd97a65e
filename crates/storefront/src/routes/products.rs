//! Product route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use shopease_core::CatalogEntry;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::services::catalog::{CatalogBrowser, fetch_all};
use crate::services::resolver::resolve_product;
use crate::state::AppState;

/// Product display data.
#[derive(Debug, Clone, Serialize)]
pub struct ProductView {
    pub id: String,
    pub short_id: String,
    pub handle: String,
    pub title: String,
    pub description: String,
    pub price: String,
    pub image: String,
    pub image_alt: String,
    pub available_for_sale: bool,
}

impl From<&CatalogEntry> for ProductView {
    fn from(entry: &CatalogEntry) -> Self {
        Self {
            id: entry.id.clone(),
            short_id: entry.short_id().to_string(),
            handle: entry.handle.clone(),
            title: entry.title.clone(),
            description: entry.description_or_default().to_string(),
            price: entry.money().display(),
            image: entry.image_or_placeholder().to_string(),
            image_alt: entry.alt_text().to_string(),
            available_for_sale: entry.available_for_sale,
        }
    }
}

/// Pagination query parameters.
#[derive(Debug, Deserialize)]
pub struct PaginationQuery {
    pub page: Option<usize>,
}

/// One page of the catalog.
#[derive(Debug, Serialize)]
pub struct ProductListView {
    pub products: Vec<ProductView>,
    pub current_page: usize,
    pub total_pages: usize,
    pub total_products: usize,
    pub has_more_pages: bool,
}

impl From<&CatalogBrowser> for ProductListView {
    fn from(browser: &CatalogBrowser) -> Self {
        Self {
            products: browser.current().iter().map(ProductView::from).collect(),
            current_page: browser.current_page(),
            total_pages: browser.total_pages(),
            total_products: browser.entries().len(),
            has_more_pages: browser.current_page() < browser.total_pages(),
        }
    }
}

/// Product listing.
///
/// The whole catalog is loaded and sliced locally; a load failure replaces
/// the listing with an error message.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<PaginationQuery>,
) -> Response {
    let mut browser =
        CatalogBrowser::load(state.storefront(), state.config().catalog.products_per_page).await;

    if let Some(message) = browser.error() {
        return (StatusCode::BAD_GATEWAY, Json(json!({ "error": message }))).into_response();
    }

    browser.set_page(query.page.unwrap_or(1));
    Json(ProductListView::from(&browser)).into_response()
}

/// Product detail by full or short id.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProductView>> {
    let entries = fetch_all(state.storefront()).await?;

    resolve_product(&id, &entries)
        .map(|entry| Json(ProductView::from(entry)))
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))
}
