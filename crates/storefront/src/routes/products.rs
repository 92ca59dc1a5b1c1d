//! Product catalog handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::instrument;

use streamstick_core::ProductId;
use streamstick_core::catalog::{Product, ProductCategory};

use crate::db::ProductRepository;
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Browser cache lifetime for catalog reads, matching the server cache.
pub(crate) const CATALOG_CACHE_CONTROL: &str = "public, max-age=60";

#[derive(Debug, Deserialize)]
pub struct ProductQuery {
    pub category: Option<String>,
}

/// `GET /api/products[?category=]`
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<impl IntoResponse> {
    let category = query
        .category
        .as_deref()
        .filter(|c| !c.is_empty())
        .map(str::parse::<ProductCategory>)
        .transpose()
        .map_err(AppError::BadRequest)?;

    let products = state.catalog().products(state.pool(), category).await?;
    Ok((
        [(header::CACHE_CONTROL, CATALOG_CACHE_CONTROL)],
        Json(products.as_ref().clone()),
    ))
}

/// `GET /api/products/{id}`
///
/// Inactive products are reported as missing.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    ProductRepository::new(state.pool())
        .get(&id)
        .await?
        .filter(|p| p.active)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))
}
