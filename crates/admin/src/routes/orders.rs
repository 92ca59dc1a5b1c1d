//! Order listing and fulfillment.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use tracing::{info, instrument};

use streamstick_core::order::Order;
use streamstick_core::{OrderId, OrderStatus};

use crate::db::orders::DEFAULT_PAGE_SIZE;
use crate::db::{OrderFilter, OrderRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl TryFrom<ListQuery> for OrderFilter {
    type Error = AppError;

    fn try_from(query: ListQuery) -> Result<Self> {
        let status = query
            .status
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<OrderStatus>())
            .transpose()
            .map_err(AppError::BadRequest)?;

        Ok(Self {
            status,
            limit: query.limit.unwrap_or(DEFAULT_PAGE_SIZE),
            offset: query.offset.unwrap_or(0),
        }
        .clamped())
    }
}

/// `GET /api/orders[?status=&limit=&offset=]`
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Order>>> {
    let filter = OrderFilter::try_from(query)?;
    let orders = OrderRepository::new(state.pool()).list(filter).await?;
    Ok(Json(orders))
}

/// `GET /api/orders/{id}`
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(id): Path<OrderId>) -> Result<Json<Order>> {
    OrderRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: OrderStatus,
}

/// `PATCH /api/orders/{id}/status`
#[instrument(skip(state, body), fields(to = %body.status))]
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    Json(body): Json<StatusUpdate>,
) -> Result<Json<Order>> {
    let order = OrderRepository::new(state.pool())
        .update_status(id, body.status)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound(format!("order {id}")),
            RepositoryError::InvalidTransition { .. } => AppError::Conflict(e.to_string()),
            other => AppError::Database(other),
        })?;

    info!(order_id = %order.id, status = %order.status, "Order status updated");
    Ok(Json(order))
}
