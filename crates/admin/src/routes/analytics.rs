//! Dashboard rollups.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use crate::db::AnalyticsRepository;
use crate::db::analytics::AnalyticsSummary;
use crate::error::{AppError, Result};
use crate::state::AppState;

const DEFAULT_DAYS: u32 = 30;
const MAX_DAYS: u32 = 365;

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub days: Option<u32>,
}

fn window(query: &SummaryQuery) -> Result<u32> {
    match query.days.unwrap_or(DEFAULT_DAYS) {
        days @ 1..=MAX_DAYS => Ok(days),
        days => Err(AppError::BadRequest(format!(
            "days must be between 1 and {MAX_DAYS} (got {days})"
        ))),
    }
}

/// `GET /api/analytics/summary?days=`
#[instrument(skip(state))]
pub async fn summary(
    State(state): State<AppState>,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<AnalyticsSummary>> {
    let days = window(&query)?;
    let summary = AnalyticsRepository::new(state.pool()).summary(days).await?;
    Ok(Json(summary))
}
