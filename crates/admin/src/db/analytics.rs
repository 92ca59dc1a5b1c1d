//! Visitor and sales rollups for the dashboard.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tracing::instrument;

use streamstick_core::OrderStatus;

use super::RepositoryError;

/// How many paths the summary lists.
const TOP_PATHS: i64 = 10;

/// Statuses that count as revenue.
const PAID_STATUSES: [OrderStatus; 2] = [OrderStatus::Completed, OrderStatus::Shipped];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct PathCount {
    pub path: String,
    pub views: i64,
}

/// Activity over the last `days` days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalyticsSummary {
    pub days: u32,
    pub since: DateTime<Utc>,
    /// Distinct `visitor_session_id`s seen in events or page views.
    pub visitors: i64,
    pub page_views: i64,
    pub events: i64,
    pub top_paths: Vec<PathCount>,
    pub orders: i64,
    pub paid_orders: i64,
    pub revenue_cents: i64,
}

pub struct AnalyticsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AnalyticsRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any query fails.
    #[instrument(skip(self))]
    pub async fn summary(&self, days: u32) -> Result<AnalyticsSummary, RepositoryError> {
        let since = Utc::now() - Duration::days(i64::from(days));

        let visitors = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(DISTINCT session_id) FROM (
                 SELECT session_id FROM storefront.page_views WHERE created_at >= $1
                 UNION
                 SELECT session_id FROM storefront.visitor_events WHERE created_at >= $1
             ) seen",
        )
        .bind(since)
        .fetch_one(self.pool)
        .await?;

        let page_views = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM storefront.page_views WHERE created_at >= $1",
        )
        .bind(since)
        .fetch_one(self.pool)
        .await?;

        let events = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM storefront.visitor_events WHERE created_at >= $1",
        )
        .bind(since)
        .fetch_one(self.pool)
        .await?;

        let top_paths = sqlx::query_as::<_, PathCount>(
            "SELECT path, COUNT(*) AS views FROM storefront.page_views
             WHERE created_at >= $1
             GROUP BY path
             ORDER BY views DESC, path
             LIMIT $2",
        )
        .bind(since)
        .bind(TOP_PATHS)
        .fetch_all(self.pool)
        .await?;

        let (orders, paid_orders, revenue_cents) = sqlx::query_as::<_, (i64, i64, i64)>(
            "SELECT COUNT(*),
                    COUNT(*) FILTER (WHERE status::text = ANY($2)),
                    COALESCE(SUM(amount_cents) FILTER (WHERE status::text = ANY($2)), 0)::BIGINT
             FROM storefront.orders WHERE created_at >= $1",
        )
        .bind(since)
        .bind(PAID_STATUSES.map(OrderStatus::as_str).to_vec())
        .fetch_one(self.pool)
        .await?;

        Ok(AnalyticsSummary {
            days,
            since,
            visitors,
            page_views,
            events,
            top_paths,
            orders,
            paid_orders,
            revenue_cents,
        })
    }
}
