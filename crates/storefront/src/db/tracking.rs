//! Visitor event and page view inserts.

use sqlx::PgPool;
use sqlx::types::Json;
use tracing::instrument;

use streamstick_core::analytics::{GeoLocation, PageView, TrackEvent};

use super::RepositoryError;

pub struct TrackingRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TrackingRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    #[instrument(skip_all, fields(event = %event.event))]
    pub async fn record_event(
        &self,
        event: &TrackEvent,
        geo: &GeoLocation,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO storefront.visitor_events
                 (session_id, event, path, referrer, properties, country, region, city)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(event.session_id)
        .bind(&event.event)
        .bind(&event.path)
        .bind(&event.referrer)
        .bind(Json(&event.properties))
        .bind(&geo.country)
        .bind(&geo.region)
        .bind(&geo.city)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    #[instrument(skip_all, fields(path = %view.path))]
    pub async fn record_page_view(
        &self,
        view: &PageView,
        geo: &GeoLocation,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO storefront.page_views
                 (session_id, path, referrer, title, country, region, city)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(view.session_id)
        .bind(&view.path)
        .bind(&view.referrer)
        .bind(&view.title)
        .bind(&geo.country)
        .bind(&geo.region)
        .bind(&geo.city)
        .execute(self.pool)
        .await?;
        Ok(())
    }
}
