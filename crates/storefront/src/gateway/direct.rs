use sqlx::PgPool;

use streamstick_core::catalog::PostSummary;

use super::{DirectRead, DirectReader, GatewayError};
use crate::db::{BlogRepository, ProductRepository};

/// Answers direct reads from Postgres with the same JSON the HTTP endpoints
/// return.
#[derive(Debug, Clone)]
pub struct PgDirectReader {
    pool: PgPool,
}

impl PgDirectReader {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl DirectReader for PgDirectReader {
    async fn read(&self, request: &DirectRead) -> Result<serde_json::Value, GatewayError> {
        let value = match request {
            DirectRead::Products { category } => {
                let products = ProductRepository::new(&self.pool)
                    .list_active(*category)
                    .await?;
                serde_json::to_value(products)?
            }
            DirectRead::BlogPosts => {
                let posts = BlogRepository::new(&self.pool).list_published().await?;
                let summaries: Vec<PostSummary> = posts.iter().map(PostSummary::from).collect();
                serde_json::to_value(summaries)?
            }
        };
        Ok(value)
    }
}
