//! Product catalog queries.

use sqlx::PgPool;
use tracing::instrument;

use streamstick_core::ProductId;
use streamstick_core::catalog::{Product, ProductCategory};

use super::RepositoryError;

const PRODUCT_COLUMNS: &str =
    "id, name, price_cents, image, category, description, active";

/// Repository for catalog products.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Active products, optionally narrowed to one category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_active(
        &self,
        category: Option<ProductCategory>,
    ) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.products
             WHERE active AND ($1::text IS NULL OR category = $1)
             ORDER BY sort_order, name"
        ))
        .bind(category)
        .fetch_all(self.pool)
        .await?;
        Ok(products)
    }

    /// An active product by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.products WHERE id = $1 AND active"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(product)
    }

    /// Insert or update a product by id. Used by the seeding command.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn upsert(&self, product: &Product, sort_order: i32) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO storefront.products
                 (id, name, price_cents, image, category, description, active, sort_order)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             ON CONFLICT (id) DO UPDATE SET
                 name = EXCLUDED.name,
                 price_cents = EXCLUDED.price_cents,
                 image = EXCLUDED.image,
                 category = EXCLUDED.category,
                 description = EXCLUDED.description,
                 active = EXCLUDED.active,
                 sort_order = EXCLUDED.sort_order,
                 updated_at = now()",
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.price.cents())
        .bind(&product.image)
        .bind(product.category)
        .bind(&product.description)
        .bind(product.active)
        .bind(sort_order)
        .execute(self.pool)
        .await?;
        Ok(())
    }
}
