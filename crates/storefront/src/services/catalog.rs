//! In-process cache in front of the catalog tables.
//!
//! Product and post lists change rarely and are read on every page, so they
//! are kept for 60 seconds. Single-item reads go straight to the database.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;

use streamstick_core::catalog::{BlogPost, Product, ProductCategory};

use crate::db::{BlogRepository, ProductRepository, RepositoryError};

/// How long cached lists are served before the next read refetches them.
pub const CATALOG_TTL: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub struct CatalogCache {
    products: Cache<Option<ProductCategory>, Arc<Vec<Product>>>,
    posts: Cache<(), Arc<Vec<BlogPost>>>,
}

impl Default for CatalogCache {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogCache {
    #[must_use]
    pub fn new() -> Self {
        Self {
            products: Cache::builder()
                .max_capacity(16)
                .time_to_live(CATALOG_TTL)
                .build(),
            posts: Cache::builder()
                .max_capacity(1)
                .time_to_live(CATALOG_TTL)
                .build(),
        }
    }

    /// Active products, optionally filtered by category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the list is not cached and the query fails.
    pub async fn products(
        &self,
        pool: &PgPool,
        category: Option<ProductCategory>,
    ) -> Result<Arc<Vec<Product>>, RepositoryError> {
        if let Some(cached) = self.products.get(&category).await {
            return Ok(cached);
        }
        let products = Arc::new(ProductRepository::new(pool).list_active(category).await?);
        self.products.insert(category, Arc::clone(&products)).await;
        Ok(products)
    }

    /// Published posts, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the list is not cached and the query fails.
    pub async fn posts(&self, pool: &PgPool) -> Result<Arc<Vec<BlogPost>>, RepositoryError> {
        if let Some(cached) = self.posts.get(&()).await {
            return Ok(cached);
        }
        let posts = Arc::new(BlogRepository::new(pool).list_published().await?);
        self.posts.insert((), Arc::clone(&posts)).await;
        Ok(posts)
    }
}
