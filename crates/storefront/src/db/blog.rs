//! Blog post queries.

use sqlx::PgPool;
use tracing::instrument;

use streamstick_core::catalog::BlogPost;

use super::RepositoryError;

const POST_COLUMNS: &str =
    "id, slug, title, excerpt, body_markdown, cover_image, published_at";

pub struct BlogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BlogRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Published posts, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_published(&self) -> Result<Vec<BlogPost>, RepositoryError> {
        let posts = sqlx::query_as::<_, BlogPost>(&format!(
            "SELECT {POST_COLUMNS} FROM storefront.blog_posts
             WHERE published_at IS NOT NULL AND published_at <= now()
             ORDER BY published_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(posts)
    }

    /// A published post by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn get_published(&self, slug: &str) -> Result<Option<BlogPost>, RepositoryError> {
        let post = sqlx::query_as::<_, BlogPost>(&format!(
            "SELECT {POST_COLUMNS} FROM storefront.blog_posts
             WHERE slug = $1 AND published_at IS NOT NULL AND published_at <= now()"
        ))
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;
        Ok(post)
    }

    /// Insert or update a post by id. Used by the seeding command.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self, post), fields(slug = %post.slug))]
    pub async fn upsert(&self, post: &BlogPost) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO storefront.blog_posts
                 (id, slug, title, excerpt, body_markdown, cover_image, published_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             ON CONFLICT (id) DO UPDATE SET
                 slug = EXCLUDED.slug,
                 title = EXCLUDED.title,
                 excerpt = EXCLUDED.excerpt,
                 body_markdown = EXCLUDED.body_markdown,
                 cover_image = EXCLUDED.cover_image,
                 published_at = EXCLUDED.published_at",
        )
        .bind(&post.id)
        .bind(&post.slug)
        .bind(&post.title)
        .bind(&post.excerpt)
        .bind(&post.body_markdown)
        .bind(&post.cover_image)
        .bind(post.published_at)
        .execute(self.pool)
        .await?;
        Ok(())
    }
}
