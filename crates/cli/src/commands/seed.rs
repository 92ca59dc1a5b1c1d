//! Seed the catalog from a YAML file.
//!
//! ```yaml
//! products:
//!   - id: fire-stick-4k
//!     name: Fire Stick 4K (Loaded)
//!     price: 7999            # cents
//!     category: firestick
//!     image: /images/fire-stick-4k.webp
//! posts:
//!   - slug: setup-guide
//!     title: Setting up your stick
//!     body_markdown: "# Plug it in\n..."
//!     published_at: 2026-01-05T12:00:00Z
//! ```
//!
//! Products and posts are upserted by id and slug, so re-running the same
//! file is safe. List order becomes product sort order.

use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{error, info};

use streamstick_core::catalog::{BlogPost, Product, ProductCategory};
use streamstick_core::{BlogPostId, Price, ProductId};
use streamstick_storefront::db::{self, BlogRepository, ProductRepository};

const fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedProduct {
    pub id: String,
    pub name: String,
    pub price: Price,
    pub category: ProductCategory,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

impl From<SeedProduct> for Product {
    fn from(seed: SeedProduct) -> Self {
        Self {
            id: ProductId::new(seed.id),
            name: seed.name,
            price: seed.price,
            image: seed.image,
            category: seed.category,
            description: seed.description,
            active: seed.active,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedPost {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    pub body_markdown: String,
    #[serde(default)]
    pub cover_image: Option<String>,
    /// Drafts have no publish date.
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

impl From<SeedPost> for BlogPost {
    fn from(seed: SeedPost) -> Self {
        Self {
            id: BlogPostId::new(seed.slug.clone()),
            slug: seed.slug,
            title: seed.title,
            excerpt: seed.excerpt,
            body_markdown: seed.body_markdown,
            cover_image: seed.cover_image,
            published_at: seed.published_at,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedFile {
    #[serde(default)]
    pub products: Vec<SeedProduct>,
    #[serde(default)]
    pub posts: Vec<SeedPost>,
}

/// Problems found before anything is written.
pub fn validate(file: &SeedFile) -> Vec<String> {
    let mut errors = Vec::new();

    let mut ids = HashSet::new();
    for product in &file.products {
        if product.id.trim().is_empty() {
            errors.push("product with empty id".to_string());
        } else if !ids.insert(product.id.as_str()) {
            errors.push(format!("duplicate product id: {}", product.id));
        }
        if product.name.trim().is_empty() {
            errors.push(format!("product {}: empty name", product.id));
        }
    }

    let mut slugs = HashSet::new();
    for post in &file.posts {
        let slug_ok = !post.slug.is_empty()
            && post
                .slug
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
        if !slug_ok {
            errors.push(format!("invalid post slug: {:?}", post.slug));
        } else if !slugs.insert(post.slug.as_str()) {
            errors.push(format!("duplicate post slug: {}", post.slug));
        }
        if post.title.trim().is_empty() {
            errors.push(format!("post {}: empty title", post.slug));
        }
    }

    errors
}

/// Seed products and posts from `file_path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, validation fails,
/// or a database write fails.
pub async fn catalog(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let database_url = super::database_url()?;

    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading catalog seed");
    let content = tokio::fs::read_to_string(path).await?;
    let file: SeedFile = serde_yaml::from_str(&content)?;

    let errors = validate(&file);
    if !errors.is_empty() {
        error!("Seed validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    let pool = db::create_pool(&database_url).await?;
    info!("Connected to database");

    let products = ProductRepository::new(&pool);
    let product_count = file.products.len();
    for (position, seed) in file.products.into_iter().enumerate() {
        let sort_order = i32::try_from(position).unwrap_or(i32::MAX);
        products.upsert(&Product::from(seed), sort_order).await?;
    }

    let posts = BlogRepository::new(&pool);
    let post_count = file.posts.len();
    for seed in file.posts {
        posts.upsert(&BlogPost::from(seed)).await?;
    }

    info!("Seeding complete!");
    info!("  Products upserted: {product_count}");
    info!("  Posts upserted: {post_count}");
    Ok(())
}
