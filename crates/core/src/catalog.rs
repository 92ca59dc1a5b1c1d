//! Catalog records: products and blog posts.
//!
//! Both are owned by the database and read-only from the storefront's point
//! of view. They are seeded and edited outside the request path.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{BlogPostId, Price, ProductId};

/// What kind of thing a product is. Drives fulfillment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProductCategory {
    /// Physical streaming stick, shipped to the customer.
    #[default]
    Firestick,
    /// IPTV subscription, delivered as service credentials.
    Iptv,
    /// Remotes, cables and other physical add-ons.
    Accessory,
}

impl ProductCategory {
    /// Whether fulfilling this category requires generated IPTV credentials.
    #[must_use]
    pub const fn needs_service_credentials(self) -> bool {
        matches!(self, Self::Iptv)
    }

    /// Whether fulfilling this category requires a shipping address.
    #[must_use]
    pub const fn is_physical(self) -> bool {
        matches!(self, Self::Firestick | Self::Accessory)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Firestick => "firestick",
            Self::Iptv => "iptv",
            Self::Accessory => "accessory",
        }
    }
}

impl std::str::FromStr for ProductCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "firestick" => Ok(Self::Firestick),
            "iptv" => Ok(Self::Iptv),
            "accessory" => Ok(Self::Accessory),
            other => Err(format!("invalid product category: {other}")),
        }
    }
}

// Stored as TEXT with a CHECK constraint rather than a Postgres enum so new
// categories only need a constraint change.
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for ProductCategory {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for ProductCategory {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(s.parse()?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for ProductCategory {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <&str as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.as_str(), buf)
    }
}

/// A product listed on the storefront.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[cfg_attr(feature = "postgres", sqlx(rename = "price_cents", try_from = "i64"))]
    pub price: Price,
    pub image: Option<String>,
    pub category: ProductCategory,
    pub description: Option<String>,
    pub active: bool,
}

/// A blog post. The body is stored as Markdown and rendered on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct BlogPost {
    pub id: BlogPostId,
    pub slug: String,
    pub title: String,
    pub excerpt: Option<String>,
    pub body_markdown: String,
    pub cover_image: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

impl BlogPost {
    /// Whether the post is visible on the public site at `now`.
    #[must_use]
    pub fn is_published(&self, now: DateTime<Utc>) -> bool {
        self.published_at.is_some_and(|at| at <= now)
    }
}

/// A post as listed on the blog index, without its body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostSummary {
    pub slug: String,
    pub title: String,
    pub excerpt: Option<String>,
    pub cover_image: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

impl From<&BlogPost> for PostSummary {
    fn from(post: &BlogPost) -> Self {
        Self {
            slug: post.slug.clone(),
            title: post.title.clone(),
            excerpt: post.excerpt.clone(),
            cover_image: post.cover_image.clone(),
            published_at: post.published_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn test_category_fulfillment_flags() {
        assert!(ProductCategory::Iptv.needs_service_credentials());
        assert!(!ProductCategory::Iptv.is_physical());
        assert!(ProductCategory::Firestick.is_physical());
    }

    #[test]
    fn test_blog_post_published_window() {
        let now = Utc::now();
        let mut post = BlogPost {
            id: BlogPostId::new("p1"),
            slug: "setup-guide".to_owned(),
            title: "Setup guide".to_owned(),
            excerpt: None,
            body_markdown: "# Hi".to_owned(),
            cover_image: None,
            published_at: None,
        };
        assert!(!post.is_published(now));
        post.published_at = Some(now + Duration::hours(1));
        assert!(!post.is_published(now));
        post.published_at = Some(now - Duration::hours(1));
        assert!(post.is_published(now));
    }
}
