//! Blog handlers. Bodies are stored as Markdown and rendered on read.

use axum::{
    Json,
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::instrument;

use streamstick_core::catalog::{BlogPost, PostSummary};

use crate::db::BlogRepository;
use crate::error::{AppError, Result};
use crate::routes::products::CATALOG_CACHE_CONTROL;
use crate::services::markdown;
use crate::state::AppState;

/// A post with its body rendered to HTML.
#[derive(Debug, Serialize)]
pub struct PostView {
    pub slug: String,
    pub title: String,
    pub excerpt: Option<String>,
    pub cover_image: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub body_html: String,
    pub reading_time_minutes: u32,
}

/// Average reading speed used for the estimate.
const WORDS_PER_MINUTE: usize = 200;

impl From<BlogPost> for PostView {
    fn from(post: BlogPost) -> Self {
        let words = post.body_markdown.split_whitespace().count();
        let minutes = words.div_ceil(WORDS_PER_MINUTE).max(1);
        Self {
            body_html: markdown::render(&post.body_markdown),
            reading_time_minutes: u32::try_from(minutes).unwrap_or(u32::MAX),
            slug: post.slug,
            title: post.title,
            excerpt: post.excerpt,
            cover_image: post.cover_image,
            published_at: post.published_at,
        }
    }
}

/// `GET /api/blog/posts`
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let posts = state.catalog().posts(state.pool()).await?;
    let summaries: Vec<PostSummary> = posts.iter().map(PostSummary::from).collect();
    Ok((
        [(header::CACHE_CONTROL, CATALOG_CACHE_CONTROL)],
        Json(summaries),
    ))
}

/// `GET /api/blog/posts/{slug}`
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<PostView>> {
    BlogRepository::new(state.pool())
        .get_published(&slug)
        .await?
        .map(|post| Json(PostView::from(post)))
        .ok_or_else(|| AppError::NotFound(format!("post {slug}")))
}

#[cfg(test)]
mod tests {
    use streamstick_core::BlogPostId;

    use super::*;

    fn post(body: &str) -> BlogPost {
        BlogPost {
            id: BlogPostId::new("post-1"),
            slug: "setup-guide".to_string(),
            title: "Setup guide".to_string(),
            excerpt: None,
            body_markdown: body.to_string(),
            cover_image: None,
            published_at: Some(Utc::now()),
        }
    }

    #[test]
    fn test_post_view_renders_markdown() {
        let view = PostView::from(post("## Step one\n\nPair the *remote*."));
        assert!(view.body_html.contains("<h2"));
        assert!(view.body_html.contains("<em>remote</em>"));
        assert_eq!(view.reading_time_minutes, 1);
    }

    #[test]
    fn test_reading_time_rounds_up() {
        let body = "word ".repeat(WORDS_PER_MINUTE + 1);
        assert_eq!(PostView::from(post(&body)).reading_time_minutes, 2);
    }
}
