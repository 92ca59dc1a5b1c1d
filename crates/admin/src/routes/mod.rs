//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                        - Liveness
//! GET    /health/ready                  - Readiness (database)
//!
//! # Bearer token required
//! GET    /api/settings[?category=...]   - CMS values, defaults filled in
//! PUT    /api/settings                  - Validate and save
//! GET    /api/settings/schema           - Keys, categories, defaults, rules
//! GET    /api/orders[?status=&limit=&offset=]
//! GET    /api/orders/{id}
//! PATCH  /api/orders/{id}/status
//! GET    /api/analytics/summary[?days=]
//! ```

pub mod analytics;
pub mod orders;
pub mod settings;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{get, patch},
};

use crate::middleware::require_api_token;
use crate::state::AppState;

/// Operator API; every route requires the bearer token.
fn api_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/settings", get(settings::show).put(settings::save))
        .route("/settings/schema", get(settings::schema))
        .route("/orders", get(orders::index))
        .route("/orders/{id}", get(orders::show))
        .route("/orders/{id}/status", patch(orders::update_status))
        .route("/analytics/summary", get(analytics::summary))
        .route_layer(from_fn_with_state(state.clone(), require_api_token))
}

/// All admin routes.
pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/api", api_routes(state))
}

async fn health() -> &'static str {
    "ok"
}

async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}
