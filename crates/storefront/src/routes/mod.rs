//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                          - Liveness
//! GET    /health/ready                    - Readiness (database)
//!
//! # Catalog
//! GET    /api/products[?category=]        - Active products (cached 60s)
//! GET    /api/products/{id}               - One product
//! GET    /api/blog/posts                  - Published post summaries (cached 60s)
//! GET    /api/blog/posts/{slug}           - Post with rendered body
//! GET    /api/site-settings               - Public CMS copy
//!
//! # Cart (session slot `cart-storage`)
//! GET    /api/cart
//! POST   /api/cart/items
//! PATCH  /api/cart/items/{id}
//! DELETE /api/cart/items/{id}
//! DELETE /api/cart
//! POST   /api/cart/drawer/{open,close,toggle}
//!
//! # Wishlist (session slot `wishlist-storage`)
//! GET    /api/wishlist
//! POST   /api/wishlist/items
//! POST   /api/wishlist/items/{id}/toggle
//! DELETE /api/wishlist/items/{id}
//!
//! # Checkout
//! POST   /api/checkout                    - Park hand-off in the session
//! GET    /api/checkout                    - Read hand-off (303 to /cart if absent)
//! POST   /api/checkout/session            - Create Stripe Checkout Session
//! POST   /api/stripe/webhook              - Stripe events
//!
//! # Rate limited
//! POST   /api/track                       - Visitor event
//! POST   /api/track-view                  - Page view
//! POST   /api/customer/forgot-password
//! ```

pub mod blog;
pub mod cart;
pub mod checkout;
pub mod customer;
pub mod products;
pub mod site_settings;
pub mod tracking;
pub mod webhook;
pub mod wishlist;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, patch, post},
};

use crate::middleware::{forgot_password_rate_limiter, tracking_rate_limiter};
use crate::state::AppState;

pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/items", post(cart::add))
        .route("/items/{id}", patch(cart::update).delete(cart::remove))
        .route("/drawer/open", post(cart::open_drawer))
        .route("/drawer/close", post(cart::close_drawer))
        .route("/drawer/toggle", post(cart::toggle_drawer))
}

pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wishlist::show))
        .route("/items", post(wishlist::add))
        .route("/items/{id}", axum::routing::delete(wishlist::remove))
        .route("/items/{id}/toggle", post(wishlist::toggle))
}

pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(checkout::show_handoff).post(checkout::create_handoff),
        )
        .route("/session", post(checkout::create_stripe_session))
}

pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(products::index))
        .route("/products/{id}", get(products::show))
        .route("/blog/posts", get(blog::index))
        .route("/blog/posts/{slug}", get(blog::show))
        .route("/site-settings", get(site_settings::show))
}

pub fn tracking_routes() -> Router<AppState> {
    Router::new()
        .route("/track", post(tracking::track_event))
        .route("/track-view", post(tracking::track_view))
        .layer(tracking_rate_limiter())
}

pub fn customer_routes() -> Router<AppState> {
    Router::new()
        .route("/forgot-password", post(customer::forgot_password))
        .layer(forgot_password_rate_limiter())
}

/// All storefront routes.
pub fn routes() -> Router<AppState> {
    let api = Router::new()
        .merge(catalog_routes())
        .merge(tracking_routes())
        .nest("/cart", cart_routes())
        .nest("/wishlist", wishlist_routes())
        .nest("/checkout", checkout_routes())
        .nest("/customer", customer_routes())
        .route("/stripe/webhook", post(webhook::receive));

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/api", api)
}

/// Liveness: the process is up.
async fn health() -> &'static str {
    "ok"
}

/// Readiness: the database answers.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}
