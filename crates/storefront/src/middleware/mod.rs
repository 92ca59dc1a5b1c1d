//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, transaction)
//! 2. `TraceLayer`
//! 3. Request ID
//! 4. Security headers
//! 5. Session layer (tower-sessions, Postgres store)
//! 6. Rate limiting on tracking and forgot-password routes only

pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use rate_limit::{client_ip, forgot_password_rate_limiter, tracking_rate_limiter};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::{create_session_layer, session_layer};
