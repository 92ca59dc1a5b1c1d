//! Admin middleware.
//!
//! Every `/api` route sits behind [`require_api_token`]. Health probes do
//! not.

pub mod auth;

pub use auth::require_api_token;
