//! Bearer-token authentication.
//!
//! Operators send `Authorization: Bearer <ADMIN_API_TOKEN>`. Both sides are
//! hashed before a constant-time comparison so neither the token length nor a
//! matching prefix leaks through timing.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::error::AppError;
use crate::state::AppState;

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn token_matches(presented: &str, expected_digest: &[u8; 32]) -> bool {
    let digest = Sha256::digest(presented.as_bytes());
    digest.as_slice().ct_eq(expected_digest.as_slice()).into()
}

/// Reject requests without the operator token.
///
/// # Errors
///
/// Returns `AppError::Unauthorized` for a missing or wrong token.
pub async fn require_api_token(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let authorized = bearer_token(request.headers())
        .is_some_and(|token| token_matches(token, state.api_token_digest()));

    if !authorized {
        tracing::warn!(path = %request.uri().path(), "Rejected admin request without valid token");
        return Err(AppError::Unauthorized);
    }

    Ok(next.run(request).await)
}
