//! Customer self-service.

use axum::{Json, extract::State};
use chrono::{Duration, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{error, info, instrument};

use streamstick_core::Email;

use crate::db::{OrderRepository, PasswordResetRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Reset tokens expire after one hour.
const RESET_TOKEN_TTL_HOURS: i64 = 1;

/// Same answer whether or not the email is known.
pub const FORGOT_PASSWORD_MESSAGE: &str =
    "If an account exists for that email, a password reset link has been sent.";

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// A fresh token and the hash stored for it. Only the hash is persisted.
fn new_reset_token() -> (String, String) {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    let token = hex::encode(bytes);
    let hash = hex::encode(Sha256::digest(token.as_bytes()));
    (token, hash)
}

/// Store a reset token if the email has ever placed an order.
///
/// Returns whether a token was issued.
async fn issue_reset_token(
    state: &AppState,
    email: &Email,
) -> std::result::Result<bool, RepositoryError> {
    if !OrderRepository::new(state.pool())
        .exists_for_email(email)
        .await?
    {
        return Ok(false);
    }

    // TODO: email the reset link once a transactional mail provider is configured.
    let (_token, hash) = new_reset_token();
    PasswordResetRepository::new(state.pool())
        .replace(email, &hash, Utc::now() + Duration::hours(RESET_TOKEN_TTL_HOURS))
        .await?;
    Ok(true)
}

/// `POST /api/customer/forgot-password`
#[instrument(skip_all)]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(body): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>> {
    let email = Email::parse(&body.email)
        .map_err(|_| AppError::BadRequest("please enter a valid email address".to_string()))?;

    match issue_reset_token(&state, &email).await {
        Ok(true) => info!(email = %email.redacted(), "Password reset token issued"),
        Ok(false) => info!(email = %email.redacted(), "Password reset requested for unknown email"),
        Err(e) => error!(error = %e, "Failed to issue password reset token"),
    }

    Ok(Json(MessageResponse {
        message: FORGOT_PASSWORD_MESSAGE,
    }))
}
