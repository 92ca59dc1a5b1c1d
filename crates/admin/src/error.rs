//! Unified error handling with Sentry integration.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use streamstick_core::settings::FieldError;

use crate::db::{RepositoryError, SettingsError};

/// Application-level error type for admin.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    /// One or more CMS fields failed validation; nothing was written.
    #[error("Invalid settings")]
    InvalidSettings(Vec<FieldError>),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

impl AppError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) | Self::Settings(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InvalidSettings(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let body = match self {
            Self::Database(_) | Self::Settings(_) => {
                serde_json::json!({ "error": "Internal server error" })
            }
            Self::InvalidSettings(fields) => {
                serde_json::json!({ "error": "Invalid settings", "fields": fields })
            }
            other => serde_json::json!({ "error": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use streamstick_core::settings::SettingKey;

    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_status_codes() {
        let status = |err: AppError| err.into_response().status();

        assert_eq!(status(AppError::Unauthorized), StatusCode::UNAUTHORIZED);
        assert_eq!(status(AppError::NotFound("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(status(AppError::Conflict("x".into())), StatusCode::CONFLICT);
        assert_eq!(
            status(AppError::InvalidSettings(Vec::new())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status(AppError::Database(RepositoryError::NotFound)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_invalid_settings_lists_fields() {
        let response = AppError::InvalidSettings(vec![FieldError {
            key: SettingKey::ContactEmail,
            message: "must be a valid email address".into(),
        }])
        .into_response();
        let body = body_json(response).await;
        assert_eq!(body["fields"][0]["key"], "contact_email");
    }

    #[tokio::test]
    async fn test_database_details_are_hidden() {
        let response =
            AppError::Database(RepositoryError::DataCorruption("order 7: bad email".into()))
                .into_response();
        assert_eq!(body_json(response).await["error"], "Internal server error");
    }
}
