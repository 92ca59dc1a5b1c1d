//! Public marketing copy from the CMS.

use axum::{Json, extract::State, http::header, response::IntoResponse};
use tracing::{instrument, warn};

use streamstick_core::settings::{SettingCategory, SettingsForm};

use crate::db::SiteSettingsRepository;
use crate::routes::products::CATALOG_CACHE_CONTROL;
use crate::state::AppState;

/// `GET /api/site-settings`
///
/// Every category, stored values over defaults. If the settings table is
/// unreachable the defaults are served so pages still render.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>) -> impl IntoResponse {
    let categories = SettingCategory::ALL;
    let form = match SiteSettingsRepository::new(state.pool())
        .list(&categories)
        .await
    {
        Ok(rows) => {
            let (form, unknown) = SettingsForm::from_rows(&categories, rows);
            if !unknown.is_empty() {
                warn!(keys = ?unknown, "Skipping unknown site settings");
            }
            form
        }
        Err(e) => {
            warn!(error = %e, "Serving default site settings");
            SettingsForm::with_defaults(&categories)
        }
    };

    ([(header::CACHE_CONTROL, CATALOG_CACHE_CONTROL)], Json(form))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;

    use streamstick_core::settings::SettingKey;

    use crate::test_support::{TestClient, body_json};

    #[tokio::test]
    async fn test_defaults_when_database_unreachable() {
        let mut client = TestClient::new();
        let response = client.get("/api/site-settings").await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(
            body["hero_title"],
            SettingKey::HeroTitle.default_value()
        );
        assert_eq!(body.as_object().unwrap().len(), SettingKey::ALL.len());
    }
}
