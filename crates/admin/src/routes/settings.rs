//! CMS settings endpoints.

use axum::{
    Json,
    extract::{RawQuery, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use streamstick_core::settings::{FieldRule, SaveReport, SettingCategory, SettingKey, SettingsForm};

use crate::error::{AppError, Result};
use crate::services::SaveError;
use crate::state::AppState;

/// Categories named by repeated `category` parameters; all when none are given.
fn requested_categories(query: Option<&str>) -> Result<Vec<SettingCategory>> {
    let mut categories = Vec::new();
    for (name, value) in url::form_urlencoded::parse(query.unwrap_or_default().as_bytes()) {
        if name != "category" {
            continue;
        }
        let category = value.parse::<SettingCategory>().map_err(AppError::BadRequest)?;
        if !categories.contains(&category) {
            categories.push(category);
        }
    }
    if categories.is_empty() {
        categories.extend(SettingCategory::ALL);
    }
    Ok(categories)
}

#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    pub categories: Vec<SettingCategory>,
    pub values: SettingsForm,
}

/// `GET /api/settings?category=hero&category=seo`
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Json<SettingsResponse>> {
    let categories = requested_categories(query.as_deref())?;
    let values = state.settings().load_settings(&categories).await?;
    Ok(Json(SettingsResponse { categories, values }))
}

#[derive(Debug, Deserialize)]
pub struct SaveRequest {
    pub values: SettingsForm,
}

/// `PUT /api/settings`
///
/// `200` when every key was written, `207 Multi-Status` when some were not.
#[instrument(skip_all)]
pub async fn save(
    State(state): State<AppState>,
    Json(body): Json<SaveRequest>,
) -> Result<(StatusCode, Json<SaveReport>)> {
    let report = state
        .settings()
        .save(&body.values)
        .await
        .map_err(|SaveError::Invalid(fields)| AppError::InvalidSettings(fields))?;

    let status = if report.is_complete() {
        StatusCode::OK
    } else {
        StatusCode::MULTI_STATUS
    };
    Ok((status, Json(report)))
}

#[derive(Debug, Serialize)]
pub struct FieldSchema {
    pub key: SettingKey,
    pub category: SettingCategory,
    pub default: &'static str,
    pub rule: FieldRule,
}

#[derive(Debug, Serialize)]
pub struct SchemaResponse {
    pub version: i32,
    pub fields: Vec<FieldSchema>,
}

/// `GET /api/settings/schema`
pub async fn schema() -> Json<SchemaResponse> {
    Json(SchemaResponse {
        version: streamstick_core::settings::SETTINGS_SCHEMA_VERSION,
        fields: SettingKey::ALL
            .into_iter()
            .map(|key| FieldSchema {
                key,
                category: key.category(),
                default: key.default_value(),
                rule: key.rule(),
            })
            .collect(),
    })
}
