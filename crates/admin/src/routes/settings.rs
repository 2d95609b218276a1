//! Per-user client settings and filter presets.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use chrono::Utc;
use serde::Deserialize;
use tracing::instrument;

use crate::error::AppError;
use crate::middleware::RequireAuth;
use crate::models::{AdvancedFilters, ClientSettings, FilterPreset};
use crate::state::AppState;

/// Build the settings router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/settings", get(show).put(replace))
        .route("/api/settings/presets", post(save_preset))
        .route("/api/settings/presets/{name}", delete(delete_preset))
}

/// The caller's settings; defaults when none were saved.
#[instrument(skip(user, state))]
pub async fn show(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<ClientSettings>, AppError> {
    Ok(Json(state.settings().load(&user.email).await?))
}

/// Replace the caller's settings.
#[instrument(skip(user, state, settings))]
pub async fn replace(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(settings): Json<ClientSettings>,
) -> Result<Json<ClientSettings>, AppError> {
    state.settings().save(&user.email, &settings).await?;
    Ok(Json(settings))
}

#[derive(Debug, Deserialize)]
pub struct PresetRequest {
    pub name: String,
    #[serde(default)]
    pub filters: AdvancedFilters,
}

/// Save a preset; an existing preset with the same name is replaced.
#[instrument(skip(user, state, body))]
pub async fn save_preset(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(body): Json<PresetRequest>,
) -> Result<(StatusCode, Json<Vec<FilterPreset>>), AppError> {
    let name = body.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("Preset name is required".to_string()));
    }

    let mut settings = state.settings().load(&user.email).await?;
    settings.upsert_preset(FilterPreset {
        name: name.to_string(),
        filters: body.filters,
        created_at: Utc::now(),
    });
    state.settings().save(&user.email, &settings).await?;

    Ok((StatusCode::CREATED, Json(settings.filter_presets)))
}

/// Remove a preset by name.
#[instrument(skip(user, state))]
pub async fn delete_preset(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Vec<FilterPreset>>, AppError> {
    let mut settings = state.settings().load(&user.email).await?;
    if !settings.remove_preset(&name) {
        return Err(AppError::NotFound(format!("Preset {name}")));
    }
    state.settings().save(&user.email, &settings).await?;

    Ok(Json(settings.filter_presets))
}
