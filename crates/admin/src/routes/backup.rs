//! Backup download and restore.

use axum::{
    Json, Router,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tracing::instrument;

use delivery_tracker_core::Capability;

use crate::error::AppError;
use crate::middleware::{RequireAuth, require};
use crate::services::backup::{create_backup, validate_backup};
use crate::services::export::export_filename;
use crate::state::AppState;

/// Build the backup router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/backup", get(download))
        .route("/api/backup/restore", post(restore))
}

/// Download every delivery plus the caller's filters and theme.
#[instrument(skip(user, state))]
pub async fn download(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    require(&user, Capability::Backup)?;

    let deliveries = state.deliveries().list().await?;
    let settings = state.settings().load(&user.email).await?;
    let document = create_backup(deliveries, &settings, Utc::now());
    let filename = export_filename("backup", "json", state.local_now());

    tracing::info!(count = document.deliveries.len(), email = %user.email, "Backup created");

    Ok((
        [(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        )],
        Json(document),
    )
        .into_response())
}

#[derive(Debug, Serialize)]
pub struct RestoreResponse {
    pub restored: usize,
}

/// Replace the whole store with a validated backup.
///
/// Nothing is written unless the document passes every check.
#[instrument(skip(user, state, body))]
pub async fn restore(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<RestoreResponse>, AppError> {
    require(&user, Capability::Backup)?;

    let document = validate_backup(&body).map_err(|errors| {
        tracing::warn!(errors = errors.len(), "Backup rejected");
        AppError::Validation { errors, data: None }
    })?;

    state.deliveries().replace_all(&document.deliveries).await?;

    if document.filters.is_some() || document.theme.is_some() {
        let mut settings = state.settings().load(&user.email).await?;
        if let Some(filters) = document.filters {
            settings.last_filters = Some(filters);
        }
        if let Some(theme) = document.theme {
            settings.theme = theme;
        }
        state.settings().save(&user.email, &settings).await?;
    }

    tracing::info!(
        count = document.deliveries.len(),
        email = %user.email,
        "Backup restored"
    );

    Ok(Json(RestoreResponse {
        restored: document.deliveries.len(),
    }))
}
