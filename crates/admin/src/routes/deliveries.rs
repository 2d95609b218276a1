//! Delivery CRUD, bulk actions and table endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
};
use chrono::Utc;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::instrument;

use delivery_tracker_core::{
    Capability, Delivery, DeliveryId, DeliveryPatch, DeliveryStatus, NewDelivery, Permissions,
    can_update,
};

use super::FilterQuery;
use crate::components::virtual_list::{DEFAULT_OVERSCAN, DEFAULT_ROW_HEIGHT};
use crate::components::{DataTableConfig, VirtualList, VisibleRange, deliveries_table_for};
use crate::error::AppError;
use crate::middleware::{RequireAuth, require};
use crate::services::filter::apply_all;
use crate::services::notifications::{StatusChangeEvent, status_change_event};
use crate::state::AppState;

/// Build the deliveries router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/deliveries", get(list).post(create))
        .route("/api/deliveries/bulk", post(bulk))
        .route("/api/deliveries/window", get(window))
        .route("/api/deliveries/table", get(table))
        .route("/api/deliveries/{id}", put(update).delete(remove))
}

/// Load the store and apply the query's filters.
///
/// # Errors
///
/// Returns an error for bad filter values or an unreadable store.
pub async fn filtered(state: &AppState, query: &FilterQuery) -> Result<Vec<Delivery>, AppError> {
    let filters = query.advanced()?;
    let quick = query.quick_filter();
    let deliveries = state.deliveries().list().await?;
    Ok(apply_all(&deliveries, quick, &filters, state.today()))
}

/// Deserialize a JSON body, reporting failures as 400.
fn from_body<T: DeserializeOwned>(body: Value) -> Result<T, AppError> {
    serde_json::from_value(body).map_err(|e| AppError::BadRequest(e.to_string()))
}

/// List deliveries.
#[instrument(skip(user, state))]
pub async fn list(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Query(query): Query<FilterQuery>,
) -> Result<Json<Vec<Delivery>>, AppError> {
    require(&user, Capability::ViewDeliveries)?;
    Ok(Json(filtered(&state, &query).await?))
}

/// Create a delivery.
#[instrument(skip(user, state, body))]
pub async fn create(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Delivery>), AppError> {
    require(&user, Capability::CreateDelivery)?;

    let new: NewDelivery = from_body(body)?;
    new.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let delivery = state.deliveries().create(new, Utc::now()).await?;
    tracing::info!(id = %delivery.id, email = %user.email, "Delivery created");

    Ok((StatusCode::CREATED, Json(delivery)))
}

/// Updated record plus the notification it triggered, if any.
#[derive(Debug, Serialize)]
pub struct UpdateResponse {
    #[serde(flatten)]
    pub delivery: Delivery,
    pub notification: Option<StatusChangeEvent>,
}

/// Whether an update body sets nothing but a status string.
fn is_status_only(body: &Value) -> bool {
    body.as_object().is_some_and(|fields| {
        fields.len() == 1 && fields.get("status").is_some_and(Value::is_string)
    })
}

/// Update a delivery.
///
/// A body carrying only `status` needs the change-status capability; any
/// other field needs the edit capability.
#[instrument(skip(user, state, body))]
pub async fn update(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<UpdateResponse>, AppError> {
    if body.get("status").is_some_and(Value::is_null) {
        return Err(AppError::BadRequest("status must not be null".to_string()));
    }

    let status_only = is_status_only(&body);
    if !can_update(user.role, status_only) {
        tracing::warn!(email = %user.email, role = %user.role, status_only, "Update denied");
        return Err(AppError::Forbidden(
            "You do not have permission to perform this action".to_string(),
        ));
    }

    let patch: DeliveryPatch = from_body(body)?;
    patch
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let updated = state.deliveries().update(&DeliveryId::new(id), patch).await?;

    // The write has happened; a settings failure only costs the notification.
    let notification = match state.settings().load(&user.email).await {
        Ok(settings) => {
            status_change_event(&updated.previous, &updated.current, &settings.notifications)
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                email = %user.email,
                "Settings unavailable, skipping notification"
            );
            None
        }
    };
    if let Some(event) = &notification {
        tracing::info!(id = %event.id, from = %event.from, to = %event.to, "{}", event.message);
    }

    Ok(Json(UpdateResponse {
        delivery: updated.current,
        notification,
    }))
}

/// Delete confirmation.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Delete a delivery.
#[instrument(skip(user, state))]
pub async fn remove(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    require(&user, Capability::DeleteDelivery)?;

    let deleted = state.deliveries().delete(&DeliveryId::new(id)).await?;
    tracing::info!(id = %deleted.id, email = %user.email, "Delivery deleted");

    Ok(Json(MessageResponse {
        message: format!("Delivery {} deleted", deleted.id),
    }))
}

/// Bulk operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkActionKind {
    Delete,
    Status,
}

/// Bulk request body.
#[derive(Debug, Deserialize)]
pub struct BulkRequest {
    pub action: BulkActionKind,
    pub ids: Vec<DeliveryId>,
    #[serde(default)]
    pub status: Option<DeliveryStatus>,
}

/// Bulk result.
#[derive(Debug, Serialize)]
pub struct BulkResponse {
    /// Records actually changed; unknown ids are skipped.
    pub affected: usize,
}

/// Delete or re-status many deliveries at once.
#[instrument(skip(user, state, body))]
pub async fn bulk(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Json(body): Json<BulkRequest>,
) -> Result<Json<BulkResponse>, AppError> {
    let affected = match body.action {
        BulkActionKind::Delete => {
            require(&user, Capability::BulkDelete)?;
            if body.ids.is_empty() {
                return Err(AppError::BadRequest("No deliveries selected".to_string()));
            }
            state.deliveries().delete_many(&body.ids).await?
        }
        BulkActionKind::Status => {
            require(&user, Capability::BulkStatusChange)?;
            let status = body
                .status
                .ok_or_else(|| AppError::BadRequest("status is required".to_string()))?;
            if body.ids.is_empty() {
                return Err(AppError::BadRequest("No deliveries selected".to_string()));
            }
            state.deliveries().set_status_many(&body.ids, status).await?
        }
    };

    tracing::info!(affected, email = %user.email, "Bulk action completed");
    Ok(Json(BulkResponse { affected }))
}

/// Scroll geometry for the window endpoint.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WindowQuery {
    pub scroll_top: u64,
    pub viewport_height: u64,
    pub row_height: Option<u32>,
    pub overscan: Option<usize>,
}

/// Visible rows and where to place them.
#[derive(Debug, Serialize)]
pub struct WindowResponse {
    #[serde(flatten)]
    pub range: VisibleRange,
    pub items: Vec<Delivery>,
}

/// Slice of the filtered list visible at the given scroll position.
#[instrument(skip(user, state))]
pub async fn window(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Query(filter): Query<FilterQuery>,
    Query(geometry): Query<WindowQuery>,
) -> Result<Json<WindowResponse>, AppError> {
    require(&user, Capability::ViewDeliveries)?;

    let deliveries = filtered(&state, &filter).await?;
    let list = VirtualList::new(
        deliveries.len(),
        geometry.row_height.unwrap_or(DEFAULT_ROW_HEIGHT),
    )
    .map_err(|e| AppError::BadRequest(e.to_string()))?
    .with_overscan(geometry.overscan.unwrap_or(DEFAULT_OVERSCAN));

    let range = list.window(geometry.scroll_top, geometry.viewport_height);
    let items = deliveries
        .get(range.start..range.end)
        .map(<[Delivery]>::to_vec)
        .unwrap_or_default();

    Ok(Json(WindowResponse { range, items }))
}

/// Table description for the caller's role.
#[instrument(skip(user))]
pub async fn table(RequireAuth(user): RequireAuth) -> Result<Json<DataTableConfig>, AppError> {
    require(&user, Capability::ViewDeliveries)?;
    Ok(Json(deliveries_table_for(&Permissions::for_role(user.role))))
}
