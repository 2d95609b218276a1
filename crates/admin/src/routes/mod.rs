//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                         - Liveness
//! GET    /health/ready                   - Readiness (data file readable)
//!
//! # Auth
//! POST   /api/auth/login                 - Email + password login
//! POST   /api/auth/logout                - Logout
//! GET    /api/auth/me                    - Current user, role and permissions
//!
//! # Deliveries
//! GET    /api/deliveries                 - Filtered list
//! POST   /api/deliveries                 - Create
//! PUT    /api/deliveries/{id}            - Update (status-only or full edit)
//! DELETE /api/deliveries/{id}            - Delete
//! POST   /api/deliveries/bulk            - Bulk delete / status change
//! GET    /api/deliveries/window          - Visible slice for a virtualized table
//! GET    /api/deliveries/table           - Table description for the caller
//!
//! # Import / Export
//! GET    /api/deliveries/export          - CSV, Excel or JSON download
//! POST   /api/deliveries/import          - CSV import
//! POST   /api/deliveries/import/preview  - Parse a CSV without writing
//!
//! # Reports
//! GET    /api/analytics                  - Chart aggregates
//! GET    /api/notifications              - Deadline alerts
//!
//! # Backup
//! GET    /api/backup                     - Download a backup document
//! POST   /api/backup/restore             - Replace the store from a backup
//!
//! # Settings
//! GET    /api/settings                   - Caller's client settings
//! PUT    /api/settings                   - Replace them
//! POST   /api/settings/presets           - Save a filter preset
//! DELETE /api/settings/presets/{name}    - Remove a filter preset
//! ```

pub mod analytics;
pub mod auth;
pub mod backup;
pub mod deliveries;
pub mod notifications;
pub mod settings;
pub mod transfer;

use axum::{Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
use serde::Deserialize;

use delivery_tracker_core::{DeliveryDate, DeliveryStatus};

use crate::error::AppError;
use crate::models::{AdvancedFilters, DateRange, QuickFilter};
use crate::state::AppState;

/// Build the complete router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(auth::router())
        .merge(deliveries::router())
        .merge(transfer::router())
        .merge(analytics::router())
        .merge(notifications::router())
        .merge(backup::router())
        .merge(settings::router())
}

/// Liveness probe.
async fn health() -> &'static str {
    "ok"
}

/// Readiness probe: the deliveries file must be readable.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    match state.deliveries().readiness().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "storage unavailable")
        }
    }
}

/// Filter parameters shared by the list, window and export endpoints.
///
/// `status` is a comma list; `from`/`to` are inclusive `YYYY-MM-DD` bounds.
#[derive(Debug, Default, Deserialize)]
pub struct FilterQuery {
    pub quick: Option<String>,
    pub status: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub address: Option<String>,
    pub name: Option<String>,
}

impl FilterQuery {
    /// The quick filter, if one was named and recognized.
    ///
    /// Unknown names are ignored with a warning.
    #[must_use]
    pub fn quick_filter(&self) -> Option<QuickFilter> {
        let name = self.quick.as_deref().map(str::trim).filter(|q| !q.is_empty())?;
        let parsed = QuickFilter::parse(name);
        if parsed.is_none() {
            tracing::warn!(quick = name, "Ignoring unknown quick filter");
        }
        parsed
    }

    /// The advanced filters described by the query.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` for an unknown status or a malformed date.
    pub fn advanced(&self) -> Result<AdvancedFilters, AppError> {
        let statuses = self
            .status
            .as_deref()
            .map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(|s| {
                        s.parse::<DeliveryStatus>()
                            .map_err(|e| AppError::BadRequest(e.to_string()))
                    })
                    .collect::<Result<_, _>>()
            })
            .transpose()?
            .unwrap_or_default();

        let date_range = DateRange {
            start: parse_date("from", self.from.as_deref())?,
            end: parse_date("to", self.to.as_deref())?,
        };

        Ok(AdvancedFilters {
            statuses,
            date_range,
            address_keyword: self.address.clone().unwrap_or_default(),
            name_keyword: self.name.clone().unwrap_or_default(),
        })
    }
}

fn parse_date(field: &str, value: Option<&str>) -> Result<Option<DeliveryDate>, AppError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| {
            DeliveryDate::parse(v).map_err(|e| AppError::BadRequest(format!("{field}: {e}")))
        })
        .transpose()
}
