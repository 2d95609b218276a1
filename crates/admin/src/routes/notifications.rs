//! Deadline alerts for the caller.

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;
use tracing::instrument;

use delivery_tracker_core::Capability;

use crate::error::AppError;
use crate::middleware::{RequireAuth, require};
use crate::services::notifications::{DeadlineAlert, deadline_alerts};
use crate::state::AppState;

/// Build the notifications router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/notifications", get(alerts))
}

#[derive(Debug, Serialize)]
pub struct AlertsResponse {
    pub alerts: Vec<DeadlineAlert>,
}

/// Overdue and upcoming deliveries, per the caller's notification settings.
#[instrument(skip(user, state))]
pub async fn alerts(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<AlertsResponse>, AppError> {
    require(&user, Capability::ViewDeliveries)?;

    let settings = state.settings().load(&user.email).await?;
    let deliveries = state.deliveries().list().await?;

    Ok(Json(AlertsResponse {
        alerts: deadline_alerts(&deliveries, &settings.notifications, state.today()),
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;

    use delivery_tracker_core::DeliveryStatus::{Completed, Pending};

    use crate::test_support::{TestApp, USER_EMAIL, delivery};

    #[tokio::test]
    async fn test_alerts_for_today() {
        let app = TestApp::new().await;
        let today = app.state.today().format("%Y-%m-%d").to_string();
        app.seed(&[
            delivery("DEL1", "山田太郎", Pending, &today),
            delivery("DEL2", "佐藤花子", Completed, &today),
            delivery("DEL3", "鈴木一郎", Pending, "2000-01-01"),
        ])
        .await;
        let cookie = app.login(USER_EMAIL).await;

        let (status, body) = app.json("GET", "/api/notifications", Some(&cookie), None).await;
        assert_eq!(status, StatusCode::OK);
        let alerts = body["alerts"].as_array().unwrap();
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0]["kind"], "due_today");
        assert_eq!(alerts[1]["kind"], "overdue");
    }
}
