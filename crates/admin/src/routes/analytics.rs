//! Analytics endpoint.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use serde::Deserialize;
use tracing::instrument;

use delivery_tracker_core::{Capability, DeliveryDate};

use crate::error::AppError;
use crate::middleware::{RequireAuth, require};
use crate::services::analytics::{AnalyticsPeriod, AnalyticsReport, aggregate};
use crate::state::AppState;

/// Build the analytics router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/analytics", get(report))
}

/// Period selection. Without `period` the caller's last period is reused.
#[derive(Debug, Default, Deserialize)]
pub struct AnalyticsQuery {
    pub period: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

impl AnalyticsQuery {
    fn period(&self) -> Result<Option<AnalyticsPeriod>, AppError> {
        let Some(name) = self.period.as_deref() else {
            return Ok(None);
        };
        let start = parse_bound(self.start.as_deref())?;
        let end = parse_bound(self.end.as_deref())?;
        AnalyticsPeriod::from_query(name, start, end)
            .map(Some)
            .map_err(|e| AppError::BadRequest(e.to_string()))
    }
}

fn parse_bound(value: Option<&str>) -> Result<Option<DeliveryDate>, AppError> {
    value
        .map(|v| DeliveryDate::parse(v).map_err(|e| AppError::BadRequest(e.to_string())))
        .transpose()
}

/// Chart aggregates for a period.
///
/// An explicitly requested period is remembered in the caller's settings.
#[instrument(skip(user, state))]
pub async fn report(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<AnalyticsReport>, AppError> {
    require(&user, Capability::ViewAnalytics)?;

    let requested = query.period()?;
    let mut settings = state.settings().load(&user.email).await?;

    let period = match requested {
        Some(period) => {
            if settings.analytics_period.as_ref() != Some(&period) {
                settings.analytics_period = Some(period.clone());
                state.settings().save(&user.email, &settings).await?;
            }
            period
        }
        None => settings.analytics_period.clone().unwrap_or_default(),
    };

    let deliveries = state.deliveries().list().await?;
    Ok(Json(aggregate(&deliveries, &period, state.today())))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;

    use delivery_tracker_core::Email;

    use crate::services::analytics::AnalyticsPeriod;
    use crate::test_support::{TestApp, USER_EMAIL};

    #[tokio::test]
    async fn test_default_week() {
        let app = TestApp::new().await;
        let cookie = app.login(USER_EMAIL).await;
        let (status, body) = app.json("GET", "/api/analytics", Some(&cookie), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["daily"].as_array().unwrap().len(), 7);
        assert_eq!(body["summary"]["total"], 0);
    }

    #[tokio::test]
    async fn test_requested_period_is_remembered() {
        let app = TestApp::new().await;
        let cookie = app.login(USER_EMAIL).await;
        let (status, body) = app
            .json(
                "GET",
                "/api/analytics?period=custom&start=2024-01-01&end=2024-01-10",
                Some(&cookie),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["daily"].as_array().unwrap().len(), 10);

        let email = Email::parse(USER_EMAIL).unwrap();
        let settings = app.state.settings().load(&email).await.unwrap();
        assert!(matches!(
            settings.analytics_period,
            Some(AnalyticsPeriod::Custom { .. })
        ));

        let (_, body) = app.json("GET", "/api/analytics", Some(&cookie), None).await;
        assert_eq!(body["start"], "2024-01-01");
    }

    #[tokio::test]
    async fn test_bad_period() {
        let app = TestApp::new().await;
        let cookie = app.login(USER_EMAIL).await;
        for query in ["period=decade", "period=custom&start=2024-01-01"] {
            let (status, _) = app
                .json("GET", &format!("/api/analytics?{query}"), Some(&cookie), None)
                .await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
        }
    }
}
