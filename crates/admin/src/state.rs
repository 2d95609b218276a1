//! Application state shared across handlers.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, Utc};

use crate::config::AdminConfig;
use crate::db::{DeliveryRepository, JsonFileSettingsRepository, SettingsRepository, UserRepository};

/// Application state shared across all handlers.
///
/// Cheap to clone; everything lives behind one `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    deliveries: DeliveryRepository,
    users: UserRepository,
    settings: Arc<dyn SettingsRepository>,
}

impl AppState {
    /// Build state with file-backed stores under `config.data_dir`.
    #[must_use]
    pub fn new(config: AdminConfig) -> Self {
        let settings = Arc::new(JsonFileSettingsRepository::new(config.settings_dir()));
        Self::with_settings(config, settings)
    }

    /// Build state with a caller-supplied settings store.
    #[must_use]
    pub fn with_settings(config: AdminConfig, settings: Arc<dyn SettingsRepository>) -> Self {
        let deliveries = DeliveryRepository::new(config.deliveries_file());
        let users = UserRepository::new(config.users_file.clone());
        Self {
            inner: Arc::new(AppStateInner {
                config,
                deliveries,
                users,
                settings,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn deliveries(&self) -> &DeliveryRepository {
        &self.inner.deliveries
    }

    #[must_use]
    pub fn users(&self) -> &UserRepository {
        &self.inner.users
    }

    #[must_use]
    pub fn settings(&self) -> &dyn SettingsRepository {
        self.inner.settings.as_ref()
    }

    /// Wall-clock time at the configured offset.
    #[must_use]
    pub fn local_now(&self) -> NaiveDateTime {
        Utc::now()
            .with_timezone(&self.inner.config.utc_offset)
            .naive_local()
    }

    /// Calendar date at the configured offset.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.local_now().date()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("data_dir", &self.inner.config.data_dir)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_follow_config() {
        let state = AppState::new(AdminConfig::local("/srv/tracker"));
        assert_eq!(
            state.deliveries().path(),
            std::path::Path::new("/srv/tracker/deliveries.json")
        );
        assert_eq!(
            state.users().path(),
            std::path::Path::new("/srv/tracker/users.json")
        );
    }

    #[test]
    fn test_today_uses_offset() {
        let state = AppState::new(AdminConfig::local("/tmp"));
        let utc_today = Utc::now().date_naive();
        let diff = (state.today() - utc_today).num_days();
        assert!((-1..=1).contains(&diff));
    }
}
