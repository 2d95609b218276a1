//! Per-user client settings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::filter::AdvancedFilters;
use crate::services::analytics::AnalyticsPeriod;

/// Color theme preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

/// Which alerts the user wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationSettings {
    pub enabled: bool,
    pub deadline_alert: bool,
    pub status_change_alert: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            deadline_alert: true,
            status_change_alert: true,
        }
    }
}

/// A named, saved set of advanced filters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterPreset {
    pub name: String,
    pub filters: AdvancedFilters,
    pub created_at: DateTime<Utc>,
}

/// Everything the browser used to keep in local storage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientSettings {
    pub theme: Theme,
    pub notifications: NotificationSettings,
    pub filter_presets: Vec<FilterPreset>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_filters: Option<AdvancedFilters>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analytics_period: Option<AnalyticsPeriod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pwa_install_dismissed_at: Option<DateTime<Utc>>,
}

impl ClientSettings {
    /// Insert a preset, replacing any preset with the same name.
    pub fn upsert_preset(&mut self, preset: FilterPreset) {
        match self.filter_presets.iter_mut().find(|p| p.name == preset.name) {
            Some(existing) => *existing = preset,
            None => self.filter_presets.push(preset),
        }
    }

    /// Remove a preset by name; returns whether one was removed.
    pub fn remove_preset(&mut self, name: &str) -> bool {
        let before = self.filter_presets.len();
        self.filter_presets.retain(|p| p.name != name);
        self.filter_presets.len() != before
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn preset(name: &str, keyword: &str) -> FilterPreset {
        FilterPreset {
            name: name.to_string(),
            filters: AdvancedFilters {
                name_keyword: keyword.to_string(),
                ..AdvancedFilters::default()
            },
            created_at: DateTime::<Utc>::default(),
        }
    }

    #[test]
    fn test_defaults_from_empty_object() {
        let settings: ClientSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, ClientSettings::default());
        assert_eq!(settings.theme, Theme::System);
        assert!(settings.notifications.enabled);
        assert!(settings.notifications.status_change_alert);
    }

    #[test]
    fn test_upsert_preset_replaces_by_name() {
        let mut settings = ClientSettings::default();
        settings.upsert_preset(preset("mine", "a"));
        settings.upsert_preset(preset("mine", "b"));
        settings.upsert_preset(preset("other", "c"));

        assert_eq!(settings.filter_presets.len(), 2);
        assert_eq!(settings.filter_presets[0].filters.name_keyword, "b");
    }

    #[test]
    fn test_remove_preset() {
        let mut settings = ClientSettings::default();
        settings.upsert_preset(preset("mine", "a"));
        assert!(settings.remove_preset("mine"));
        assert!(!settings.remove_preset("mine"));
    }

    #[test]
    fn test_json_shape() {
        let settings = ClientSettings {
            theme: Theme::Dark,
            ..ClientSettings::default()
        };
        let json = serde_json::to_value(&settings).unwrap();
        assert_eq!(json["theme"], "dark");
        assert_eq!(json["notifications"]["deadlineAlert"], true);
        assert!(json.get("lastFilters").is_none());
    }
}
