//! JSON backup documents.
//!
//! A backup holds every delivery plus the caller's last filters and theme.
//! Restores are validated in full before anything is written; the messages
//! name the offending field by path, e.g. `deliveries[2].status`.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use delivery_tracker_core::{DateError, Delivery, DeliveryDate, DeliveryId, DeliveryStatus};

use crate::models::{AdvancedFilters, ClientSettings, Theme};

/// Format version written into new backups.
pub const BACKUP_VERSION: &str = "1.0";

/// A full backup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupDocument {
    pub deliveries: Vec<Delivery>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<AdvancedFilters>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

/// Build a backup of `deliveries` and the caller's settings.
#[must_use]
pub fn create_backup(
    deliveries: Vec<Delivery>,
    settings: &ClientSettings,
    now: DateTime<Utc>,
) -> BackupDocument {
    BackupDocument {
        deliveries,
        filters: settings.last_filters.clone(),
        theme: Some(settings.theme),
        timestamp: now,
        version: BACKUP_VERSION.to_string(),
    }
}

/// Validate an uploaded backup.
///
/// Every problem is reported, not just the first.
///
/// # Errors
///
/// Returns the list of messages when any check fails.
pub fn validate_backup(value: &Value) -> Result<BackupDocument, Vec<String>> {
    let Some(object) = value.as_object() else {
        return Err(vec!["バックアップはJSONオブジェクトである必要があります".to_string()]);
    };

    let mut errors = Vec::new();

    let deliveries = match object.get("deliveries").and_then(Value::as_array) {
        Some(items) => validate_deliveries(items, &mut errors),
        None => {
            errors.push("deliveries: 配列が必要です".to_string());
            Vec::new()
        }
    };

    let timestamp = match object.get("timestamp").and_then(Value::as_str) {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|_| errors.push(format!("timestamp: 日時の形式が不正です: {raw}")))
            .ok(),
        None => {
            errors.push("timestamp: 必須です".to_string());
            None
        }
    };

    let version = match object.get("version").and_then(Value::as_str) {
        Some(v) if v.split('.').next() == BACKUP_VERSION.split('.').next() => Some(v.to_string()),
        Some(v) => {
            errors.push(format!("version: 未対応のバージョンです: {v}"));
            None
        }
        None => {
            errors.push("version: 必須です".to_string());
            None
        }
    };

    let filters = optional_field::<AdvancedFilters>(object.get("filters"), "filters", &mut errors);
    let theme = optional_field::<Theme>(object.get("theme"), "theme", &mut errors);

    match (timestamp, version) {
        (Some(timestamp), Some(version)) if errors.is_empty() => Ok(BackupDocument {
            deliveries,
            filters,
            theme,
            timestamp,
            version,
        }),
        _ => Err(errors),
    }
}

fn optional_field<T: serde::de::DeserializeOwned>(
    value: Option<&Value>,
    field: &str,
    errors: &mut Vec<String>,
) -> Option<T> {
    match value {
        None | Some(Value::Null) => None,
        Some(v) => serde_json::from_value(v.clone())
            .map_err(|_| errors.push(format!("{field}: 不正な形式です")))
            .ok(),
    }
}

fn validate_deliveries(items: &[Value], errors: &mut Vec<String>) -> Vec<Delivery> {
    let mut seen = HashSet::new();
    let mut deliveries = Vec::with_capacity(items.len());

    for (index, item) in items.iter().enumerate() {
        let path = format!("deliveries[{index}]");
        let before = errors.len();

        let Some(record) = item.as_object() else {
            errors.push(format!("{path}: オブジェクトである必要があります"));
            continue;
        };
        // Text fields are restored exactly; trimming is only for the checks.
        let raw = |key: &str| record.get(key).and_then(Value::as_str);
        let text = |key: &str| raw(key).map(str::trim);

        let id = match raw("id") {
            Some(id) if !id.trim().is_empty() => {
                if !seen.insert(id.to_string()) {
                    errors.push(format!("{path}.id: IDが重複しています: {id}"));
                }
                Some(DeliveryId::new(id))
            }
            _ => {
                errors.push(format!("{path}.id: 必須です"));
                None
            }
        };

        let mut required = |key: &str| match raw(key) {
            Some(v) if !v.trim().is_empty() => Some(v.to_string()),
            _ => {
                errors.push(format!("{path}.{key}: 必須です"));
                None
            }
        };
        let name = required("name");
        let address = required("address");

        let status = match text("status").map(str::parse::<DeliveryStatus>) {
            Some(Ok(status)) => Some(status),
            _ => {
                errors.push(format!("{path}.status: 不正なステータスです"));
                None
            }
        };

        let delivery_date = match text("deliveryDate").map(DeliveryDate::parse) {
            Some(Ok(date)) => Some(date),
            Some(Err(DateError::Nonexistent(raw))) => {
                errors.push(format!("{path}.deliveryDate: 存在しない日付です: {raw}"));
                None
            }
            _ => {
                errors.push(format!(
                    "{path}.deliveryDate: 日付はYYYY-MM-DD形式である必要があります"
                ));
                None
            }
        };

        if errors.len() != before {
            continue;
        }
        if let (Some(id), Some(name), Some(address), Some(status), Some(delivery_date)) =
            (id, name, address, status, delivery_date)
        {
            deliveries.push(Delivery {
                id,
                name,
                address,
                status,
                delivery_date,
            });
        }
    }

    deliveries
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use serde_json::json;

    use super::*;

    fn record(id: &str, status: &str) -> Value {
        json!({
            "id": id,
            "name": "山田",
            "address": "東京都1-1",
            "status": status,
            "deliveryDate": "2024-02-20",
        })
    }

    fn document(deliveries: Vec<Value>) -> Value {
        json!({
            "deliveries": deliveries,
            "timestamp": "2024-02-20T10:00:00Z",
            "version": "1.0",
        })
    }

    #[test]
    fn test_created_backup_validates() {
        let deliveries = vec![Delivery {
            id: DeliveryId::new("DEL1"),
            name: "a".to_string(),
            address: "b".to_string(),
            status: DeliveryStatus::InTransit,
            delivery_date: DeliveryDate::parse("2024-02-20").unwrap(),
        }];
        let backup = create_backup(deliveries, &ClientSettings::default(), Utc::now());
        assert_eq!(backup.version, BACKUP_VERSION);

        let value = serde_json::to_value(&backup).unwrap();
        let restored = validate_backup(&value).unwrap();
        assert_eq!(restored.deliveries, backup.deliveries);
        assert_eq!(restored.theme, Some(Theme::System));
    }

    #[test]
    fn test_restore_keeps_text_exactly() {
        let original = Delivery {
            id: DeliveryId::new("DEL1"),
            name: " 山田太郎 ".to_string(),
            address: "東京都港区1-1 ".to_string(),
            status: DeliveryStatus::Pending,
            delivery_date: DeliveryDate::parse("2024-02-20").unwrap(),
        };
        let backup = create_backup(vec![original.clone()], &ClientSettings::default(), Utc::now());

        let value = serde_json::to_value(&backup).unwrap();
        let restored = validate_backup(&value).unwrap();
        assert_eq!(restored.deliveries, [original]);
    }

    #[test]
    fn test_unknown_status_is_reported_by_index() {
        let value = document(vec![
            record("DEL1", "pending"),
            record("DEL2", "completed"),
            record("DEL3", "shipped"),
        ]);
        let errors = validate_backup(&value).unwrap_err();
        assert_eq!(errors, vec!["deliveries[2].status: 不正なステータスです".to_string()]);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let value = document(vec![record("DEL1", "pending"), record("DEL1", "pending")]);
        let errors = validate_backup(&value).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("deliveries[1].id"));
    }

    #[test]
    fn test_missing_top_level_fields() {
        let errors = validate_backup(&json!({})).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().any(|e| e.starts_with("deliveries")));
        assert!(errors.iter().any(|e| e.starts_with("timestamp")));
        assert!(errors.iter().any(|e| e.starts_with("version")));
    }

    #[test]
    fn test_not_an_object() {
        assert_eq!(validate_backup(&json!([1, 2])).unwrap_err().len(), 1);
    }

    #[test]
    fn test_blank_fields_and_bad_date() {
        let value = document(vec![json!({
            "id": " ",
            "name": "",
            "address": "x",
            "status": "pending",
            "deliveryDate": "2024-02-30",
        })]);
        let errors = validate_backup(&value).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors[0].starts_with("deliveries[0].id"));
        assert!(errors[1].starts_with("deliveries[0].name"));
        assert!(errors[2].contains("存在しない"));
    }

    #[test]
    fn test_optional_settings_fields() {
        let mut value = document(vec![record("DEL1", "pending")]);
        value["theme"] = json!("dark");
        value["filters"] = json!({"statuses": ["completed"]});
        let doc = validate_backup(&value).unwrap();
        assert_eq!(doc.theme, Some(Theme::Dark));
        assert!(doc.filters.unwrap().statuses.contains(&DeliveryStatus::Completed));

        value["theme"] = json!("neon");
        let errors = validate_backup(&value).unwrap_err();
        assert_eq!(errors, vec!["theme: 不正な形式です".to_string()]);
    }

    #[test]
    fn test_unsupported_version() {
        let mut value = document(vec![]);
        value["version"] = json!("2.0");
        assert!(validate_backup(&value).unwrap_err()[0].starts_with("version"));
    }
}
