//! Deadline alerts and status-change events.

use chrono::{Days, NaiveDate};
use serde::Serialize;

use delivery_tracker_core::{Delivery, DeliveryDate, DeliveryId, DeliveryStatus};

use crate::models::NotificationSettings;

/// Why a delivery needs attention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Overdue,
    DueToday,
    DueTomorrow,
}

/// One deadline alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeadlineAlert {
    pub kind: AlertKind,
    pub delivery: Delivery,
}

/// A status transition worth telling the user about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChangeEvent {
    pub id: DeliveryId,
    pub name: String,
    pub from: DeliveryStatus,
    pub to: DeliveryStatus,
    /// Display text, e.g. `山田太郎: 配送待ち → 配送中`.
    pub message: String,
}

/// Deliveries that are overdue or due today/tomorrow.
///
/// Overdue only covers pending records; due-today and due-tomorrow cover
/// anything not yet completed. Empty when alerts are switched off.
#[must_use]
pub fn deadline_alerts(
    deliveries: &[Delivery],
    settings: &NotificationSettings,
    today: NaiveDate,
) -> Vec<DeadlineAlert> {
    if !settings.enabled || !settings.deadline_alert {
        return Vec::new();
    }

    let today_date = DeliveryDate::from_naive(today);
    let tomorrow = today
        .checked_add_days(Days::new(1))
        .map(DeliveryDate::from_naive);

    deliveries
        .iter()
        .filter_map(|d| {
            let kind = match d.status {
                DeliveryStatus::Completed => return None,
                DeliveryStatus::Pending if d.delivery_date < today_date => AlertKind::Overdue,
                _ if d.delivery_date == today_date => AlertKind::DueToday,
                _ if tomorrow.as_ref() == Some(&d.delivery_date) => AlertKind::DueTomorrow,
                _ => return None,
            };
            Some(DeadlineAlert {
                kind,
                delivery: d.clone(),
            })
        })
        .collect()
}

/// Event for a status change, if the status moved and the user wants it.
#[must_use]
pub fn status_change_event(
    before: &Delivery,
    after: &Delivery,
    settings: &NotificationSettings,
) -> Option<StatusChangeEvent> {
    if before.status == after.status || !settings.enabled || !settings.status_change_alert {
        return None;
    }

    Some(StatusChangeEvent {
        id: after.id.clone(),
        name: after.name.clone(),
        from: before.status,
        to: after.status,
        message: format!(
            "{}: {} → {}",
            after.name,
            before.status.label(),
            after.status.label()
        ),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn delivery(id: &str, status: DeliveryStatus, date: &str) -> Delivery {
        Delivery {
            id: DeliveryId::new(id),
            name: "山田太郎".to_string(),
            address: "東京都".to_string(),
            status,
            delivery_date: DeliveryDate::parse(date).unwrap(),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 20).unwrap()
    }

    #[test]
    fn test_deadline_alert_kinds() {
        let list = vec![
            delivery("A", DeliveryStatus::Pending, "2024-02-19"),
            delivery("B", DeliveryStatus::InTransit, "2024-02-19"),
            delivery("C", DeliveryStatus::InTransit, "2024-02-20"),
            delivery("D", DeliveryStatus::Pending, "2024-02-21"),
            delivery("E", DeliveryStatus::Completed, "2024-02-20"),
            delivery("F", DeliveryStatus::Pending, "2024-02-22"),
        ];
        let alerts = deadline_alerts(&list, &NotificationSettings::default(), today());
        let summary: Vec<_> = alerts.iter().map(|a| (a.delivery.id.as_str(), a.kind)).collect();
        assert_eq!(
            summary,
            vec![
                ("A", AlertKind::Overdue),
                ("C", AlertKind::DueToday),
                ("D", AlertKind::DueTomorrow),
            ]
        );
    }

    #[test]
    fn test_deadline_alerts_respect_settings() {
        let list = vec![delivery("A", DeliveryStatus::Pending, "2024-02-20")];
        let off = NotificationSettings {
            deadline_alert: false,
            ..NotificationSettings::default()
        };
        assert!(deadline_alerts(&list, &off, today()).is_empty());
    }

    #[test]
    fn test_status_change_event() {
        let before = delivery("A", DeliveryStatus::Pending, "2024-02-20");
        let mut after = before.clone();
        after.status = DeliveryStatus::InTransit;

        let event = status_change_event(&before, &after, &NotificationSettings::default()).unwrap();
        assert_eq!(event.message, "山田太郎: 配送待ち → 配送中");

        assert!(status_change_event(&before, &before, &NotificationSettings::default()).is_none());

        let muted = NotificationSettings {
            enabled: false,
            ..NotificationSettings::default()
        };
        assert!(status_change_event(&before, &after, &muted).is_none());
    }
}
