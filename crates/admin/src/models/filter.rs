//! Filter criteria shared by the list, window, export and settings endpoints.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use delivery_tracker_core::{DeliveryDate, DeliveryStatus};

/// Inclusive date bounds; either side may be open.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DateRange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<DeliveryDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<DeliveryDate>,
}

impl DateRange {
    /// Whether neither bound is set.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Whether `date` falls inside the bounds.
    #[must_use]
    pub fn contains(&self, date: &DeliveryDate) -> bool {
        self.start.as_ref().is_none_or(|start| date >= start)
            && self.end.as_ref().is_none_or(|end| date <= end)
    }
}

/// User-composed filter. Every populated criterion must match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdvancedFilters {
    /// Allowed statuses; empty means any.
    pub statuses: BTreeSet<DeliveryStatus>,
    pub date_range: DateRange,
    /// Case-insensitive substring of the address.
    pub address_keyword: String,
    /// Case-insensitive substring of the name.
    pub name_keyword: String,
}

impl AdvancedFilters {
    /// Whether no criterion is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active_count() == 0
    }

    /// Number of populated criteria, for the filter badge.
    #[must_use]
    pub fn active_count(&self) -> usize {
        [
            !self.statuses.is_empty(),
            !self.date_range.is_open(),
            !self.address_keyword.trim().is_empty(),
            !self.name_keyword.trim().is_empty(),
        ]
        .into_iter()
        .filter(|active| *active)
        .count()
    }
}

/// Named, parameterless filter presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuickFilter {
    Today,
    Tomorrow,
    ThisWeek,
    Overdue,
    InTransitOnly,
    CompletedToday,
}

impl QuickFilter {
    pub const ALL: [Self; 6] = [
        Self::Today,
        Self::Tomorrow,
        Self::ThisWeek,
        Self::Overdue,
        Self::InTransitOnly,
        Self::CompletedToday,
    ];

    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Tomorrow => "tomorrow",
            Self::ThisWeek => "this_week",
            Self::Overdue => "overdue",
            Self::InTransitOnly => "in_transit_only",
            Self::CompletedToday => "completed_today",
        }
    }

    /// Look up a preset by wire name. Unknown names yield `None`.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == name.trim())
    }
}

impl std::fmt::Display for QuickFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filters() {
        let filters = AdvancedFilters::default();
        assert!(filters.is_empty());
        assert_eq!(filters.active_count(), 0);
    }

    #[test]
    fn test_blank_keywords_are_inactive() {
        let filters = AdvancedFilters {
            address_keyword: "   ".to_string(),
            ..AdvancedFilters::default()
        };
        assert!(filters.is_empty());
    }

    #[test]
    fn test_active_count() {
        let filters = AdvancedFilters {
            statuses: BTreeSet::from([DeliveryStatus::Pending, DeliveryStatus::InTransit]),
            date_range: DateRange {
                start: Some(DeliveryDate::parse("2024-01-01").unwrap()),
                end: None,
            },
            name_keyword: "山田".to_string(),
            ..AdvancedFilters::default()
        };
        assert_eq!(filters.active_count(), 3);
    }

    #[test]
    fn test_date_range_inclusive() {
        let range = DateRange {
            start: Some(DeliveryDate::parse("2024-02-01").unwrap()),
            end: Some(DeliveryDate::parse("2024-02-29").unwrap()),
        };
        assert!(range.contains(&DeliveryDate::parse("2024-02-01").unwrap()));
        assert!(range.contains(&DeliveryDate::parse("2024-02-29").unwrap()));
        assert!(!range.contains(&DeliveryDate::parse("2024-03-01").unwrap()));
    }

    #[test]
    fn test_quick_filter_parse() {
        assert_eq!(QuickFilter::parse("this_week"), Some(QuickFilter::ThisWeek));
        assert_eq!(QuickFilter::parse("yesterday"), None);
    }

    #[test]
    fn test_filters_json_shape() {
        let json = r#"{"statuses":["in_transit"],"dateRange":{"end":"2024-02-20"},"nameKeyword":"x"}"#;
        let filters: AdvancedFilters = serde_json::from_str(json).unwrap();
        assert!(filters.statuses.contains(&DeliveryStatus::InTransit));
        assert!(filters.date_range.start.is_none());
        assert_eq!(filters.name_keyword, "x");
        assert!(filters.address_keyword.is_empty());
    }
}
