//! Filter engine.
//!
//! Pure functions over an in-memory list. `today` is always passed in by the
//! caller so results depend only on the arguments.

use chrono::{Datelike, Days, NaiveDate};

use delivery_tracker_core::{Delivery, DeliveryDate, DeliveryStatus};

use crate::models::{AdvancedFilters, QuickFilter};

/// Keep the records matching every populated criterion in `filters`.
#[must_use]
pub fn apply_advanced_filters(deliveries: &[Delivery], filters: &AdvancedFilters) -> Vec<Delivery> {
    let address_keyword = normalized_keyword(&filters.address_keyword);
    let name_keyword = normalized_keyword(&filters.name_keyword);

    deliveries
        .iter()
        .filter(|d| filters.statuses.is_empty() || filters.statuses.contains(&d.status))
        .filter(|d| filters.date_range.contains(&d.delivery_date))
        .filter(|d| {
            address_keyword
                .as_deref()
                .is_none_or(|k| d.address.to_lowercase().contains(k))
        })
        .filter(|d| {
            name_keyword
                .as_deref()
                .is_none_or(|k| d.name.to_lowercase().contains(k))
        })
        .cloned()
        .collect()
}

/// Keep the records matching a named preset relative to `today`.
#[must_use]
pub fn apply_quick_filter(
    deliveries: &[Delivery],
    filter: QuickFilter,
    today: NaiveDate,
) -> Vec<Delivery> {
    let today_date = DeliveryDate::from_naive(today);

    deliveries
        .iter()
        .filter(|d| match filter {
            QuickFilter::Today => d.delivery_date == today_date,
            QuickFilter::Tomorrow => {
                today.checked_add_days(Days::new(1)).map(DeliveryDate::from_naive).as_ref()
                    == Some(&d.delivery_date)
            }
            QuickFilter::ThisWeek => {
                let (start, end) = week_bounds(today);
                d.delivery_date >= start && d.delivery_date <= end
            }
            QuickFilter::Overdue => {
                d.status == DeliveryStatus::Pending && d.delivery_date < today_date
            }
            QuickFilter::InTransitOnly => d.status == DeliveryStatus::InTransit,
            QuickFilter::CompletedToday => {
                d.status == DeliveryStatus::Completed && d.delivery_date == today_date
            }
        })
        .cloned()
        .collect()
}

/// Apply an optional quick filter, then the advanced filters.
#[must_use]
pub fn apply_all(
    deliveries: &[Delivery],
    quick: Option<QuickFilter>,
    filters: &AdvancedFilters,
    today: NaiveDate,
) -> Vec<Delivery> {
    match quick {
        Some(quick) => apply_advanced_filters(&apply_quick_filter(deliveries, quick, today), filters),
        None => apply_advanced_filters(deliveries, filters),
    }
}

/// Sunday and Saturday of the week containing `today`.
fn week_bounds(today: NaiveDate) -> (DeliveryDate, DeliveryDate) {
    let since_sunday = u64::from(today.weekday().num_days_from_sunday());
    let start = today.checked_sub_days(Days::new(since_sunday)).unwrap_or(today);
    let end = start.checked_add_days(Days::new(6)).unwrap_or(today);
    (DeliveryDate::from_naive(start), DeliveryDate::from_naive(end))
}

fn normalized_keyword(keyword: &str) -> Option<String> {
    let trimmed = keyword.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_lowercase())
}
