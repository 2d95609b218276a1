//! Analytics aggregates for the dashboard charts.
//!
//! Everything is computed from the records dated inside the selected period.

use chrono::{Datelike, Days, NaiveDate, Timelike};
use serde::{Deserialize, Serialize};

use delivery_tracker_core::{Delivery, DeliveryDate, DeliveryStatus};

/// Longest custom range accepted, in days.
pub const MAX_CUSTOM_DAYS: u64 = 366;

/// Region label for addresses that name no prefecture.
pub const OTHER_REGION: &str = "その他";

/// Prefectures in the standard north-to-south order.
const PREFECTURES: [&str; 47] = [
    "北海道", "青森県", "岩手県", "宮城県", "秋田県", "山形県", "福島県",
    "茨城県", "栃木県", "群馬県", "埼玉県", "千葉県", "東京都", "神奈川県",
    "新潟県", "富山県", "石川県", "福井県", "山梨県", "長野県", "岐阜県",
    "静岡県", "愛知県", "三重県", "滋賀県", "京都府", "大阪府", "兵庫県",
    "奈良県", "和歌山県", "鳥取県", "島根県", "岡山県", "広島県", "山口県",
    "徳島県", "香川県", "愛媛県", "高知県", "福岡県", "佐賀県", "長崎県",
    "熊本県", "大分県", "宮崎県", "鹿児島県", "沖縄県",
];

/// Coarse delivery time slots, in display order.
const TIME_SLOTS: [&str; 6] = ["午前中", "12-14時", "14-16時", "16-18時", "18-21時", "その他"];

/// Errors from building a period out of request parameters.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PeriodError {
    #[error("unknown period: {0}")]
    Unknown(String),
    #[error("custom period needs both start and end")]
    MissingBounds,
    #[error("start must not be after end")]
    Reversed,
    #[error("custom period must not exceed {MAX_CUSTOM_DAYS} days")]
    TooLong,
}

/// Reporting window.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AnalyticsPeriod {
    /// The last seven days including today.
    #[default]
    Week,
    /// From the first of the current month to today.
    Month,
    /// The last thirty days including today.
    Last30Days,
    /// Explicit inclusive range.
    Custom { start: DeliveryDate, end: DeliveryDate },
}

impl AnalyticsPeriod {
    /// Build a period from query parameters.
    ///
    /// # Errors
    ///
    /// Returns `PeriodError` for an unknown name or an unusable custom range.
    pub fn from_query(
        name: &str,
        start: Option<DeliveryDate>,
        end: Option<DeliveryDate>,
    ) -> Result<Self, PeriodError> {
        match name {
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "last30days" => Ok(Self::Last30Days),
            "custom" => {
                let (Some(start), Some(end)) = (start, end) else {
                    return Err(PeriodError::MissingBounds);
                };
                if start > end {
                    return Err(PeriodError::Reversed);
                }
                let span = (end.to_naive() - start.to_naive()).num_days();
                if span >= i64::try_from(MAX_CUSTOM_DAYS).unwrap_or(i64::MAX) {
                    return Err(PeriodError::TooLong);
                }
                Ok(Self::Custom { start, end })
            }
            other => Err(PeriodError::Unknown(other.to_string())),
        }
    }

    /// Inclusive first and last day of the period.
    #[must_use]
    pub fn bounds(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let back = |days: u64| today.checked_sub_days(Days::new(days)).unwrap_or(today);
        match self {
            Self::Week => (back(6), today),
            Self::Month => (today.with_day(1).unwrap_or(today), today),
            Self::Last30Days => (back(29), today),
            Self::Custom { start, end } => (start.to_naive(), end.to_naive()),
        }
    }
}

/// Per-day counts by status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyCount {
    pub date: DeliveryDate,
    pub pending: usize,
    pub in_transit: usize,
    pub completed: usize,
    pub total: usize,
}

/// Deliveries per prefecture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionCount {
    pub region: &'static str,
    pub count: usize,
}

/// Deliveries per time slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeSlotCount {
    pub slot: &'static str,
    pub count: usize,
}

/// Headline numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total: usize,
    /// Completed share, rounded to a whole percent.
    pub completion_rate: usize,
    /// Mean of `today - deliveryDate` over completed records, rounded.
    pub average_days_since_delivery: i64,
    pub in_transit: usize,
}

/// Everything the analytics page draws.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub start: DeliveryDate,
    pub end: DeliveryDate,
    pub daily: Vec<DailyCount>,
    pub regions: Vec<RegionCount>,
    pub time_slots: Vec<TimeSlotCount>,
    pub summary: Summary,
}

/// Aggregate `deliveries` over `period`.
#[must_use]
pub fn aggregate(
    deliveries: &[Delivery],
    period: &AnalyticsPeriod,
    today: NaiveDate,
) -> AnalyticsReport {
    let (start, end) = period.bounds(today);
    let in_period: Vec<&Delivery> = deliveries
        .iter()
        .filter(|d| {
            let date = d.delivery_date.to_naive();
            date >= start && date <= end
        })
        .collect();

    AnalyticsReport {
        start: DeliveryDate::from_naive(start),
        end: DeliveryDate::from_naive(end),
        daily: daily_counts(&in_period, start, end),
        regions: region_counts(&in_period),
        time_slots: time_slot_counts(&in_period),
        summary: summarize(&in_period, today),
    }
}

fn daily_counts(deliveries: &[&Delivery], start: NaiveDate, end: NaiveDate) -> Vec<DailyCount> {
    start
        .iter_days()
        .take_while(|day| *day <= end)
        .map(|day| {
            let date = DeliveryDate::from_naive(day);
            let mut bucket = DailyCount {
                date: date.clone(),
                pending: 0,
                in_transit: 0,
                completed: 0,
                total: 0,
            };
            for delivery in deliveries.iter().filter(|d| d.delivery_date == date) {
                match delivery.status {
                    DeliveryStatus::Pending => bucket.pending += 1,
                    DeliveryStatus::InTransit => bucket.in_transit += 1,
                    DeliveryStatus::Completed => bucket.completed += 1,
                }
                bucket.total += 1;
            }
            bucket
        })
        .collect()
}

/// First prefecture (in list order) named in `address`.
#[must_use]
pub fn region_of(address: &str) -> &'static str {
    PREFECTURES
        .into_iter()
        .find(|p| address.contains(p))
        .unwrap_or(OTHER_REGION)
}

fn region_counts(deliveries: &[&Delivery]) -> Vec<RegionCount> {
    let mut counts: Vec<RegionCount> = PREFECTURES
        .into_iter()
        .chain([OTHER_REGION])
        .map(|region| RegionCount { region, count: 0 })
        .collect();

    for delivery in deliveries {
        let region = region_of(&delivery.address);
        if let Some(entry) = counts.iter_mut().find(|c| c.region == region) {
            entry.count += 1;
        }
    }

    counts.retain(|c| c.count > 0);
    // Stable sort keeps list order among equal counts.
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

/// Slot label for an hour of the day.
#[must_use]
pub const fn time_slot(hour: u32) -> &'static str {
    match hour {
        0..=11 => TIME_SLOTS[0],
        12..=13 => TIME_SLOTS[1],
        14..=15 => TIME_SLOTS[2],
        16..=17 => TIME_SLOTS[3],
        18..=20 => TIME_SLOTS[4],
        _ => TIME_SLOTS[5],
    }
}

/// Slot for a delivery, reading the hour of its date taken as a midnight timestamp.
///
/// Delivery dates carry no time of day, so this is always the morning slot.
fn slot_of(delivery: &Delivery) -> &'static str {
    let hour = delivery
        .delivery_date
        .to_naive()
        .and_hms_opt(0, 0, 0)
        .map_or(0, |t| t.hour());
    time_slot(hour)
}

fn time_slot_counts(deliveries: &[&Delivery]) -> Vec<TimeSlotCount> {
    TIME_SLOTS
        .into_iter()
        .map(|slot| TimeSlotCount {
            slot,
            count: deliveries.iter().filter(|d| slot_of(d) == slot).count(),
        })
        .collect()
}

fn summarize(deliveries: &[&Delivery], today: NaiveDate) -> Summary {
    let total = deliveries.len();
    let completed: Vec<&&Delivery> = deliveries
        .iter()
        .filter(|d| d.status == DeliveryStatus::Completed)
        .collect();
    let in_transit = deliveries
        .iter()
        .filter(|d| d.status == DeliveryStatus::InTransit)
        .count();

    let completion_rate = if total == 0 {
        0
    } else {
        (completed.len() * 100 + total / 2) / total
    };

    let days_total: i64 = completed
        .iter()
        .map(|d| (today - d.delivery_date.to_naive()).num_days())
        .sum();
    let average_days_since_delivery =
        i64::try_from(completed.len()).map_or(0, |n| rounded_mean(days_total, n));

    Summary {
        total,
        completion_rate,
        average_days_since_delivery,
        in_transit,
    }
}

/// `sum / n` rounded half up; zero when `n` is zero.
const fn rounded_mean(sum: i64, n: i64) -> i64 {
    if n == 0 {
        return 0;
    }
    let quotient = sum.div_euclid(n);
    if 2 * sum.rem_euclid(n) >= n {
        quotient + 1
    } else {
        quotient
    }
}
