//! Calendar date of a delivery.

use core::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`DeliveryDate`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DateError {
    /// The value is not shaped like `YYYY-MM-DD`.
    #[error("date must be in YYYY-MM-DD format: {0}")]
    Format(String),
    /// The value is shaped correctly but names no calendar day (e.g. `2024-02-30`).
    #[error("date does not exist: {0}")]
    Nonexistent(String),
}

/// A delivery date in ISO `YYYY-MM-DD` form.
///
/// The string form is kept because every comparison the filter engine makes
/// is a plain string comparison. Validation at construction guarantees those
/// comparisons agree with calendar order.
///
/// ## Examples
///
/// ```
/// use delivery_tracker_core::DeliveryDate;
///
/// assert!(DeliveryDate::parse("2024-02-20").is_ok());
/// assert!(DeliveryDate::parse("2024/02/20").is_err());
/// assert!(DeliveryDate::parse("2024-02-30").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeliveryDate(String);

impl DeliveryDate {
    /// Length of a `YYYY-MM-DD` string.
    pub const LENGTH: usize = 10;

    /// Parse a `DeliveryDate` from a string.
    ///
    /// # Errors
    ///
    /// Returns `DateError::Format` unless the input is exactly four digits,
    /// a dash, two digits, a dash and two digits. Returns
    /// `DateError::Nonexistent` if that names no real day.
    pub fn parse(s: &str) -> Result<Self, DateError> {
        if !is_iso_shape(s) {
            return Err(DateError::Format(s.to_string()));
        }

        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|_| DateError::Nonexistent(s.to_string()))?;

        Ok(Self(s.to_owned()))
    }

    /// Build from a calendar date.
    #[must_use]
    pub fn from_naive(date: NaiveDate) -> Self {
        Self(date.format("%Y-%m-%d").to_string())
    }

    /// Returns the date as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the calendar date.
    #[must_use]
    pub fn to_naive(&self) -> NaiveDate {
        // Validated at construction.
        NaiveDate::parse_from_str(&self.0, "%Y-%m-%d").unwrap_or_default()
    }
}

fn is_iso_shape(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == DeliveryDate::LENGTH
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

impl fmt::Display for DeliveryDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for DeliveryDate {
    type Err = DateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for DeliveryDate {
    type Error = DateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DeliveryDate> for String {
    fn from(date: DeliveryDate) -> Self {
        date.0
    }
}

impl From<NaiveDate> for DeliveryDate {
    fn from(date: NaiveDate) -> Self {
        Self::from_naive(date)
    }
}

impl AsRef<str> for DeliveryDate {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let date = DeliveryDate::parse("2024-02-29").unwrap();
        assert_eq!(date.as_str(), "2024-02-29");
        assert_eq!(date.to_naive(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }

    #[test]
    fn test_parse_rejects_unpadded() {
        assert!(matches!(
            DeliveryDate::parse("2024-2-5"),
            Err(DateError::Format(_))
        ));
    }

    #[test]
    fn test_parse_rejects_time_suffix() {
        assert!(matches!(
            DeliveryDate::parse("2024-02-20T10:00"),
            Err(DateError::Format(_))
        ));
    }

    #[test]
    fn test_parse_rejects_nonexistent() {
        assert!(matches!(
            DeliveryDate::parse("2023-02-29"),
            Err(DateError::Nonexistent(_))
        ));
    }

    #[test]
    fn test_ordering_matches_calendar() {
        let a = DeliveryDate::parse("2024-01-31").unwrap();
        let b = DeliveryDate::parse("2024-02-01").unwrap();
        assert!(a < b);
    }

    #[test]
    fn test_deserialize_validates() {
        assert!(serde_json::from_str::<DeliveryDate>("\"2024-02-20\"").is_ok());
        assert!(serde_json::from_str::<DeliveryDate>("\"20240220\"").is_err());
    }
}
