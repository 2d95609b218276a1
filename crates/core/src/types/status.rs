//! Status and role enums.

use serde::{Deserialize, Serialize};

/// Error returned when a status or role string is not recognized.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown status: {0}")]
pub struct StatusError(pub String);

/// Delivery progress.
///
/// Serialized as the canonical `snake_case` code. The Japanese display label
/// is used by CSV/Excel export and accepted again on import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    #[default]
    Pending,
    InTransit,
    Completed,
}

impl DeliveryStatus {
    /// All statuses in display order.
    pub const ALL: [Self; 3] = [Self::Pending, Self::InTransit, Self::Completed];

    /// Canonical wire code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InTransit => "in_transit",
            Self::Completed => "completed",
        }
    }

    /// Japanese display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "配送待ち",
            Self::InTransit => "配送中",
            Self::Completed => "配送完了",
        }
    }

    /// Parse either the canonical code or the display label.
    ///
    /// Surrounding whitespace is ignored.
    ///
    /// # Errors
    ///
    /// Returns `StatusError` if the value matches neither form.
    pub fn parse_code_or_label(value: &str) -> Result<Self, StatusError> {
        let trimmed = value.trim();
        Self::ALL
            .into_iter()
            .find(|s| s.as_str() == trimmed || s.label() == trimmed)
            .ok_or_else(|| StatusError(value.to_string()))
    }
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DeliveryStatus {
    type Err = StatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "in_transit" => Ok(Self::InTransit),
            "completed" => Ok(Self::Completed),
            _ => Err(StatusError(s.to_string())),
        }
    }
}

/// Caller role.
///
/// Sessions only carry `Admin` or `User`; a request without a session is
/// treated as `Guest`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full access to all delivery operations.
    Admin,
    /// Read access plus status changes.
    User,
    /// Unauthenticated; no capabilities.
    #[default]
    Guest,
}

impl Role {
    /// Resolve a role from an optional, loosely typed string.
    ///
    /// Anything other than `"admin"` or `"user"` resolves to `Guest`.
    #[must_use]
    pub fn from_optional(role: Option<&str>) -> Self {
        match role {
            Some("admin") => Self::Admin,
            Some("user") => Self::User,
            _ => Self::Guest,
        }
    }

    /// Whether a session may carry this role.
    #[must_use]
    pub const fn is_authenticated(self) -> bool {
        !matches!(self, Self::Guest)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::User => write!(f, "user"),
            Self::Guest => write!(f, "guest"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "user" => Ok(Self::User),
            "guest" => Ok(Self::Guest),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_round_trip() {
        for status in DeliveryStatus::ALL {
            assert_eq!(status.as_str().parse::<DeliveryStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_status_accepts_labels() {
        assert_eq!(
            DeliveryStatus::parse_code_or_label("配送中").unwrap(),
            DeliveryStatus::InTransit
        );
        assert_eq!(
            DeliveryStatus::parse_code_or_label(" completed ").unwrap(),
            DeliveryStatus::Completed
        );
        assert!(DeliveryStatus::parse_code_or_label("shipped").is_err());
    }

    #[test]
    fn test_status_serde_snake_case() {
        let json = serde_json::to_string(&DeliveryStatus::InTransit).unwrap();
        assert_eq!(json, "\"in_transit\"");
    }

    #[test]
    fn test_role_from_optional() {
        assert_eq!(Role::from_optional(Some("admin")), Role::Admin);
        assert_eq!(Role::from_optional(Some("user")), Role::User);
        assert_eq!(Role::from_optional(Some("root")), Role::Guest);
        assert_eq!(Role::from_optional(None), Role::Guest);
    }

    #[test]
    fn test_role_display_parse() {
        assert_eq!(Role::Admin.to_string(), "admin");
        assert_eq!("user".parse::<Role>().unwrap(), Role::User);
        assert!("superuser".parse::<Role>().is_err());
    }
}
