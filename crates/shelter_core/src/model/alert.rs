//! Hazard alert model.
//!
//! Status is a closed enum, but any status may follow any other; there is no
//! transition table.

use super::{
    check_coordinates, optional_text, require_id, require_text, ParseEnumError, ValidationError,
};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

pub type AlertId = Uuid;

pub const ALERT_CATEGORY_MAX_CHARS: usize = 50;
pub const ALERT_AREA_MAX_CHARS: usize = 200;
pub const ALERT_DESCRIPTION_MAX_CHARS: usize = 500;
pub const ALERT_SOURCE_MAX_CHARS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AlertSeverity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl Display for AlertSeverity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertSeverity {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            other => Err(ParseEnumError {
                kind: "alert severity",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    Active,
    Cancelled,
    Finalized,
}

impl AlertStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Cancelled => "cancelled",
            Self::Finalized => "finalized",
        }
    }
}

impl Display for AlertStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertStatus {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "active" => Ok(Self::Active),
            "cancelled" => Ok(Self::Cancelled),
            "finalized" => Ok(Self::Finalized),
            other => Err(ParseEnumError {
                kind: "alert status",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: AlertId,
    /// Hazard kind, e.g. `flood` or `landslide`.
    pub category: String,
    pub severity: AlertSeverity,
    pub area: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub radius_km: Option<f64>,
    pub description: Option<String>,
    /// Issuing agency or sensor network.
    pub source: String,
    pub status: AlertStatus,
    pub starts_at: i64,
    pub estimated_end_at: Option<i64>,
}

impl Alert {
    /// Creates an active alert starting at `starts_at`.
    pub fn new(
        category: impl Into<String>,
        severity: AlertSeverity,
        area: impl Into<String>,
        source: impl Into<String>,
        starts_at: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            category: category.into(),
            severity,
            area: area.into(),
            latitude: None,
            longitude: None,
            radius_km: None,
            description: None,
            source: source.into(),
            status: AlertStatus::Active,
            starts_at,
            estimated_end_at: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_id(self.id)?;
        require_text("category", &self.category, ALERT_CATEGORY_MAX_CHARS)?;
        require_text("area", &self.area, ALERT_AREA_MAX_CHARS)?;
        optional_text(
            "description",
            self.description.as_deref(),
            ALERT_DESCRIPTION_MAX_CHARS,
        )?;
        require_text("source", &self.source, ALERT_SOURCE_MAX_CHARS)?;
        check_coordinates(self.latitude, self.longitude)?;
        if let Some(radius) = self.radius_km {
            if radius < 0.0 || radius.is_nan() {
                return Err(ValidationError::NegativeRadius(radius));
            }
        }
        if let Some(end) = self.estimated_end_at {
            if end < self.starts_at {
                return Err(ValidationError::InvalidTimeWindow {
                    field: "estimated_end_at",
                    start: self.starts_at,
                    end,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Alert, AlertSeverity, AlertStatus};
    use crate::model::ValidationError;

    #[test]
    fn validate_rejects_end_before_start() {
        let mut alert = Alert::new("flood", AlertSeverity::High, "Vale do Itajaí", "civil-defense", 200);
        alert.estimated_end_at = Some(100);
        assert_eq!(
            alert.validate().unwrap_err(),
            ValidationError::InvalidTimeWindow {
                field: "estimated_end_at",
                start: 200,
                end: 100,
            }
        );
    }

    #[test]
    fn enum_wire_values_round_trip_through_from_str() {
        for status in [AlertStatus::Active, AlertStatus::Cancelled, AlertStatus::Finalized] {
            assert_eq!(status.as_str().parse::<AlertStatus>(), Ok(status));
        }
        assert!("cancelado".parse::<AlertStatus>().is_err());
        assert!("severe".parse::<AlertSeverity>().is_err());
    }
}
