//! Domain model for shelters, persons, stays, resources and alerts.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Own field-level validation shared by every write path.
//!
//! # Invariants
//! - Every domain object is identified by a stable, non-nil UUID.
//! - Timestamps are Unix epoch milliseconds.
//! - Enumerated fields are closed enums; unknown text never becomes a value.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use uuid::Uuid;

pub mod alert;
pub mod occupancy;
pub mod person;
pub mod resource;
pub mod shelter;

/// Current wall-clock time in epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(epoch_ms)
        .unwrap_or(0)
}

/// Milliseconds in `elapsed`, saturating at `i64::MAX`.
pub(crate) fn epoch_ms(elapsed: Duration) -> i64 {
    i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
}

/// Field-level validation failure for create/update inputs.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    NilId,
    EmptyField(&'static str),
    FieldTooLong {
        field: &'static str,
        max_chars: usize,
        actual_chars: usize,
    },
    InvalidFormat {
        field: &'static str,
        expected: &'static str,
    },
    ZeroCapacity,
    OccupancyExceedsCapacity {
        occupancy: u32,
        capacity: u32,
    },
    CoordinateOutOfRange {
        field: &'static str,
        value: f64,
    },
    NegativeRadius(f64),
    InvalidTimeWindow {
        field: &'static str,
        start: i64,
        end: i64,
    },
    QuantityOverflow {
        quantity: i64,
        delta: i64,
    },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "id must not be nil"),
            Self::EmptyField(field) => write!(f, "{field} must not be blank"),
            Self::FieldTooLong {
                field,
                max_chars,
                actual_chars,
            } => write!(
                f,
                "{field} must be at most {max_chars} characters, got {actual_chars}"
            ),
            Self::InvalidFormat { field, expected } => {
                write!(f, "{field} is malformed; expected {expected}")
            }
            Self::ZeroCapacity => write!(f, "capacity must be greater than zero"),
            Self::OccupancyExceedsCapacity {
                occupancy,
                capacity,
            } => write!(
                f,
                "occupancy ({occupancy}) must be <= capacity ({capacity})"
            ),
            Self::CoordinateOutOfRange { field, value } => {
                write!(f, "{field} ({value}) is out of range")
            }
            Self::NegativeRadius(value) => write!(f, "radius_km ({value}) must be >= 0"),
            Self::InvalidTimeWindow { field, start, end } => {
                write!(f, "{field} ({end}) must be >= start ({start})")
            }
            Self::QuantityOverflow { quantity, delta } => {
                write!(f, "quantity {quantity} adjusted by {delta} overflows")
            }
        }
    }
}

impl Error for ValidationError {}

/// Text value that does not name a variant of a closed enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl Display for ParseEnumError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown {} `{}`", self.kind, self.value)
    }
}

impl Error for ParseEnumError {}

pub(crate) fn require_id(id: Uuid) -> Result<(), ValidationError> {
    if id.is_nil() {
        return Err(ValidationError::NilId);
    }
    Ok(())
}

pub(crate) fn require_text(
    field: &'static str,
    value: &str,
    max_chars: usize,
) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    optional_text(field, Some(value), max_chars)
}

pub(crate) fn optional_text(
    field: &'static str,
    value: Option<&str>,
    max_chars: usize,
) -> Result<(), ValidationError> {
    if let Some(value) = value {
        let actual_chars = value.chars().count();
        if actual_chars > max_chars {
            return Err(ValidationError::FieldTooLong {
                field,
                max_chars,
                actual_chars,
            });
        }
    }
    Ok(())
}

pub(crate) fn check_coordinates(
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> Result<(), ValidationError> {
    if let Some(value) = latitude {
        if !(-90.0..=90.0).contains(&value) {
            return Err(ValidationError::CoordinateOutOfRange {
                field: "latitude",
                value,
            });
        }
    }
    if let Some(value) = longitude {
        if !(-180.0..=180.0).contains(&value) {
            return Err(ValidationError::CoordinateOutOfRange {
                field: "longitude",
                value,
            });
        }
    }
    Ok(())
}
