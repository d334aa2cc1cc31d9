//! Occupancy record model: one person's stay at one shelter.
//!
//! # Responsibility
//! - Define the stay record and its two-state lifecycle.
//! - Provide the only in-memory transition (`close`).
//!
//! # Invariants
//! - `checked_out_at.is_some()` iff `status == Closed`.
//! - `checked_out_at >= checked_in_at` when set.
//! - A record transitions Active -> Closed at most once.

use super::person::PersonId;
use super::shelter::ShelterId;
use super::{require_id, ParseEnumError, ValidationError};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

pub type OccupancyRecordId = Uuid;

/// Lifecycle state of a stay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OccupancyStatus {
    /// Person is currently housed; counts toward shelter occupancy.
    Active,
    /// Person has checked out.
    Closed,
}

impl OccupancyStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Closed => "closed",
        }
    }
}

impl Display for OccupancyStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OccupancyStatus {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "active" => Ok(Self::Active),
            "closed" => Ok(Self::Closed),
            other => Err(ParseEnumError {
                kind: "occupancy status",
                value: other.to_string(),
            }),
        }
    }
}

/// Raised when closing a record that is already closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlreadyClosed(pub OccupancyRecordId);

impl Display for AlreadyClosed {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "occupancy record already closed: {}", self.0)
    }
}

impl Error for AlreadyClosed {}

/// One person's stay at one shelter, from check-in to check-out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupancyRecord {
    pub id: OccupancyRecordId,
    pub shelter_id: ShelterId,
    pub person_id: PersonId,
    pub checked_in_at: i64,
    pub checked_out_at: Option<i64>,
    pub status: OccupancyStatus,
}

impl OccupancyRecord {
    /// Opens a new active stay checked in at `checked_in_at`.
    pub fn open(shelter_id: ShelterId, person_id: PersonId, checked_in_at: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            shelter_id,
            person_id,
            checked_in_at,
            checked_out_at: None,
            status: OccupancyStatus::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == OccupancyStatus::Active
    }

    /// Closes the stay.
    ///
    /// The check-out time is clamped to the check-in time so a backwards
    /// clock step cannot produce a reversed window.
    pub fn close(&mut self, checked_out_at: i64) -> Result<(), AlreadyClosed> {
        if !self.is_active() {
            return Err(AlreadyClosed(self.id));
        }
        self.status = OccupancyStatus::Closed;
        self.checked_out_at = Some(checked_out_at.max(self.checked_in_at));
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_id(self.id)?;
        require_id(self.shelter_id)?;
        require_id(self.person_id)?;
        match (self.status, self.checked_out_at) {
            (OccupancyStatus::Active, None) => Ok(()),
            (OccupancyStatus::Closed, Some(out)) if out >= self.checked_in_at => Ok(()),
            (OccupancyStatus::Closed, Some(out)) => Err(ValidationError::InvalidTimeWindow {
                field: "checked_out_at",
                start: self.checked_in_at,
                end: out,
            }),
            (OccupancyStatus::Active, Some(_)) | (OccupancyStatus::Closed, None) => {
                Err(ValidationError::InvalidFormat {
                    field: "checked_out_at",
                    expected: "set if and only if status is closed",
                })
            }
        }
    }
}

/// Read model: a stay joined with shelter and person display names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupancyView {
    #[serde(flatten)]
    pub record: OccupancyRecord,
    pub shelter_name: String,
    pub person_name: String,
}

/// Outcome of recomputing a shelter's counter from its active stays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupancyReconciliation {
    pub shelter_id: ShelterId,
    pub previous: u32,
    pub current: u32,
}

impl OccupancyReconciliation {
    pub fn drifted(&self) -> bool {
        self.previous != self.current
    }
}
