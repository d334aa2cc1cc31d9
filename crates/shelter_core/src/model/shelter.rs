//! Shelter domain model.
//!
//! # Invariants
//! - `capacity > 0`.
//! - `occupancy <= capacity`.
//! - Deactivation is a soft delete; the row and its stays are kept.

use super::{check_coordinates, now_epoch_ms, require_id, require_text, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ShelterId = Uuid;

pub const SHELTER_NAME_MAX_CHARS: usize = 100;
pub const SHELTER_LOCATION_MAX_CHARS: usize = 200;

/// A facility with a bounded capacity for housing persons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shelter {
    pub id: ShelterId,
    pub name: String,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub capacity: u32,
    /// Live count of active stays. Owned by the occupancy ledger.
    pub occupancy: u32,
    pub created_at: i64,
    pub is_active: bool,
}

impl Shelter {
    /// Creates an empty, active shelter with a generated ID.
    pub fn new(name: impl Into<String>, location: impl Into<String>, capacity: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            location: location.into(),
            latitude: None,
            longitude: None,
            capacity,
            occupancy: 0,
            created_at: now_epoch_ms(),
            is_active: true,
        }
    }

    /// Beds still free.
    pub fn available(&self) -> u32 {
        self.capacity.saturating_sub(self.occupancy)
    }

    pub fn is_full(&self) -> bool {
        self.occupancy >= self.capacity
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_id(self.id)?;
        require_text("name", &self.name, SHELTER_NAME_MAX_CHARS)?;
        require_text("location", &self.location, SHELTER_LOCATION_MAX_CHARS)?;
        check_coordinates(self.latitude, self.longitude)?;
        if self.capacity == 0 {
            return Err(ValidationError::ZeroCapacity);
        }
        if self.occupancy > self.capacity {
            return Err(ValidationError::OccupancyExceedsCapacity {
                occupancy: self.occupancy,
                capacity: self.capacity,
            });
        }
        Ok(())
    }
}
