//! Relief resource inventory model.
//!
//! Quantity has no floor at zero: adjustments below zero are stored as-is.

use super::{optional_text, require_id, require_text, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ResourceId = Uuid;

pub const DEFAULT_RESOURCE_UNIT: &str = "units";
pub const RESOURCE_CATEGORY_MAX_CHARS: usize = 50;
pub const RESOURCE_DESCRIPTION_MAX_CHARS: usize = 200;
pub const RESOURCE_UNIT_MAX_CHARS: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    /// Free-form grouping such as `water` or `blankets`.
    pub category: String,
    pub description: Option<String>,
    pub quantity: i64,
    pub expires_at: Option<i64>,
    pub unit: String,
}

impl Resource {
    pub fn new(category: impl Into<String>, quantity: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            category: category.into(),
            description: None,
            quantity,
            expires_at: None,
            unit: DEFAULT_RESOURCE_UNIT.to_string(),
        }
    }

    /// Whether the resource expired strictly before `now`.
    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at < now)
    }

    /// Quantity after applying `delta`, if representable.
    pub fn adjusted_quantity(&self, delta: i64) -> Result<i64, ValidationError> {
        self.quantity
            .checked_add(delta)
            .ok_or(ValidationError::QuantityOverflow {
                quantity: self.quantity,
                delta,
            })
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_id(self.id)?;
        require_text("category", &self.category, RESOURCE_CATEGORY_MAX_CHARS)?;
        optional_text(
            "description",
            self.description.as_deref(),
            RESOURCE_DESCRIPTION_MAX_CHARS,
        )?;
        require_text("unit", &self.unit, RESOURCE_UNIT_MAX_CHARS)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Resource;

    #[test]
    fn adjusted_quantity_allows_negative_and_rejects_overflow() {
        let resource = Resource::new("water", 3);
        assert_eq!(resource.adjusted_quantity(-5).unwrap(), -2);

        let full = Resource::new("water", i64::MAX);
        assert!(full.adjusted_quantity(1).is_err());
    }

    #[test]
    fn expiry_is_strictly_before_now() {
        let mut resource = Resource::new("medicine", 10);
        assert!(!resource.is_expired(100));
        resource.expires_at = Some(100);
        assert!(!resource.is_expired(100));
        assert!(resource.is_expired(101));
    }
}
