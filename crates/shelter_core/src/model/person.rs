//! Person identity model.

use super::{
    now_epoch_ms, optional_text, require_id, require_text, ParseEnumError, ValidationError,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

pub type PersonId = Uuid;

pub const PERSON_NAME_MAX_CHARS: usize = 100;
pub const PERSON_EMAIL_MAX_CHARS: usize = 100;
pub const PERSON_PHONE_MAX_CHARS: usize = 20;

static NATIONAL_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{11}$").expect("valid national id regex"));
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex")
});

/// Role a person plays in the response effort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonRole {
    Admin,
    Manager,
    Volunteer,
    /// Displaced person; the usual subject of a shelter stay.
    Affected,
}

impl PersonRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::Volunteer => "volunteer",
            Self::Affected => "affected",
        }
    }
}

impl Display for PersonRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PersonRole {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "admin" => Ok(Self::Admin),
            "manager" => Ok(Self::Manager),
            "volunteer" => Ok(Self::Volunteer),
            "affected" => Ok(Self::Affected),
            other => Err(ParseEnumError {
                kind: "person role",
                value: other.to_string(),
            }),
        }
    }
}

/// Identity record. Referenced, never mutated, by the occupancy ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    pub name: String,
    /// Eleven-digit national registry number.
    pub national_id: String,
    pub role: PersonRole,
    pub email: String,
    pub phone: Option<String>,
    pub created_at: i64,
}

impl Person {
    pub fn new(
        name: impl Into<String>,
        national_id: impl Into<String>,
        role: PersonRole,
        email: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            national_id: national_id.into(),
            role,
            email: email.into(),
            phone: None,
            created_at: now_epoch_ms(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_id(self.id)?;
        require_text("name", &self.name, PERSON_NAME_MAX_CHARS)?;
        if !NATIONAL_ID_RE.is_match(&self.national_id) {
            return Err(ValidationError::InvalidFormat {
                field: "national_id",
                expected: "11 digits",
            });
        }
        require_text("email", &self.email, PERSON_EMAIL_MAX_CHARS)?;
        if !EMAIL_RE.is_match(&self.email) {
            return Err(ValidationError::InvalidFormat {
                field: "email",
                expected: "local@domain.tld",
            });
        }
        optional_text("phone", self.phone.as_deref(), PERSON_PHONE_MAX_CHARS)?;
        Ok(())
    }
}
