//! Hazard risk prediction seam.
//!
//! The predictor itself lives outside this crate. Callers inject anything
//! implementing [`HazardPredictor`]; plain closures qualify.

use crate::model::ParseEnumError;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Feature vector handed to the predictor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisasterFeatures {
    /// Count of past disasters recorded for the area.
    pub disaster_history: f32,
    pub affected_population: f32,
    pub critical_infrastructure: bool,
    /// Hazard kind, e.g. `flood`.
    pub disaster_kind: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl Display for RiskLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(ParseEnumError {
                kind: "risk level",
                value: other.to_string(),
            }),
        }
    }
}

/// Failure reported by a predictor backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictionError(pub String);

impl Display for PredictionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "hazard prediction failed: {}", self.0)
    }
}

impl Error for PredictionError {}

/// Opaque risk classifier.
pub trait HazardPredictor {
    fn predict(&self, features: &DisasterFeatures) -> Result<RiskLevel, PredictionError>;
}

impl<F> HazardPredictor for F
where
    F: Fn(&DisasterFeatures) -> Result<RiskLevel, PredictionError>,
{
    fn predict(&self, features: &DisasterFeatures) -> Result<RiskLevel, PredictionError> {
        self(features)
    }
}
