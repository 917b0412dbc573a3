//! Estimates, advisories and the persisted prediction history

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which estimation strategy produced a prediction
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum EstimationStrategy {
    /// Deterministic multiplier chain over the climate aggregate
    #[default]
    Heuristic,
    /// Feed-forward regressions trained on synthetic data
    Learned,
}

impl std::fmt::Display for EstimationStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EstimationStrategy::Heuristic => write!(f, "heuristic"),
            EstimationStrategy::Learned => write!(f, "learned"),
        }
    }
}

impl std::str::FromStr for EstimationStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "heuristic" => Ok(EstimationStrategy::Heuristic),
            "learned" => Ok(EstimationStrategy::Learned),
            other => Err(format!("unknown estimation strategy: {}", other)),
        }
    }
}

/// Numeric output of the estimation engine
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Estimate {
    /// Tons for the whole field
    pub yield_value: f64,
    /// Millimetres
    pub rainfall_value: f64,
    /// Degrees Celsius
    pub temperature_value: f64,
    /// Heuristic score in [0, 0.95]
    pub confidence: f64,
}

/// Categorized advisory text derived from an estimate
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdvisoryReport {
    #[serde(rename = "positive")]
    pub positive_factors: Vec<String>,
    #[serde(rename = "negative")]
    pub risk_factors: Vec<String>,
    pub recommendations: Vec<String>,
}

/// A stored prediction, appended once and never mutated
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PredictionRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "cropDataId")]
    pub crop_record_id: Uuid,
    pub predicted_yield: f64,
    pub predicted_rainfall: f64,
    pub predicted_temperature: f64,
    pub climate_impact: AdvisoryReport,
    /// Confidence as a whole percentage
    pub confidence: u8,
    #[serde(default)]
    pub strategy: EstimationStrategy,
    pub created_at: DateTime<Utc>,
}

impl PredictionRecord {
    pub fn new(
        user_id: Uuid,
        crop_record_id: Uuid,
        estimate: &Estimate,
        climate_impact: AdvisoryReport,
        strategy: EstimationStrategy,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            crop_record_id,
            predicted_yield: estimate.yield_value,
            predicted_rainfall: estimate.rainfall_value,
            predicted_temperature: estimate.temperature_value,
            climate_impact,
            confidence: confidence_percent(estimate.confidence),
            strategy,
            created_at: Utc::now(),
        }
    }
}

/// Convert a [0, 1] confidence into a rounded percentage
pub fn confidence_percent(confidence: f64) -> u8 {
    (confidence.clamp(0.0, 1.0) * 100.0).round() as u8
}
