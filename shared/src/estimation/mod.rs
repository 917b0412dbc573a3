//! Yield estimation engine
//!
//! Pure functions over crop records and climate observations. Two strategies
//! share the same aggregation, confidence and advisory stages:
//!
//! - [`heuristic`]: base yield times a multiplier chain, always available
//! - [`learned`]: small regressors trained on synthetic data, usable once
//!   [`learned::TrainedModels::train`] has completed

pub mod advisory;
pub mod aggregate;
pub mod confidence;
pub mod heuristic;
pub mod learned;
pub mod network;
pub mod random;
pub mod synthetic;
pub mod thresholds;

use thiserror::Error;

use crate::models::{ClimateObservation, CropRecord};
use crate::validation::{validate_climate_reading, validate_fertilizer_amount, validate_field_size};

pub use advisory::generate_advisory;
pub use aggregate::{aggregate_climate, aggregate_with_reference};
pub use confidence::confidence_score;
pub use learned::{LearnedSettings, ModelMetrics, TrainedModels};
pub use random::{EntropyRandom, RandomSource, SeededRandom, SequenceRandom};
pub use thresholds::EstimationThresholds;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EstimationError {
    #[error("Estimation engine is not initialized")]
    NotInitialized,

    #[error("Invalid {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },
}

/// Reject records the engine cannot reason about
pub(crate) fn validate_inputs(
    crop: &CropRecord,
    observations: &[ClimateObservation],
) -> Result<(), EstimationError> {
    validate_field_size(crop.field_size).map_err(|reason| EstimationError::InvalidInput {
        field: "field_size",
        reason: reason.to_string(),
    })?;
    validate_fertilizer_amount(crop.fertilizer_amount).map_err(|reason| {
        EstimationError::InvalidInput {
            field: "fertilizer_amount",
            reason: reason.to_string(),
        }
    })?;
    for o in observations {
        validate_climate_reading(
            o.temperature,
            o.rainfall,
            o.humidity,
            o.wind_speed,
            o.solar_radiation,
        )
        .map_err(|reason| EstimationError::InvalidInput {
            field: "climate_observation",
            reason: format!("{} on {}", reason, o.date),
        })?;
    }
    Ok(())
}
