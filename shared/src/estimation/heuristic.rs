//! Deterministic heuristic strategy
//!
//! `yield = base(category) × Π multipliers × field_size`, with rainfall and
//! temperature taken from the climate aggregate plus optional jitter.

use chrono::NaiveDate;

use super::aggregate::aggregate_with_reference;
use super::confidence::confidence_score;
use super::random::RandomSource;
use super::thresholds::{EstimationThresholds, MultiplierRule, YieldDriver};
use super::{validate_inputs, EstimationError};
use crate::models::{ClimateAggregate, ClimateObservation, CropRecord, Estimate};

/// Values a multiplier rule can look at
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YieldDrivers {
    pub climate: ClimateAggregate,
    pub fertilizer_amount: f64,
}

impl YieldDrivers {
    pub fn value(&self, driver: YieldDriver) -> f64 {
        match driver {
            YieldDriver::Temperature => self.climate.temperature,
            YieldDriver::Rainfall => self.climate.rainfall,
            YieldDriver::Humidity => self.climate.humidity,
            YieldDriver::SolarRadiation => self.climate.solar_radiation,
            YieldDriver::WindSpeed => self.climate.wind_speed,
            YieldDriver::FertilizerAmount => self.fertilizer_amount,
        }
    }
}

/// Product of every rule that fires
pub fn yield_multiplier(chain: &[MultiplierRule], drivers: &YieldDrivers) -> f64 {
    chain
        .iter()
        .filter(|rule| rule.applies(drivers.value(rule.driver)))
        .map(|rule| rule.multiplier)
        .product()
}

/// Non-jittered yield for the whole field, never negative
pub fn heuristic_yield(
    crop: &CropRecord,
    climate: &ClimateAggregate,
    thresholds: &EstimationThresholds,
) -> f64 {
    let drivers = YieldDrivers {
        climate: *climate,
        fertilizer_amount: crop.fertilizer_amount,
    };
    let base = thresholds.base_yields.for_category(crop.category);
    let multiplier = yield_multiplier(&thresholds.heuristic_chain, &drivers);
    (base * multiplier * crop.field_size).max(0.0)
}

/// Full heuristic estimate. Pass `jitter` to perturb rainfall and temperature.
pub fn estimate(
    crop: &CropRecord,
    observations: &[ClimateObservation],
    today: NaiveDate,
    thresholds: &EstimationThresholds,
    jitter: Option<&mut dyn RandomSource>,
) -> Result<Estimate, EstimationError> {
    validate_inputs(crop, observations)?;

    let climate = aggregate_with_reference(observations, &thresholds.reference_climate);
    let yield_value = heuristic_yield(crop, &climate, thresholds);

    let (rainfall_offset, temperature_offset) = match jitter {
        Some(rng) => (
            (rng.next_f64() - 0.5) * thresholds.jitter.rainfall,
            (rng.next_f64() - 0.5) * thresholds.jitter.temperature,
        ),
        None => (0.0, 0.0),
    };

    Ok(Estimate {
        yield_value,
        rainfall_value: (climate.rainfall + rainfall_offset).max(0.0),
        temperature_value: climate.temperature + temperature_offset,
        confidence: confidence_score(crop, observations.len(), today, &thresholds.confidence),
    })
}
