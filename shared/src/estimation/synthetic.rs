//! Synthetic agronomic training data
//!
//! Samples are drawn from plausible East African ranges and labelled with the
//! agronomic multiplier chain, so a model trained on them learns the same
//! shape of response the heuristic encodes plus some noise.

use std::f64::consts::PI;

use super::heuristic::{yield_multiplier, YieldDrivers};
use super::random::RandomSource;
use super::thresholds::EstimationThresholds;
use crate::models::{ClimateAggregate, CropCategory};

/// Number of yield-model features
pub const YIELD_FEATURES: usize = 8;
/// Number of climate-model features
pub const CLIMATE_FEATURES: usize = 6;

/// Uniform sampling ranges, `(low, high)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyntheticRanges {
    pub temperature: (f64, f64),
    pub rainfall: (f64, f64),
    pub humidity: (f64, f64),
    pub solar_radiation: (f64, f64),
    pub wind_speed: (f64, f64),
    pub field_size: (f64, f64),
    pub fertilizer_amount: (f64, f64),
    /// Multiplicative noise on the yield label
    pub yield_noise: (f64, f64),
    /// Seasonal amplitude of the temperature label
    pub temperature_season: f64,
    /// Width of the temperature label noise
    pub temperature_noise: f64,
    /// Seasonal amplitude of the rainfall label
    pub rainfall_season: f64,
    /// Width of the rainfall label noise
    pub rainfall_noise: f64,
}

impl Default for SyntheticRanges {
    fn default() -> Self {
        Self {
            temperature: (20.0, 30.0),
            rainfall: (800.0, 1400.0),
            humidity: (60.0, 90.0),
            solar_radiation: (15.0, 25.0),
            wind_speed: (5.0, 15.0),
            field_size: (0.5, 5.0),
            fertilizer_amount: (0.0, 200.0),
            yield_noise: (0.8, 1.2),
            temperature_season: 3.0,
            temperature_noise: 4.0,
            rainfall_season: 200.0,
            rainfall_noise: 300.0,
        }
    }
}

/// Feature rows and targets for both models
#[derive(Debug, Clone, Default)]
pub struct TrainingSet {
    pub yield_inputs: Vec<[f64; YIELD_FEATURES]>,
    pub yield_targets: Vec<[f64; 1]>,
    pub climate_inputs: Vec<[f64; CLIMATE_FEATURES]>,
    /// `[rainfall, temperature]`
    pub climate_targets: Vec<[f64; 2]>,
}

impl TrainingSet {
    pub fn len(&self) -> usize {
        self.yield_inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.yield_inputs.is_empty()
    }
}

/// Yield features in model order
pub fn yield_features(
    climate: &ClimateAggregate,
    category: CropCategory,
    field_size: f64,
    fertilizer_amount: f64,
) -> [f64; YIELD_FEATURES] {
    [
        category.index() as f64,
        field_size,
        climate.temperature,
        climate.rainfall,
        climate.humidity,
        climate.solar_radiation,
        climate.wind_speed,
        fertilizer_amount,
    ]
}

/// Climate features in model order; `month` is zero-based
pub fn climate_features(climate: &ClimateAggregate, month: u32) -> [f64; CLIMATE_FEATURES] {
    [
        f64::from(month),
        climate.temperature,
        climate.rainfall,
        climate.humidity,
        climate.solar_radiation,
        climate.wind_speed,
    ]
}

pub fn generate_training_set(
    samples: usize,
    ranges: &SyntheticRanges,
    thresholds: &EstimationThresholds,
    rng: &mut dyn RandomSource,
) -> TrainingSet {
    let mut set = TrainingSet {
        yield_inputs: Vec::with_capacity(samples),
        yield_targets: Vec::with_capacity(samples),
        climate_inputs: Vec::with_capacity(samples),
        climate_targets: Vec::with_capacity(samples),
    };

    for _ in 0..samples {
        let climate = ClimateAggregate {
            temperature: rng.uniform(ranges.temperature.0, ranges.temperature.1),
            rainfall: rng.uniform(ranges.rainfall.0, ranges.rainfall.1),
            humidity: rng.uniform(ranges.humidity.0, ranges.humidity.1),
            solar_radiation: rng.uniform(ranges.solar_radiation.0, ranges.solar_radiation.1),
            wind_speed: rng.uniform(ranges.wind_speed.0, ranges.wind_speed.1),
        };
        let category = CropCategory::ALL[rng.index(CropCategory::ALL.len())];
        let field_size = rng.uniform(ranges.field_size.0, ranges.field_size.1);
        let fertilizer_amount = rng.uniform(ranges.fertilizer_amount.0, ranges.fertilizer_amount.1);

        let drivers = YieldDrivers {
            climate,
            fertilizer_amount,
        };
        let multiplier = yield_multiplier(&thresholds.agronomic_chain, &drivers);
        let noise = rng.uniform(ranges.yield_noise.0, ranges.yield_noise.1);
        let label = thresholds.base_yields.for_category(category) * multiplier * field_size * noise;

        set.yield_inputs
            .push(yield_features(&climate, category, field_size, fertilizer_amount));
        set.yield_targets.push([label]);

        let month = rng.index(12) as u32;
        let phase = f64::from(month) / 12.0 * 2.0 * PI;
        let temperature = climate.temperature
            + phase.sin() * ranges.temperature_season
            + (rng.next_f64() - 0.5) * ranges.temperature_noise;
        let rainfall = (climate.rainfall
            + phase.cos() * ranges.rainfall_season
            + (rng.next_f64() - 0.5) * ranges.rainfall_noise)
            .max(0.0);

        set.climate_inputs.push(climate_features(&climate, month));
        set.climate_targets.push([rainfall, temperature]);
    }

    set
}
