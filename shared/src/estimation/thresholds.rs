//! Calibration constants for the estimation engine
//!
//! Every number the engine compares against lives here so it can be
//! recalibrated (or loaded from configuration) without touching the
//! algorithms. `Default` yields the documented constants.

use serde::{Deserialize, Serialize};

use crate::models::{ClimateAggregate, CropCategory};

/// Quantity a multiplier rule inspects
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum YieldDriver {
    Temperature,
    Rainfall,
    Humidity,
    SolarRadiation,
    WindSpeed,
    FertilizerAmount,
}

/// Strict comparison direction
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    Above,
    Below,
}

/// `if driver <comparison> threshold { yield *= multiplier }`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MultiplierRule {
    pub driver: YieldDriver,
    pub comparison: Comparison,
    pub threshold: f64,
    pub multiplier: f64,
}

impl MultiplierRule {
    pub const fn new(
        driver: YieldDriver,
        comparison: Comparison,
        threshold: f64,
        multiplier: f64,
    ) -> Self {
        Self {
            driver,
            comparison,
            threshold,
            multiplier,
        }
    }

    pub fn applies(&self, value: f64) -> bool {
        match self.comparison {
            Comparison::Above => value > self.threshold,
            Comparison::Below => value < self.threshold,
        }
    }
}

/// Average yield per acre before any adjustment, in tons
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BaseYields {
    pub maize: f64,
    pub rice: f64,
    pub beans: f64,
}

impl BaseYields {
    pub fn for_category(&self, category: CropCategory) -> f64 {
        match category {
            CropCategory::Maize => self.maize,
            CropCategory::Rice => self.rice,
            CropCategory::Beans => self.beans,
        }
    }
}

impl Default for BaseYields {
    fn default() -> Self {
        Self {
            maize: 2.5,
            rice: 1.8,
            beans: 0.9,
        }
    }
}

/// Additive confidence terms
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConfidenceWeights {
    pub base: f64,
    pub moderate_history_count: usize,
    pub moderate_history_bonus: f64,
    pub long_history_count: usize,
    pub long_history_bonus: f64,
    pub fertilizer_bonus: f64,
    pub seed_variety_bonus: f64,
    pub season_window_months: u32,
    pub season_bonus: f64,
    pub max: f64,
}

impl Default for ConfidenceWeights {
    fn default() -> Self {
        Self {
            base: 0.7,
            moderate_history_count: 10,
            moderate_history_bonus: 0.1,
            long_history_count: 30,
            long_history_bonus: 0.1,
            fertilizer_bonus: 0.05,
            seed_variety_bonus: 0.05,
            season_window_months: 2,
            season_bonus: 0.1,
            max: 0.95,
        }
    }
}

/// Bands and cut-offs for advisory text
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AdvisoryBands {
    pub rainfall_optimal_min: f64,
    pub rainfall_optimal_max: f64,
    pub drought_below: f64,
    pub waterlogging_above: f64,
    pub temperature_optimal_min: f64,
    pub temperature_optimal_max: f64,
    pub heat_above: f64,
    pub cold_below: f64,
    pub maize_low_yield_below: f64,
    pub maize_disease_humidity_above: f64,
    pub rice_water_below: f64,
    pub beans_heat_above: f64,
    pub low_fertilizer_below: f64,
    pub low_confidence_below: f64,
}

impl Default for AdvisoryBands {
    fn default() -> Self {
        Self {
            rainfall_optimal_min: 800.0,
            rainfall_optimal_max: 1200.0,
            drought_below: 600.0,
            waterlogging_above: 1400.0,
            temperature_optimal_min: 18.0,
            temperature_optimal_max: 28.0,
            heat_above: 30.0,
            cold_below: 16.0,
            maize_low_yield_below: 2.0,
            maize_disease_humidity_above: 80.0,
            rice_water_below: 1000.0,
            beans_heat_above: 28.0,
            low_fertilizer_below: 50.0,
            low_confidence_below: 0.8,
        }
    }
}

/// Width of the uniform jitter window (value ± span / 2)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct JitterSpans {
    pub rainfall: f64,
    pub temperature: f64,
}

impl Default for JitterSpans {
    fn default() -> Self {
        Self {
            rainfall: 100.0,
            temperature: 5.0,
        }
    }
}

/// Complete calibration of the engine
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EstimationThresholds {
    pub base_yields: BaseYields,
    /// Chain applied by the heuristic strategy
    pub heuristic_chain: Vec<MultiplierRule>,
    /// Richer chain used to label synthetic training samples
    pub agronomic_chain: Vec<MultiplierRule>,
    pub confidence: ConfidenceWeights,
    pub advisory: AdvisoryBands,
    pub reference_climate: ClimateAggregate,
    pub jitter: JitterSpans,
}

impl EstimationThresholds {
    pub fn heuristic_chain() -> Vec<MultiplierRule> {
        use Comparison::*;
        use YieldDriver::*;
        vec![
            MultiplierRule::new(Temperature, Above, 30.0, 0.9),
            MultiplierRule::new(Rainfall, Below, 500.0, 0.8),
            MultiplierRule::new(Humidity, Above, 80.0, 0.95),
        ]
    }

    pub fn agronomic_chain() -> Vec<MultiplierRule> {
        use Comparison::*;
        use YieldDriver::*;
        vec![
            MultiplierRule::new(Temperature, Above, 28.0, 0.9),
            MultiplierRule::new(Temperature, Below, 18.0, 0.85),
            MultiplierRule::new(Rainfall, Below, 600.0, 0.7),
            MultiplierRule::new(Rainfall, Above, 1200.0, 0.9),
            MultiplierRule::new(Humidity, Above, 85.0, 0.95),
            MultiplierRule::new(FertilizerAmount, Above, 100.0, 1.1),
            MultiplierRule::new(SolarRadiation, Above, 20.0, 1.05),
        ]
    }
}

impl Default for EstimationThresholds {
    fn default() -> Self {
        Self {
            base_yields: BaseYields::default(),
            heuristic_chain: Self::heuristic_chain(),
            agronomic_chain: Self::agronomic_chain(),
            confidence: ConfidenceWeights::default(),
            advisory: AdvisoryBands::default(),
            reference_climate: ClimateAggregate::REFERENCE,
            jitter: JitterSpans::default(),
        }
    }
}
