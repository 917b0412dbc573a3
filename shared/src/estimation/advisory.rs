//! Rule-based advisory text
//!
//! Sections are appended in a fixed order: rainfall, temperature, crop
//! specific, fertilizer, confidence, then the general reminders that every
//! report ends with. Bands are closed on both ends.

use super::thresholds::AdvisoryBands;
use crate::models::{AdvisoryReport, ClimateAggregate, CropCategory, CropRecord, Estimate};

pub fn generate_advisory(
    estimate: &Estimate,
    crop: &CropRecord,
    climate: &ClimateAggregate,
    bands: &AdvisoryBands,
) -> AdvisoryReport {
    let mut report = AdvisoryReport::default();
    let rainfall = estimate.rainfall_value;
    let temperature = estimate.temperature_value;

    // Rainfall
    if (bands.rainfall_optimal_min..=bands.rainfall_optimal_max).contains(&rainfall) {
        report.positive("Optimal rainfall expected for crop growth");
    } else if rainfall < bands.drought_below {
        report.risk("Below-average rainfall predicted - drought risk");
        report.recommend("Install drip irrigation system");
        report.recommend("Apply mulch to conserve soil moisture");
    } else if rainfall > bands.waterlogging_above {
        report.risk("Excessive rainfall predicted - waterlogging risk");
        report.recommend("Improve field drainage systems");
        report.recommend("Consider raised bed cultivation");
    }

    // Temperature
    if (bands.temperature_optimal_min..=bands.temperature_optimal_max).contains(&temperature) {
        report.positive("Favorable temperature range for crop development");
    } else if temperature > bands.heat_above {
        report.risk("High temperatures may cause heat stress");
        report.recommend("Provide shade during hottest parts of day");
        report.recommend("Increase irrigation frequency");
    } else if temperature < bands.cold_below {
        report.risk("Low temperatures may slow crop growth");
        report.recommend("Consider using row covers for protection");
    }

    match crop.category {
        CropCategory::Maize => {
            if estimate.yield_value < bands.maize_low_yield_below {
                report.recommend("Consider drought-resistant maize varieties like H516");
                report.recommend("Apply nitrogen fertilizer at tasseling stage");
            }
            if climate.humidity > bands.maize_disease_humidity_above {
                report.recommend("Monitor for gray leaf spot disease");
            }
        }
        CropCategory::Rice => {
            if rainfall < bands.rice_water_below {
                report.recommend("Ensure adequate water supply for rice paddies");
            }
            report.recommend("Apply phosphorus fertilizer before transplanting");
        }
        CropCategory::Beans => {
            if temperature > bands.beans_heat_above {
                report.recommend("Plant beans in partial shade during hot season");
            }
            report.recommend("Inoculate seeds with rhizobia bacteria");
        }
    }

    if crop.fertilizer_amount < bands.low_fertilizer_below {
        report.recommend("Consider increasing fertilizer application");
    }

    if estimate.confidence < bands.low_confidence_below {
        report.recommend("Collect more climate data for better predictions");
    }

    report.recommend("Monitor weather forecasts regularly");
    report.recommend("Keep detailed records of crop performance");

    report
}

impl AdvisoryReport {
    fn positive(&mut self, text: &str) {
        self.positive_factors.push(text.to_string());
    }

    fn risk(&mut self, text: &str) {
        self.risk_factors.push(text.to_string());
    }

    fn recommend(&mut self, text: &str) {
        self.recommendations.push(text.to_string());
    }
}
