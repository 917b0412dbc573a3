//! Climate aggregation

use crate::models::{ClimateAggregate, ClimateObservation};

/// Arithmetic mean of every field, or the reference climate when empty
pub fn aggregate_climate(observations: &[ClimateObservation]) -> ClimateAggregate {
    aggregate_with_reference(observations, &ClimateAggregate::REFERENCE)
}

pub fn aggregate_with_reference(
    observations: &[ClimateObservation],
    reference: &ClimateAggregate,
) -> ClimateAggregate {
    if observations.is_empty() {
        return *reference;
    }

    let totals = observations.iter().fold(
        ClimateAggregate {
            temperature: 0.0,
            rainfall: 0.0,
            humidity: 0.0,
            solar_radiation: 0.0,
            wind_speed: 0.0,
        },
        |acc, o| ClimateAggregate {
            temperature: acc.temperature + o.temperature,
            rainfall: acc.rainfall + o.rainfall,
            humidity: acc.humidity + o.humidity,
            solar_radiation: acc.solar_radiation + o.solar_radiation,
            wind_speed: acc.wind_speed + o.wind_speed,
        },
    );

    let count = observations.len() as f64;
    ClimateAggregate {
        temperature: totals.temperature / count,
        rainfall: totals.rainfall / count,
        humidity: totals.humidity / count,
        solar_radiation: totals.solar_radiation / count,
        wind_speed: totals.wind_speed / count,
    }
}
