//! Climate observation models

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// One dated weather measurement recorded by a user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClimateObservation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    /// Degrees Celsius
    pub temperature: f64,
    /// Millimetres
    pub rainfall: f64,
    /// Relative humidity, percent
    pub humidity: f64,
    /// km/h
    pub wind_speed: f64,
    /// MJ/m²
    pub solar_radiation: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ClimateObservation {
    pub fn new(user_id: Uuid, input: ClimateInput) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            date: input.date,
            temperature: input.temperature,
            rainfall: input.rainfall,
            humidity: input.humidity,
            wind_speed: input.wind_speed,
            solar_radiation: input.solar_radiation,
            location: input.location,
            created_at: Utc::now(),
        }
    }

    pub fn apply(&mut self, input: ClimateInput) {
        self.date = input.date;
        self.temperature = input.temperature;
        self.rainfall = input.rainfall;
        self.humidity = input.humidity;
        self.wind_speed = input.wind_speed;
        self.solar_radiation = input.solar_radiation;
        self.location = input.location;
    }
}

/// Form input for a climate observation
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_climate_input"))]
pub struct ClimateInput {
    pub date: NaiveDate,
    pub temperature: f64,
    #[validate(range(min = 0.0))]
    pub rainfall: f64,
    #[validate(range(min = 0.0, max = 100.0))]
    pub humidity: f64,
    #[validate(range(min = 0.0))]
    pub wind_speed: f64,
    #[validate(range(min = 0.0))]
    pub solar_radiation: f64,
    #[serde(default)]
    #[validate(length(max = 200))]
    pub location: Option<String>,
}

fn validate_climate_input(input: &ClimateInput) -> Result<(), ValidationError> {
    let all_finite = [
        input.temperature,
        input.rainfall,
        input.humidity,
        input.wind_speed,
        input.solar_radiation,
    ]
    .iter()
    .all(|v| v.is_finite());

    if !all_finite {
        return Err(ValidationError::new("climate_values_must_be_finite"));
    }
    if !(-60.0..=60.0).contains(&input.temperature) {
        return Err(ValidationError::new("temperature_out_of_range"));
    }
    Ok(())
}

/// Mean of a set of observations. Never persisted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ClimateAggregate {
    pub temperature: f64,
    pub rainfall: f64,
    pub humidity: f64,
    pub solar_radiation: f64,
    pub wind_speed: f64,
}

impl ClimateAggregate {
    /// Temperate highland reference climate used when nothing was observed
    pub const REFERENCE: ClimateAggregate = ClimateAggregate {
        temperature: 24.0,
        rainfall: 1000.0,
        humidity: 70.0,
        solar_radiation: 20.0,
        wind_speed: 8.0,
    };
}

impl Default for ClimateAggregate {
    fn default() -> Self {
        Self::REFERENCE
    }
}
