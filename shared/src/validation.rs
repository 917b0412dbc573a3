//! Validation utilities for the Shamba yield dashboard
//!
//! Field-level checks used by forms, CSV import and the browser build, plus
//! helpers for flattening `validator` errors into a single message.

use validator::ValidationErrors;

// ============================================================================
// Crop Record Validations
// ============================================================================

/// Validate field area is a positive, finite number of acres
pub fn validate_field_size(field_size: f64) -> Result<(), &'static str> {
    if !field_size.is_finite() {
        return Err("Field size must be a number");
    }
    if field_size <= 0.0 {
        return Err("Field size must be greater than zero");
    }
    Ok(())
}

/// Validate fertilizer amount is a non-negative, finite number of kg
pub fn validate_fertilizer_amount(amount: f64) -> Result<(), &'static str> {
    if !amount.is_finite() {
        return Err("Fertilizer amount must be a number");
    }
    if amount < 0.0 {
        return Err("Fertilizer amount cannot be negative");
    }
    Ok(())
}

// ============================================================================
// Climate Validations
// ============================================================================

/// Validate one climate reading
pub fn validate_climate_reading(
    temperature: f64,
    rainfall: f64,
    humidity: f64,
    wind_speed: f64,
    solar_radiation: f64,
) -> Result<(), &'static str> {
    if ![temperature, rainfall, humidity, wind_speed, solar_radiation]
        .iter()
        .all(|v| v.is_finite())
    {
        return Err("Climate values must be numbers");
    }
    if !(-60.0..=60.0).contains(&temperature) {
        return Err("Temperature must be between -60 and 60 °C");
    }
    if rainfall < 0.0 {
        return Err("Rainfall cannot be negative");
    }
    if !(0.0..=100.0).contains(&humidity) {
        return Err("Humidity must be between 0 and 100%");
    }
    if wind_speed < 0.0 {
        return Err("Wind speed cannot be negative");
    }
    if solar_radiation < 0.0 {
        return Err("Solar radiation cannot be negative");
    }
    Ok(())
}

// ============================================================================
// Account Validations
// ============================================================================

/// Validate a username: any text that is not blank, up to 100 characters
pub fn validate_username(username: &str) -> Result<(), &'static str> {
    let username = username.trim();
    if username.is_empty() {
        return Err("Username is required");
    }
    if username.chars().count() > 100 {
        return Err("Username must be at most 100 characters");
    }
    Ok(())
}

/// Flatten `validator` errors into "field: code" pairs, sorted by field name
pub fn describe_validation_errors(errors: &ValidationErrors) -> String {
    let mut parts: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter()
                .map(move |e| format!("{}: {}", field, e.code))
        })
        .collect();
    parts.sort();
    parts.join(", ")
}
