//! External API integrations
//!
//! Each collaborator sits behind a trait so services can be exercised with
//! in-process stubs.

pub mod geocoding;
pub mod text_generation;
pub mod weather;

pub use geocoding::{Geocoder, NominatimGeocoder};
pub use text_generation::{ChatCompletionClient, CompletionRequest, TextGenerator};
pub use weather::{DailyWeather, OpenMeteoClient, WeatherHistory};

use reqwest::Client;
use std::time::Duration;

use crate::error::{AppError, AppResult};

/// Shared HTTP client with the configured timeout
pub fn http_client(timeout: Duration) -> AppResult<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("shamba-app/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| AppError::Configuration(format!("Failed to create HTTP client: {}", e)))
}
