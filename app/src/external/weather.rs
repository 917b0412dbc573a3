//! Daily weather lookup against an Open-Meteo-compatible API

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use shared::GpsCoordinates;

use crate::error::{AppError, AppResult};

const DAILY_FIELDS: &str = "temperature_2m_max,precipitation_sum,wind_speed_10m_max,shortwave_radiation_sum,relative_humidity_2m_max";

/// Daily values used to prefill a climate observation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DailyWeather {
    pub date: NaiveDate,
    pub temperature: f64,
    pub rainfall: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub solar_radiation: f64,
}

#[async_trait]
pub trait WeatherHistory: Send + Sync {
    /// `Ok(None)` when the provider has no data for that day
    async fn daily(&self, coordinates: &GpsCoordinates, date: NaiveDate)
        -> AppResult<Option<DailyWeather>>;
}

#[derive(Clone)]
pub struct OpenMeteoClient {
    client: Client,
    base_url: String,
    timezone: String,
}

/// Open-Meteo response; each daily series has one entry per requested day
#[derive(Debug, Deserialize)]
struct OpenMeteoResponse {
    daily: Option<OpenMeteoDaily>,
}

#[derive(Debug, Deserialize)]
struct OpenMeteoDaily {
    temperature_2m_max: Option<Vec<Option<f64>>>,
    #[serde(default)]
    precipitation_sum: Vec<Option<f64>>,
    #[serde(default)]
    wind_speed_10m_max: Vec<Option<f64>>,
    #[serde(default)]
    shortwave_radiation_sum: Vec<Option<f64>>,
    #[serde(default)]
    relative_humidity_2m_max: Vec<Option<f64>>,
}

impl OpenMeteoClient {
    pub fn new(client: Client, base_url: impl Into<String>, timezone: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timezone: timezone.into(),
        }
    }
}

#[async_trait]
impl WeatherHistory for OpenMeteoClient {
    async fn daily(
        &self,
        coordinates: &GpsCoordinates,
        date: NaiveDate,
    ) -> AppResult<Option<DailyWeather>> {
        let url = format!("{}/v1/forecast", self.base_url);
        let day = date.format("%Y-%m-%d").to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("latitude", coordinates.latitude.to_string()),
                ("longitude", coordinates.longitude.to_string()),
                ("start_date", day.clone()),
                ("end_date", day),
                ("daily", DAILY_FIELDS.to_string()),
                ("timezone", self.timezone.clone()),
            ])
            .send()
            .await
            .map_err(|e| {
                AppError::ExternalServiceUnavailable(format!("Weather API request failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalServiceUnavailable(format!(
                "Weather API error: {} - {}",
                status, body
            )));
        }

        let data: OpenMeteoResponse = response.json().await.map_err(|e| {
            AppError::ExternalServiceUnavailable(format!("Failed to parse weather response: {}", e))
        })?;

        Ok(convert_daily(data, date))
    }
}

/// First value of a series, missing entries read as zero
fn first_or_zero(series: &[Option<f64>]) -> f64 {
    series.first().copied().flatten().unwrap_or(0.0)
}

fn convert_daily(data: OpenMeteoResponse, date: NaiveDate) -> Option<DailyWeather> {
    let daily = data.daily?;
    let temperature = daily.temperature_2m_max?;

    Some(DailyWeather {
        date,
        temperature: first_or_zero(&temperature),
        rainfall: first_or_zero(&daily.precipitation_sum),
        humidity: first_or_zero(&daily.relative_humidity_2m_max),
        wind_speed: first_or_zero(&daily.wind_speed_10m_max),
        solar_radiation: first_or_zero(&daily.shortwave_radiation_sum),
    })
}
