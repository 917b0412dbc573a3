//! Free-text location lookup against a Nominatim-compatible API

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::GpsCoordinates;
use std::str::FromStr;

use crate::error::{AppError, AppResult};

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// `Ok(None)` when the place is unknown
    async fn locate(&self, query: &str) -> AppResult<Option<GpsCoordinates>>;
}

#[derive(Clone)]
pub struct NominatimGeocoder {
    client: Client,
    base_url: String,
}

/// One search hit; coordinates arrive as strings
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
}

impl NominatimGeocoder {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn locate(&self, query: &str) -> AppResult<Option<GpsCoordinates>> {
        let url = format!("{}/search", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("q", query), ("format", "json")])
            .send()
            .await
            .map_err(|e| {
                AppError::ExternalServiceUnavailable(format!("Geocoding request failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalServiceUnavailable(format!(
                "Geocoding API error: {} - {}",
                status, body
            )));
        }

        let places: Vec<NominatimPlace> = response.json().await.map_err(|e| {
            AppError::ExternalServiceUnavailable(format!("Failed to parse geocoding response: {}", e))
        })?;

        Ok(places.first().and_then(parse_place))
    }
}

fn parse_place(place: &NominatimPlace) -> Option<GpsCoordinates> {
    let latitude = Decimal::from_str(place.lat.trim()).ok()?;
    let longitude = Decimal::from_str(place.lon.trim()).ok()?;
    Some(GpsCoordinates::new(latitude, longitude))
}
