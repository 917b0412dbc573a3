//! Shamba yield dashboard services
//!
//! Record keeping and yield estimation for smallholder farms. Everything is
//! persisted through a flat [`KeyValueStore`]; the estimation engine itself
//! lives in the `shared` crate.

pub mod config;
pub mod error;
pub mod external;
pub mod services;
pub mod telemetry;

use shared::KeyValueStore;
use std::sync::Arc;

pub use config::Config;
pub use error::{AppError, AppResult, ErrorDetail};

use external::{
    ChatCompletionClient, Geocoder, NominatimGeocoder, OpenMeteoClient, TextGenerator,
    WeatherHistory,
};
use services::{
    AuthService, ClimateService, CropService, EngineSettings, EstimationService, InsightService,
    PredictionService, PreferenceService,
};

/// Store handle shared by every service
pub type SharedStore = Arc<dyn KeyValueStore + Send + Sync>;

/// Application state wiring every service to one store
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub auth: AuthService,
    pub preferences: PreferenceService,
    pub crops: CropService,
    pub climate: ClimateService,
    pub engine: EstimationService,
    pub predictions: PredictionService,
    pub insights: InsightService,
}

impl AppState {
    /// Build the state with the real HTTP collaborators
    pub fn new(config: Config, store: SharedStore) -> AppResult<Self> {
        let http = external::http_client(config.http.timeout())?;
        let geocoder = Arc::new(NominatimGeocoder::new(http.clone(), &config.geocoding.endpoint));
        let weather = Arc::new(OpenMeteoClient::new(
            http.clone(),
            &config.weather.endpoint,
            &config.weather.timezone,
        ));
        let text = Arc::new(ChatCompletionClient::new(
            http,
            &config.text_generation.endpoint,
            &config.text_generation.api_key,
            &config.text_generation.model,
        ));
        Ok(Self::with_collaborators(config, store, geocoder, weather, text))
    }

    pub fn with_collaborators(
        config: Config,
        store: SharedStore,
        geocoder: Arc<dyn Geocoder>,
        weather: Arc<dyn WeatherHistory>,
        text: Arc<dyn TextGenerator>,
    ) -> Self {
        let engine = EstimationService::new(EngineSettings::from(&config.engine));

        tracing::info!(
            environment = %config.environment,
            strategy = %engine.strategy(),
            "Shamba services configured"
        );

        Self {
            auth: AuthService::new(store.clone()),
            preferences: PreferenceService::new(store.clone()),
            crops: CropService::new(store.clone()),
            climate: ClimateService::new(store.clone(), geocoder, weather),
            predictions: PredictionService::new(store, engine.clone()),
            insights: InsightService::new(
                text,
                &config.text_generation,
                engine.thresholds().reference_climate,
            ),
            engine,
            config: Arc::new(config),
        }
    }
}
