//! Configuration management for the Shamba yield dashboard
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with SHAMBA_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;
use shared::estimation::network::TrainingConfig;
use shared::estimation::{EstimationThresholds, LearnedSettings};
use shared::EstimationStrategy;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    pub logging: LoggingConfig,

    /// Estimation engine configuration
    pub engine: EngineConfig,

    /// Geocoding API configuration
    pub geocoding: GeocodingConfig,

    /// Weather history API configuration
    pub weather: WeatherConfig,

    /// Text-generation API configuration
    pub text_generation: TextGenerationConfig,

    pub http: HttpConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Default `EnvFilter` directive, overridden by `RUST_LOG`
    pub filter: String,

    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EngineConfig {
    /// `heuristic` or `learned`
    pub strategy: EstimationStrategy,

    /// Perturb heuristic rainfall/temperature with uniform jitter
    pub jitter_enabled: bool,

    /// Synthetic samples generated for training
    pub training_samples: usize,

    pub yield_epochs: usize,

    pub climate_epochs: usize,

    /// Fixed seed for reproducible training; entropy when absent
    pub training_seed: Option<u64>,

    /// Abort training after this many seconds
    pub training_timeout_secs: Option<u64>,

    /// Recalibrated thresholds; documented constants when absent
    #[serde(default)]
    pub thresholds: EstimationThresholds,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeocodingConfig {
    /// Nominatim-compatible endpoint
    pub endpoint: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WeatherConfig {
    /// Open-Meteo-compatible endpoint
    pub endpoint: String,

    /// IANA zone used to cut daily aggregates
    pub timezone: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TextGenerationConfig {
    /// OpenAI-compatible endpoint
    pub endpoint: String,

    /// Bearer token; insights fall back to static text when empty
    pub api_key: String,

    pub model: String,

    pub max_tokens: u32,

    pub temperature: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    /// Request timeout for every external call
    pub timeout_secs: u64,
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let environment =
            std::env::var("SHAMBA_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = Self::defaults(config::Config::builder(), &environment)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (SHAMBA_ prefix)
            .add_source(Self::environment())
            .build()?;

        config.try_deserialize()
    }

    /// Code defaults only, no files or environment
    pub fn from_defaults() -> Result<Self, ConfigError> {
        Self::defaults(config::Config::builder(), "development")?
            .build()?
            .try_deserialize()
    }

    fn environment() -> Environment {
        Environment::with_prefix("SHAMBA")
            .separator("__")
            .try_parsing(true)
    }

    fn defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
        environment: &str,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        builder
            .set_default("environment", environment)?
            .set_default("logging.filter", "shamba_app=debug,reqwest=warn")?
            .set_default("logging.json", false)?
            .set_default("engine.strategy", "heuristic")?
            .set_default("engine.jitter_enabled", false)?
            .set_default("engine.training_samples", 1000)?
            .set_default("engine.yield_epochs", 50)?
            .set_default("engine.climate_epochs", 30)?
            .set_default("geocoding.endpoint", "https://nominatim.openstreetmap.org")?
            .set_default("weather.endpoint", "https://api.open-meteo.com")?
            .set_default("weather.timezone", "Africa/Nairobi")?
            .set_default("text_generation.endpoint", "https://api.together.xyz/v1")?
            .set_default("text_generation.api_key", "")?
            .set_default("text_generation.model", "meta-llama/Llama-2-7b-chat-hf")?
            .set_default("text_generation.max_tokens", 500)?
            .set_default("text_generation.temperature", 0.7)?
            .set_default("http.timeout_secs", 30)
    }
}

impl EngineConfig {
    /// Training settings derived from the configured sample and epoch counts
    pub fn learned_settings(&self) -> LearnedSettings {
        let defaults = LearnedSettings::default();
        LearnedSettings {
            samples: self.training_samples,
            yield_training: TrainingConfig {
                epochs: self.yield_epochs,
                ..defaults.yield_training
            },
            climate_training: TrainingConfig {
                epochs: self.climate_epochs,
                ..defaults.climate_training
            },
            ..defaults
        }
    }

    pub fn training_timeout(&self) -> Option<Duration> {
        self.training_timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_deserialize() {
        let config = Config::from_defaults().unwrap();
        assert_eq!(config.engine.strategy, EstimationStrategy::Heuristic);
        assert!(!config.engine.jitter_enabled);
        assert_eq!(config.engine.training_samples, 1000);
        assert_eq!(config.engine.training_seed, None);
        assert_eq!(config.text_generation.max_tokens, 500);
        assert_eq!(config.http.timeout(), Duration::from_secs(30));
        assert_eq!(config.engine.thresholds, EstimationThresholds::default());
    }

    #[test]
    fn test_nested_threshold_override_merges_with_defaults() {
        let variables = config::Map::from([
            ("SHAMBA__ENGINE__THRESHOLDS__CONFIDENCE__MAX".to_string(), "0.9".to_string()),
            ("SHAMBA__ENGINE__THRESHOLDS__JITTER__RAINFALL".to_string(), "40".to_string()),
        ]);
        let config: Config = Config::defaults(config::Config::builder(), "test")
            .unwrap()
            .add_source(Config::environment().source(Some(variables)))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        let defaults = EstimationThresholds::default();
        let thresholds = &config.engine.thresholds;
        assert_eq!(thresholds.confidence.max, 0.9);
        assert_eq!(thresholds.confidence.base, defaults.confidence.base);
        assert_eq!(thresholds.confidence.season_bonus, defaults.confidence.season_bonus);
        assert_eq!(thresholds.jitter.rainfall, 40.0);
        assert_eq!(thresholds.jitter.temperature, defaults.jitter.temperature);
        assert_eq!(thresholds.advisory, defaults.advisory);
        assert_eq!(thresholds.base_yields, defaults.base_yields);
    }

    #[test]
    fn test_learned_settings_follow_epochs() {
        let mut engine = Config::from_defaults().unwrap().engine;
        engine.yield_epochs = 7;
        engine.climate_epochs = 3;
        engine.training_samples = 50;
        let settings = engine.learned_settings();
        assert_eq!(settings.samples, 50);
        assert_eq!(settings.yield_training.epochs, 7);
        assert_eq!(settings.yield_training.batch_size, 32);
        assert_eq!(settings.climate_training.epochs, 3);
        assert_eq!(settings.climate_training.batch_size, 16);
    }
}
