//! Business logic services for the Shamba yield dashboard

pub mod auth;
pub mod climate;
pub mod crop;
pub mod estimation;
pub mod insights;
pub mod prediction;
pub mod preferences;

pub use auth::AuthService;
pub use climate::ClimateService;
pub use crop::CropService;
pub use estimation::{EngineSettings, EstimationService};
pub use insights::{InsightResult, InsightService, WeatherInsight};
pub use prediction::{CropYieldSummary, PredictionService};
pub use preferences::PreferenceService;
