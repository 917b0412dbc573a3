//! Learned strategy: two regressors trained on synthetic agronomic data

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::aggregate::aggregate_with_reference;
use super::confidence::confidence_score;
use super::network::{Evaluation, Regressor, TrainingConfig, TrainingReport};
use super::random::RandomSource;
use super::synthetic::{
    climate_features, generate_training_set, yield_features, SyntheticRanges, CLIMATE_FEATURES,
    YIELD_FEATURES,
};
use super::thresholds::EstimationThresholds;
use super::{validate_inputs, EstimationError};
use crate::models::{ClimateObservation, CropRecord, Estimate};

pub const YIELD_LAYERS: [usize; 5] = [YIELD_FEATURES, 64, 32, 16, 1];
pub const CLIMATE_LAYERS: [usize; 4] = [CLIMATE_FEATURES, 32, 16, 2];

#[derive(Debug, Clone, PartialEq)]
pub struct LearnedSettings {
    pub samples: usize,
    pub ranges: SyntheticRanges,
    pub yield_training: TrainingConfig,
    pub climate_training: TrainingConfig,
}

impl Default for LearnedSettings {
    fn default() -> Self {
        Self {
            samples: 1000,
            ranges: SyntheticRanges::default(),
            yield_training: TrainingConfig::default(),
            climate_training: TrainingConfig {
                epochs: 30,
                batch_size: 16,
                ..TrainingConfig::default()
            },
        }
    }
}

/// Error of both models on freshly generated samples
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    pub yield_loss: f64,
    pub yield_mae: f64,
    pub climate_loss: f64,
    pub climate_mae: f64,
    pub evaluated_at: DateTime<Utc>,
}

/// Pair of trained models; immutable once built
#[derive(Debug, Clone)]
pub struct TrainedModels {
    yield_model: Regressor,
    climate_model: Regressor,
    pub yield_report: TrainingReport,
    pub climate_report: TrainingReport,
}

impl TrainedModels {
    pub fn train(
        settings: &LearnedSettings,
        thresholds: &EstimationThresholds,
        rng: &mut dyn RandomSource,
    ) -> Result<Self, EstimationError> {
        if settings.samples < 2 {
            return Err(EstimationError::InvalidInput {
                field: "samples",
                reason: "at least two training samples are required".to_string(),
            });
        }
        let set = generate_training_set(settings.samples, &settings.ranges, thresholds, rng);

        let mut yield_model = Regressor::new(&YIELD_LAYERS, rng)?;
        let yield_report = yield_model.fit(
            &set.yield_inputs,
            &set.yield_targets,
            &settings.yield_training,
            rng,
        )?;

        let mut climate_model = Regressor::new(&CLIMATE_LAYERS, rng)?;
        let climate_report = climate_model.fit(
            &set.climate_inputs,
            &set.climate_targets,
            &settings.climate_training,
            rng,
        )?;

        Ok(Self {
            yield_model,
            climate_model,
            yield_report,
            climate_report,
        })
    }

    pub fn estimate(
        &self,
        crop: &CropRecord,
        observations: &[ClimateObservation],
        today: NaiveDate,
        thresholds: &EstimationThresholds,
    ) -> Result<Estimate, EstimationError> {
        validate_inputs(crop, observations)?;
        let climate = aggregate_with_reference(observations, &thresholds.reference_climate);

        let yield_row = yield_features(&climate, crop.category, crop.field_size, crop.fertilizer_amount);
        let yield_value = self.yield_model.predict(&yield_row).first().copied().unwrap_or(0.0);

        let climate_row = climate_features(&climate, today.month0());
        let forecast = self.climate_model.predict(&climate_row);
        let rainfall_value = forecast.first().copied().unwrap_or(climate.rainfall);
        let temperature_value = forecast.get(1).copied().unwrap_or(climate.temperature);

        if ![yield_value, temperature_value, rainfall_value].iter().all(|v| v.is_finite()) {
            return Err(EstimationError::InvalidInput {
                field: "model_output",
                reason: "model produced a non-finite value".to_string(),
            });
        }

        Ok(Estimate {
            yield_value: yield_value.max(0.0),
            rainfall_value: rainfall_value.max(0.0),
            temperature_value,
            confidence: confidence_score(crop, observations.len(), today, &thresholds.confidence),
        })
    }

    /// Evaluate both models on `samples` newly generated rows
    pub fn metrics(
        &self,
        samples: usize,
        ranges: &SyntheticRanges,
        thresholds: &EstimationThresholds,
        rng: &mut dyn RandomSource,
        evaluated_at: DateTime<Utc>,
    ) -> ModelMetrics {
        let set = generate_training_set(samples, ranges, thresholds, rng);
        let Evaluation {
            loss: yield_loss,
            mae: yield_mae,
        } = self.yield_model.evaluate(&set.yield_inputs, &set.yield_targets);
        let Evaluation {
            loss: climate_loss,
            mae: climate_mae,
        } = self.climate_model.evaluate(&set.climate_inputs, &set.climate_targets);
        ModelMetrics {
            yield_loss,
            yield_mae,
            climate_loss,
            climate_mae,
            evaluated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimation::random::SeededRandom;
    use crate::models::CropCategory;
    use uuid::Uuid;

    fn quick_settings() -> LearnedSettings {
        let quick = TrainingConfig {
            epochs: 5,
            batch_size: 16,
            ..TrainingConfig::default()
        };
        LearnedSettings {
            samples: 200,
            yield_training: quick,
            climate_training: quick,
            ..LearnedSettings::default()
        }
    }

    fn crop() -> CropRecord {
        CropRecord {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            category: CropCategory::Rice,
            planting_date: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            expected_harvest_date: None,
            field_size: 2.0,
            fertilizer_type: String::new(),
            fertilizer_amount: 80.0,
            seed_variety: String::new(),
            irrigation_method: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_trained_estimate_is_well_formed() {
        let thresholds = EstimationThresholds::default();
        let mut rng = SeededRandom::from_seed(21);
        let models = TrainedModels::train(&quick_settings(), &thresholds, &mut rng).unwrap();
        assert_eq!(models.yield_report.validation_samples, 40);

        let today = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let estimate = models.estimate(&crop(), &[], today, &thresholds).unwrap();
        assert!(estimate.yield_value >= 0.0);
        assert!(estimate.rainfall_value >= 0.0);
        assert!(estimate.temperature_value.is_finite());
        assert!((0.0..=0.95).contains(&estimate.confidence));
    }

    #[test]
    fn test_same_seed_same_models() {
        let thresholds = EstimationThresholds::default();
        let today = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let a = TrainedModels::train(&quick_settings(), &thresholds, &mut SeededRandom::from_seed(4)).unwrap();
        let b = TrainedModels::train(&quick_settings(), &thresholds, &mut SeededRandom::from_seed(4)).unwrap();
        assert_eq!(
            a.estimate(&crop(), &[], today, &thresholds).unwrap(),
            b.estimate(&crop(), &[], today, &thresholds).unwrap()
        );
    }

    #[test]
    fn test_metrics_are_finite() {
        let thresholds = EstimationThresholds::default();
        let mut rng = SeededRandom::from_seed(8);
        let models = TrainedModels::train(&quick_settings(), &thresholds, &mut rng).unwrap();
        let metrics = models.metrics(100, &SyntheticRanges::default(), &thresholds, &mut rng, Utc::now());
        assert!(metrics.yield_loss.is_finite() && metrics.yield_loss >= 0.0);
        assert!(metrics.climate_mae.is_finite() && metrics.climate_mae >= 0.0);
    }

    fn reading(temperature: f64, rainfall: f64, humidity: f64) -> ClimateObservation {
        ClimateObservation {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            date: NaiveDate::from_ymd_opt(2024, 4, 15).unwrap(),
            temperature,
            rainfall,
            humidity,
            wind_speed: 8.0,
            solar_radiation: 20.0,
            location: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_seeded_models_give_plausible_scenarios() {
        let thresholds = EstimationThresholds::default();
        let settings = LearnedSettings {
            samples: 400,
            yield_training: TrainingConfig {
                epochs: 20,
                batch_size: 16,
                ..TrainingConfig::default()
            },
            ..quick_settings()
        };
        let mut rng = SeededRandom::from_seed(2024);
        let models = TrainedModels::train(&settings, &thresholds, &mut rng).unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();

        let mut maize = crop();
        maize.category = CropCategory::Maize;
        maize.fertilizer_amount = 0.0;
        let drought = models
            .estimate(&maize, &[reading(32.0, 400.0, 85.0)], today, &thresholds)
            .unwrap();
        assert!((0.0..40.0).contains(&drought.yield_value));
        assert!((0.0..2500.0).contains(&drought.rainfall_value));
        assert!((15.0..45.0).contains(&drought.temperature_value));
        assert!((drought.confidence - 0.8).abs() < 1e-9);

        let mut beans = crop();
        beans.category = CropCategory::Beans;
        beans.seed_variety = "Rosecoco".to_string();
        let wet = models
            .estimate(&beans, &[reading(31.0, 1450.0, 70.0)], today, &thresholds)
            .unwrap();
        assert!((0.0..40.0).contains(&wet.yield_value));
        assert!((500.0..2500.0).contains(&wet.rainfall_value));
        assert!((15.0..45.0).contains(&wet.temperature_value));
        assert!((wet.confidence - 0.9).abs() < 1e-9);

        let mut small = crop();
        small.field_size = 0.5;
        let mut large = crop();
        large.field_size = 5.0;
        let typical = [reading(24.0, 1000.0, 70.0)];
        let small_yield = models.estimate(&small, &typical, today, &thresholds).unwrap().yield_value;
        let large_yield = models.estimate(&large, &typical, today, &thresholds).unwrap().yield_value;
        assert!(large_yield > small_yield);

        let metrics = models.metrics(200, &settings.ranges, &thresholds, &mut rng, Utc::now());
        for value in [metrics.yield_loss, metrics.yield_mae, metrics.climate_loss, metrics.climate_mae] {
            assert!(value.is_finite() && value >= 0.0);
        }
        assert!(metrics.yield_mae < 3.0);
    }

    #[test]
    fn test_too_few_samples() {
        let settings = LearnedSettings {
            samples: 1,
            ..quick_settings()
        };
        let result = TrainedModels::train(&settings, &EstimationThresholds::default(), &mut SeededRandom::from_seed(1));
        assert!(matches!(result, Err(EstimationError::InvalidInput { field: "samples", .. })));
    }
}
