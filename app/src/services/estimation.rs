//! Estimation engine service
//!
//! Wraps the pure engine in `shared` with strategy selection and the
//! one-time training step of the learned strategy. Training runs at most
//! once per service (clones share it); concurrent `initialize` callers all
//! await the same run. A failed run leaves the service uninitialized so a
//! later call can retry. A timed-out run keeps going in the background and
//! the next `initialize` waits on it instead of starting another.

use chrono::{NaiveDate, Utc};
use shared::estimation::{
    aggregate_with_reference, generate_advisory, heuristic, EntropyRandom, EstimationError,
    EstimationThresholds, LearnedSettings, ModelMetrics, RandomSource, SeededRandom, TrainedModels,
};
use shared::{AdvisoryReport, ClimateObservation, CropRecord, Estimate, EstimationStrategy};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, OnceCell};
use tokio::task::JoinHandle;

use crate::config::EngineConfig;
use crate::error::{AppError, AppResult};

/// Synthetic samples used by [`EstimationService::model_metrics`]
pub const METRICS_SAMPLES: usize = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub strategy: EstimationStrategy,
    pub jitter_enabled: bool,
    pub learned: LearnedSettings,
    pub training_seed: Option<u64>,
    pub training_timeout: Option<Duration>,
    pub thresholds: EstimationThresholds,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            strategy: EstimationStrategy::Heuristic,
            jitter_enabled: false,
            learned: LearnedSettings::default(),
            training_seed: None,
            training_timeout: None,
            thresholds: EstimationThresholds::default(),
        }
    }
}

impl From<&EngineConfig> for EngineSettings {
    fn from(config: &EngineConfig) -> Self {
        Self {
            strategy: config.strategy,
            jitter_enabled: config.jitter_enabled,
            learned: config.learned_settings(),
            training_seed: config.training_seed,
            training_timeout: config.training_timeout(),
            thresholds: config.thresholds.clone(),
        }
    }
}

type TrainingJob = JoinHandle<Result<TrainedModels, EstimationError>>;

#[derive(Clone)]
pub struct EstimationService {
    settings: Arc<EngineSettings>,
    models: Arc<OnceCell<Arc<TrainedModels>>>,
    /// Training job that outlived its timeout
    in_flight: Arc<Mutex<Option<TrainingJob>>>,
    training_runs: Arc<AtomicUsize>,
}

impl EstimationService {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings: Arc::new(settings),
            models: Arc::new(OnceCell::new()),
            in_flight: Arc::new(Mutex::new(None)),
            training_runs: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn strategy(&self) -> EstimationStrategy {
        self.settings.strategy
    }

    pub fn thresholds(&self) -> &EstimationThresholds {
        &self.settings.thresholds
    }

    /// Prepare the configured strategy. Returns immediately for the
    /// heuristic strategy and once training is done for the learned one.
    pub async fn initialize(&self) -> AppResult<()> {
        if self.settings.strategy == EstimationStrategy::Heuristic {
            return Ok(());
        }
        self.models.get_or_try_init(|| self.train()).await?;
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        match self.settings.strategy {
            EstimationStrategy::Heuristic => true,
            EstimationStrategy::Learned => self.models.initialized(),
        }
    }

    /// Estimate with the configured strategy; jitter, when enabled, draws
    /// from OS entropy
    pub fn estimate(
        &self,
        crop: &CropRecord,
        observations: &[ClimateObservation],
        today: NaiveDate,
    ) -> AppResult<Estimate> {
        let mut rng = EntropyRandom;
        self.estimate_with_rng(crop, observations, today, &mut rng)
    }

    pub fn estimate_with_rng(
        &self,
        crop: &CropRecord,
        observations: &[ClimateObservation],
        today: NaiveDate,
        rng: &mut dyn RandomSource,
    ) -> AppResult<Estimate> {
        let thresholds = &self.settings.thresholds;
        let estimate = match self.settings.strategy {
            EstimationStrategy::Heuristic => {
                let jitter = if self.settings.jitter_enabled {
                    Some(rng)
                } else {
                    None
                };
                heuristic::estimate(crop, observations, today, thresholds, jitter)?
            }
            EstimationStrategy::Learned => {
                let models = self.models.get().ok_or(AppError::NotInitialized)?;
                models.estimate(crop, observations, today, thresholds)?
            }
        };
        Ok(estimate)
    }

    pub fn advise(
        &self,
        estimate: &Estimate,
        crop: &CropRecord,
        observations: &[ClimateObservation],
    ) -> AdvisoryReport {
        let thresholds = &self.settings.thresholds;
        let climate = aggregate_with_reference(observations, &thresholds.reference_climate);
        generate_advisory(estimate, crop, &climate, &thresholds.advisory)
    }

    /// Error of the trained models on fresh synthetic data; `None` until the
    /// learned strategy has been trained
    pub fn model_metrics(&self) -> Option<ModelMetrics> {
        let models = self.models.get()?;
        let mut rng = SeededRandom::from_entropy();
        Some(models.metrics(
            METRICS_SAMPLES,
            &self.settings.learned.ranges,
            &self.settings.thresholds,
            &mut rng,
            Utc::now(),
        ))
    }

    fn spawn_training(&self) -> TrainingJob {
        let settings = Arc::clone(&self.settings);
        let run = self.training_runs.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::info!(
            run,
            samples = settings.learned.samples,
            yield_epochs = settings.learned.yield_training.epochs,
            climate_epochs = settings.learned.climate_training.epochs,
            "Training estimation models"
        );

        tokio::task::spawn_blocking(move || {
            let mut rng = match settings.training_seed {
                Some(seed) => SeededRandom::from_seed(seed),
                None => SeededRandom::from_entropy(),
            };
            TrainedModels::train(&settings.learned, &settings.thresholds, &mut rng)
        })
    }

    async fn train(&self) -> AppResult<Arc<TrainedModels>> {
        let mut in_flight = self.in_flight.lock().await;
        let mut task = match in_flight.take() {
            Some(task) => {
                tracing::info!("Waiting on model training started earlier");
                task
            }
            None => self.spawn_training(),
        };
        let started = Instant::now();

        let joined = match self.settings.training_timeout {
            Some(limit) => match tokio::time::timeout(limit, &mut task).await.ok() {
                Some(joined) => joined,
                None => {
                    tracing::error!(
                        timeout_ms = limit.as_millis() as u64,
                        "Model training timed out"
                    );
                    *in_flight = Some(task);
                    return Err(AppError::Internal("Model training timed out".to_string()));
                }
            },
            None => task.await,
        };

        let models = joined
            .map_err(|e| AppError::Internal(format!("Training task failed: {}", e)))??;

        tracing::info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            yield_validation = ?models.yield_report.validation,
            climate_validation = ?models.climate_report.validation,
            "Estimation models trained"
        );
        Ok(Arc::new(models))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::estimation::network::TrainingConfig;
    use shared::estimation::SequenceRandom;
    use shared::CropCategory;
    use uuid::Uuid;

    fn crop() -> CropRecord {
        CropRecord {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            category: CropCategory::Maize,
            planting_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            expected_harvest_date: None,
            field_size: 2.0,
            fertilizer_type: String::new(),
            fertilizer_amount: 0.0,
            seed_variety: String::new(),
            irrigation_method: None,
            created_at: Utc::now(),
        }
    }

    fn learned_settings() -> EngineSettings {
        let quick = TrainingConfig {
            epochs: 2,
            batch_size: 16,
            ..TrainingConfig::default()
        };
        EngineSettings {
            strategy: EstimationStrategy::Learned,
            learned: LearnedSettings {
                samples: 64,
                yield_training: quick,
                climate_training: quick,
                ..LearnedSettings::default()
            },
            training_seed: Some(42),
            ..EngineSettings::default()
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, 1).unwrap()
    }

    #[tokio::test]
    async fn test_heuristic_ready_immediately() {
        let engine = EstimationService::new(EngineSettings::default());
        assert!(engine.is_ready());
        engine.initialize().await.unwrap();
        let estimate = engine.estimate(&crop(), &[], today()).unwrap();
        assert!((estimate.yield_value - 5.0).abs() < 1e-9);
        assert!(engine.model_metrics().is_none());
    }

    #[tokio::test]
    async fn test_learned_requires_initialization() {
        let engine = EstimationService::new(learned_settings());
        assert!(!engine.is_ready());
        assert!(matches!(
            engine.estimate(&crop(), &[], today()),
            Err(AppError::NotInitialized)
        ));

        engine.initialize().await.unwrap();
        assert!(engine.is_ready());
        let estimate = engine.estimate(&crop(), &[], today()).unwrap();
        assert!(estimate.yield_value >= 0.0);
        assert!(engine.model_metrics().is_some());
    }

    #[tokio::test]
    async fn test_concurrent_initialize_trains_once() {
        let engine = EstimationService::new(learned_settings());
        let other = engine.clone();
        let (a, b) = tokio::join!(engine.initialize(), other.initialize());
        a.unwrap();
        b.unwrap();

        let first = engine.models.get().map(Arc::as_ptr);
        engine.initialize().await.unwrap();
        assert_eq!(engine.models.get().map(Arc::as_ptr), first);
        assert_eq!(engine.training_runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_training_timeout_leaves_engine_uninitialized() {
        let mut settings = learned_settings();
        settings.learned.samples = 1000;
        settings.learned.yield_training.epochs = 10;
        settings.training_timeout = Some(Duration::from_millis(1));
        let engine = EstimationService::new(settings);

        assert!(matches!(engine.initialize().await, Err(AppError::Internal(_))));
        assert!(!engine.is_ready());
        assert!(engine.in_flight.lock().await.is_some());
    }

    #[tokio::test]
    async fn test_retry_after_timeout_waits_for_same_run() {
        let mut settings = learned_settings();
        settings.learned.samples = 1000;
        settings.learned.yield_training.epochs = 10;
        settings.training_timeout = Some(Duration::from_millis(1));
        let engine = EstimationService::new(settings);
        assert!(matches!(engine.initialize().await, Err(AppError::Internal(_))));

        let mut retries = 0;
        while let Err(err) = engine.initialize().await {
            assert!(matches!(err, AppError::Internal(_)));
            retries += 1;
            assert!(retries < 5000, "training never finished");
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        assert!(engine.is_ready());
        assert_eq!(engine.training_runs.load(Ordering::SeqCst), 1);
        assert!(engine.in_flight.lock().await.is_none());
    }

    #[test]
    fn test_jitter_uses_injected_source() {
        let engine = EstimationService::new(EngineSettings {
            jitter_enabled: true,
            ..EngineSettings::default()
        });
        let mut rng = SequenceRandom::new(vec![0.0, 0.0]);
        let estimate = engine.estimate_with_rng(&crop(), &[], today(), &mut rng).unwrap();
        assert_eq!(estimate.rainfall_value, 950.0);
        assert_eq!(estimate.temperature_value, 21.5);
    }

    #[test]
    fn test_advice_uses_aggregate_humidity() {
        let engine = EstimationService::new(EngineSettings::default());
        let estimate = Estimate {
            yield_value: 1.0,
            rainfall_value: 1000.0,
            temperature_value: 24.0,
            confidence: 0.7,
        };
        let report = engine.advise(&estimate, &crop(), &[]);
        assert!(report
            .recommendations
            .contains(&"Consider drought-resistant maize varieties like H516".to_string()));
        assert!(!report
            .recommendations
            .contains(&"Monitor for gray leaf spot disease".to_string()));
    }
}
