//! Prediction generation and history

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use shared::storage::{load_list, save_list};
use shared::{ClimateObservation, CropCategory, CropRecord, PredictionRecord, StorageKey};
use std::collections::HashMap;
use uuid::Uuid;

use super::EstimationService;
use crate::error::{AppError, AppResult};
use crate::SharedStore;

/// Chart row: average predicted yield per crop category
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CropYieldSummary {
    pub category: CropCategory,
    pub average_yield: f64,
    pub predictions: usize,
}

#[derive(Clone)]
pub struct PredictionService {
    store: SharedStore,
    engine: EstimationService,
}

impl PredictionService {
    pub fn new(store: SharedStore, engine: EstimationService) -> Self {
        Self { store, engine }
    }

    /// Estimate every crop record of the user and append the results to the
    /// history in a single write
    pub fn generate(&self, user_id: Uuid, today: NaiveDate) -> AppResult<Vec<PredictionRecord>> {
        if !self.engine.is_ready() {
            return Err(AppError::NotInitialized);
        }

        let crops: Vec<CropRecord> = load_list(&*self.store, StorageKey::CropData(user_id))?;
        let observations: Vec<ClimateObservation> =
            load_list(&*self.store, StorageKey::ClimateData(user_id))?;

        let mut generated = Vec::with_capacity(crops.len());
        for crop in &crops {
            let estimate = self.engine.estimate(crop, &observations, today)?;
            let report = self.engine.advise(&estimate, crop, &observations);
            generated.push(PredictionRecord::new(
                user_id,
                crop.id,
                &estimate,
                report,
                self.engine.strategy(),
            ));
        }

        if !generated.is_empty() {
            let mut history = self.list(user_id)?;
            history.extend(generated.iter().cloned());
            save_list(&*self.store, StorageKey::Predictions(user_id), &history)?;
        }

        tracing::info!(
            user_id = %user_id,
            crops = crops.len(),
            observations = observations.len(),
            strategy = %self.engine.strategy(),
            "Predictions generated"
        );
        Ok(generated)
    }

    pub fn list(&self, user_id: Uuid) -> AppResult<Vec<PredictionRecord>> {
        Ok(load_list(&*self.store, StorageKey::Predictions(user_id))?)
    }

    /// Average yield per category, in category order. Predictions whose crop
    /// record no longer exists are skipped.
    pub fn summarize_by_crop(&self, user_id: Uuid) -> AppResult<Vec<CropYieldSummary>> {
        let crops: Vec<CropRecord> = load_list(&*self.store, StorageKey::CropData(user_id))?;
        let categories: HashMap<Uuid, CropCategory> =
            crops.iter().map(|c| (c.id, c.category)).collect();

        let mut totals: HashMap<CropCategory, (f64, usize)> = HashMap::new();
        for prediction in self.list(user_id)? {
            if let Some(category) = categories.get(&prediction.crop_record_id) {
                let entry = totals.entry(*category).or_insert((0.0, 0));
                entry.0 += prediction.predicted_yield;
                entry.1 += 1;
            }
        }

        Ok(CropCategory::ALL
            .iter()
            .filter_map(|category| {
                totals.get(category).map(|(sum, count)| CropYieldSummary {
                    category: *category,
                    average_yield: sum / *count as f64,
                    predictions: *count,
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::estimation::EngineSettings;
    use crate::services::CropService;
    use shared::{CropInput, EstimationStrategy, MemoryStore};
    use std::sync::Arc;

    fn crop_input(category: CropCategory, field_size: f64) -> CropInput {
        CropInput {
            category,
            planting_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            expected_harvest_date: None,
            field_size,
            fertilizer_type: String::new(),
            fertilizer_amount: 0.0,
            seed_variety: String::new(),
            irrigation_method: None,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, 1).unwrap()
    }

    #[test]
    fn test_generate_appends_one_record_per_crop() {
        let store: SharedStore = Arc::new(MemoryStore::new());
        let crops = CropService::new(store.clone());
        let predictions = PredictionService::new(store, EstimationService::new(EngineSettings::default()));
        let user = Uuid::new_v4();

        crops.create(user, crop_input(CropCategory::Maize, 2.0)).unwrap();
        crops.create(user, crop_input(CropCategory::Rice, 1.0)).unwrap();

        let generated = predictions.generate(user, today()).unwrap();
        assert_eq!(generated.len(), 2);
        assert_eq!(generated[0].confidence, 70);
        assert_eq!(generated[0].strategy, EstimationStrategy::Heuristic);

        predictions.generate(user, today()).unwrap();
        assert_eq!(predictions.list(user).unwrap().len(), 4);
    }

    #[test]
    fn test_generate_before_training_fails() {
        let store: SharedStore = Arc::new(MemoryStore::new());
        let engine = EstimationService::new(EngineSettings {
            strategy: EstimationStrategy::Learned,
            ..EngineSettings::default()
        });
        let predictions = PredictionService::new(store, engine);
        assert!(matches!(
            predictions.generate(Uuid::new_v4(), today()),
            Err(AppError::NotInitialized)
        ));
    }

    #[test]
    fn test_no_crops_writes_nothing() {
        let store = Arc::new(MemoryStore::new());
        let predictions = PredictionService::new(store.clone(), EstimationService::new(EngineSettings::default()));
        assert!(predictions.generate(Uuid::new_v4(), today()).unwrap().is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn test_summary_averages_per_category() {
        let store: SharedStore = Arc::new(MemoryStore::new());
        let crops = CropService::new(store.clone());
        let predictions = PredictionService::new(store, EstimationService::new(EngineSettings::default()));
        let user = Uuid::new_v4();

        crops.create(user, crop_input(CropCategory::Maize, 2.0)).unwrap();
        crops.create(user, crop_input(CropCategory::Maize, 4.0)).unwrap();
        crops.create(user, crop_input(CropCategory::Beans, 1.0)).unwrap();
        predictions.generate(user, today()).unwrap();

        let summary = predictions.summarize_by_crop(user).unwrap();
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].category, CropCategory::Maize);
        assert_eq!(summary[0].predictions, 2);
        assert!((summary[0].average_yield - 7.5).abs() < 1e-9);
        assert_eq!(summary[1].category, CropCategory::Beans);
        assert!((summary[1].average_yield - 0.9).abs() < 1e-9);
    }
}
