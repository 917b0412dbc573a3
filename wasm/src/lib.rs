//! WebAssembly module for the Shamba yield dashboard
//!
//! Provides client-side computation for:
//! - Climate aggregation and heuristic yield estimates
//! - Confidence scoring and advisory reports
//! - Prediction generation against `localStorage`
//!
//! Structured arguments and results cross the boundary as JSON strings using
//! the same camelCase layout that is persisted.

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use shared::estimation::{self, heuristic, EntropyRandom, EstimationThresholds, RandomSource};
use shared::storage::{load_list, save_list};
use uuid::Uuid;
use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::storage::{KeyValueStore, StorageError, StorageKey};
pub use shared::types::*;

/// `localStorage` adapter for the key-value contract
pub struct LocalStorageStore {
    storage: web_sys::Storage,
}

impl LocalStorageStore {
    pub fn new() -> Result<Self, StorageError> {
        let storage = web_sys::window()
            .ok_or_else(|| StorageError::Backend("no window".into()))?
            .local_storage()
            .map_err(backend_error)?
            .ok_or_else(|| StorageError::Backend("localStorage is disabled".into()))?;
        Ok(Self { storage })
    }
}

impl KeyValueStore for LocalStorageStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.storage.get_item(key).map_err(backend_error)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.storage.set_item(key, value).map_err(backend_error)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.storage.remove_item(key).map_err(backend_error)
    }
}

fn backend_error(err: JsValue) -> StorageError {
    StorageError::Backend(err.as_string().unwrap_or_else(|| format!("{:?}", err)))
}

fn to_js(message: String) -> JsValue {
    JsValue::from_str(&message)
}

fn parse<T: DeserializeOwned>(what: &str, json: &str) -> Result<T, String> {
    serde_json::from_str(json).map_err(|e| format!("Invalid {} JSON: {}", what, e))
}

fn render<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| format!("Failed to serialize result: {}", e))
}

fn parse_date(today: &str) -> Result<NaiveDate, String> {
    today
        .trim()
        .parse::<NaiveDate>()
        .map_err(|e| format!("Invalid date '{}': {}", today, e))
}

/// Local calendar date of the browser
fn browser_today() -> Result<NaiveDate, String> {
    let now = js_sys::Date::new_0();
    NaiveDate::from_ymd_opt(now.get_full_year() as i32, now.get_month() + 1, now.get_date())
        .ok_or_else(|| "Browser clock returned an invalid date".to_string())
}

/// `YYYY-MM-DD`, or the browser's current date when blank
fn resolve_date(today: &str) -> Result<NaiveDate, String> {
    if today.trim().is_empty() {
        browser_today()
    } else {
        parse_date(today)
    }
}

fn aggregate_json(observations_json: &str) -> Result<String, String> {
    let observations: Vec<ClimateObservation> = parse("observations", observations_json)?;
    render(&estimation::aggregate_climate(&observations))
}

fn estimate_json(
    crop_json: &str,
    observations_json: &str,
    today: &str,
    jitter: Option<&mut dyn RandomSource>,
) -> Result<String, String> {
    let crop: CropRecord = parse("crop", crop_json)?;
    let observations: Vec<ClimateObservation> = parse("observations", observations_json)?;
    let thresholds = EstimationThresholds::default();
    let estimate = heuristic::estimate(&crop, &observations, parse_date(today)?, &thresholds, jitter)
        .map_err(|e| e.to_string())?;
    render(&estimate)
}

fn advisory_json(estimate_json: &str, crop_json: &str, observations_json: &str) -> Result<String, String> {
    let estimate: Estimate = parse("estimate", estimate_json)?;
    let crop: CropRecord = parse("crop", crop_json)?;
    let observations: Vec<ClimateObservation> = parse("observations", observations_json)?;
    let thresholds = EstimationThresholds::default();
    let climate = estimation::aggregate_with_reference(&observations, &thresholds.reference_climate);
    render(&estimation::generate_advisory(&estimate, &crop, &climate, &thresholds.advisory))
}

/// Estimate every stored crop of a user and append the results to their
/// prediction history
fn generate_into<S: KeyValueStore + ?Sized>(
    store: &S,
    user_id: Uuid,
    today: NaiveDate,
    jitter: bool,
) -> Result<Vec<PredictionRecord>, String> {
    let thresholds = EstimationThresholds::default();
    let mut entropy = EntropyRandom;
    let crops: Vec<CropRecord> =
        load_list(store, StorageKey::CropData(user_id)).map_err(|e| e.to_string())?;
    let observations: Vec<ClimateObservation> =
        load_list(store, StorageKey::ClimateData(user_id)).map_err(|e| e.to_string())?;
    let climate = estimation::aggregate_with_reference(&observations, &thresholds.reference_climate);

    let mut generated = Vec::with_capacity(crops.len());
    for crop in &crops {
        let rng = if jitter {
            Some(&mut entropy as &mut dyn RandomSource)
        } else {
            None
        };
        let estimate = heuristic::estimate(crop, &observations, today, &thresholds, rng)
            .map_err(|e| e.to_string())?;
        let report = estimation::generate_advisory(&estimate, crop, &climate, &thresholds.advisory);
        generated.push(PredictionRecord::new(
            user_id,
            crop.id,
            &estimate,
            report,
            EstimationStrategy::Heuristic,
        ));
    }

    if !generated.is_empty() {
        let mut history: Vec<PredictionRecord> =
            load_list(store, StorageKey::Predictions(user_id)).map_err(|e| e.to_string())?;
        history.extend(generated.iter().cloned());
        save_list(store, StorageKey::Predictions(user_id), &history).map_err(|e| e.to_string())?;
    }
    Ok(generated)
}

/// Mean of the given observations, or the reference climate when empty
#[wasm_bindgen]
pub fn aggregate_climate(observations_json: &str) -> Result<String, JsValue> {
    aggregate_json(observations_json).map_err(to_js)
}

/// Heuristic estimate for one crop record; `today` is `YYYY-MM-DD`
#[wasm_bindgen]
pub fn estimate_yield(
    crop_json: &str,
    observations_json: &str,
    today: &str,
    jitter: bool,
) -> Result<String, JsValue> {
    let mut rng = EntropyRandom;
    let jitter = jitter.then_some(&mut rng as &mut dyn RandomSource);
    estimate_json(crop_json, observations_json, today, jitter).map_err(to_js)
}

#[wasm_bindgen]
pub fn confidence_score(crop_json: &str, observation_count: usize, today: &str) -> Result<f64, JsValue> {
    let crop: CropRecord = parse("crop", crop_json).map_err(to_js)?;
    let today = parse_date(today).map_err(to_js)?;
    let weights = EstimationThresholds::default().confidence;
    Ok(estimation::confidence_score(&crop, observation_count, today, &weights))
}

#[wasm_bindgen]
pub fn generate_advisory(
    estimate_json: &str,
    crop_json: &str,
    observations_json: &str,
) -> Result<String, JsValue> {
    advisory_json(estimate_json, crop_json, observations_json).map_err(to_js)
}

/// Rendered storage key for a table, e.g. `cropData_<uuid>`
#[wasm_bindgen]
pub fn storage_key(table: &str, user_id: &str) -> Result<String, JsValue> {
    storage_key_for(table, user_id).map_err(to_js)
}

fn storage_key_for(table: &str, user_id: &str) -> Result<String, String> {
    let user = || Uuid::parse_str(user_id.trim()).map_err(|e| format!("Invalid user id: {}", e));
    let key = match table {
        "users" => StorageKey::Users,
        "currentUser" => StorageKey::CurrentUser,
        "language" => StorageKey::Language,
        "cropData" => StorageKey::CropData(user()?),
        "climateData" => StorageKey::ClimateData(user()?),
        "predictions" => StorageKey::Predictions(user()?),
        other => return Err(format!("Unknown table '{}'", other)),
    };
    Ok(key.render())
}

/// Generate predictions from the user's stored records and persist them.
/// A blank `today` uses the browser clock.
#[wasm_bindgen]
pub fn generate_predictions(user_id: &str, today: &str, jitter: bool) -> Result<String, JsValue> {
    let user_id = Uuid::parse_str(user_id.trim())
        .map_err(|e| to_js(format!("Invalid user id: {}", e)))?;
    let today = resolve_date(today).map_err(to_js)?;
    let store = LocalStorageStore::new().map_err(|e| to_js(e.to_string()))?;
    let generated = generate_into(&store, user_id, today, jitter).map_err(to_js)?;
    render(&generated).map_err(to_js)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::MemoryStore;

    const CROP: &str = r#"{
        "id": "6d1f3c2e-8a4b-4c8e-9f10-2b3c4d5e6f70",
        "userId": "00000000-0000-0000-0000-000000000000",
        "cropType": "maize",
        "plantingDate": "2024-03-01",
        "fieldSize": 2.0,
        "fertilizerType": "DAP",
        "fertilizerAmount": 20.0,
        "seedVariety": "",
        "createdAt": "2024-03-01T08:00:00Z"
    }"#;

    fn dry_observations(count: usize) -> String {
        let row = r#"{"id":"11111111-2222-4333-8444-555555555555","userId":"00000000-0000-0000-0000-000000000000","date":"2024-08-01","temperature":32.0,"rainfall":400.0,"humidity":85.0,"windSpeed":6.0,"solarRadiation":18.0,"createdAt":"2024-08-01T08:00:00Z"}"#;
        format!("[{}]", vec![row; count].join(","))
    }

    #[test]
    fn test_estimate_drought() {
        let json = estimate_json(CROP, &dry_observations(12), "2024-09-01", None).unwrap();
        let estimate: Estimate = serde_json::from_str(&json).unwrap();
        assert!((estimate.yield_value - 3.42).abs() < 1e-9);
        assert!((estimate.confidence - 0.85).abs() < 1e-9);
    }

    #[test]
    fn test_aggregate_empty_is_reference() {
        let json = aggregate_json("[]").unwrap();
        let climate: ClimateAggregate = serde_json::from_str(&json).unwrap();
        assert_eq!(climate, ClimateAggregate::REFERENCE);
    }

    #[test]
    fn test_bad_input_reports_message() {
        assert!(estimate_json("{}", "[]", "2024-09-01", None).unwrap_err().contains("crop"));
        assert!(estimate_json(CROP, "[]", "September", None).unwrap_err().contains("Invalid date"));
    }

    #[test]
    fn test_advisory_from_estimate() {
        let estimate = estimate_json(CROP, &dry_observations(12), "2024-09-01", None).unwrap();
        let json = advisory_json(&estimate, CROP, &dry_observations(12)).unwrap();
        let report: AdvisoryReport = serde_json::from_str(&json).unwrap();
        assert!(report
            .risk_factors
            .contains(&"Below-average rainfall predicted - drought risk".to_string()));
    }

    #[test]
    fn test_storage_keys() {
        let user = "6d1f3c2e-8a4b-4c8e-9f10-2b3c4d5e6f70";
        assert_eq!(storage_key_for("cropData", user).unwrap(), format!("cropData_{}", user));
        assert_eq!(storage_key_for("currentUser", "").unwrap(), "currentUser");
        assert!(storage_key_for("predictions", "nope").is_err());
        assert!(storage_key_for("harvests", user).is_err());
    }

    #[test]
    fn test_generate_into_appends_history() {
        let store = MemoryStore::new();
        let user = Uuid::nil();
        store.set(&StorageKey::CropData(user).render(), &format!("[{}]", CROP)).unwrap();
        store.set(&StorageKey::ClimateData(user).render(), &dry_observations(12)).unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 9, 1).unwrap();

        let first = generate_into(&store, user, today, false).unwrap();
        generate_into(&store, user, today, false).unwrap();

        assert_eq!(first.len(), 1);
        assert_eq!(first[0].confidence, 85);
        let history: Vec<PredictionRecord> = load_list(&store, StorageKey::Predictions(user)).unwrap();
        assert_eq!(history.len(), 2);
    }
}
