//! Crop planting records

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Crops the dashboard can estimate yields for
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CropCategory {
    Maize,
    Rice,
    Beans,
}

impl CropCategory {
    pub const ALL: [CropCategory; 3] = [CropCategory::Maize, CropCategory::Rice, CropCategory::Beans];

    /// Numeric encoding used as a regression feature
    pub fn index(&self) -> usize {
        match self {
            CropCategory::Maize => 0,
            CropCategory::Rice => 1,
            CropCategory::Beans => 2,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

impl std::fmt::Display for CropCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CropCategory::Maize => write!(f, "maize"),
            CropCategory::Rice => write!(f, "rice"),
            CropCategory::Beans => write!(f, "beans"),
        }
    }
}

/// How a field is watered
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IrrigationMethod {
    Rainfed,
    Sprinkler,
    Drip,
    Flood,
}

/// A planted field owned by one user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CropRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "cropType")]
    pub category: CropCategory,
    pub planting_date: NaiveDate,
    #[serde(default)]
    pub expected_harvest_date: Option<NaiveDate>,
    /// Field area in acres
    pub field_size: f64,
    #[serde(default)]
    pub fertilizer_type: String,
    /// Fertilizer applied in kg
    pub fertilizer_amount: f64,
    #[serde(default)]
    pub seed_variety: String,
    #[serde(default)]
    pub irrigation_method: Option<IrrigationMethod>,
    pub created_at: DateTime<Utc>,
}

impl CropRecord {
    /// Build a new record from validated form input
    pub fn new(user_id: Uuid, input: CropInput) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            category: input.category,
            planting_date: input.planting_date,
            expected_harvest_date: input.expected_harvest_date,
            field_size: input.field_size,
            fertilizer_type: input.fertilizer_type,
            fertilizer_amount: input.fertilizer_amount,
            seed_variety: input.seed_variety,
            irrigation_method: input.irrigation_method,
            created_at: Utc::now(),
        }
    }

    /// Overwrite the editable fields, keeping identity and creation time
    pub fn apply(&mut self, input: CropInput) {
        self.category = input.category;
        self.planting_date = input.planting_date;
        self.expected_harvest_date = input.expected_harvest_date;
        self.field_size = input.field_size;
        self.fertilizer_type = input.fertilizer_type;
        self.fertilizer_amount = input.fertilizer_amount;
        self.seed_variety = input.seed_variety;
        self.irrigation_method = input.irrigation_method;
    }

    pub fn has_seed_variety(&self) -> bool {
        !self.seed_variety.trim().is_empty()
    }
}

/// Form input for creating or editing a crop record
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_crop_input"))]
pub struct CropInput {
    #[serde(rename = "cropType")]
    pub category: CropCategory,
    pub planting_date: NaiveDate,
    #[serde(default)]
    pub expected_harvest_date: Option<NaiveDate>,
    pub field_size: f64,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub fertilizer_type: String,
    #[validate(range(min = 0.0))]
    pub fertilizer_amount: f64,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub seed_variety: String,
    #[serde(default)]
    pub irrigation_method: Option<IrrigationMethod>,
}

fn validate_crop_input(input: &CropInput) -> Result<(), ValidationError> {
    if !input.field_size.is_finite() || input.field_size <= 0.0 {
        return Err(ValidationError::new("field_size_must_be_positive"));
    }
    if !input.fertilizer_amount.is_finite() {
        return Err(ValidationError::new("fertilizer_amount_must_be_finite"));
    }
    if let Some(harvest) = input.expected_harvest_date {
        if harvest < input.planting_date {
            return Err(ValidationError::new("harvest_before_planting"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> CropInput {
        CropInput {
            category: CropCategory::Maize,
            planting_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            expected_harvest_date: NaiveDate::from_ymd_opt(2024, 8, 1),
            field_size: 2.0,
            fertilizer_type: "NPK".to_string(),
            fertilizer_amount: 50.0,
            seed_variety: "H614".to_string(),
            irrigation_method: Some(IrrigationMethod::Rainfed),
        }
    }

    #[test]
    fn test_valid_crop_input() {
        assert!(input().validate().is_ok());
    }

    #[test]
    fn test_zero_field_size_rejected() {
        let mut bad = input();
        bad.field_size = 0.0;
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_negative_fertilizer_rejected() {
        let mut bad = input();
        bad.fertilizer_amount = -1.0;
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_harvest_before_planting_rejected() {
        let mut bad = input();
        bad.expected_harvest_date = NaiveDate::from_ymd_opt(2024, 1, 1);
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_category_encoding() {
        for category in CropCategory::ALL {
            assert_eq!(CropCategory::from_index(category.index()), Some(category));
        }
        assert_eq!(CropCategory::from_index(3), None);
    }

    #[test]
    fn test_crop_record_uses_storage_keys() {
        let record = CropRecord::new(Uuid::new_v4(), input());
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["cropType"], "maize");
        assert_eq!(json["fieldSize"], 2.0);
        assert!(json.get("plantingDate").is_some());
    }
}
