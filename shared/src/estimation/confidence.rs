//! Confidence scoring

use chrono::{Datelike, NaiveDate};

use super::thresholds::ConfidenceWeights;
use crate::models::CropRecord;

/// Additive data-quality score, clamped to `[0, weights.max]`
///
/// Month proximity compares calendar months only, so a crop planted in
/// December is eleven months away from January regardless of year.
pub fn confidence_score(
    crop: &CropRecord,
    observation_count: usize,
    today: NaiveDate,
    weights: &ConfidenceWeights,
) -> f64 {
    let mut confidence = weights.base;

    if observation_count >= weights.moderate_history_count {
        confidence += weights.moderate_history_bonus;
    }
    if observation_count >= weights.long_history_count {
        confidence += weights.long_history_bonus;
    }
    if crop.fertilizer_amount > 0.0 {
        confidence += weights.fertilizer_bonus;
    }
    if crop.has_seed_variety() {
        confidence += weights.seed_variety_bonus;
    }

    let month_diff = today.month().abs_diff(crop.planting_date.month());
    if month_diff <= weights.season_window_months {
        confidence += weights.season_bonus;
    }

    confidence.clamp(0.0, weights.max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CropCategory;
    use chrono::Utc;
    use uuid::Uuid;

    fn crop(fertilizer_amount: f64, seed_variety: &str, planting_date: NaiveDate) -> CropRecord {
        CropRecord {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            category: CropCategory::Maize,
            planting_date,
            expected_harvest_date: None,
            field_size: 1.0,
            fertilizer_type: String::new(),
            fertilizer_amount,
            seed_variety: seed_variety.to_string(),
            irrigation_method: None,
            created_at: Utc::now(),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_base_only() {
        let today = date(2024, 9, 15);
        let c = crop(0.0, "", date(2024, 3, 15));
        let score = confidence_score(&c, 0, today, &ConfidenceWeights::default());
        assert_eq!(score, 0.7);
    }

    #[test]
    fn test_history_bonuses() {
        let today = date(2024, 9, 15);
        let c = crop(0.0, "", date(2024, 3, 15));
        let w = ConfidenceWeights::default();
        assert!((confidence_score(&c, 10, today, &w) - 0.8).abs() < 1e-9);
        assert!((confidence_score(&c, 29, today, &w) - 0.8).abs() < 1e-9);
        assert!((confidence_score(&c, 30, today, &w) - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_whitespace_variety_earns_nothing() {
        let today = date(2024, 9, 15);
        let c = crop(0.0, "   ", date(2024, 3, 15));
        assert_eq!(confidence_score(&c, 0, today, &ConfidenceWeights::default()), 0.7);
    }

    #[test]
    fn test_recent_planting_bonus() {
        let w = ConfidenceWeights::default();
        let c = crop(0.0, "", date(2024, 7, 1));
        assert!((confidence_score(&c, 0, date(2024, 9, 1), &w) - 0.8).abs() < 1e-9);
        assert!((confidence_score(&c, 0, date(2024, 10, 1), &w) - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_everything_is_capped() {
        let today = date(2024, 5, 1);
        let c = crop(120.0, "H614", date(2024, 4, 1));
        assert_eq!(confidence_score(&c, 45, today, &ConfidenceWeights::default()), 0.95);
    }
}
