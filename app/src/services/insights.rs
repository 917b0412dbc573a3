//! Narrative insights from the text-generation collaborator
//!
//! Failures here never reach the caller: unparseable replies and transport
//! errors are replaced with fixed advice so the dashboard always renders.

use regex::Regex;
use serde::{Deserialize, Serialize};
use shared::estimation::aggregate_with_reference;
use shared::{ClimateAggregate, ClimateObservation, CropCategory};
use std::sync::{Arc, OnceLock};

use crate::config::TextGenerationConfig;
use crate::external::{CompletionRequest, TextGenerator};

const SUMMARY_PREVIEW_CHARS: usize = 200;
const MAX_ADVICE_LINES: usize = 5;
const MIN_ADVICE_CHARS: usize = 10;
const ADVICE_MAX_TOKENS: u32 = 300;
const ADVICE_TEMPERATURE: f64 = 0.6;

const UNSTRUCTURED_RECOMMENDATIONS: [&str; 3] = [
    "Monitor weather conditions regularly",
    "Adjust irrigation based on rainfall patterns",
    "Consider climate-adapted varieties",
];

const UNSTRUCTURED_RISKS: [&str; 3] = [
    "Temperature fluctuations",
    "Irregular rainfall patterns",
    "Humidity-related diseases",
];

const FALLBACK_RECOMMENDATIONS: [&str; 4] = [
    "Implement water conservation techniques",
    "Use appropriate fertilizer timing",
    "Monitor for pest and disease pressure",
    "Consider intercropping for risk mitigation",
];

const FALLBACK_RISKS: [&str; 4] = [
    "Climate variability",
    "Seasonal weather changes",
    "Potential drought stress",
    "Disease pressure from humidity",
];

const FALLBACK_ADVICE: [&str; 5] = [
    "Optimize planting density for maximum yield",
    "Implement precision fertilizer application",
    "Use integrated pest management strategies",
    "Improve soil health through organic matter",
    "Monitor crop growth stages carefully",
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WeatherInsight {
    pub summary: String,
    pub recommendations: Vec<String>,
    pub risk_factors: Vec<String>,
}

/// Reply of the text generator, either in the requested JSON shape or not
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsightResult {
    Structured(WeatherInsight),
    Unstructured(String),
}

impl InsightResult {
    pub fn parse(content: &str) -> Self {
        match serde_json::from_str::<WeatherInsight>(content.trim()) {
            Ok(insight) => InsightResult::Structured(insight),
            Err(_) => InsightResult::Unstructured(content.to_string()),
        }
    }

    /// Structured replies pass through; free text becomes a truncated
    /// summary with generic advice
    pub fn into_insight(self) -> WeatherInsight {
        match self {
            InsightResult::Structured(insight) => insight,
            InsightResult::Unstructured(text) => WeatherInsight {
                summary: format!(
                    "{}...",
                    text.chars().take(SUMMARY_PREVIEW_CHARS).collect::<String>()
                ),
                recommendations: to_strings(&UNSTRUCTURED_RECOMMENDATIONS),
                risk_factors: to_strings(&UNSTRUCTURED_RISKS),
            },
        }
    }
}

/// Advice used when the text generator is unreachable
pub fn fallback_insight(category: CropCategory, location: &str) -> WeatherInsight {
    WeatherInsight {
        summary: format!(
            "Climate analysis for {} in {} shows mixed conditions that require careful management.",
            category, location
        ),
        recommendations: to_strings(&FALLBACK_RECOMMENDATIONS),
        risk_factors: to_strings(&FALLBACK_RISKS),
    }
}

pub fn fallback_advice() -> Vec<String> {
    to_strings(&FALLBACK_ADVICE)
}

pub fn weather_prompt(category: CropCategory, location: &str, climate: &ClimateAggregate) -> String {
    format!(
        "As an agricultural expert specializing in East African farming, analyze the following climate data for {crop} cultivation in {location}:\n\
         \n\
         Climate Data:\n\
         - Average Temperature: {temp:.1}°C\n\
         - Average Rainfall: {rain:.0}mm\n\
         - Average Humidity: {humidity:.1}%\n\
         - Location: {location}\n\
         \n\
         Please provide:\n\
         1. A brief summary of how these conditions affect {crop} growth\n\
         2. Specific recommendations for optimizing yield under these conditions\n\
         3. Key risk factors to monitor\n\
         \n\
         Format your response as JSON with keys: summary, recommendations (array), riskFactors (array)",
        crop = category,
        location = location,
        temp = climate.temperature,
        rain = climate.rainfall,
        humidity = climate.humidity,
    )
}

pub fn optimization_prompt(category: CropCategory, predicted_yield: f64, field_size: f64) -> String {
    format!(
        "As an agricultural advisor, provide 5 specific optimization strategies for {} cultivation \
         with a predicted yield of {:.2} tons on {} acres. Focus on practical, actionable advice for \
         farmers in Tanzania.",
        category, predicted_yield, field_size
    )
}

/// Leading list numbering such as `1.` or `2 `
fn numbering() -> Option<&'static Regex> {
    static NUMBERING: OnceLock<Option<Regex>> = OnceLock::new();
    NUMBERING
        .get_or_init(|| Regex::new(r"^\d+\.?\s*").ok())
        .as_ref()
}

fn strip_numbering(line: &str) -> String {
    match numbering() {
        Some(re) => re.replace(line, "").trim().to_string(),
        None => line.to_string(),
    }
}

/// Pull advice lines out of free text: strip leading numbering, drop short
/// lines, keep the first five
pub fn extract_advice(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(strip_numbering)
        .filter(|line| line.chars().count() > MIN_ADVICE_CHARS)
        .take(MAX_ADVICE_LINES)
        .collect()
}

#[derive(Clone)]
pub struct InsightService {
    generator: Arc<dyn TextGenerator>,
    max_tokens: u32,
    temperature: f64,
    /// Stands in for an empty observation history
    reference_climate: ClimateAggregate,
}

impl InsightService {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        config: &TextGenerationConfig,
        reference_climate: ClimateAggregate,
    ) -> Self {
        Self {
            generator,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            reference_climate,
        }
    }

    pub async fn weather_insights(
        &self,
        category: CropCategory,
        location: &str,
        observations: &[ClimateObservation],
    ) -> WeatherInsight {
        let climate = aggregate_with_reference(observations, &self.reference_climate);
        let request = CompletionRequest {
            prompt: weather_prompt(category, location, &climate),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        match self.generator.complete(request).await {
            Ok(content) => {
                let result = InsightResult::parse(&content);
                if let InsightResult::Unstructured(_) = result {
                    tracing::warn!(crop = %category, "Insight reply was not JSON, summarizing raw text");
                }
                result.into_insight()
            }
            Err(e) => {
                tracing::warn!(crop = %category, error = %e, "Weather insights unavailable, using fallback");
                fallback_insight(category, location)
            }
        }
    }

    pub async fn optimization_advice(
        &self,
        category: CropCategory,
        predicted_yield: f64,
        field_size: f64,
    ) -> Vec<String> {
        let request = CompletionRequest {
            prompt: optimization_prompt(category, predicted_yield, field_size),
            max_tokens: ADVICE_MAX_TOKENS,
            temperature: ADVICE_TEMPERATURE,
        };

        match self.generator.complete(request).await {
            Ok(content) => {
                let advice = extract_advice(&content);
                if advice.is_empty() {
                    tracing::warn!(crop = %category, "No usable advice lines in reply, using fallback");
                    fallback_advice()
                } else {
                    advice
                }
            }
            Err(e) => {
                tracing::warn!(crop = %category, error = %e, "Optimization advice unavailable, using fallback");
                fallback_advice()
            }
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
