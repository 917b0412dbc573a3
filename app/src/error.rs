//! Error handling for the Shamba yield dashboard
//!
//! Provides consistent error details in English and Swahili

use serde::Serialize;
use shared::{EstimationError, StorageError};
use thiserror::Error;
use validator::ValidationErrors;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Estimation errors
    #[error("Estimation engine is not initialized")]
    NotInitialized,

    #[error("Invalid {field}: {message}")]
    InvalidInput { field: String, message: String },

    // Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Duplicate entry: {0}")]
    Duplicate(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // External service errors
    #[error("External service unavailable: {0}")]
    ExternalServiceUnavailable(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// User-facing error description
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ErrorDetail {
    pub code: String,
    pub message_en: String,
    pub message_sw: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotInitialized => "NOT_INITIALIZED",
            AppError::InvalidInput { .. } => "INVALID_INPUT",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Duplicate(_) => "DUPLICATE_ENTRY",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::ExternalServiceUnavailable(_) => "EXTERNAL_SERVICE_UNAVAILABLE",
            AppError::Storage(_) => "STORAGE_ERROR",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Bilingual description suitable for display
    pub fn detail(&self) -> ErrorDetail {
        let (message_en, message_sw, field) = match self {
            AppError::NotInitialized => (
                "The prediction model is still loading. Please try again shortly.".to_string(),
                "Mfumo wa utabiri bado unapakia. Tafadhali jaribu tena baadaye.".to_string(),
                None,
            ),
            AppError::InvalidInput { field, message } => (
                message.clone(),
                format!("Data si sahihi: {}", message),
                Some(field.clone()),
            ),
            AppError::Validation(msg) => (
                msg.clone(),
                format!("Data si sahihi: {}", msg),
                None,
            ),
            AppError::Duplicate(field) => (
                format!("A record with this {} already exists", field),
                format!("Rekodi yenye {} hii tayari ipo", field),
                Some(field.clone()),
            ),
            AppError::NotFound(resource) => (
                format!("{} not found", resource),
                format!("{} haikupatikana", resource),
                None,
            ),
            AppError::ExternalServiceUnavailable(_) => (
                "The service is temporarily unavailable. Please try again later.".to_string(),
                "Huduma haipatikani kwa sasa. Tafadhali jaribu tena baadaye.".to_string(),
                None,
            ),
            AppError::Storage(_) => (
                "Saved data could not be read or written".to_string(),
                "Data iliyohifadhiwa haikuweza kusomwa au kuandikwa".to_string(),
                None,
            ),
            AppError::Configuration(msg) => (
                format!("Configuration error: {}", msg),
                format!("Hitilafu ya usanidi: {}", msg),
                None,
            ),
            AppError::Internal(_) => (
                "An internal error occurred".to_string(),
                "Hitilafu ya ndani imetokea".to_string(),
                None,
            ),
        };

        tracing::debug!("Error: {:?}", self);

        ErrorDetail {
            code: self.code().to_string(),
            message_en,
            message_sw,
            field,
        }
    }
}

impl From<EstimationError> for AppError {
    fn from(err: EstimationError) -> Self {
        match err {
            EstimationError::NotInitialized => AppError::NotInitialized,
            EstimationError::InvalidInput { field, reason } => AppError::InvalidInput {
                field: field.to_string(),
                message: reason,
            },
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::Validation(shared::describe_validation_errors(&errors))
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Configuration(err.to_string())
    }
}

/// Result type alias for services
pub type AppResult<T> = Result<T, AppError>;
