//! User accounts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A locally registered user. Stored in plaintext, no credentials.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub location: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(input: RegisterUserInput) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: input.username.trim().to_string(),
            email: input.email,
            full_name: input.full_name,
            location: input.location,
            created_at: Utc::now(),
        }
    }
}

/// Registration form
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserInput {
    #[validate(length(min = 1, max = 100))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 100))]
    pub full_name: String,
    #[serde(default)]
    #[validate(length(max = 200))]
    pub location: String,
}

/// Editable profile fields
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[validate(length(min = 1, max = 100))]
    pub full_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(max = 200))]
    pub location: String,
}

/// Record counts shown on the profile page
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileStats {
    pub crop_records: usize,
    pub climate_observations: usize,
    pub predictions: usize,
}
