//! Local account registration, login and profile management
//!
//! Accounts are plaintext records in the `users` table; the active session
//! is a copy of the user under `currentUser`.

use shared::storage::{load_list, load_value, save_list, save_value};
use shared::{ClimateObservation, CropRecord, PredictionRecord, ProfileStats, ProfileUpdate, RegisterUserInput, StorageKey, User};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::SharedStore;

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    store: SharedStore,
}

impl AuthService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Register a new user and start a session for them
    pub fn register(&self, input: RegisterUserInput) -> AppResult<User> {
        input.validate()?;
        shared::validate_username(&input.username).map_err(|msg| AppError::InvalidInput {
            field: "username".to_string(),
            message: msg.to_string(),
        })?;

        let mut users: Vec<User> = load_list(&*self.store, StorageKey::Users)?;
        let username = input.username.trim();
        if users.iter().any(|u| u.username == username) {
            return Err(AppError::Duplicate("username".to_string()));
        }

        let user = User::new(input);
        users.push(user.clone());
        save_list(&*self.store, StorageKey::Users, &users)?;
        save_value(&*self.store, StorageKey::CurrentUser, &user)?;

        tracing::info!(user_id = %user.id, username = %user.username, "User registered");
        Ok(user)
    }

    /// Start a session for an existing username
    pub fn login(&self, username: &str) -> AppResult<User> {
        let users: Vec<User> = load_list(&*self.store, StorageKey::Users)?;
        let username = username.trim();
        let user = users
            .into_iter()
            .find(|u| u.username == username)
            .ok_or_else(|| AppError::NotFound("User".to_string()))?;

        save_value(&*self.store, StorageKey::CurrentUser, &user)?;
        tracing::info!(user_id = %user.id, "User logged in");
        Ok(user)
    }

    pub fn logout(&self) -> AppResult<()> {
        self.store.remove(&StorageKey::CurrentUser.render())?;
        tracing::debug!("Session cleared");
        Ok(())
    }

    pub fn current_user(&self) -> AppResult<Option<User>> {
        Ok(load_value(&*self.store, StorageKey::CurrentUser)?)
    }

    /// Update editable profile fields in both the user table and the session
    pub fn update_profile(&self, user_id: Uuid, input: ProfileUpdate) -> AppResult<User> {
        input.validate()?;

        let mut users: Vec<User> = load_list(&*self.store, StorageKey::Users)?;
        let user = users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or_else(|| AppError::NotFound("User".to_string()))?;

        user.full_name = input.full_name;
        user.email = input.email;
        user.location = input.location;
        let updated = user.clone();

        save_list(&*self.store, StorageKey::Users, &users)?;
        if self.current_user()?.map(|u| u.id) == Some(user_id) {
            save_value(&*self.store, StorageKey::CurrentUser, &updated)?;
        }

        tracing::info!(user_id = %user_id, "Profile updated");
        Ok(updated)
    }

    pub fn profile_stats(&self, user_id: Uuid) -> AppResult<ProfileStats> {
        let crops: Vec<CropRecord> = load_list(&*self.store, StorageKey::CropData(user_id))?;
        let climate: Vec<ClimateObservation> = load_list(&*self.store, StorageKey::ClimateData(user_id))?;
        let predictions: Vec<PredictionRecord> =
            load_list(&*self.store, StorageKey::Predictions(user_id))?;

        Ok(ProfileStats {
            crop_records: crops.len(),
            climate_observations: climate.len(),
            predictions: predictions.len(),
        })
    }
}
