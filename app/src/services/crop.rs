//! Crop record management

use shared::storage::{load_list, save_list};
use shared::{CropInput, CropRecord, StorageKey};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::SharedStore;

#[derive(Clone)]
pub struct CropService {
    store: SharedStore,
}

impl CropService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub fn list(&self, user_id: Uuid) -> AppResult<Vec<CropRecord>> {
        Ok(load_list(&*self.store, StorageKey::CropData(user_id))?)
    }

    pub fn get(&self, user_id: Uuid, crop_id: Uuid) -> AppResult<CropRecord> {
        self.list(user_id)?
            .into_iter()
            .find(|c| c.id == crop_id)
            .ok_or_else(|| AppError::NotFound("Crop record".to_string()))
    }

    pub fn create(&self, user_id: Uuid, input: CropInput) -> AppResult<CropRecord> {
        input.validate()?;

        let mut crops = self.list(user_id)?;
        let record = CropRecord::new(user_id, input);
        crops.push(record.clone());
        save_list(&*self.store, StorageKey::CropData(user_id), &crops)?;

        tracing::info!(user_id = %user_id, crop_id = %record.id, category = %record.category, "Crop record created");
        Ok(record)
    }

    pub fn update(&self, user_id: Uuid, crop_id: Uuid, input: CropInput) -> AppResult<CropRecord> {
        input.validate()?;

        let mut crops = self.list(user_id)?;
        let record = crops
            .iter_mut()
            .find(|c| c.id == crop_id)
            .ok_or_else(|| AppError::NotFound("Crop record".to_string()))?;
        record.apply(input);
        let updated = record.clone();
        save_list(&*self.store, StorageKey::CropData(user_id), &crops)?;

        tracing::info!(user_id = %user_id, crop_id = %crop_id, "Crop record updated");
        Ok(updated)
    }

    pub fn delete(&self, user_id: Uuid, crop_id: Uuid) -> AppResult<()> {
        let mut crops = self.list(user_id)?;
        let before = crops.len();
        crops.retain(|c| c.id != crop_id);
        if crops.len() == before {
            return Err(AppError::NotFound("Crop record".to_string()));
        }
        save_list(&*self.store, StorageKey::CropData(user_id), &crops)?;

        tracing::info!(user_id = %user_id, crop_id = %crop_id, "Crop record deleted");
        Ok(())
    }
}
