//! Flat key-value persistence contract
//!
//! Every logical table is a JSON document stored under one key. Per-user
//! tables embed the user id in the key. The browser build backs this with
//! `localStorage`; native code and tests use [`MemoryStore`].

use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use thiserror::Error;
use uuid::Uuid;

/// Storage failures
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Stored data is malformed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Minimal string key-value store
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

/// Logical tables of the persisted state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKey {
    Users,
    CurrentUser,
    CropData(Uuid),
    ClimateData(Uuid),
    Predictions(Uuid),
    Language,
}

impl StorageKey {
    pub fn render(&self) -> String {
        match self {
            StorageKey::Users => "users".to_string(),
            StorageKey::CurrentUser => "currentUser".to_string(),
            StorageKey::CropData(user_id) => format!("cropData_{}", user_id),
            StorageKey::ClimateData(user_id) => format!("climateData_{}", user_id),
            StorageKey::Predictions(user_id) => format!("predictions_{}", user_id),
            StorageKey::Language => "language".to_string(),
        }
    }
}

impl std::fmt::Display for StorageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

/// Load a JSON list, treating a missing key as empty
pub fn load_list<T, S>(store: &S, key: StorageKey) -> Result<Vec<T>, StorageError>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    match store.get(&key.render())? {
        Some(raw) => Ok(serde_json::from_str(&raw)?),
        None => Ok(Vec::new()),
    }
}

/// Replace a JSON list
pub fn save_list<T, S>(store: &S, key: StorageKey, items: &[T]) -> Result<(), StorageError>
where
    T: Serialize,
    S: KeyValueStore + ?Sized,
{
    let raw = serde_json::to_string(items)?;
    store.set(&key.render(), &raw)
}

/// Load a single JSON value
pub fn load_value<T, S>(store: &S, key: StorageKey) -> Result<Option<T>, StorageError>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    match store.get(&key.render())? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Replace a single JSON value
pub fn save_value<T, S>(store: &S, key: StorageKey, value: &T) -> Result<(), StorageError>
where
    T: Serialize,
    S: KeyValueStore + ?Sized,
{
    let raw = serde_json::to_string(value)?;
    store.set(&key.render(), &raw)
}

/// In-process store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self
            .entries
            .read()
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        let id = Uuid::nil();
        assert_eq!(StorageKey::Users.render(), "users");
        assert_eq!(StorageKey::CurrentUser.render(), "currentUser");
        assert_eq!(StorageKey::Language.render(), "language");
        assert_eq!(
            StorageKey::CropData(id).render(),
            "cropData_00000000-0000-0000-0000-000000000000"
        );
        assert_eq!(
            StorageKey::ClimateData(id).render(),
            "climateData_00000000-0000-0000-0000-000000000000"
        );
        assert_eq!(
            StorageKey::Predictions(id).render(),
            "predictions_00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn test_missing_list_is_empty() {
        let store = MemoryStore::new();
        let items: Vec<String> = load_list(&store, StorageKey::Users).unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_list_round_trip() {
        let store = MemoryStore::new();
        save_list(&store, StorageKey::Users, &["a".to_string(), "b".to_string()]).unwrap();
        let items: Vec<String> = load_list(&store, StorageKey::Users).unwrap();
        assert_eq!(items, vec!["a", "b"]);
    }

    #[test]
    fn test_malformed_data_is_an_error() {
        let store = MemoryStore::new();
        store.set("users", "{not json").unwrap();
        let result: Result<Vec<String>, _> = load_list(&store, StorageKey::Users);
        assert!(matches!(result, Err(StorageError::Serialization(_))));
    }

    #[test]
    fn test_remove() {
        let store = MemoryStore::new();
        save_value(&store, StorageKey::Language, &"sw").unwrap();
        assert_eq!(store.len(), 1);
        store.remove("language").unwrap();
        assert!(store.is_empty());
    }
}
