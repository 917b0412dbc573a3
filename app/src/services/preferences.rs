//! Interface language preference

use shared::{Language, StorageKey};

use crate::error::AppResult;
use crate::SharedStore;

/// Stores the two-letter code as a bare string, not JSON
#[derive(Clone)]
pub struct PreferenceService {
    store: SharedStore,
}

impl PreferenceService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Stored language, English when unset or unrecognised
    pub fn language(&self) -> AppResult<Language> {
        let stored = self.store.get(&StorageKey::Language.render())?;
        Ok(stored
            .as_deref()
            .and_then(Language::from_code)
            .unwrap_or_default())
    }

    pub fn set_language(&self, language: Language) -> AppResult<()> {
        self.store
            .set(&StorageKey::Language.render(), language.code())?;
        Ok(())
    }
}
