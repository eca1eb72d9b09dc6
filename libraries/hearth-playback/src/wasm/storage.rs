//! `window.localStorage` as a key-value store

use hearth_core::{HearthError, KeyValueStore, Result};
use web_sys::Storage;

/// Browser local storage
///
/// Falls back to a store that reads nothing and rejects writes when
/// `localStorage` is unavailable (privacy mode, sandboxed iframe).
#[derive(Debug, Clone, Default)]
pub struct LocalStorage {
    storage: Option<Storage>,
}

impl LocalStorage {
    pub fn new() -> Self {
        let storage = web_sys::window().and_then(|window| window.local_storage().ok().flatten());
        if storage.is_none() {
            tracing::warn!("localStorage unavailable, preferences will not persist");
        }
        Self { storage }
    }

    pub fn is_available(&self) -> bool {
        self.storage.is_some()
    }
}

impl KeyValueStore for LocalStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.storage.as_ref()?.get_item(key).ok().flatten()
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        let storage = self
            .storage
            .as_ref()
            .ok_or_else(|| HearthError::storage("localStorage unavailable"))?;

        storage
            .set_item(key, value)
            .map_err(|e| HearthError::storage(format!("{:?}", e)))
    }

    fn remove_item(&mut self, key: &str) {
        if let Some(storage) = self.storage.as_ref() {
            let _ = storage.remove_item(key);
        }
    }
}
