//! Key-value persistence for user preferences
//!
//! Mirrors the browser `localStorage` contract: string keys, string values,
//! missing keys read as `None`.

use crate::error::Result;
use std::collections::HashMap;

/// String key-value store
pub trait KeyValueStore {
    /// Read a value, `None` if the key is absent or unreadable
    fn get_item(&self, key: &str) -> Option<String>;

    /// Write a value
    ///
    /// # Errors
    /// Returns an error if the backing store rejects the write (quota, privacy mode)
    fn set_item(&mut self, key: &str, value: &str) -> Result<()>;

    /// Remove a value; removing an absent key is not an error
    fn remove_item(&mut self, key: &str);
}

/// In-memory store, used for tests and headless sessions
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    items: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing values
    pub fn with_items<K, V>(items: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            items: items
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) {
        self.items.remove(key);
    }
}
