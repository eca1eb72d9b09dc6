//! Persisted user preferences
//!
//! Typed view over a `KeyValueStore`. Values are stored as JSON so existing
//! browser profiles (`"0.5"`, `"true"`, `{"local-1":0.5}`) read back as-is.
//! Reads never fail: missing or malformed values fall back to defaults.
//! Writes never fail either: a rejected write is logged and dropped.

use crate::types::{clamp_volume, StorageKeys};
use hearth_core::{KeyValueStore, TrackId};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

/// Master volume when nothing is stored
pub const DEFAULT_MASTER_VOLUME: f32 = 1.0;

/// Typed preference store
#[derive(Debug)]
pub struct Preferences<S: KeyValueStore> {
    store: S,
    keys: StorageKeys,
}

impl<S: KeyValueStore> Preferences<S> {
    pub fn new(store: S, keys: StorageKeys) -> Self {
        Self { store, keys }
    }

    pub fn keys(&self) -> &StorageKeys {
        &self.keys
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    // ===== Sound volumes =====

    /// Per-sound volumes, clamped; non-numeric entries are skipped
    pub fn sound_volumes(&self) -> HashMap<TrackId, f32> {
        let raw: HashMap<String, serde_json::Value> =
            self.read(&self.keys.sound_volumes).unwrap_or_default();

        raw.into_iter()
            .filter_map(|(id, value)| match value.as_f64() {
                Some(v) => Some((TrackId::new(id), clamp_volume(v as f32))),
                None => {
                    debug!(track_id = %id, "Skipping non-numeric stored sound volume");
                    None
                }
            })
            .collect()
    }

    /// Stored volume for one sound
    pub fn sound_volume(&self, id: &TrackId) -> Option<f32> {
        self.sound_volumes().get(id).copied()
    }

    /// Persist one sound's volume, keeping the others
    pub fn set_sound_volume(&mut self, id: &TrackId, volume: f32) {
        self.set_sound_volumes([(id.clone(), volume)]);
    }

    /// Persist several sound volumes in one write
    pub fn set_sound_volumes(&mut self, volumes: impl IntoIterator<Item = (TrackId, f32)>) {
        // BTreeMap keeps the stored JSON stable across writes
        let mut map: BTreeMap<String, f32> = self
            .sound_volumes()
            .into_iter()
            .map(|(id, v)| (id.as_str().to_string(), v))
            .collect();

        for (id, volume) in volumes {
            map.insert(id.as_str().to_string(), clamp_volume(volume));
        }

        let key = self.keys.sound_volumes.clone();
        self.write(&key, &map);
    }

    // ===== Music volume =====

    /// Stored music player volume, if any
    pub fn music_volume(&self) -> Option<f32> {
        self.read::<f32>(&self.keys.music_volume).map(clamp_volume)
    }

    pub fn set_music_volume(&mut self, volume: f32) {
        let key = self.keys.music_volume.clone();
        self.write(&key, &clamp_volume(volume));
    }

    // ===== Master volume =====

    /// Stored master volume, full volume when absent
    pub fn master_volume(&self) -> f32 {
        self.read::<f32>(&self.keys.master_volume)
            .map(clamp_volume)
            .unwrap_or(DEFAULT_MASTER_VOLUME)
    }

    pub fn set_master_volume(&mut self, volume: f32) {
        let key = self.keys.master_volume.clone();
        self.write(&key, &clamp_volume(volume));
    }

    /// Level saved by the last master mute
    pub fn master_restore(&self) -> Option<f32> {
        self.read::<f32>(&self.keys.master_restore).map(clamp_volume)
    }

    /// Persist the mute restore level; `None` removes it
    pub fn set_master_restore(&mut self, level: Option<f32>) {
        let key = self.keys.master_restore.clone();
        match level {
            Some(level) => self.write(&key, &clamp_volume(level)),
            None => self.store.remove_item(&key),
        }
    }

    // ===== Flags =====

    pub fn loop_song(&self) -> bool {
        self.read(&self.keys.loop_song).unwrap_or(false)
    }

    pub fn set_loop_song(&mut self, enabled: bool) {
        let key = self.keys.loop_song.clone();
        self.write(&key, &enabled);
    }

    pub fn shuffle(&self) -> bool {
        self.read(&self.keys.shuffle).unwrap_or(false)
    }

    pub fn set_shuffle(&mut self, enabled: bool) {
        let key = self.keys.shuffle.clone();
        self.write(&key, &enabled);
    }

    // ===== Internal =====

    fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.store.get_item(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, value = %raw, error = %e, "Ignoring malformed stored preference");
                None
            }
        }
    }

    fn write<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key, error = %e, "Failed to encode preference");
                return;
            }
        };

        if let Err(e) = self.store.set_item(key, &raw) {
            warn!(key, error = %e, "Failed to persist preference");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_core::{HearthError, MemoryStore, Result as CoreResult};

    fn prefs(items: &[(&str, &str)]) -> Preferences<MemoryStore> {
        Preferences::new(
            MemoryStore::with_items(items.iter().copied()),
            StorageKeys::default(),
        )
    }

    /// Store whose writes are always rejected
    struct FullStore;

    impl KeyValueStore for FullStore {
        fn get_item(&self, _key: &str) -> Option<String> {
            None
        }

        fn set_item(&mut self, _key: &str, _value: &str) -> CoreResult<()> {
            Err(HearthError::storage("quota exceeded"))
        }

        fn remove_item(&mut self, _key: &str) {}
    }

    #[test]
    fn defaults_when_empty() {
        let prefs = prefs(&[]);
        assert!(prefs.sound_volumes().is_empty());
        assert!(prefs.music_volume().is_none());
        assert_eq!(prefs.master_volume(), 1.0);
        assert!(prefs.master_restore().is_none());
        assert!(!prefs.loop_song());
        assert!(!prefs.shuffle());
    }

    #[test]
    fn reads_existing_browser_values() {
        let prefs = prefs(&[
            ("soundVolumeStorage", r#"{"local-1":0.5,"7":1}"#),
            ("musicVolumeStorage", "0.3"),
            ("masterVolumeStorage", "0.8"),
            ("loopSongStorage", "true"),
            ("shuffleStorage", "false"),
        ]);

        assert_eq!(prefs.sound_volume(&TrackId::new("local-1")), Some(0.5));
        assert_eq!(prefs.sound_volume(&TrackId::new("7")), Some(1.0));
        assert_eq!(prefs.music_volume(), Some(0.3));
        assert_eq!(prefs.master_volume(), 0.8);
        assert!(prefs.loop_song());
        assert!(!prefs.shuffle());
    }

    #[test]
    fn malformed_values_fall_back_to_defaults() {
        let prefs = prefs(&[
            ("soundVolumeStorage", "not json"),
            ("masterVolumeStorage", "loud"),
            ("loopSongStorage", "yes"),
            ("musicVolumeStorage", "{}"),
        ]);

        assert!(prefs.sound_volumes().is_empty());
        assert_eq!(prefs.master_volume(), 1.0);
        assert!(!prefs.loop_song());
        assert!(prefs.music_volume().is_none());
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let prefs = prefs(&[
            ("soundVolumeStorage", r#"{"local-2":3.5,"local-3":-1,"local-4":"x"}"#),
            ("masterVolumeStorage", "7"),
        ]);

        let volumes = prefs.sound_volumes();
        assert_eq!(volumes.get(&TrackId::new("local-2")), Some(&1.0));
        assert_eq!(volumes.get(&TrackId::new("local-3")), Some(&0.0));
        assert!(!volumes.contains_key(&TrackId::new("local-4")));
        assert_eq!(prefs.master_volume(), 1.0);
    }

    #[test]
    fn set_sound_volume_keeps_other_entries() {
        let mut prefs = prefs(&[("soundVolumeStorage", r#"{"local-1":0.5}"#)]);

        prefs.set_sound_volume(&TrackId::new("local-2"), 0.25);

        let volumes = prefs.sound_volumes();
        assert_eq!(volumes.len(), 2);
        assert_eq!(volumes[&TrackId::new("local-1")], 0.5);
        assert_eq!(volumes[&TrackId::new("local-2")], 0.25);
    }

    #[test]
    fn scalar_round_trips() {
        let mut prefs = prefs(&[]);

        prefs.set_music_volume(0.4);
        prefs.set_master_volume(0.6);
        prefs.set_master_restore(Some(0.6));
        prefs.set_loop_song(true);
        prefs.set_shuffle(true);

        assert_eq!(prefs.music_volume(), Some(0.4));
        assert_eq!(prefs.master_volume(), 0.6);
        assert_eq!(prefs.master_restore(), Some(0.6));
        assert!(prefs.loop_song());
        assert!(prefs.shuffle());

        prefs.set_master_restore(None);
        assert!(prefs.master_restore().is_none());
    }

    #[test]
    fn stored_format_matches_browser_client() {
        let mut prefs = prefs(&[]);
        prefs.set_shuffle(true);
        prefs.set_sound_volume(&TrackId::new("local-1"), 0.5);

        assert_eq!(prefs.store().get_item("shuffleStorage").as_deref(), Some("true"));
        assert_eq!(
            prefs.store().get_item("soundVolumeStorage").as_deref(),
            Some(r#"{"local-1":0.5}"#)
        );
    }

    #[test]
    fn custom_key_names() {
        let keys = StorageKeys {
            shuffle: "hearth.shuffle".to_string(),
            ..StorageKeys::default()
        };
        let mut prefs = Preferences::new(MemoryStore::new(), keys);
        prefs.set_shuffle(true);

        assert!(prefs.store().get_item("shuffleStorage").is_none());
        assert_eq!(prefs.store().get_item("hearth.shuffle").as_deref(), Some("true"));
    }

    #[test]
    fn rejected_writes_are_swallowed() {
        let mut prefs = Preferences::new(FullStore, StorageKeys::default());
        prefs.set_master_volume(0.2);
        prefs.set_sound_volume(&TrackId::new("local-1"), 0.2);

        // Nothing stuck, defaults still apply
        assert_eq!(prefs.master_volume(), 1.0);
    }
}
