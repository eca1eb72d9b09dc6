//! Core types for the mixing engine

use serde::{Deserialize, Serialize};

/// Global play/pause switch shared by every track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// Tracks with an audible effective volume produce sound
    Playing,

    /// Nothing produces sound
    #[default]
    Paused,
}

impl Transport {
    pub fn is_playing(self) -> bool {
        matches!(self, Self::Playing)
    }

    /// The opposite state
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Playing => Self::Paused,
            Self::Paused => Self::Playing,
        }
    }
}

/// Observable play state change of a single track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum PlayStateChange {
    /// Resource started producing sound
    Started,

    /// Resource stopped producing sound
    Stopped,

    /// Resource refused to play
    Failed {
        /// Failure reported by the resource
        message: String,
    },
}

/// Persistence key names
///
/// Defaults match the names the web client has always used, so existing
/// browser profiles keep their settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageKeys {
    /// Map of sound id to volume
    pub sound_volumes: String,
    /// Music player volume
    pub music_volume: String,
    /// Master volume
    pub master_volume: String,
    /// Master level to restore on unmute
    pub master_restore: String,
    /// Loop active song flag
    pub loop_song: String,
    /// Shuffle flag
    pub shuffle: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            sound_volumes: "soundVolumeStorage".to_string(),
            music_volume: "musicVolumeStorage".to_string(),
            master_volume: "masterVolumeStorage".to_string(),
            master_restore: "masterVolumeRestoreStorage".to_string(),
            loop_song: "loopSongStorage".to_string(),
            shuffle: "shuffleStorage".to_string(),
        }
    }
}

/// Configuration for a mixing session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Persistence key names
    pub storage_keys: StorageKeys,

    /// Append the bundled ambience sounds after the user's own (default: true)
    pub include_builtin_sounds: bool,

    /// Reset also silences the music player (default: true)
    pub reset_music_volume: bool,

    /// Fixed shuffle seed for reproducible orders (default: entropy)
    pub shuffle_seed: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            storage_keys: StorageKeys::default(),
            include_builtin_sounds: true,
            reset_music_volume: true,
            shuffle_seed: None,
        }
    }
}

/// Progress of the catalog collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogState {
    /// No load requested yet
    #[default]
    Idle,
    /// A fetch is in flight
    Loading,
    /// Last fetch succeeded
    Ready,
    /// Last fetch failed; only builtins are loaded
    Failed,
}

/// Clamp a volume into [0, 1]; NaN reads as silence
pub(crate) fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        0.0
    } else {
        volume.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = SessionConfig::default();
        assert!(config.include_builtin_sounds);
        assert!(config.reset_music_volume);
        assert!(config.shuffle_seed.is_none());
        assert_eq!(config.storage_keys.master_volume, "masterVolumeStorage");
        assert_eq!(config.storage_keys.sound_volumes, "soundVolumeStorage");
    }

    #[test]
    fn partial_config_uses_defaults() {
        let config: SessionConfig =
            serde_json::from_str(r#"{"reset_music_volume": false, "shuffle_seed": 7}"#).unwrap();
        assert!(!config.reset_music_volume);
        assert!(config.include_builtin_sounds);
        assert_eq!(config.shuffle_seed, Some(7));
        assert_eq!(config.storage_keys, StorageKeys::default());
    }

    #[test]
    fn transport_toggle() {
        assert_eq!(Transport::default(), Transport::Paused);
        assert_eq!(Transport::Paused.toggled(), Transport::Playing);
        assert!(!Transport::Playing.toggled().is_playing());
    }

    #[test]
    fn clamp_volume_bounds() {
        assert_eq!(clamp_volume(-0.5), 0.0);
        assert_eq!(clamp_volume(1.7), 1.0);
        assert_eq!(clamp_volume(0.25), 0.25);
        assert_eq!(clamp_volume(f32::NAN), 0.0);
    }
}
