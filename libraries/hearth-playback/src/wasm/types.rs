//! WASM-compatible type definitions

use crate::types::{SessionConfig, StorageKeys};
use serde::{Deserialize, Serialize};

/// Session configuration as JavaScript passes it
///
/// Every field is optional; omitted fields keep the engine defaults. The
/// shuffle seed is a double because JavaScript numbers are.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct WasmSessionConfig {
    include_builtin_sounds: Option<bool>,
    reset_music_volume: Option<bool>,
    shuffle_seed: Option<f64>,
    storage_prefix: Option<String>,
}

impl From<WasmSessionConfig> for SessionConfig {
    fn from(config: WasmSessionConfig) -> Self {
        let defaults = SessionConfig::default();

        let storage_keys = match config.storage_prefix {
            Some(prefix) => {
                let keys = StorageKeys::default();
                StorageKeys {
                    sound_volumes: format!("{prefix}{}", keys.sound_volumes),
                    music_volume: format!("{prefix}{}", keys.music_volume),
                    master_volume: format!("{prefix}{}", keys.master_volume),
                    master_restore: format!("{prefix}{}", keys.master_restore),
                    loop_song: format!("{prefix}{}", keys.loop_song),
                    shuffle: format!("{prefix}{}", keys.shuffle),
                }
            }
            None => defaults.storage_keys,
        };

        Self {
            storage_keys,
            include_builtin_sounds: config
                .include_builtin_sounds
                .unwrap_or(defaults.include_builtin_sounds),
            reset_music_volume: config
                .reset_music_volume
                .unwrap_or(defaults.reset_music_volume),
            shuffle_seed: config.shuffle_seed.map(|seed| seed.abs() as u64),
        }
    }
}
