//! Session events and snapshots
//!
//! Every observable change is queued as a [`SessionEvent`]. The UI drains the
//! queue after each call (or each frame) and re-renders from a
//! [`SessionSnapshot`] when it needs the full picture.

use crate::types::{CatalogState, Transport};
use hearth_core::{CatalogEntry, Origin, TrackId};
use serde::{Deserialize, Serialize};

/// Events emitted by a mixing session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SessionEvent {
    /// Global play/pause switched
    TransportChanged { transport: Transport },

    /// Master level changed (mute included)
    MasterVolumeChanged { level: f32 },

    /// A track started or stopped producing sound
    TrackPlaybackChanged { track_id: TrackId, is_playing: bool },

    /// An ambience layer's level changed
    TrackVolumeChanged { track_id: TrackId, volume: f32 },

    /// Music player level changed
    MusicVolumeChanged { volume: f32 },

    /// A different song became active, or none
    ActiveSongChanged {
        song_id: Option<TrackId>,
        previous: Option<TrackId>,
    },

    /// The active song went back to its start
    SongRestarted { song_id: TrackId },

    /// Loop flag changed
    LoopChanged { enabled: bool },

    /// Shuffle flag changed
    ShuffleChanged { enabled: bool },

    /// A catalog was applied
    CatalogLoaded { sounds: usize, songs: usize },

    /// The catalog collaborator failed; only bundled sounds are loaded
    CatalogLoadFailed { message: String },

    /// A track's resource refused to play
    TrackFailed { track_id: TrackId, message: String },

    /// The user reset all volumes
    VolumesReset { reset_count: u64 },
}

/// One ambience layer as the sound grid shows it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundSnapshot {
    pub id: TrackId,
    pub name: String,
    pub icon: String,
    pub origin: Origin,
    pub volume: f32,
    pub is_playing: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Music player state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MusicSnapshot {
    pub active_song: Option<TrackId>,
    /// "Name — Author" of the active song
    pub title: Option<String>,
    pub volume: f32,
    pub is_playing: bool,
    pub loop_song: bool,
    pub shuffle: bool,
    pub playlist: Vec<CatalogEntry>,
}

/// Full observable state of a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub transport: Transport,
    pub master_volume: f32,
    pub catalog_state: CatalogState,
    pub reset_count: u64,
    pub sounds: Vec<SoundSnapshot>,
    pub music: MusicSnapshot,
}
