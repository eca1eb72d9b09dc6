//! Hearth - Mixing Engine
//!
//! Platform-agnostic playback state for layered ambience and a music playlist.
//!
//! This crate provides:
//! - Track units that keep an audio resource in line with volume, master and transport
//! - Ambience mixer (concurrently looping sound layers)
//! - Music sequencer (active song, next/previous, loop, song-end handling)
//! - Shuffle cycles without repeats (Fisher-Yates)
//! - Master volume with mute/restore
//! - Persisted preferences over any key-value store
//! - Catalog loading with stale-result protection
//!
//! # Architecture
//!
//! `hearth-playback` never touches audio hardware or the DOM itself:
//! - Audio comes from `AudioResource`s built by a `ResourceFactory`
//! - Preferences go through a `KeyValueStore`
//! - Catalogs come from a `CatalogProvider`
//!
//! The `wasm` feature ships browser implementations of all three seams.
//!
//! # Example
//!
//! ```rust
//! use hearth_core::{AudioResource, CatalogEntry, MemoryStore, ResourceFactory, Result, SourceRef, TrackId};
//! use hearth_playback::{MixingSession, SessionConfig};
//!
//! struct Silent;
//!
//! impl AudioResource for Silent {
//!     fn play(&mut self) -> Result<()> { Ok(()) }
//!     fn pause(&mut self) {}
//!     fn set_volume(&mut self, _volume: f32) {}
//!     fn set_looping(&mut self, _looping: bool) {}
//!     fn set_source(&mut self, _source: &SourceRef) -> Result<()> { Ok(()) }
//!     fn restart(&mut self) -> Result<()> { Ok(()) }
//!     fn release(&mut self) {}
//! }
//!
//! struct SilentFactory;
//!
//! impl ResourceFactory for SilentFactory {
//!     fn create(&mut self, _entry: &CatalogEntry) -> Result<Box<dyn AudioResource>> {
//!         Ok(Box::new(Silent))
//!     }
//! }
//!
//! let mut session = MixingSession::new(SessionConfig::default(), MemoryStore::new(), SilentFactory);
//! session.apply_catalog(&Default::default());
//!
//! // Turn up the rain and start playing
//! session.set_sound_volume(&TrackId::new("local-1"), 0.5).unwrap();
//! session.play();
//!
//! assert_eq!(session.mixer().playing_count(), 1);
//! ```

mod error;
mod events;
mod mixer;
mod preferences;
mod sequencer;
mod session;
pub mod shuffle;
mod track;
pub mod types;
mod volume;

#[cfg(test)]
mod test_support;

#[cfg(feature = "wasm")]
pub mod wasm;

// Public exports
pub use error::{PlaybackError, Result};
pub use events::{MusicSnapshot, SessionEvent, SessionSnapshot, SoundSnapshot};
pub use mixer::{AmbienceMixer, MixerReset, TrackChanges};
pub use preferences::{Preferences, DEFAULT_MASTER_VOLUME};
pub use sequencer::{MusicSequencer, SequencerChange, SequencerState};
pub use session::{CatalogTicket, MixingSession};
pub use shuffle::ShuffleBag;
pub use track::TrackUnit;
pub use types::{CatalogState, PlayStateChange, SessionConfig, StorageKeys, Transport};
pub use volume::{MasterVolume, DEFAULT_RESTORE_LEVEL};
