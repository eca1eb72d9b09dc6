//! Error types for the mixing engine

use hearth_core::{HearthError, TrackId};
use thiserror::Error;

/// Playback errors
///
/// Only mistakes the caller can act on surface here. Resource and storage
/// failures inside a session are logged and absorbed.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// No ambience sound or song with this id in the current catalog
    #[error("Unknown track: {0}")]
    UnknownTrack(TrackId),

    /// Operation needs an active song but the playlist is empty
    #[error("No active song")]
    NoActiveSong,

    /// Audio resource refused an operation
    #[error("Audio resource error for {track_id}: {message}")]
    Resource {
        /// Track whose resource failed
        track_id: TrackId,
        /// Failure reported by the resource
        message: String,
    },

    /// Error from a core collaborator
    #[error(transparent)]
    Core(#[from] HearthError),
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
