//! Track unit: one catalog entry bound to one audio resource
//!
//! The unit owns the observable state (`volume`, `is_playing`) and issues
//! resource side effects only when the desired play state differs from the
//! current one.

use crate::types::{clamp_volume, PlayStateChange, Transport};
use hearth_core::{
    AudioResource, CatalogEntry, EntryKind, HearthError, Origin, ResourceFactory, SourceRef,
    TrackId,
};
use tracing::{debug, warn};

/// A catalog entry bound to a playable resource
pub struct TrackUnit {
    entry: CatalogEntry,
    resource: Box<dyn AudioResource>,
    volume: f32,
    master: f32,
    transport: Transport,
    is_playing: bool,
    failed: Option<String>,
    available: bool,
}

impl TrackUnit {
    /// Bind an entry to a resource
    ///
    /// The resource starts paused at the given volume. Call one of the
    /// setters (or [`TrackUnit::reconcile`]) to start it.
    pub fn new(
        entry: CatalogEntry,
        mut resource: Box<dyn AudioResource>,
        volume: f32,
        master: f32,
        transport: Transport,
    ) -> Self {
        let volume = clamp_volume(volume);
        let master = clamp_volume(master);
        resource.set_looping(entry.kind.is_looping());
        resource.set_volume(volume * master);

        Self {
            entry,
            resource,
            volume,
            master,
            transport,
            is_playing: false,
            failed: None,
            available: true,
        }
    }

    /// Create a unit through the factory
    ///
    /// A factory failure still yields a unit, one whose resource refuses to
    /// play, so the entry stays visible and its siblings are unaffected.
    pub fn create(
        entry: CatalogEntry,
        factory: &mut dyn ResourceFactory,
        volume: f32,
        master: f32,
        transport: Transport,
    ) -> Self {
        match factory.create(&entry) {
            Ok(resource) => Self::new(entry, resource, volume, master, transport),
            Err(e) => {
                warn!(track_id = %entry.id, error = %e, "Failed to create audio resource");
                let resource = Box::new(UnavailableResource {
                    reason: e.to_string(),
                });
                let mut unit = Self::new(entry, resource, volume, master, transport);
                unit.available = false;
                unit
            }
        }
    }

    // ===== Queries =====

    pub fn id(&self) -> &TrackId {
        &self.entry.id
    }

    pub fn display_name(&self) -> &str {
        &self.entry.name
    }

    pub fn source(&self) -> &SourceRef {
        &self.entry.source
    }

    pub fn kind(&self) -> &EntryKind {
        &self.entry.kind
    }

    pub fn origin(&self) -> Origin {
        self.entry.origin
    }

    pub fn entry(&self) -> &CatalogEntry {
        &self.entry
    }

    pub fn is_looping(&self) -> bool {
        self.entry.kind.is_looping()
    }

    /// User-set level, independent of master
    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Level actually sent to the resource
    pub fn effective_volume(&self) -> f32 {
        self.volume * self.master
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    /// Last resource failure, cleared by the next successful play
    pub fn failure(&self) -> Option<&str> {
        self.failed.as_deref()
    }

    /// False when the factory could not build a resource for this unit
    pub fn has_resource(&self) -> bool {
        self.available
    }

    // ===== Control =====

    /// Set the user level
    ///
    /// Returns the play state change if the unit started or stopped.
    pub fn set_volume(&mut self, volume: f32) -> Option<PlayStateChange> {
        self.volume = clamp_volume(volume);
        self.resource.set_volume(self.effective_volume());
        self.reconcile()
    }

    /// Set the master level pushed down by the owner
    pub fn apply_master_volume(&mut self, master: f32) -> Option<PlayStateChange> {
        self.master = clamp_volume(master);
        self.resource.set_volume(self.effective_volume());
        self.reconcile()
    }

    /// Set the global transport pushed down by the owner
    pub fn set_transport(&mut self, transport: Transport) -> Option<PlayStateChange> {
        self.transport = transport;
        self.reconcile()
    }

    /// Whether the unit should be producing sound right now
    pub fn should_play(&self) -> bool {
        self.transport.is_playing() && self.effective_volume() > 0.0
    }

    /// Bring the resource in line with the current fields
    ///
    /// Issues `play()`/`pause()` only on a state flip; repeated calls with
    /// unchanged fields do nothing.
    pub fn reconcile(&mut self) -> Option<PlayStateChange> {
        match (self.should_play(), self.is_playing) {
            (true, false) => match self.resource.play() {
                Ok(()) => {
                    debug!(track_id = %self.entry.id, volume = self.effective_volume(), "Track started");
                    self.is_playing = true;
                    self.failed = None;
                    Some(PlayStateChange::Started)
                }
                Err(e) => {
                    warn!(track_id = %self.entry.id, error = %e, "Track failed to play");
                    let message = e.to_string();
                    self.failed = Some(message.clone());
                    Some(PlayStateChange::Failed { message })
                }
            },
            (false, true) => {
                self.resource.pause();
                self.is_playing = false;
                debug!(track_id = %self.entry.id, "Track stopped");
                Some(PlayStateChange::Stopped)
            }
            _ => None,
        }
    }

    /// Point the shared stream at another song
    ///
    /// Keeps the volume; keeps playing if the unit was playing. When the
    /// resource refuses the new source the unit is left paused on its old
    /// entry and the error is returned, so the owner can rebuild it.
    pub fn retarget(&mut self, entry: CatalogEntry) -> hearth_core::Result<Option<PlayStateChange>> {
        let was_playing = self.is_playing;
        if was_playing {
            self.resource.pause();
            self.is_playing = false;
        }

        self.resource.set_looping(entry.kind.is_looping());
        if let Err(e) = self.resource.set_source(&entry.source) {
            warn!(track_id = %entry.id, error = %e, "Failed to assign track source");
            return Err(e);
        }
        self.entry = entry;
        self.failed = None;

        self.resource.set_volume(self.effective_volume());
        Ok(continuity(was_playing, self.reconcile()))
    }

    /// Replace the entry record without touching the resource
    ///
    /// Only for records whose source did not change.
    pub fn refresh_entry(&mut self, entry: CatalogEntry) {
        debug_assert_eq!(entry.source, self.entry.source);
        self.entry = entry;
    }

    /// Record a failure the resource reported after the fact
    ///
    /// Used for asynchronous play errors (a rejected play request, a media
    /// error event). The unit is treated as stopped; the next reconcile
    /// that wants it playing tries again.
    pub fn mark_failed(&mut self, message: impl Into<String>) -> Option<PlayStateChange> {
        let message = message.into();
        warn!(track_id = %self.entry.id, error = %message, "Track reported a playback failure");
        if self.is_playing {
            self.resource.pause();
            self.is_playing = false;
        }
        self.failed = Some(message.clone());
        Some(PlayStateChange::Failed { message })
    }

    /// Seek to zero, resuming if the unit is playing
    pub fn restart(&mut self) -> Option<PlayStateChange> {
        if let Err(e) = self.resource.restart() {
            warn!(track_id = %self.entry.id, error = %e, "Failed to restart track");
            let message = e.to_string();
            self.failed = Some(message.clone());
            return Some(PlayStateChange::Failed { message });
        }

        if self.is_playing {
            // A finished resource stops by itself; resume it
            if let Err(e) = self.resource.play() {
                warn!(track_id = %self.entry.id, error = %e, "Track failed to resume");
                self.is_playing = false;
                let message = e.to_string();
                self.failed = Some(message.clone());
                return Some(PlayStateChange::Failed { message });
            }
            None
        } else {
            self.reconcile()
        }
    }

    /// Stop and let go of the resource
    pub fn release(&mut self) {
        if self.is_playing {
            self.resource.pause();
            self.is_playing = false;
        }
        self.resource.release();
        debug!(track_id = %self.entry.id, "Track released");
    }
}

/// Play state change seen by an observer when one song replaces another
///
/// A stream that was playing and keeps playing shows no flip.
pub(crate) fn continuity(
    was_playing: bool,
    change: Option<PlayStateChange>,
) -> Option<PlayStateChange> {
    match change {
        Some(PlayStateChange::Started) if was_playing => None,
        None if was_playing => Some(PlayStateChange::Stopped),
        change => change,
    }
}

/// Stand-in for a resource the factory could not build
struct UnavailableResource {
    reason: String,
}

impl AudioResource for UnavailableResource {
    fn play(&mut self) -> hearth_core::Result<()> {
        Err(HearthError::audio(format!("resource unavailable: {}", self.reason)))
    }

    fn pause(&mut self) {}

    fn set_volume(&mut self, _volume: f32) {}

    fn set_looping(&mut self, _looping: bool) {}

    fn set_source(&mut self, _source: &SourceRef) -> hearth_core::Result<()> {
        Err(HearthError::audio(format!("resource unavailable: {}", self.reason)))
    }

    fn restart(&mut self) -> hearth_core::Result<()> {
        Ok(())
    }

    fn release(&mut self) {}
}

impl std::fmt::Debug for TrackUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackUnit")
            .field("id", &self.entry.id)
            .field("volume", &self.volume)
            .field("master", &self.master)
            .field("transport", &self.transport)
            .field("is_playing", &self.is_playing)
            .field("failed", &self.failed)
            .finish_non_exhaustive()
    }
}
