//! Ambience mixer: the set of concurrently looping sound layers

use crate::error::{PlaybackError, Result};
use crate::track::TrackUnit;
use crate::types::{PlayStateChange, Transport};
use hearth_core::{CatalogEntry, ResourceFactory, SourceRef, TrackId};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// Play state changes produced by one mixer operation
pub type TrackChanges = Vec<(TrackId, PlayStateChange)>;

/// Outcome of a user-triggered reset
#[derive(Debug, Default)]
pub struct MixerReset {
    /// Every sound that was set to zero
    pub silenced: Vec<TrackId>,
    /// Sounds that stopped because of it
    pub changes: TrackChanges,
}

/// Ambience layers in display order
#[derive(Debug)]
pub struct AmbienceMixer {
    tracks: Vec<TrackUnit>,
    master: f32,
    transport: Transport,
}

impl AmbienceMixer {
    pub fn new() -> Self {
        Self {
            tracks: Vec::new(),
            master: 1.0,
            transport: Transport::Paused,
        }
    }

    /// Replace every layer
    ///
    /// Prior units are released first. Each entry starts at its stored
    /// volume (0 when absent) under the given master level and transport.
    /// Entries repeating an earlier id are skipped.
    pub fn load_catalog(
        &mut self,
        entries: Vec<CatalogEntry>,
        stored_volumes: &HashMap<TrackId, f32>,
        master: f32,
        transport: Transport,
        factory: &mut dyn ResourceFactory,
    ) -> TrackChanges {
        self.release_all();
        self.master = master;
        self.transport = transport;

        let mut seen = HashSet::new();
        let mut changes = Vec::new();

        for entry in entries {
            if !seen.insert(entry.id.clone()) {
                warn!(track_id = %entry.id, "Skipping duplicate ambience entry");
                continue;
            }

            let volume = stored_volumes.get(&entry.id).copied().unwrap_or(0.0);
            let mut unit = TrackUnit::create(entry, factory, volume, master, transport);
            if let Some(change) = unit.reconcile() {
                changes.push((unit.id().clone(), change));
            }
            self.tracks.push(unit);
        }

        info!(
            sounds = self.tracks.len(),
            playing = self.playing_count(),
            "Ambience catalog loaded"
        );
        changes
    }

    /// Set one layer's level
    pub fn set_track_volume(&mut self, id: &TrackId, volume: f32) -> Result<Option<PlayStateChange>> {
        let unit = self
            .tracks
            .iter_mut()
            .find(|unit| unit.id() == id)
            .ok_or_else(|| PlaybackError::UnknownTrack(id.clone()))?;

        Ok(unit.set_volume(volume))
    }

    /// Push a new master level to every layer
    pub fn set_master_volume(&mut self, master: f32) -> TrackChanges {
        self.master = master;
        self.broadcast(|unit| unit.apply_master_volume(master))
    }

    /// Push a new transport to every layer
    ///
    /// Silent layers stay paused.
    pub fn set_transport(&mut self, transport: Transport) -> TrackChanges {
        self.transport = transport;
        self.broadcast(|unit| unit.set_transport(transport))
    }

    /// Record a late failure reported by the resource playing `source`
    pub fn mark_failed(&mut self, source: &SourceRef, message: &str) -> TrackChanges {
        self.tracks
            .iter_mut()
            .filter(|unit| unit.source() == source)
            .filter_map(|unit| unit.mark_failed(message).map(|change| (unit.id().clone(), change)))
            .collect()
    }

    /// Silence every layer
    pub fn reset_all(&mut self) -> MixerReset {
        let silenced = self.ids();
        let changes = self.broadcast(|unit| unit.set_volume(0.0));
        debug!(sounds = silenced.len(), "Ambience volumes reset");
        MixerReset { silenced, changes }
    }

    /// Stop and release every layer
    pub fn release_all(&mut self) {
        for mut unit in self.tracks.drain(..) {
            unit.release();
        }
    }

    // ===== Queries =====

    pub fn track(&self, id: &TrackId) -> Option<&TrackUnit> {
        self.tracks.iter().find(|unit| unit.id() == id)
    }

    pub fn tracks(&self) -> &[TrackUnit] {
        &self.tracks
    }

    pub fn ids(&self) -> Vec<TrackId> {
        self.tracks.iter().map(|unit| unit.id().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn playing_count(&self) -> usize {
        self.tracks.iter().filter(|unit| unit.is_playing()).count()
    }

    pub fn master_volume(&self) -> f32 {
        self.master
    }

    pub fn transport(&self) -> Transport {
        self.transport
    }

    fn broadcast(&mut self, mut apply: impl FnMut(&mut TrackUnit) -> Option<PlayStateChange>) -> TrackChanges {
        self.tracks
            .iter_mut()
            .filter_map(|unit| apply(unit).map(|change| (unit.id().clone(), change)))
            .collect()
    }
}

impl Default for AmbienceMixer {
    fn default() -> Self {
        Self::new()
    }
}
