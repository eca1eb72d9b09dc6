//! Music sequencer: playlist, active song, loop and shuffle
//!
//! One shared player stream plays the active song. The player exists only
//! while a song is active; switching songs retargets it instead of building
//! a new one. A player whose resource is missing or refuses the new source
//! is released and rebuilt through the factory.

use crate::error::{PlaybackError, Result};
use crate::shuffle::ShuffleBag;
use crate::track::{continuity, TrackUnit};
use crate::types::{clamp_volume, PlayStateChange, Transport};
use hearth_core::{CatalogEntry, ResourceFactory, SourceRef, TrackId};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Whether a song is active
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "song_id", rename_all = "snake_case")]
pub enum SequencerState {
    /// Empty playlist, no player
    NoActive,
    /// This song owns the player
    Active(TrackId),
}

/// Observable effect of a sequencer operation
#[derive(Debug, Clone, PartialEq)]
pub enum SequencerChange {
    /// A different song (or none) became active
    ActiveChanged {
        song_id: Option<TrackId>,
        previous: Option<TrackId>,
    },
    /// The active song went back to its start
    Restarted(TrackId),
    /// The player started, stopped or failed
    Playback(TrackId, PlayStateChange),
}

/// Playlist sequencing state
#[derive(Debug)]
pub struct MusicSequencer {
    playlist: Vec<CatalogEntry>,
    player: Option<TrackUnit>,
    volume: f32,
    master: f32,
    transport: Transport,
    loop_song: bool,
    shuffle: bool,
    bag: ShuffleBag,
    rng: StdRng,
}

impl MusicSequencer {
    /// Create an empty sequencer; `seed` fixes the shuffle order
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            playlist: Vec::new(),
            player: None,
            volume: 0.0,
            master: 1.0,
            transport: Transport::Paused,
            loop_song: false,
            shuffle: false,
            bag: ShuffleBag::new(),
            rng,
        }
    }

    // ===== Playlist =====

    /// Replace the playlist
    ///
    /// The active song survives if its id is still listed. Otherwise the
    /// first song (or the head of a fresh shuffle order) takes over. An
    /// empty playlist releases the player.
    pub fn load_playlist(
        &mut self,
        songs: Vec<CatalogEntry>,
        stored_volume: Option<f32>,
        factory: &mut dyn ResourceFactory,
    ) -> Vec<SequencerChange> {
        let previous = self.active_id().cloned();
        self.playlist = songs;
        if let Some(volume) = stored_volume {
            self.volume = clamp_volume(volume);
        }

        info!(songs = self.playlist.len(), "Playlist loaded");

        if self.playlist.is_empty() {
            self.release();
            self.bag.clear();
            return match previous {
                Some(previous) => vec![SequencerChange::ActiveChanged {
                    song_id: None,
                    previous: Some(previous),
                }],
                None => Vec::new(),
            };
        }

        let ids = self.ids();
        let mut changes = Vec::new();

        match previous.filter(|id| ids.contains(id)) {
            Some(active) => {
                // Refresh the record; only a new source needs a retarget
                if let Some(entry) = self.entry(&active).cloned() {
                    let repoint = self
                        .player
                        .as_ref()
                        .is_some_and(|player| player.source() != &entry.source || !player.has_resource());
                    if repoint {
                        let change = self.point_player(entry, factory);
                        changes.extend(player_change(change, &active));
                    } else if let Some(player) = self.player.as_mut() {
                        player.refresh_entry(entry);
                    }
                    let volume = self.volume;
                    changes.extend(self.with_player(|player| player.set_volume(volume)));
                }
                if self.shuffle {
                    self.bag.retain(&ids);
                    if self.bag.is_empty() {
                        self.bag.seed(&ids, &active, &mut self.rng);
                    }
                }
            }
            None => {
                let next = if self.shuffle {
                    self.bag.start(&ids, &mut self.rng)
                } else {
                    ids.first().cloned()
                };
                if let Some(next) = next {
                    changes.extend(self.activate(&next, factory));
                }
            }
        }

        changes
    }

    // ===== Navigation =====

    /// Move to the next song
    pub fn advance_next(&mut self, factory: &mut dyn ResourceFactory) -> Vec<SequencerChange> {
        let Some(active) = self.active_id().cloned() else {
            return Vec::new();
        };

        let next = if self.shuffle {
            let ids = self.ids();
            self.bag.next(&ids, &mut self.rng)
        } else {
            self.neighbour(&active, 1)
        };

        match next {
            Some(next) if next == active => self.restart(factory),
            Some(next) => self.activate(&next, factory),
            None => Vec::new(),
        }
    }

    /// Move to the previous song
    ///
    /// With shuffle on this walks back through the songs played this cycle
    /// and stops at the first one.
    pub fn advance_prev(&mut self, factory: &mut dyn ResourceFactory) -> Vec<SequencerChange> {
        let Some(active) = self.active_id().cloned() else {
            return Vec::new();
        };

        let prev = if self.shuffle {
            self.bag.prev()
        } else {
            self.neighbour(&active, self.playlist.len() - 1)
        };

        match prev {
            Some(prev) if prev == active => self.restart(factory),
            Some(prev) => self.activate(&prev, factory),
            None => Vec::new(),
        }
    }

    /// The active song reached its end
    ///
    /// Loops the song when looping is on or there is nothing else to play,
    /// otherwise advances.
    pub fn on_active_song_ended(&mut self, factory: &mut dyn ResourceFactory) -> Vec<SequencerChange> {
        if self.player.is_none() {
            return Vec::new();
        }

        if self.loop_song || self.playlist.len() < 2 {
            self.restart(factory)
        } else {
            self.advance_next(factory)
        }
    }

    /// Make a specific song active
    pub fn select(
        &mut self,
        id: &TrackId,
        factory: &mut dyn ResourceFactory,
    ) -> Result<Vec<SequencerChange>> {
        if self.entry(id).is_none() {
            return Err(PlaybackError::UnknownTrack(id.clone()));
        }
        if self.active_id() == Some(id) {
            return Ok(Vec::new());
        }

        if self.shuffle {
            let ids = self.ids();
            self.bag.seed(&ids, id, &mut self.rng);
        }
        Ok(self.activate(id, factory))
    }

    // ===== Levels and flags =====

    /// Set the player level (one slot shared by every song)
    pub fn set_volume(&mut self, volume: f32) -> Vec<SequencerChange> {
        self.volume = clamp_volume(volume);
        self.with_player(|player| player.set_volume(volume))
    }

    pub fn set_master_volume(&mut self, master: f32) -> Vec<SequencerChange> {
        self.master = clamp_volume(master);
        self.with_player(|player| player.apply_master_volume(master))
    }

    pub fn set_transport(&mut self, transport: Transport) -> Vec<SequencerChange> {
        self.transport = transport;
        self.with_player(|player| player.set_transport(transport))
    }

    pub fn set_loop(&mut self, enabled: bool) {
        self.loop_song = enabled;
    }

    /// Flip looping, returning the new value
    pub fn toggle_loop(&mut self) -> bool {
        self.set_loop(!self.loop_song);
        self.loop_song
    }

    /// Turn shuffle on or off
    ///
    /// Turning it on starts a cycle around the active song; turning it off
    /// forgets the cycle.
    pub fn set_shuffle(&mut self, enabled: bool) {
        self.shuffle = enabled;
        self.bag.clear();

        if enabled {
            if let Some(active) = self.active_id().cloned() {
                let ids = self.ids();
                self.bag.seed(&ids, &active, &mut self.rng);
            }
        }
        debug!(enabled, "Shuffle changed");
    }

    /// Flip shuffle, returning the new value
    pub fn toggle_shuffle(&mut self) -> bool {
        self.set_shuffle(!self.shuffle);
        self.shuffle
    }

    /// Record a failure the player's resource reported after the fact
    ///
    /// Ignored unless the player is currently on `source`.
    pub fn mark_failed(&mut self, source: &SourceRef, message: &str) -> Vec<SequencerChange> {
        match self.player.as_ref() {
            Some(player) if player.source() == source => {
                self.with_player(|player| player.mark_failed(message))
            }
            _ => Vec::new(),
        }
    }

    /// Stop and drop the player
    pub fn release(&mut self) {
        if let Some(mut player) = self.player.take() {
            player.release();
        }
    }

    // ===== Queries =====

    pub fn state(&self) -> SequencerState {
        match self.active_id() {
            Some(id) => SequencerState::Active(id.clone()),
            None => SequencerState::NoActive,
        }
    }

    pub fn playlist(&self) -> &[CatalogEntry] {
        &self.playlist
    }

    pub fn active_id(&self) -> Option<&TrackId> {
        self.player.as_ref().map(|player| player.id())
    }

    /// Catalog record of the active song
    pub fn active_song(&self) -> Option<&CatalogEntry> {
        self.player.as_ref().map(|player| player.entry())
    }

    pub fn player(&self) -> Option<&TrackUnit> {
        self.player.as_ref()
    }

    pub fn is_playing(&self) -> bool {
        self.player.as_ref().is_some_and(|player| player.is_playing())
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn loop_song(&self) -> bool {
        self.loop_song
    }

    pub fn shuffle(&self) -> bool {
        self.shuffle
    }

    pub fn shuffle_bag(&self) -> &ShuffleBag {
        &self.bag
    }

    // ===== Internal =====

    fn ids(&self) -> Vec<TrackId> {
        self.playlist.iter().map(|song| song.id.clone()).collect()
    }

    fn entry(&self, id: &TrackId) -> Option<&CatalogEntry> {
        self.playlist.iter().find(|song| &song.id == id)
    }

    /// Song `offset` places after `id`, wrapping around
    fn neighbour(&self, id: &TrackId, offset: usize) -> Option<TrackId> {
        let len = self.playlist.len();
        let index = self
            .playlist
            .iter()
            .position(|song| &song.id == id)
            .unwrap_or(0);
        self.playlist
            .get((index + offset) % len)
            .map(|song| song.id.clone())
    }

    fn activate(&mut self, id: &TrackId, factory: &mut dyn ResourceFactory) -> Vec<SequencerChange> {
        let Some(entry) = self.entry(id).cloned() else {
            return Vec::new();
        };
        let previous = self.active_id().cloned();
        let mut changes: Vec<SequencerChange> =
            player_change(self.point_player(entry, factory), id).into_iter().collect();

        debug!(song_id = %id, previous = ?previous, "Active song changed");
        changes.insert(
            0,
            SequencerChange::ActiveChanged {
                song_id: Some(id.clone()),
                previous,
            },
        );
        changes
    }

    /// Put `entry` on the player, building a fresh one when needed
    ///
    /// The existing player is retargeted when it has a resource that accepts
    /// the new source. Otherwise it is released and the factory builds a
    /// replacement at the current levels and transport.
    fn point_player(
        &mut self,
        entry: CatalogEntry,
        factory: &mut dyn ResourceFactory,
    ) -> Option<PlayStateChange> {
        let was_playing = self.is_playing();

        if let Some(player) = self.player.as_mut().filter(|player| player.has_resource()) {
            match player.retarget(entry.clone()) {
                Ok(change) => return change,
                Err(e) => {
                    warn!(song_id = %entry.id, error = %e, "Player rejected source, rebuilding");
                }
            }
        }

        self.release();
        let mut player = TrackUnit::create(entry, factory, self.volume, self.master, self.transport);
        let change = player.reconcile();
        self.player = Some(player);
        continuity(was_playing, change)
    }

    fn restart(&mut self, factory: &mut dyn ResourceFactory) -> Vec<SequencerChange> {
        let Some(player) = self.player.as_mut() else {
            return Vec::new();
        };
        let id = player.id().clone();
        let change = if player.has_resource() {
            player.restart()
        } else {
            let entry = player.entry().clone();
            self.point_player(entry, factory)
        };

        let mut changes = vec![SequencerChange::Restarted(id.clone())];
        changes.extend(player_change(change, &id));
        changes
    }

    fn with_player(&mut self, apply: impl FnOnce(&mut TrackUnit) -> Option<PlayStateChange>) -> Vec<SequencerChange> {
        match self.player.as_mut() {
            Some(player) => {
                let id = player.id().clone();
                player_change(apply(player), &id).into_iter().collect()
            }
            None => Vec::new(),
        }
    }
}

fn player_change(change: Option<PlayStateChange>, id: &TrackId) -> Option<SequencerChange> {
    change.map(|change| SequencerChange::Playback(id.clone(), change))
}
