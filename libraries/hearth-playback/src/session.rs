//! Mixing session - core orchestration
//!
//! Coordinates transport, master volume, the ambience mixer, the music
//! sequencer, persisted preferences and catalog loading. The session is the
//! only writer of the preference store.

use crate::{
    error::Result,
    events::{MusicSnapshot, SessionEvent, SessionSnapshot, SoundSnapshot},
    mixer::{AmbienceMixer, TrackChanges},
    preferences::Preferences,
    sequencer::{MusicSequencer, SequencerChange},
    track::TrackUnit,
    types::{clamp_volume, CatalogState, PlayStateChange, SessionConfig, Transport},
    volume::MasterVolume,
};
use hearth_core::{
    builtin_sounds, Catalog, CatalogEntry, CatalogProvider, HearthError, KeyValueStore,
    ResourceFactory, SourceRef, TrackId,
};
use tracing::{debug, info, warn};

/// Handle for one in-flight catalog load
///
/// Only the most recent ticket is honoured; anything issued before a newer
/// load, an applied catalog or a cancel is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CatalogTicket(u64);

impl CatalogTicket {
    /// Raw generation number (for crossing the JS boundary)
    pub fn generation(self) -> u64 {
        self.0
    }

    pub fn from_generation(generation: u64) -> Self {
        Self(generation)
    }
}

/// Ambient mixing session
pub struct MixingSession<S: KeyValueStore, F: ResourceFactory> {
    config: SessionConfig,
    prefs: Preferences<S>,
    factory: F,

    transport: Transport,
    master: MasterVolume,
    mixer: AmbienceMixer,
    sequencer: MusicSequencer,

    catalog_state: CatalogState,
    generation: u64,
    reset_count: u64,

    pending_events: Vec<SessionEvent>,
}

impl<S: KeyValueStore, F: ResourceFactory> MixingSession<S, F> {
    /// Create a session with an empty catalog
    ///
    /// Persisted master volume, loop and shuffle flags are applied right
    /// away; sound and music volumes are applied at each catalog load.
    pub fn new(config: SessionConfig, store: S, factory: F) -> Self {
        let prefs = Preferences::new(store, config.storage_keys.clone());
        let master =
            MasterVolume::new(prefs.master_volume()).with_restore_level(prefs.master_restore());

        let mut sequencer = MusicSequencer::new(config.shuffle_seed);
        sequencer.set_loop(prefs.loop_song());
        sequencer.set_shuffle(prefs.shuffle());
        sequencer.set_master_volume(master.level());

        let mut mixer = AmbienceMixer::new();
        mixer.set_master_volume(master.level());

        debug!(
            master = master.level(),
            loop_song = sequencer.loop_song(),
            shuffle = sequencer.shuffle(),
            "Mixing session created"
        );

        Self {
            config,
            prefs,
            factory,
            transport: Transport::Paused,
            master,
            mixer,
            sequencer,
            catalog_state: CatalogState::Idle,
            generation: 0,
            reset_count: 0,
            pending_events: Vec::new(),
        }
    }

    // ===== Transport =====

    /// Start every audible track
    pub fn play(&mut self) {
        self.set_transport(Transport::Playing);
    }

    /// Pause everything
    pub fn pause(&mut self) {
        self.set_transport(Transport::Paused);
    }

    /// Flip play/pause, returning the new transport
    pub fn toggle_play(&mut self) -> Transport {
        self.set_transport(self.transport.toggled());
        self.transport
    }

    pub fn set_transport(&mut self, transport: Transport) {
        if transport == self.transport {
            return;
        }
        self.transport = transport;
        info!(?transport, "Transport changed");

        let changes = self.mixer.set_transport(transport);
        self.emit_track_changes(changes);
        let changes = self.sequencer.set_transport(transport);
        self.emit_sequencer_changes(changes);

        self.pending_events.push(SessionEvent::TransportChanged { transport });
    }

    // ===== Master volume =====

    /// Set the master level (persisted)
    pub fn set_master_volume(&mut self, level: f32) {
        self.master.set_level(level);
        self.prefs.set_master_volume(self.master.level());
        self.apply_master();
    }

    /// Mute when audible, otherwise restore the level saved by the last mute
    ///
    /// With no saved level (or a saved zero) the master goes to full volume.
    pub fn toggle_master_mute(&mut self) {
        if self.master.is_muted() {
            self.master = MasterVolume::new(0.0).with_restore_level(self.prefs.master_restore());
            self.master.unmute();
        } else {
            self.master.mute();
            self.prefs.set_master_restore(self.master.restore_level());
        }

        self.prefs.set_master_volume(self.master.level());
        self.apply_master();
    }

    fn apply_master(&mut self) {
        let level = self.master.level();
        let changes = self.mixer.set_master_volume(level);
        self.emit_track_changes(changes);
        let changes = self.sequencer.set_master_volume(level);
        self.emit_sequencer_changes(changes);

        self.pending_events.push(SessionEvent::MasterVolumeChanged { level });
    }

    // ===== Ambience =====

    /// Set one ambience layer's level (persisted)
    pub fn set_sound_volume(&mut self, id: &TrackId, volume: f32) -> Result<()> {
        let volume = clamp_volume(volume);
        let change = self.mixer.set_track_volume(id, volume)?;
        self.prefs.set_sound_volume(id, volume);

        self.pending_events.push(SessionEvent::TrackVolumeChanged {
            track_id: id.clone(),
            volume,
        });
        if let Some(change) = change {
            self.emit_track_change(id.clone(), change);
        }
        Ok(())
    }

    /// Silence every ambience layer (and the music player when configured)
    ///
    /// The zeros are persisted, so a reload keeps everything silent.
    pub fn reset_volumes(&mut self) {
        self.reset_count += 1;

        let reset = self.mixer.reset_all();
        self.prefs
            .set_sound_volumes(reset.silenced.iter().map(|id| (id.clone(), 0.0)));
        for id in reset.silenced {
            self.pending_events.push(SessionEvent::TrackVolumeChanged {
                track_id: id,
                volume: 0.0,
            });
        }
        self.emit_track_changes(reset.changes);

        if self.config.reset_music_volume {
            self.set_music_volume(0.0);
        }

        info!(reset_count = self.reset_count, "Volumes reset");
        self.pending_events.push(SessionEvent::VolumesReset {
            reset_count: self.reset_count,
        });
    }

    // ===== Music =====

    /// Set the music player level (persisted)
    pub fn set_music_volume(&mut self, volume: f32) {
        let volume = clamp_volume(volume);
        let changes = self.sequencer.set_volume(volume);
        self.prefs.set_music_volume(volume);

        self.pending_events.push(SessionEvent::MusicVolumeChanged { volume });
        self.emit_sequencer_changes(changes);
    }

    pub fn next_song(&mut self) {
        let changes = self.sequencer.advance_next(&mut self.factory);
        self.emit_sequencer_changes(changes);
    }

    pub fn prev_song(&mut self) {
        let changes = self.sequencer.advance_prev(&mut self.factory);
        self.emit_sequencer_changes(changes);
    }

    /// The music stream reached the end of the active song
    pub fn song_ended(&mut self) {
        let changes = self.sequencer.on_active_song_ended(&mut self.factory);
        self.emit_sequencer_changes(changes);
    }

    /// Make a specific song active
    pub fn select_song(&mut self, id: &TrackId) -> Result<()> {
        let changes = self.sequencer.select(id, &mut self.factory)?;
        self.emit_sequencer_changes(changes);
        Ok(())
    }

    /// A resource reported a failure after its play request returned
    ///
    /// Covers refused play requests and media errors raised while loading
    /// or decoding. Every sound layer or song currently on `source` is marked
    /// stopped and gets a `TrackFailed` event.
    pub fn resource_failed(&mut self, source: &SourceRef, message: &str) {
        let changes = self.mixer.mark_failed(source, message);
        self.emit_track_changes(changes);
        let changes = self.sequencer.mark_failed(source, message);
        self.emit_sequencer_changes(changes);
    }

    /// Flip looping of the active song (persisted)
    pub fn toggle_loop(&mut self) -> bool {
        let enabled = self.sequencer.toggle_loop();
        self.prefs.set_loop_song(enabled);
        self.pending_events.push(SessionEvent::LoopChanged { enabled });
        enabled
    }

    /// Flip shuffle (persisted)
    pub fn toggle_shuffle(&mut self) -> bool {
        let enabled = self.sequencer.toggle_shuffle();
        self.prefs.set_shuffle(enabled);
        self.pending_events.push(SessionEvent::ShuffleChanged { enabled });
        enabled
    }

    // ===== Catalog =====

    /// Mark a catalog fetch as in flight
    ///
    /// Any earlier ticket becomes stale.
    pub fn begin_catalog_load(&mut self) -> CatalogTicket {
        self.generation += 1;
        self.catalog_state = CatalogState::Loading;
        debug!(generation = self.generation, "Catalog load started");
        CatalogTicket(self.generation)
    }

    /// Deliver the result of a fetch
    ///
    /// Returns `false` (and changes nothing) for a stale ticket. A failed
    /// fetch loads an empty user catalog: bundled sounds only, no songs.
    pub fn complete_catalog_load(
        &mut self,
        ticket: CatalogTicket,
        result: std::result::Result<Catalog, HearthError>,
    ) -> bool {
        if ticket.0 != self.generation || self.catalog_state != CatalogState::Loading {
            debug!(
                ticket = ticket.0,
                generation = self.generation,
                "Ignoring stale catalog result"
            );
            return false;
        }

        match result {
            Ok(catalog) => {
                self.load_catalog(&catalog);
                self.catalog_state = CatalogState::Ready;
            }
            Err(e) => {
                warn!(error = %e, "Catalog load failed, falling back to bundled sounds");
                self.load_catalog(&Catalog::default());
                self.catalog_state = CatalogState::Failed;
                self.pending_events.push(SessionEvent::CatalogLoadFailed {
                    message: e.to_string(),
                });
            }
        }
        true
    }

    /// Drop any in-flight fetch (logout, teardown)
    pub fn cancel_catalog_load(&mut self) {
        self.generation += 1;
        if self.catalog_state == CatalogState::Loading {
            self.catalog_state = CatalogState::Idle;
        }
        debug!(generation = self.generation, "Catalog load cancelled");
    }

    /// Replace the catalog right away, cancelling any in-flight fetch
    pub fn apply_catalog(&mut self, catalog: &Catalog) {
        self.generation += 1;
        self.load_catalog(catalog);
        self.catalog_state = CatalogState::Ready;
    }

    /// Fetch from a provider and apply the result
    ///
    /// Returns `false` if another load superseded this one while it was in
    /// flight.
    pub async fn refresh_catalog<P>(&mut self, provider: &P, token: Option<&str>) -> bool
    where
        P: CatalogProvider + ?Sized,
    {
        let ticket = self.begin_catalog_load();
        let result = provider.fetch_catalog(token).await;
        self.complete_catalog_load(ticket, result)
    }

    fn load_catalog(&mut self, catalog: &Catalog) {
        // Custom sounds first, then the bundled ones
        let mut sounds: Vec<CatalogEntry> = catalog.ambience_entries();
        if self.config.include_builtin_sounds {
            sounds.extend(builtin_sounds());
        }
        let songs = catalog.song_entries();
        let counts = (sounds.len(), songs.len());

        let stored = self.prefs.sound_volumes();
        let changes = self.mixer.load_catalog(
            sounds,
            &stored,
            self.master.level(),
            self.transport,
            &mut self.factory,
        );
        self.emit_track_changes(changes);

        let changes = self
            .sequencer
            .load_playlist(songs, self.prefs.music_volume(), &mut self.factory);
        self.emit_sequencer_changes(changes);

        info!(sounds = counts.0, songs = counts.1, "Catalog applied");
        self.pending_events.push(SessionEvent::CatalogLoaded {
            sounds: counts.0,
            songs: counts.1,
        });
    }

    /// Stop and release every resource
    pub fn release_all(&mut self) {
        self.mixer.release_all();
        self.sequencer.release();
    }

    // ===== Queries =====

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn transport(&self) -> Transport {
        self.transport
    }

    pub fn master_volume(&self) -> f32 {
        self.master.level()
    }

    pub fn mixer(&self) -> &AmbienceMixer {
        &self.mixer
    }

    pub fn sequencer(&self) -> &MusicSequencer {
        &self.sequencer
    }

    pub fn active_song_id(&self) -> Option<&TrackId> {
        self.sequencer.active_id()
    }

    pub fn active_song(&self) -> Option<&CatalogEntry> {
        self.sequencer.active_song()
    }

    pub fn sound(&self, id: &TrackId) -> Option<&TrackUnit> {
        self.mixer.track(id)
    }

    /// Current level of one ambience layer
    pub fn sound_volume(&self, id: &TrackId) -> Option<f32> {
        self.sound(id).map(TrackUnit::volume)
    }

    pub fn catalog_state(&self) -> CatalogState {
        self.catalog_state
    }

    pub fn reset_count(&self) -> u64 {
        self.reset_count
    }

    pub fn preferences(&self) -> &Preferences<S> {
        &self.prefs
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Full observable state
    pub fn snapshot(&self) -> SessionSnapshot {
        let sounds = self
            .mixer
            .tracks()
            .iter()
            .map(|unit| SoundSnapshot {
                id: unit.id().clone(),
                name: unit.display_name().to_string(),
                icon: unit.entry().icon.clone(),
                origin: unit.origin(),
                volume: unit.volume(),
                is_playing: unit.is_playing(),
                error: unit.failure().map(str::to_string),
            })
            .collect();

        SessionSnapshot {
            transport: self.transport,
            master_volume: self.master.level(),
            catalog_state: self.catalog_state,
            reset_count: self.reset_count,
            sounds,
            music: MusicSnapshot {
                active_song: self.sequencer.active_id().cloned(),
                title: self.sequencer.active_song().map(|song| song.display_title()),
                volume: self.sequencer.volume(),
                is_playing: self.sequencer.is_playing(),
                loop_song: self.sequencer.loop_song(),
                shuffle: self.sequencer.shuffle(),
                playlist: self.sequencer.playlist().to_vec(),
            },
        }
    }

    // ===== Events =====

    /// Drain all pending events
    ///
    /// Returns all events emitted since the last drain, oldest first.
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.pending_events)
    }

    pub fn has_pending_events(&self) -> bool {
        !self.pending_events.is_empty()
    }

    fn emit_track_change(&mut self, track_id: TrackId, change: PlayStateChange) {
        let event = match change {
            PlayStateChange::Started => SessionEvent::TrackPlaybackChanged {
                track_id,
                is_playing: true,
            },
            PlayStateChange::Stopped => SessionEvent::TrackPlaybackChanged {
                track_id,
                is_playing: false,
            },
            PlayStateChange::Failed { message } => SessionEvent::TrackFailed { track_id, message },
        };
        self.pending_events.push(event);
    }

    fn emit_track_changes(&mut self, changes: TrackChanges) {
        for (id, change) in changes {
            self.emit_track_change(id, change);
        }
    }

    fn emit_sequencer_changes(&mut self, changes: Vec<SequencerChange>) {
        for change in changes {
            match change {
                SequencerChange::ActiveChanged { song_id, previous } => {
                    self.pending_events
                        .push(SessionEvent::ActiveSongChanged { song_id, previous });
                }
                SequencerChange::Restarted(song_id) => {
                    self.pending_events.push(SessionEvent::SongRestarted { song_id });
                }
                SequencerChange::Playback(id, change) => self.emit_track_change(id, change),
            }
        }
    }
}

impl<S: KeyValueStore, F: ResourceFactory> std::fmt::Debug for MixingSession<S, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MixingSession")
            .field("transport", &self.transport)
            .field("master", &self.master)
            .field("mixer", &self.mixer)
            .field("sequencer", &self.sequencer)
            .field("catalog_state", &self.catalog_state)
            .field("reset_count", &self.reset_count)
            .finish_non_exhaustive()
    }
}
