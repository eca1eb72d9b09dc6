//! Shared test infrastructure for hearth-playback integration tests

#![allow(dead_code)]

use hearth_core::{
    AudioResource, Catalog, CatalogEntry, HearthError, MemoryStore, ResourceFactory, Result,
    SongRecord, SoundRecord, SourceRef, TrackId,
};
use hearth_playback::{MixingSession, SessionConfig};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

/// Install a log subscriber once; honours `RUST_LOG`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// State of one fake `<audio>` element
#[derive(Debug, Clone, Default)]
pub struct ElementState {
    pub source: String,
    pub playing: bool,
    pub volume: f32,
    pub looping: bool,
    pub plays: usize,
    pub pauses: usize,
    pub restarts: usize,
    pub released: usize,
}

/// Every element the factory has built, in creation order
#[derive(Debug, Default)]
pub struct Elements {
    pub all: Vec<(TrackId, ElementState)>,
}

impl Elements {
    /// Latest element created for this id
    pub fn get(&self, id: &str) -> Option<&ElementState> {
        self.all
            .iter()
            .rev()
            .find(|(track_id, _)| track_id.as_str() == id)
            .map(|(_, state)| state)
    }

    pub fn playing_sources(&self) -> Vec<String> {
        self.all
            .iter()
            .filter(|(_, state)| state.playing)
            .map(|(_, state)| state.source.clone())
            .collect()
    }

    pub fn total_released(&self) -> usize {
        self.all.iter().map(|(_, state)| state.released).sum()
    }
}

pub struct FakeElement {
    index: usize,
    elements: Rc<RefCell<Elements>>,
    broken: Rc<RefCell<HashSet<String>>>,
}

impl FakeElement {
    fn with_state(&self, f: impl FnOnce(&mut ElementState)) {
        f(&mut self.elements.borrow_mut().all[self.index].1);
    }

    fn on_broken_source(&self) -> bool {
        let elements = self.elements.borrow();
        self.broken.borrow().contains(&elements.all[self.index].1.source)
    }
}

impl AudioResource for FakeElement {
    fn play(&mut self) -> Result<()> {
        if self.on_broken_source() {
            return Err(HearthError::audio("MEDIA_ERR_SRC_NOT_SUPPORTED"));
        }
        self.with_state(|s| {
            s.playing = true;
            s.plays += 1;
        });
        Ok(())
    }

    fn pause(&mut self) {
        self.with_state(|s| {
            s.playing = false;
            s.pauses += 1;
        });
    }

    fn set_volume(&mut self, volume: f32) {
        self.with_state(|s| s.volume = volume);
    }

    fn set_looping(&mut self, looping: bool) {
        self.with_state(|s| s.looping = looping);
    }

    fn set_source(&mut self, source: &SourceRef) -> Result<()> {
        let source = source.to_string();
        self.with_state(|s| s.source = source);
        Ok(())
    }

    fn restart(&mut self) -> Result<()> {
        self.with_state(|s| s.restarts += 1);
        Ok(())
    }

    fn release(&mut self) {
        self.with_state(|s| {
            s.playing = false;
            s.released += 1;
        });
    }
}

/// Factory of fake elements sharing one [`Elements`] registry
///
/// Elements refuse to play while their current source is broken. Ids passed
/// to `refuse_next_create` get no element on their next creation.
#[derive(Default, Clone)]
pub struct FakeFactory {
    pub elements: Rc<RefCell<Elements>>,
    pub broken: Rc<RefCell<HashSet<String>>>,
    pub refused: Rc<RefCell<HashSet<String>>>,
}

impl FakeFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn break_source(&self, source: &str) {
        self.broken.borrow_mut().insert(source.to_string());
    }

    pub fn refuse_next_create(&self, id: &str) {
        self.refused.borrow_mut().insert(id.to_string());
    }
}

impl ResourceFactory for FakeFactory {
    fn create(&mut self, entry: &CatalogEntry) -> Result<Box<dyn AudioResource>> {
        if self.refused.borrow_mut().remove(entry.id.as_str()) {
            return Err(HearthError::audio("too many audio elements"));
        }
        let mut elements = self.elements.borrow_mut();
        elements.all.push((
            entry.id.clone(),
            ElementState {
                source: entry.source.to_string(),
                ..ElementState::default()
            },
        ));

        Ok(Box::new(FakeElement {
            index: elements.all.len() - 1,
            elements: Rc::clone(&self.elements),
            broken: Rc::clone(&self.broken),
        }))
    }
}

pub type TestSession = MixingSession<MemoryStore, FakeFactory>;

/// Session with a fixed shuffle seed over the given store contents
pub fn session_with(items: &[(&str, &str)]) -> (TestSession, FakeFactory) {
    init_tracing();
    let factory = FakeFactory::new();
    let config = SessionConfig {
        shuffle_seed: Some(42),
        ..SessionConfig::default()
    };
    let session = MixingSession::new(
        config,
        MemoryStore::with_items(items.iter().copied()),
        factory.clone(),
    );
    (session, factory)
}

pub fn sound(id: i64, name: &str) -> SoundRecord {
    SoundRecord {
        id: TrackId::from(id),
        name: name.to_string(),
        url: format!("https://cdn.example/sounds/{}.mp3", name.to_lowercase()),
    }
}

pub fn song(id: i64, name: &str) -> SongRecord {
    SongRecord {
        id: TrackId::from(id),
        name: name.to_string(),
        author: Some("Test Author".to_string()),
        url: format!("https://cdn.example/songs/{id}.mp3"),
    }
}

/// Catalog with `sounds` custom sounds and `songs` songs (ids from 1 and 100)
pub fn catalog(sounds: usize, songs: usize) -> Catalog {
    Catalog::new(
        (0..sounds)
            .map(|i| sound(i as i64 + 1, &format!("CUSTOM{}", i + 1)))
            .collect(),
        (0..songs).map(|i| song(i as i64 + 100, &format!("Song {}", i + 1))).collect(),
    )
}

pub fn stored_volumes(session: &TestSession) -> HashMap<TrackId, f32> {
    session.preferences().sound_volumes()
}
