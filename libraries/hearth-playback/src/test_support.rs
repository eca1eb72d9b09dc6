//! Recording fakes shared by the unit tests

use hearth_core::{AudioResource, CatalogEntry, HearthError, ResourceFactory, Result, SourceRef};
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

/// Every call made on resources built by a [`FakeFactory`]
#[derive(Debug, Default)]
pub struct CallLog {
    pub created: Vec<String>,
    pub plays: Vec<String>,
    pub pauses: Vec<String>,
    pub restarts: Vec<String>,
    pub releases: Vec<String>,
    pub sources: Vec<String>,
}

impl CallLog {
    pub fn count(calls: &[String], id: &str) -> usize {
        calls.iter().filter(|c| c.as_str() == id).count()
    }
}

pub struct FakeResource {
    id: String,
    source: String,
    log: Rc<RefCell<CallLog>>,
    broken_sources: Rc<RefCell<HashSet<String>>>,
}

impl AudioResource for FakeResource {
    fn play(&mut self) -> Result<()> {
        if self.broken_sources.borrow().contains(&self.source) {
            return Err(HearthError::audio("media error"));
        }
        self.log.borrow_mut().plays.push(self.id.clone());
        Ok(())
    }

    fn pause(&mut self) {
        self.log.borrow_mut().pauses.push(self.id.clone());
    }

    fn set_volume(&mut self, _volume: f32) {}

    fn set_looping(&mut self, _looping: bool) {}

    fn set_source(&mut self, source: &SourceRef) -> Result<()> {
        self.source = source.to_string();
        self.log.borrow_mut().sources.push(source.to_string());
        Ok(())
    }

    fn restart(&mut self) -> Result<()> {
        self.log.borrow_mut().restarts.push(self.id.clone());
        Ok(())
    }

    fn release(&mut self) {
        self.log.borrow_mut().releases.push(self.id.clone());
    }
}

/// Factory whose resources write to a shared [`CallLog`]
///
/// Resources are labelled with the id of the entry they were created for.
/// A resource refuses to play while its current source is broken; entries
/// listed in `unavailable` get no resource at all, once each.
#[derive(Default)]
pub struct FakeFactory {
    pub log: Rc<RefCell<CallLog>>,
    pub unavailable: HashSet<String>,
    broken_sources: Rc<RefCell<HashSet<String>>>,
}

impl FakeFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> Rc<RefCell<CallLog>> {
        Rc::clone(&self.log)
    }

    pub fn break_source(&self, source: &str) {
        self.broken_sources.borrow_mut().insert(source.to_string());
    }
}

impl ResourceFactory for FakeFactory {
    fn create(&mut self, entry: &CatalogEntry) -> Result<Box<dyn AudioResource>> {
        let id = entry.id.to_string();
        if self.unavailable.remove(&id) {
            return Err(HearthError::audio("no free audio element"));
        }
        self.log.borrow_mut().created.push(id.clone());
        Ok(Box::new(FakeResource {
            id,
            source: entry.source.to_string(),
            log: Rc::clone(&self.log),
            broken_sources: Rc::clone(&self.broken_sources),
        }))
    }
}

/// Playlist of songs with ids "1".."n"
pub fn songs(n: usize) -> Vec<CatalogEntry> {
    (1..=n)
        .map(|i| {
            CatalogEntry::song(
                i.to_string().as_str(),
                format!("Song {i}"),
                Some("Various".to_string()),
                format!("https://cdn.example/{i}.mp3"),
            )
        })
        .collect()
}
