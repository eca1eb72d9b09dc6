//! Shuffle ordering for the music playlist
//!
//! `shuffle_with` is a plain Fisher-Yates pass over a copy of the input.
//! `ShuffleBag` walks a shuffled order without repeats: every song plays once
//! per cycle, then the whole playlist is reshuffled.

use hearth_core::TrackId;
use rand::Rng;
use std::collections::VecDeque;

/// Shuffle a copy of `items` using the thread-local RNG
pub fn shuffle<T: Clone>(items: &[T]) -> Vec<T> {
    shuffle_with(items, &mut rand::thread_rng())
}

/// Shuffle a copy of `items` with the given RNG
///
/// Fisher-Yates: for i from the last index down to 1, swap with a uniform
/// j in [0, i]. Every permutation is equally likely. The input is untouched.
pub fn shuffle_with<T: Clone, R: Rng + ?Sized>(items: &[T], rng: &mut R) -> Vec<T> {
    let mut shuffled = items.to_vec();
    for i in (1..shuffled.len()).rev() {
        let j = rng.gen_range(0..=i);
        shuffled.swap(i, j);
    }
    shuffled
}

/// Shuffle cycle state
///
/// `queue` holds songs still to come this cycle, `history` the songs played
/// this cycle with the active song on top. The two never share an id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShuffleBag {
    queue: VecDeque<TrackId>,
    history: Vec<TrackId>,
}

impl ShuffleBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Songs still to come this cycle
    pub fn queue(&self) -> &VecDeque<TrackId> {
        &self.queue
    }

    /// Songs played this cycle, oldest first
    pub fn history(&self) -> &[TrackId] {
        &self.history
    }

    /// Song on top of the history
    pub fn current(&self) -> Option<&TrackId> {
        self.history.last()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty() && self.history.is_empty()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
        self.history.clear();
    }

    /// Begin a fresh cycle over the whole playlist
    ///
    /// Returns the head of the new order, which becomes the only history
    /// entry. Returns `None` for an empty playlist.
    pub fn start<R: Rng + ?Sized>(&mut self, playlist: &[TrackId], rng: &mut R) -> Option<TrackId> {
        self.queue = shuffle_with(playlist, rng).into();
        self.history.clear();

        let head = self.queue.pop_front()?;
        self.history.push(head.clone());
        Some(head)
    }

    /// Begin a cycle around an already-active song
    ///
    /// The queue gets every other song in random order.
    pub fn seed<R: Rng + ?Sized>(&mut self, playlist: &[TrackId], active: &TrackId, rng: &mut R) {
        let rest: Vec<TrackId> = playlist.iter().filter(|id| *id != active).cloned().collect();
        self.queue = shuffle_with(&rest, rng).into();
        self.history = vec![active.clone()];
    }

    /// Move to the next song of the cycle
    ///
    /// When the cycle is exhausted the whole playlist is reshuffled and the
    /// history restarts from the new head.
    pub fn next<R: Rng + ?Sized>(&mut self, playlist: &[TrackId], rng: &mut R) -> Option<TrackId> {
        match self.queue.pop_front() {
            Some(id) => {
                self.history.push(id.clone());
                Some(id)
            }
            None => self.start(playlist, rng),
        }
    }

    /// Step back to the previously played song
    ///
    /// The current song goes back to the front of the queue. No-op with one
    /// or zero songs in the history, so stepping back past a reshuffle stops
    /// at the head of the new cycle.
    pub fn prev(&mut self) -> Option<TrackId> {
        if self.history.len() <= 1 {
            return None;
        }
        if let Some(current) = self.history.pop() {
            self.queue.push_front(current);
        }
        self.history.last().cloned()
    }

    /// Forget songs that left the playlist
    pub fn retain(&mut self, playlist: &[TrackId]) {
        self.queue.retain(|id| playlist.contains(id));
        self.history.retain(|id| playlist.contains(id));
    }
}
