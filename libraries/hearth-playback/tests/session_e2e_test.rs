//! End-to-end tests for MixingSession
//!
//! Drives a session the way the web client does and checks what the fake
//! `<audio>` elements end up doing:
//! - Catalog loading and replacement
//! - Transport and master volume
//! - Ambience layers and persistence
//! - Song sequencing (next/prev, loop, shuffle, song end)
//! - Failure handling

mod common;

use async_trait::async_trait;
use common::{catalog, session_with, stored_volumes};
use hearth_core::{
    Catalog, CatalogProvider, HearthError, KeyValueStore, StaticCatalogProvider, TrackId,
};
use hearth_playback::{CatalogState, SessionEvent, Transport};
use std::collections::HashSet;

fn id(s: &str) -> TrackId {
    TrackId::new(s)
}

// ============================================================================
// Catalog loading
// ============================================================================

#[test]
fn stored_rain_volume_waits_for_play() {
    let (mut session, factory) = session_with(&[("soundVolumeStorage", r#"{"local-1":0.5}"#)]);
    session.apply_catalog(&Catalog::default());

    assert_eq!(session.sound_volume(&id("local-1")), Some(0.5));
    assert!(!factory.elements.borrow().get("local-1").unwrap().playing);

    session.play();

    let elements = factory.elements.borrow();
    let rain = elements.get("local-1").unwrap();
    assert!(rain.playing);
    assert!(rain.looping);
    assert_eq!(rain.volume, 0.5);
    assert_eq!(elements.playing_sources(), vec!["sounds/rain.mp3"]);
}

#[test]
fn catalog_replacement_releases_every_prior_unit_once() {
    let (mut session, factory) = session_with(&[
        ("soundVolumeStorage", r#"{"local-1":0.5,"1":0.7}"#),
        ("musicVolumeStorage", "0.5"),
    ]);
    session.apply_catalog(&catalog(2, 3));
    session.play();
    assert!(factory.elements.borrow().playing_sources().len() >= 3);

    let before = factory.elements.borrow().all.len();
    session.apply_catalog(&catalog(1, 0));

    let elements = factory.elements.borrow();
    for (track_id, state) in &elements.all[..before] {
        // The music stream is released only because the playlist emptied
        assert_eq!(state.released, 1, "{} released {} times", track_id, state.released);
        assert!(!state.playing);
    }
    assert!(session.active_song_id().is_none());
}

#[test]
fn reload_restores_persisted_volumes() {
    let (mut session, _) = session_with(&[]);
    session.apply_catalog(&catalog(1, 0));
    session.set_sound_volume(&id("1"), 0.3).unwrap();
    session.set_sound_volume(&id("local-5"), 0.9).unwrap();

    session.apply_catalog(&catalog(1, 0));
    assert_eq!(session.sound_volume(&id("1")), Some(0.3));
    assert_eq!(session.sound_volume(&id("local-5")), Some(0.9));
}

#[test]
fn stale_catalog_result_is_dropped() {
    let (mut session, _) = session_with(&[]);

    let first = session.begin_catalog_load();
    let second = session.begin_catalog_load();

    assert!(session.complete_catalog_load(second, Ok(catalog(1, 2))));
    assert!(!session.complete_catalog_load(first, Ok(catalog(3, 0))));

    assert_eq!(session.mixer().len(), 7);
    assert_eq!(session.sequencer().playlist().len(), 2);
}

#[test]
fn failed_catalog_loads_builtins_only() {
    let (mut session, _) = session_with(&[]);
    let ticket = session.begin_catalog_load();

    session.complete_catalog_load(ticket, Err(HearthError::network("connection refused")));

    assert_eq!(session.catalog_state(), CatalogState::Failed);
    let ids: Vec<_> = session.mixer().ids();
    assert_eq!(ids.len(), 6);
    assert!(ids.iter().all(|id| id.as_str().starts_with("local-")));
    assert!(session.sequencer().playlist().is_empty());
}

#[tokio::test]
async fn refresh_from_static_provider() {
    let (mut session, _) = session_with(&[]);
    let provider = StaticCatalogProvider::new(catalog(2, 2));

    assert!(session.refresh_catalog(&provider, Some("token")).await);
    assert_eq!(session.catalog_state(), CatalogState::Ready);
    assert_eq!(session.mixer().len(), 8);
    assert_eq!(session.active_song_id(), Some(&id("100")));
}

struct UnreachableProvider;

#[async_trait]
impl CatalogProvider for UnreachableProvider {
    async fn fetch_catalog(&self, _token: Option<&str>) -> hearth_core::Result<Catalog> {
        Err(HearthError::network("server unreachable"))
    }
}

#[tokio::test]
async fn refresh_from_failing_provider() {
    let (mut session, _) = session_with(&[]);

    assert!(session.refresh_catalog(&UnreachableProvider, None).await);
    assert_eq!(session.catalog_state(), CatalogState::Failed);
    assert_eq!(session.mixer().len(), 6);

    let events = session.drain_events();
    assert!(events.iter().any(|e| matches!(
        e,
        SessionEvent::CatalogLoadFailed { message } if message.contains("server unreachable")
    )));
}

// ============================================================================
// Transport and master volume
// ============================================================================

#[test]
fn pause_stops_everything_and_play_resumes_audible_tracks() {
    let (mut session, factory) = session_with(&[
        ("soundVolumeStorage", r#"{"local-2":0.4,"local-3":0}"#),
        ("musicVolumeStorage", "0.8"),
    ]);
    session.apply_catalog(&catalog(0, 2));

    session.play();
    assert_eq!(factory.elements.borrow().playing_sources().len(), 2);

    session.pause();
    assert!(factory.elements.borrow().playing_sources().is_empty());

    session.play();
    let elements = factory.elements.borrow();
    assert!(elements.get("local-2").unwrap().playing);
    assert!(!elements.get("local-3").unwrap().playing);
    assert!(elements.get("100").unwrap().playing);
}

#[test]
fn master_scales_every_track() {
    let (mut session, factory) = session_with(&[
        ("soundVolumeStorage", r#"{"local-1":0.5}"#),
        ("musicVolumeStorage", "1"),
    ]);
    session.apply_catalog(&catalog(0, 1));
    session.play();

    session.set_master_volume(0.5);

    let elements = factory.elements.borrow();
    assert_eq!(elements.get("local-1").unwrap().volume, 0.25);
    assert_eq!(elements.get("100").unwrap().volume, 0.5);
    drop(elements);

    // Raw levels are untouched
    assert_eq!(session.sound_volume(&id("local-1")), Some(0.5));
    assert_eq!(session.sequencer().volume(), 1.0);
}

#[test]
fn master_mute_pauses_and_unmute_resumes() {
    let (mut session, factory) = session_with(&[
        ("soundVolumeStorage", r#"{"local-1":0.5}"#),
        ("masterVolumeStorage", "0.6"),
    ]);
    session.apply_catalog(&Catalog::default());
    session.play();

    session.toggle_master_mute();
    assert_eq!(session.master_volume(), 0.0);
    assert!(!factory.elements.borrow().get("local-1").unwrap().playing);

    session.toggle_master_mute();
    assert_eq!(session.master_volume(), 0.6);
    assert!(factory.elements.borrow().get("local-1").unwrap().playing);
}

#[test]
fn preferences_survive_a_new_session() {
    let (mut session, _) = session_with(&[]);
    session.apply_catalog(&catalog(0, 3));
    session.set_master_volume(0.7);
    session.set_music_volume(0.2);
    session.toggle_loop();
    session.toggle_shuffle();

    let store = session.preferences().store().clone();
    let (reopened, _) = {
        let items: Vec<(String, String)> = [
            "masterVolumeStorage",
            "musicVolumeStorage",
            "loopSongStorage",
            "shuffleStorage",
        ]
        .iter()
        .filter_map(|key| store.get_item(key).map(|v| (key.to_string(), v)))
        .collect();
        let borrowed: Vec<(&str, &str)> = items.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        session_with(&borrowed)
    };

    assert_eq!(reopened.master_volume(), 0.7);
    assert!(reopened.sequencer().loop_song());
    assert!(reopened.sequencer().shuffle());
    assert_eq!(reopened.preferences().music_volume(), Some(0.2));
}

// ============================================================================
// Song sequencing
// ============================================================================

#[test]
fn next_and_prev_cycle_through_playlist() {
    let (mut session, _) = session_with(&[]);
    session.apply_catalog(&catalog(0, 3));

    session.next_song();
    session.next_song();
    assert_eq!(session.active_song_id(), Some(&id("102")));

    session.next_song();
    assert_eq!(session.active_song_id(), Some(&id("100")));

    session.prev_song();
    assert_eq!(session.active_song_id(), Some(&id("102")));
}

#[test]
fn song_end_with_loop_restarts_same_song() {
    let (mut session, factory) = session_with(&[("musicVolumeStorage", "0.5")]);
    session.apply_catalog(&catalog(0, 2));
    session.play();
    session.toggle_loop();
    session.drain_events();

    session.song_ended();

    assert_eq!(session.active_song_id(), Some(&id("100")));
    assert_eq!(factory.elements.borrow().get("100").unwrap().restarts, 1);
    assert_eq!(
        session.drain_events(),
        vec![SessionEvent::SongRestarted { song_id: id("100") }]
    );
}

#[test]
fn song_end_advances_and_keeps_playing() {
    let (mut session, factory) = session_with(&[("musicVolumeStorage", "0.5")]);
    session.apply_catalog(&catalog(0, 3));
    session.play();

    session.song_ended();
    session.song_ended();

    assert_eq!(session.active_song_id(), Some(&id("102")));
    assert!(session.sequencer().is_playing());
    // One shared stream, retargeted
    let elements = factory.elements.borrow();
    let stream = elements.get("100").unwrap();
    assert_eq!(stream.source, "https://cdn.example/songs/102.mp3");
    assert!(stream.playing);
}

#[test]
fn song_end_after_selection_follows_selected_song() {
    let (mut session, _) = session_with(&[]);
    session.apply_catalog(&catalog(0, 4));

    session.select_song(&id("102")).unwrap();
    session.song_ended();

    assert_eq!(session.active_song_id(), Some(&id("103")));
}

#[test]
fn shuffle_plays_every_song_once_per_cycle() {
    let (mut session, _) = session_with(&[]);
    session.apply_catalog(&catalog(0, 6));
    session.toggle_shuffle();

    let mut heard = HashSet::new();
    heard.insert(session.active_song_id().cloned().unwrap());
    for _ in 0..5 {
        session.next_song();
        assert!(heard.insert(session.active_song_id().cloned().unwrap()));
    }
    assert_eq!(heard.len(), 6);
}

#[test]
fn shuffle_prev_at_cycle_start_does_nothing() {
    let (mut session, _) = session_with(&[]);
    session.apply_catalog(&catalog(0, 4));
    session.toggle_shuffle();
    session.drain_events();

    session.prev_song();

    assert_eq!(session.active_song_id(), Some(&id("100")));
    assert!(session.drain_events().is_empty());
}

#[test]
fn shuffle_enabled_before_load_starts_on_shuffled_head() {
    let (mut session, _) = session_with(&[("shuffleStorage", "true")]);
    session.apply_catalog(&catalog(0, 5));

    let bag = session.sequencer().shuffle_bag();
    assert_eq!(bag.history().len(), 1);
    assert_eq!(bag.queue().len(), 4);
    assert_eq!(bag.current(), session.active_song_id());
}

// ============================================================================
// Reset and failures
// ============================================================================

#[test]
fn reset_silences_everything_and_persists_zeros() {
    let (mut session, factory) = session_with(&[
        ("soundVolumeStorage", r#"{"local-1":0.5,"local-6":1}"#),
        ("musicVolumeStorage", "0.9"),
    ]);
    session.apply_catalog(&catalog(1, 1));
    session.play();

    session.reset_volumes();

    assert!(factory.elements.borrow().playing_sources().is_empty());
    assert_eq!(session.reset_count(), 1);
    assert_eq!(session.transport(), Transport::Playing);

    let stored = stored_volumes(&session);
    assert_eq!(stored.len(), 7);
    assert!(stored.values().all(|v| *v == 0.0));
    assert_eq!(session.preferences().music_volume(), Some(0.0));
}

#[test]
fn broken_sound_does_not_affect_others() {
    let (mut session, factory) = session_with(&[("soundVolumeStorage", r#"{"local-1":0.5,"local-2":0.5}"#)]);
    factory.break_source("sounds/rain.mp3");
    session.apply_catalog(&Catalog::default());

    session.play();

    let snapshot = session.snapshot();
    let rain = snapshot.sounds.iter().find(|s| s.id == id("local-1")).unwrap();
    let waves = snapshot.sounds.iter().find(|s| s.id == id("local-2")).unwrap();
    assert!(!rain.is_playing);
    assert!(rain.error.is_some());
    assert!(waves.is_playing);

    let events = session.drain_events();
    assert!(events.iter().any(|e| matches!(e, SessionEvent::TrackFailed { track_id, .. } if track_id == &id("local-1"))));
}

#[test]
fn next_song_after_broken_song_plays() {
    let (mut session, factory) = session_with(&[("musicVolumeStorage", "0.5")]);
    factory.break_source("https://cdn.example/songs/100.mp3");
    session.apply_catalog(&catalog(0, 3));
    session.play();
    assert!(!session.sequencer().is_playing());

    session.next_song();

    assert_eq!(session.active_song_id(), Some(&id("101")));
    assert!(session.sequencer().is_playing());
    let events = session.drain_events();
    assert!(events.contains(&SessionEvent::TrackPlaybackChanged {
        track_id: id("101"),
        is_playing: true,
    }));
}

#[test]
fn music_recovers_when_first_stream_could_not_be_created() {
    let (mut session, factory) = session_with(&[("musicVolumeStorage", "0.5")]);
    factory.refuse_next_create("100");
    session.apply_catalog(&catalog(0, 3));
    session.play();
    assert!(!session.sequencer().is_playing());

    session.next_song();
    session.next_song();

    assert_eq!(session.active_song_id(), Some(&id("102")));
    assert!(session.sequencer().is_playing());
    let elements = factory.elements.borrow();
    assert!(elements.get("100").is_none());
    let stream = elements.get("101").unwrap();
    assert_eq!(stream.source, "https://cdn.example/songs/102.mp3");
    assert!(stream.playing);
}

#[test]
fn play_emits_track_events_before_transport() {
    let (mut session, _) = session_with(&[("soundVolumeStorage", r#"{"local-4":0.2}"#)]);
    session.apply_catalog(&Catalog::default());
    session.drain_events();

    session.play();

    assert_eq!(
        session.drain_events(),
        vec![
            SessionEvent::TrackPlaybackChanged {
                track_id: id("local-4"),
                is_playing: true,
            },
            SessionEvent::TransportChanged {
                transport: Transport::Playing,
            },
        ]
    );
}
