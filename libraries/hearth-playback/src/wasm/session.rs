//! WASM-compatible mixing session wrapper

use super::resource::HtmlAudioFactory;
use super::storage::LocalStorage;
use super::types::WasmSessionConfig;
use crate::{CatalogTicket, MixingSession, PlaybackError, SessionConfig, Transport};
use hearth_core::{Catalog, HearthError, SourceRef, TrackId};
use js_sys::Reflect;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use wasm_bindgen::prelude::*;
use web_sys::{Event, HtmlMediaElement, MediaError};

type BrowserSession = MixingSession<LocalStorage, HtmlAudioFactory>;

/// WASM-compatible mixing session
///
/// The session lives behind `Rc<RefCell<..>>` so element listeners can reach
/// it: `ended` on the music stream calls `song_ended()`, while `error`
/// events and rejected play requests call `resource_failed()` for the
/// element's source.
#[wasm_bindgen]
pub struct WasmMixingSession {
    inner: Rc<RefCell<BrowserSession>>,
    _on_ended: Closure<dyn FnMut()>,
    _on_media_error: Closure<dyn FnMut(Event)>,
    _on_play_rejected: Closure<dyn FnMut(JsValue, JsValue)>,
}

#[wasm_bindgen]
impl WasmMixingSession {
    /// Create a session backed by `localStorage` and `<audio>` elements
    ///
    /// `config` may be `undefined` or a partial `{ includeBuiltinSounds,
    /// resetMusicVolume, shuffleSeed, storagePrefix }` object.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<WasmMixingSession, JsValue> {
        console_error_panic_hook::set_once();

        let config: SessionConfig = if config.is_undefined() || config.is_null() {
            SessionConfig::default()
        } else {
            serde_wasm_bindgen::from_value::<WasmSessionConfig>(config)
                .map_err(|e| JsValue::from_str(&format!("Invalid session config: {}", e)))?
                .into()
        };

        let factory = HtmlAudioFactory::new();
        let inner = Rc::new(RefCell::new(MixingSession::new(
            config,
            LocalStorage::new(),
            factory.clone(),
        )));

        let weak: Weak<RefCell<BrowserSession>> = Rc::downgrade(&inner);
        let on_ended = Closure::<dyn FnMut()>::new(move || {
            with_session(&weak, "song ended", |session| session.song_ended());
        });
        factory.set_ended_handler(on_ended.as_ref().unchecked_ref::<js_sys::Function>().clone());

        let weak: Weak<RefCell<BrowserSession>> = Rc::downgrade(&inner);
        let on_media_error = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            let Some(element) = event
                .target()
                .and_then(|target| target.dyn_into::<HtmlMediaElement>().ok())
            else {
                return;
            };
            // Released elements carry no source; their errors are not reported
            let Some(source) = element.get_attribute("src") else {
                return;
            };
            let message = element
                .error()
                .map_or_else(|| "media error".to_string(), |error| media_error_name(&error));
            with_session(&weak, "media error", |session| {
                session.resource_failed(&SourceRef::new(source), &message);
            });
        });
        factory.set_error_handler(on_media_error.as_ref().unchecked_ref::<js_sys::Function>().clone());

        let weak: Weak<RefCell<BrowserSession>> = Rc::downgrade(&inner);
        let on_play_rejected = Closure::<dyn FnMut(JsValue, JsValue)>::new(move |source: JsValue, reason: JsValue| {
            let name = error_field(&reason, "name");
            // pause() interrupting a pending play() is not a failure
            if name.as_deref() == Some("AbortError") {
                return;
            }
            let Some(source) = source.as_string() else {
                return;
            };
            let message = match (name, error_field(&reason, "message")) {
                (Some(name), Some(message)) => format!("{}: {}", name, message),
                (Some(text), None) | (None, Some(text)) => text,
                (None, None) => "play request rejected".to_string(),
            };
            with_session(&weak, "play rejection", |session| {
                session.resource_failed(&SourceRef::new(source), &message);
            });
        });
        factory.set_rejection_handler(on_play_rejected.as_ref().unchecked_ref::<js_sys::Function>().clone());

        Ok(Self {
            inner,
            _on_ended: on_ended,
            _on_media_error: on_media_error,
            _on_play_rejected: on_play_rejected,
        })
    }

    // ===== Transport =====

    pub fn play(&self) {
        self.inner.borrow_mut().play();
    }

    pub fn pause(&self) {
        self.inner.borrow_mut().pause();
    }

    /// Flip play/pause; returns whether the session is now playing
    #[wasm_bindgen(js_name = togglePlay)]
    pub fn toggle_play(&self) -> bool {
        self.inner.borrow_mut().toggle_play() == Transport::Playing
    }

    #[wasm_bindgen(js_name = isPlaying)]
    pub fn is_playing(&self) -> bool {
        self.inner.borrow().transport().is_playing()
    }

    // ===== Volume =====

    #[wasm_bindgen(js_name = setMasterVolume)]
    pub fn set_master_volume(&self, level: f32) {
        self.inner.borrow_mut().set_master_volume(level);
    }

    #[wasm_bindgen(js_name = getMasterVolume)]
    pub fn get_master_volume(&self) -> f32 {
        self.inner.borrow().master_volume()
    }

    #[wasm_bindgen(js_name = toggleMasterMute)]
    pub fn toggle_master_mute(&self) {
        self.inner.borrow_mut().toggle_master_mute();
    }

    #[wasm_bindgen(js_name = setSoundVolume)]
    pub fn set_sound_volume(&self, id: &str, volume: f32) -> Result<(), JsValue> {
        self.inner
            .borrow_mut()
            .set_sound_volume(&TrackId::new(id), volume)
            .map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = setMusicVolume)]
    pub fn set_music_volume(&self, volume: f32) {
        self.inner.borrow_mut().set_music_volume(volume);
    }

    #[wasm_bindgen(js_name = resetVolumes)]
    pub fn reset_volumes(&self) {
        self.inner.borrow_mut().reset_volumes();
    }

    // ===== Music =====

    #[wasm_bindgen(js_name = nextSong)]
    pub fn next_song(&self) {
        self.inner.borrow_mut().next_song();
    }

    #[wasm_bindgen(js_name = prevSong)]
    pub fn prev_song(&self) {
        self.inner.borrow_mut().prev_song();
    }

    /// Manually report a song end (the element listener does this already)
    #[wasm_bindgen(js_name = songEnded)]
    pub fn song_ended(&self) {
        self.inner.borrow_mut().song_ended();
    }

    /// Manually report a failed source (element listeners do this already)
    #[wasm_bindgen(js_name = resourceFailed)]
    pub fn resource_failed(&self, source: &str, message: &str) {
        self.inner
            .borrow_mut()
            .resource_failed(&SourceRef::new(source), message);
    }

    #[wasm_bindgen(js_name = selectSong)]
    pub fn select_song(&self, id: &str) -> Result<(), JsValue> {
        self.inner
            .borrow_mut()
            .select_song(&TrackId::new(id))
            .map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = toggleLoop)]
    pub fn toggle_loop(&self) -> bool {
        self.inner.borrow_mut().toggle_loop()
    }

    #[wasm_bindgen(js_name = toggleShuffle)]
    pub fn toggle_shuffle(&self) -> bool {
        self.inner.borrow_mut().toggle_shuffle()
    }

    // ===== Catalog =====

    /// Start a catalog load; pass the returned ticket back with the result
    #[wasm_bindgen(js_name = beginCatalogLoad)]
    pub fn begin_catalog_load(&self) -> f64 {
        self.inner.borrow_mut().begin_catalog_load().generation() as f64
    }

    /// Deliver a fetched `{ sounds, songs }` catalog
    ///
    /// Returns `false` if the ticket is stale.
    #[wasm_bindgen(js_name = completeCatalogLoad)]
    pub fn complete_catalog_load(&self, ticket: f64, catalog: JsValue) -> bool {
        let result = serde_wasm_bindgen::from_value::<Catalog>(catalog)
            .map_err(|e| HearthError::catalog(format!("Malformed catalog: {}", e)));
        self.inner
            .borrow_mut()
            .complete_catalog_load(ticket_from_js(ticket), result)
    }

    /// Report a failed fetch; only bundled sounds will be loaded
    #[wasm_bindgen(js_name = failCatalogLoad)]
    pub fn fail_catalog_load(&self, ticket: f64, message: &str) -> bool {
        self.inner
            .borrow_mut()
            .complete_catalog_load(ticket_from_js(ticket), Err(HearthError::catalog(message)))
    }

    #[wasm_bindgen(js_name = cancelCatalogLoad)]
    pub fn cancel_catalog_load(&self) {
        self.inner.borrow_mut().cancel_catalog_load();
    }

    /// Replace the catalog right away
    #[wasm_bindgen(js_name = applyCatalog)]
    pub fn apply_catalog(&self, catalog: JsValue) -> Result<(), JsValue> {
        let catalog: Catalog = serde_wasm_bindgen::from_value(catalog)
            .map_err(|e| JsValue::from_str(&format!("Failed to parse catalog: {}", e)))?;
        self.inner.borrow_mut().apply_catalog(&catalog);
        Ok(())
    }

    // ===== State =====

    /// Full observable state
    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.inner.borrow().snapshot())
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    /// Events since the last drain, oldest first
    #[wasm_bindgen(js_name = drainEvents)]
    pub fn drain_events(&self) -> Result<JsValue, JsValue> {
        let events = self.inner.borrow_mut().drain_events();
        serde_wasm_bindgen::to_value(&events)
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    /// Stop and release every `<audio>` element
    pub fn release(&self) {
        self.inner.borrow_mut().release_all();
    }
}

/// Run `apply` on the session if it is still alive and not mid-call
fn with_session(
    weak: &Weak<RefCell<BrowserSession>>,
    what: &str,
    apply: impl FnOnce(&mut BrowserSession),
) {
    let Some(session) = weak.upgrade() else {
        return;
    };
    match session.try_borrow_mut() {
        Ok(mut session) => apply(&mut session),
        Err(_) => web_sys::console::warn_1(&JsValue::from_str(&format!(
            "hearth: {} while the session was busy",
            what
        ))),
    };
}

fn media_error_name(error: &MediaError) -> String {
    match error.code() {
        MediaError::MEDIA_ERR_ABORTED => "MEDIA_ERR_ABORTED".to_string(),
        MediaError::MEDIA_ERR_NETWORK => "MEDIA_ERR_NETWORK".to_string(),
        MediaError::MEDIA_ERR_DECODE => "MEDIA_ERR_DECODE".to_string(),
        MediaError::MEDIA_ERR_SRC_NOT_SUPPORTED => "MEDIA_ERR_SRC_NOT_SUPPORTED".to_string(),
        code => format!("media error {}", code),
    }
}

fn error_field(error: &JsValue, field: &str) -> Option<String> {
    Reflect::get(error, &JsValue::from_str(field))
        .ok()
        .and_then(|value| value.as_string())
        .filter(|value| !value.is_empty())
}

fn ticket_from_js(ticket: f64) -> CatalogTicket {
    CatalogTicket::from_generation(ticket.max(0.0) as u64)
}

fn to_js_error(error: PlaybackError) -> JsValue {
    JsValue::from_str(&error.to_string())
}
