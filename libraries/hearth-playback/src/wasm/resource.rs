//! `HTMLAudioElement` as an audio resource

use hearth_core::{AudioResource, CatalogEntry, HearthError, ResourceFactory, Result, SourceRef};
use js_sys::{Function, Promise, Reflect};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::HtmlAudioElement;

/// One `<audio>` element (never attached to the document)
#[derive(Debug)]
pub struct HtmlAudioResource {
    element: HtmlAudioElement,
    source: SourceRef,
    on_rejected: Option<Function>,
}

impl HtmlAudioResource {
    /// Create an element for the given source
    pub fn new(source: &SourceRef) -> Result<Self> {
        let element = HtmlAudioElement::new_with_src(source.as_str()).map_err(js_error)?;
        element.set_preload("auto");
        Ok(Self {
            element,
            source: source.clone(),
            on_rejected: None,
        })
    }

    /// Route rejected play requests to `handler(source, reason)`
    pub fn with_rejection_handler(mut self, handler: Option<Function>) -> Self {
        self.on_rejected = handler;
        self
    }

    pub fn element(&self) -> &HtmlAudioElement {
        &self.element
    }
}

impl AudioResource for HtmlAudioResource {
    fn play(&mut self) -> Result<()> {
        let promise = self.element.play().map_err(js_error)?;

        // Autoplay refusal and unplayable sources only show up as a rejection
        if let Some(handler) = &self.on_rejected {
            let report = handler.bind1(&JsValue::NULL, &JsValue::from_str(self.source.as_str()));
            attach_catch(&promise, &report).map_err(js_error)?;
        }
        Ok(())
    }

    fn pause(&mut self) {
        let _ = self.element.pause();
    }

    fn set_volume(&mut self, volume: f32) {
        self.element.set_volume(f64::from(volume));
    }

    fn set_looping(&mut self, looping: bool) {
        self.element.set_loop(looping);
    }

    fn set_source(&mut self, source: &SourceRef) -> Result<()> {
        self.element.set_src(source.as_str());
        self.source = source.clone();
        Ok(())
    }

    fn restart(&mut self) -> Result<()> {
        self.element.set_current_time(0.0);
        Ok(())
    }

    fn release(&mut self) {
        let _ = self.element.pause();
        let _ = self.element.remove_attribute("src");
        // Reloading with no source drops the buffered media
        self.element.load();
    }
}

/// `promise.catch(handler)` for a plain JS function
fn attach_catch(promise: &Promise, handler: &Function) -> std::result::Result<(), JsValue> {
    let catch = Reflect::get(promise, &JsValue::from_str("catch"))?.dyn_into::<Function>()?;
    catch.call1(promise, handler)?;
    Ok(())
}

fn js_error(error: JsValue) -> HearthError {
    HearthError::audio(format!("{:?}", error))
}

/// Builds `<audio>` elements for catalog entries
///
/// Song elements get the shared `ended` handler, so the one music stream
/// reports every song end to whoever owns the session. Every element gets
/// the shared `error` handler, and its play requests report rejections to
/// the rejection handler.
#[derive(Debug, Default, Clone)]
pub struct HtmlAudioFactory {
    ended_handler: Rc<RefCell<Option<Function>>>,
    error_handler: Rc<RefCell<Option<Function>>>,
    rejection_handler: Rc<RefCell<Option<Function>>>,
}

impl HtmlAudioFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handler attached to song elements created from now on
    pub fn set_ended_handler(&self, handler: Function) {
        *self.ended_handler.borrow_mut() = Some(handler);
    }

    /// `error` event listener attached to every element created from now on
    pub fn set_error_handler(&self, handler: Function) {
        *self.error_handler.borrow_mut() = Some(handler);
    }

    /// Called as `handler(source, reason)` when a play request is rejected
    pub fn set_rejection_handler(&self, handler: Function) {
        *self.rejection_handler.borrow_mut() = Some(handler);
    }
}

impl ResourceFactory for HtmlAudioFactory {
    fn create(&mut self, entry: &CatalogEntry) -> Result<Box<dyn AudioResource>> {
        let resource = HtmlAudioResource::new(&entry.source)?
            .with_rejection_handler(self.rejection_handler.borrow().clone());
        let element = resource.element();

        if let Some(handler) = self.error_handler.borrow().as_ref() {
            element
                .add_event_listener_with_callback("error", handler)
                .map_err(js_error)?;
        }

        if entry.is_song() {
            if let Some(handler) = self.ended_handler.borrow().as_ref() {
                element
                    .add_event_listener_with_callback("ended", handler)
                    .map_err(js_error)?;
            }
        }

        Ok(Box::new(resource))
    }
}
