//! WASM bindings for hearth-playback
//!
//! Browser implementations of the engine's seams (`localStorage`,
//! `HTMLAudioElement`) and a JavaScript-friendly session wrapper.

pub mod resource;
pub mod session;
pub mod storage;
pub mod types;

pub use resource::{HtmlAudioFactory, HtmlAudioResource};
pub use session::WasmMixingSession;
pub use storage::LocalStorage;
pub use types::WasmSessionConfig;
