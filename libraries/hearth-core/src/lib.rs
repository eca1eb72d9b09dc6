//! Hearth Core
//!
//! Platform-agnostic types, collaborator traits, and error handling for Hearth.
//!
//! This crate provides the building blocks shared by the playback engine
//! and the backend client.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `TrackId`, `CatalogEntry`, `Catalog`, and the bundled ambience sounds
//! - **Collaborator Traits**: `AudioResource`, `ResourceFactory`, `KeyValueStore`, `CatalogProvider`
//! - **Error Handling**: Unified `HearthError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use hearth_core::{builtin_sounds, Catalog, Origin};
//!
//! let catalog: Catalog = serde_json::from_str(r#"{"sounds": null, "songs": []}"#).unwrap();
//! assert!(catalog.is_empty());
//!
//! let rain = &builtin_sounds()[0];
//! assert_eq!(rain.name, "RAIN");
//! assert_eq!(rain.origin, Origin::Builtin);
//! ```

#![forbid(unsafe_code)]

pub mod builtin;
pub mod error;
pub mod storage;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use builtin::builtin_sounds;
pub use error::{HearthError, Result};
pub use storage::{KeyValueStore, MemoryStore};
pub use traits::{AudioResource, CatalogProvider, ResourceFactory, StaticCatalogProvider};

pub use types::{
    Catalog, CatalogEntry, EntryKind, Origin, SongRecord, SoundRecord, SourceRef, TrackId,
    UserId, CUSTOM_ICON,
};
