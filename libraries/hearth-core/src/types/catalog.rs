//! Catalog types for ambience sounds and songs
//!
//! The catalog provider hands back loosely-shaped records (`SoundRecord`,
//! `SongRecord`); the engine works on `CatalogEntry`, a tagged variant with
//! shared base fields and kind-specific fields.

use super::ids::TrackId;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Generic icon used for user-added sounds
pub const CUSTOM_ICON: &str = "audio";

/// Handle to a playable audio resource (URL or bundled asset path)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceRef(String);

impl SourceRef {
    pub fn new(source: impl Into<String>) -> Self {
        Self(source.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this refers to a remote resource rather than a bundled asset
    pub fn is_remote(&self) -> bool {
        self.0.starts_with("http://") || self.0.starts_with("https://")
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a catalog entry comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Shipped with the client, fixed icon, read-only
    Builtin,
    /// Added by the user through the backend, editable and deletable
    Custom,
}

impl Origin {
    /// Custom entries can be edited or deleted through the CRUD collaborator
    pub fn is_editable(self) -> bool {
        matches!(self, Self::Custom)
    }
}

/// Kind-specific data for a catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EntryKind {
    /// Looping ambience layer in the sound grid
    Ambience,
    /// Song in the music playlist
    Song {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        author: Option<String>,
    },
}

impl EntryKind {
    /// Ambience layers always loop; songs advance instead
    pub fn is_looping(&self) -> bool {
        matches!(self, Self::Ambience)
    }

    pub fn author(&self) -> Option<&str> {
        match self {
            Self::Song { author } => author.as_deref(),
            Self::Ambience => None,
        }
    }
}

/// A playable catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: TrackId,
    pub name: String,
    pub source: SourceRef,
    pub origin: Origin,
    pub icon: String,
    #[serde(flatten)]
    pub kind: EntryKind,
}

impl CatalogEntry {
    /// Create an ambience entry
    pub fn ambience(
        id: impl Into<TrackId>,
        name: impl Into<String>,
        source: impl Into<String>,
        origin: Origin,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            source: SourceRef::new(source),
            origin,
            icon: CUSTOM_ICON.to_string(),
            kind: EntryKind::Ambience,
        }
    }

    /// Create a song entry
    pub fn song(
        id: impl Into<TrackId>,
        name: impl Into<String>,
        author: Option<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            source: SourceRef::new(source),
            origin: Origin::Custom,
            icon: CUSTOM_ICON.to_string(),
            kind: EntryKind::Song { author },
        }
    }

    /// Replace the icon (builtin sounds carry their own)
    #[must_use]
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    pub fn is_song(&self) -> bool {
        matches!(self.kind, EntryKind::Song { .. })
    }

    /// "Name — Author" when an author is known, otherwise just the name
    pub fn display_title(&self) -> String {
        match self.kind.author() {
            Some(author) if !author.is_empty() => format!("{} — {}", self.name, author),
            _ => self.name.clone(),
        }
    }
}

/// Sound as returned by the catalog provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundRecord {
    pub id: TrackId,
    pub name: String,
    pub url: String,
}

impl From<SoundRecord> for CatalogEntry {
    fn from(record: SoundRecord) -> Self {
        CatalogEntry::ambience(record.id, record.name, record.url, Origin::Custom)
    }
}

/// Song as returned by the catalog provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongRecord {
    pub id: TrackId,
    pub name: String,
    #[serde(default)]
    pub author: Option<String>,
    pub url: String,
}

impl From<SongRecord> for CatalogEntry {
    fn from(record: SongRecord) -> Self {
        CatalogEntry::song(record.id, record.name, record.author, record.url)
    }
}

/// A user's sounds and songs
///
/// Absent or `null` arrays are treated as empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub sounds: Vec<SoundRecord>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub songs: Vec<SongRecord>,
}

impl Catalog {
    pub fn new(sounds: Vec<SoundRecord>, songs: Vec<SongRecord>) -> Self {
        Self { sounds, songs }
    }

    pub fn is_empty(&self) -> bool {
        self.sounds.is_empty() && self.songs.is_empty()
    }

    /// Custom ambience entries in catalog order
    pub fn ambience_entries(&self) -> Vec<CatalogEntry> {
        self.sounds.iter().cloned().map(CatalogEntry::from).collect()
    }

    /// Playlist entries in catalog order
    pub fn song_entries(&self) -> Vec<CatalogEntry> {
        self.songs.iter().cloned().map(CatalogEntry::from).collect()
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_tolerates_null_and_missing_arrays() {
        let catalog: Catalog = serde_json::from_str(r#"{"sounds": null}"#).unwrap();
        assert!(catalog.sounds.is_empty());
        assert!(catalog.songs.is_empty());
        assert!(catalog.is_empty());
    }

    #[test]
    fn catalog_parses_backend_shapes() {
        let json = r#"{
            "sounds": [{"id": 1, "name": "RAIN 2", "url": "https://cdn.example/rain.mp3"}],
            "songs": [
                {"id": 1, "name": "Dire Dire Docks", "author": "Super Mario 64", "url": "https://cdn.example/ddd.mp3"},
                {"id": 2, "name": "Untitled", "url": "https://cdn.example/u.mp3"}
            ]
        }"#;

        let catalog: Catalog = serde_json::from_str(json).unwrap();
        assert_eq!(catalog.sounds[0].id, TrackId::new("1"));
        assert_eq!(catalog.songs[0].author.as_deref(), Some("Super Mario 64"));
        assert!(catalog.songs[1].author.is_none());
    }

    #[test]
    fn records_convert_to_tagged_entries() {
        let catalog = Catalog::new(
            vec![SoundRecord {
                id: TrackId::new("5"),
                name: "FAN".into(),
                url: "https://cdn.example/fan.mp3".into(),
            }],
            vec![SongRecord {
                id: TrackId::new("9"),
                name: "Sunset Haze".into(),
                author: Some("Gran Turismo 5".into()),
                url: "https://cdn.example/haze.mp3".into(),
            }],
        );

        let sound = &catalog.ambience_entries()[0];
        assert!(sound.kind.is_looping());
        assert_eq!(sound.origin, Origin::Custom);
        assert_eq!(sound.icon, CUSTOM_ICON);
        assert!(sound.source.is_remote());

        let song = &catalog.song_entries()[0];
        assert!(song.is_song());
        assert!(!song.kind.is_looping());
        assert_eq!(song.display_title(), "Sunset Haze — Gran Turismo 5");
    }

    #[test]
    fn only_custom_entries_are_editable() {
        assert!(Origin::Custom.is_editable());
        assert!(!Origin::Builtin.is_editable());
    }
}
