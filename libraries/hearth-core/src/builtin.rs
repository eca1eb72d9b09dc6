//! Ambience sounds bundled with the client
//!
//! Available to every visitor, logged in or not. Ids are stable
//! (`local-1` .. `local-6`) so persisted volumes survive reloads.

use crate::types::{CatalogEntry, Origin};

/// (name, asset stem) for every bundled sound, in display order
const BUILTIN_SOUNDS: [(&str, &str); 6] = [
    ("RAIN", "rain"),
    ("WAVES", "waves"),
    ("RIVER", "river"),
    ("WIND", "wind"),
    ("BIRDS", "birds"),
    ("FIRE", "fire"),
];

/// Bundled ambience entries
pub fn builtin_sounds() -> Vec<CatalogEntry> {
    BUILTIN_SOUNDS
        .iter()
        .enumerate()
        .map(|(i, (name, stem))| {
            CatalogEntry::ambience(
                format!("local-{}", i + 1).as_str(),
                *name,
                format!("sounds/{stem}.mp3"),
                Origin::Builtin,
            )
            .with_icon(*stem)
        })
        .collect()
}
