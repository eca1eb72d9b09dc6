mod catalog;
mod ids;

pub use catalog::{
    Catalog, CatalogEntry, EntryKind, Origin, SongRecord, SoundRecord, SourceRef, CUSTOM_ICON,
};
pub use ids::{TrackId, UserId};
