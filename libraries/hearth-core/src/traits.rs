/// Core traits for Hearth
use crate::error::Result;
use crate::types::{Catalog, CatalogEntry, SourceRef};
use async_trait::async_trait;

/// A playable audio resource (one `<audio>` element, one decoder, ...)
///
/// Calls are fire-and-forget: `play()` may be issued before the resource has
/// finished loading and must be safe to repeat. Implementations are driven
/// from a single thread and are not required to be `Send`.
pub trait AudioResource {
    /// Start or resume producing sound
    ///
    /// # Errors
    /// Returns an error if the resource refuses to play (bad URL, decode
    /// failure, autoplay policy)
    fn play(&mut self) -> Result<()>;

    /// Stop producing sound, keeping the position
    fn pause(&mut self);

    /// Set the output gain (0.0 = silent, 1.0 = full volume)
    fn set_volume(&mut self, volume: f32);

    /// Loop at end instead of finishing
    fn set_looping(&mut self, looping: bool);

    /// Point the resource at a different source
    ///
    /// # Errors
    /// Returns an error if the source cannot be assigned
    fn set_source(&mut self, source: &SourceRef) -> Result<()>;

    /// Seek back to position zero
    ///
    /// # Errors
    /// Returns an error if the resource cannot seek
    fn restart(&mut self) -> Result<()>;

    /// Drop the underlying source so nothing keeps decoding or buffering
    fn release(&mut self);
}

/// Creates audio resources for catalog entries
pub trait ResourceFactory {
    /// Create a resource for the given entry
    ///
    /// # Errors
    /// Returns an error if the platform cannot construct the resource
    fn create(&mut self, entry: &CatalogEntry) -> Result<Box<dyn AudioResource>>;
}

/// Supplies a user's sounds and songs
///
/// `token` is the session token of an authenticated user, `None` for guests.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Fetch the catalog for the given session token
    async fn fetch_catalog(&self, token: Option<&str>) -> Result<Catalog>;
}

/// Catalog provider backed by a fixed dataset
#[derive(Debug, Clone, Default)]
pub struct StaticCatalogProvider {
    catalog: Catalog,
}

impl StaticCatalogProvider {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl CatalogProvider for StaticCatalogProvider {
    async fn fetch_catalog(&self, _token: Option<&str>) -> Result<Catalog> {
        Ok(self.catalog.clone())
    }
}
