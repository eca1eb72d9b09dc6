//! Catalog reads and writes, and the `CatalogProvider` seam.

use crate::client::{parse_json, send, HearthClient};
use crate::error::{ClientError, Result};
use crate::types::{NewSong, NewSound, SongUpdate, SoundUpdate};
use async_trait::async_trait;
use hearth_core::{Catalog, CatalogProvider, HearthError, SongRecord, SoundRecord, TrackId, UserId};
use tracing::{debug, info};

impl HearthClient {
    /// Custom ambience sounds owned by a user.
    pub async fn user_sounds(&self, user_id: &UserId) -> Result<Vec<SoundRecord>> {
        let url = self.endpoint(&format!("/sounds/user/{user_id}"));
        debug!(url = %url, "Fetching user sounds");

        let response = send(self.http().get(&url)).await?;
        parse_json(response, "sound list").await
    }

    /// Songs owned by a user.
    pub async fn user_songs(&self, user_id: &UserId) -> Result<Vec<SongRecord>> {
        let url = self.endpoint(&format!("/songs/user/{user_id}"));
        debug!(url = %url, "Fetching user songs");

        let response = send(self.http().get(&url)).await?;
        parse_json(response, "song list").await
    }

    pub async fn create_sound(&self, sound: &NewSound) -> Result<SoundRecord> {
        let token = self.require_token().await?;
        let response = send(
            self.http()
                .post(self.endpoint("/sounds"))
                .bearer_auth(token)
                .json(sound),
        )
        .await?;
        let created: SoundRecord = parse_json(response, "sound").await?;
        info!(track_id = %created.id, name = %created.name, "Created sound");
        Ok(created)
    }

    /// Rename a sound or point it at a new URL.
    pub async fn update_sound(&self, id: &TrackId, update: &SoundUpdate) -> Result<SoundRecord> {
        if update.is_empty() {
            return Err(ClientError::InvalidInput("No fields to update".into()));
        }
        let token = self.require_token().await?;
        let response = send(
            self.http()
                .put(self.endpoint(&format!("/sounds/{id}")))
                .bearer_auth(token)
                .json(update),
        )
        .await?;
        parse_json(response, "sound").await
    }

    /// Delete a sound, returning the removed row.
    pub async fn delete_sound(&self, id: &TrackId) -> Result<SoundRecord> {
        let token = self.require_token().await?;
        let response = send(
            self.http()
                .delete(self.endpoint(&format!("/sounds/{id}")))
                .bearer_auth(token),
        )
        .await?;
        let deleted: SoundRecord = parse_json(response, "sound").await?;
        info!(track_id = %deleted.id, "Deleted sound");
        Ok(deleted)
    }

    pub async fn create_song(&self, song: &NewSong) -> Result<SongRecord> {
        let token = self.require_token().await?;
        let response = send(
            self.http()
                .post(self.endpoint("/songs"))
                .bearer_auth(token)
                .json(song),
        )
        .await?;
        let created: SongRecord = parse_json(response, "song").await?;
        info!(track_id = %created.id, name = %created.name, "Created song");
        Ok(created)
    }

    pub async fn update_song(&self, id: &TrackId, update: &SongUpdate) -> Result<SongRecord> {
        if update.is_empty() {
            return Err(ClientError::InvalidInput("No fields to update".into()));
        }
        let token = self.require_token().await?;
        let response = send(
            self.http()
                .put(self.endpoint(&format!("/songs/{id}")))
                .bearer_auth(token)
                .json(update),
        )
        .await?;
        parse_json(response, "song").await
    }

    pub async fn delete_song(&self, id: &TrackId) -> Result<SongRecord> {
        let token = self.require_token().await?;
        let response = send(
            self.http()
                .delete(self.endpoint(&format!("/songs/{id}")))
                .bearer_auth(token),
        )
        .await?;
        let deleted: SongRecord = parse_json(response, "song").await?;
        info!(track_id = %deleted.id, "Deleted song");
        Ok(deleted)
    }

    /// Resolve the token to a user and fetch both of their lists.
    pub async fn catalog_for_token(&self, token: &str) -> Result<Catalog> {
        let verified = self.verify_token(token).await?;
        let user = match verified.user {
            Some(user) if verified.valid => user,
            _ => return Err(ClientError::AuthFailed("Session token is not valid".into())),
        };

        let (sounds, songs) = tokio::try_join!(self.user_sounds(&user.id), self.user_songs(&user.id))?;

        info!(
            user_id = %user.id,
            sounds = sounds.len(),
            songs = songs.len(),
            "Fetched catalog"
        );

        Ok(Catalog::new(sounds, songs))
    }
}

#[async_trait]
impl CatalogProvider for HearthClient {
    async fn fetch_catalog(&self, token: Option<&str>) -> hearth_core::Result<Catalog> {
        let Some(token) = token else {
            debug!("Guest session, empty catalog");
            return Ok(Catalog::default());
        };
        self.catalog_for_token(token)
            .await
            .map_err(HearthError::from)
    }
}
