//! Hearth Backend Client
//!
//! HTTP client for the Hearth catalog backend.
//!
//! # Features
//!
//! - **Authentication**: login and signup with username/password, token verification
//! - **Catalog**: a user's custom sounds and songs, with create/update/delete
//! - **Provider**: implements [`hearth_core::CatalogProvider`] so a mixing
//!   session can refresh its catalog straight from the backend
//!
//! # Example
//!
//! ```ignore
//! use hearth_client::{ClientConfig, HearthClient};
//! use hearth_core::CatalogProvider;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = HearthClient::new(ClientConfig::new("https://hearth.example.com"))?;
//!
//!     let auth = client.login("mira", "hunter22").await?;
//!     println!("Logged in as {}", auth.user.username);
//!
//!     let catalog = client.fetch_catalog(Some(&auth.token)).await?;
//!     println!("{} sounds, {} songs", catalog.sounds.len(), catalog.songs.len());
//!
//!     Ok(())
//! }
//! ```

mod auth;
mod catalog;
mod client;
mod error;
mod types;

pub use client::HearthClient;
pub use error::{ClientError, Result};
pub use types::{
    AuthResponse, AuthUser, ClientConfig, NewSong, NewSound, SongUpdate, SoundUpdate,
    VerifyResponse, DEFAULT_CONNECT_TIMEOUT, DEFAULT_TIMEOUT,
};
