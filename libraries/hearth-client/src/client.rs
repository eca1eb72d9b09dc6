//! Main Hearth backend client.

use crate::error::{ClientError, Result};
use crate::types::ClientConfig;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use url::Url;

/// Client for the Hearth catalog backend.
///
/// Holds the session token issued by `login`/`signup`; catalog writes send
/// it as a bearer token. Cloning shares the token.
///
/// # Example
///
/// ```ignore
/// use hearth_client::{ClientConfig, HearthClient};
///
/// let client = HearthClient::new(ClientConfig::new("https://hearth.example.com"))?;
/// let auth = client.login("mira", "hunter22").await?;
/// let sounds = client.user_sounds(&auth.user.id).await?;
/// println!("{} custom sounds", sounds.len());
/// ```
#[derive(Debug, Clone)]
pub struct HearthClient {
    http: Client,
    base_url: String,
    token: Arc<RwLock<Option<String>>>,
}

impl HearthClient {
    /// Create a new client with the given configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let base_url = normalize_url(&config.url)?;

        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(format!("Hearth/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        debug!(url = %base_url, "Created backend client");

        Ok(Self {
            http,
            base_url,
            token: Arc::new(RwLock::new(config.token)),
        })
    }

    /// Base URL without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Current session token.
    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    /// Set the session token directly (e.g., restored from storage).
    pub async fn set_token(&self, token: impl Into<String>) {
        *self.token.write().await = Some(token.into());
    }

    /// Check if the client has a session token.
    pub async fn is_authenticated(&self) -> bool {
        self.token.read().await.is_some()
    }

    pub(crate) async fn store_token(&self, token: Option<String>) {
        *self.token.write().await = token;
    }

    pub(crate) async fn require_token(&self) -> Result<String> {
        self.token
            .read()
            .await
            .clone()
            .ok_or(ClientError::AuthRequired)
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn normalize_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ClientError::InvalidUrl("URL cannot be empty".into()));
    }
    if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
        return Err(ClientError::InvalidUrl(
            "URL must start with http:// or https://".into(),
        ));
    }
    Url::parse(trimmed).map_err(|e| ClientError::InvalidUrl(format!("{trimmed}: {e}")))?;
    Ok(trimmed.to_string())
}

/// Send a request, classifying connection failures.
pub(crate) async fn send(request: RequestBuilder) -> Result<Response> {
    request.send().await.map_err(|e| {
        if e.is_connect() || e.is_timeout() {
            ClientError::ServerUnreachable(e.to_string())
        } else {
            ClientError::Request(e)
        }
    })
}

/// Decode a success body or turn the response into an error.
pub(crate) async fn parse_json<T: DeserializeOwned>(response: Response, what: &str) -> Result<T> {
    if response.status().is_success() {
        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse {what}: {e}")))
    } else {
        Err(error_from_response(response).await)
    }
}

pub(crate) async fn error_from_response(response: Response) -> ClientError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body);
    match status {
        401 => ClientError::AuthRequired,
        403 => ClientError::AuthFailed(message),
        _ => ClientError::ServerError { status, message },
    }
}

/// `error` or `message` field of a JSON body, else the raw body
pub(crate) fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            ["error", "message"]
                .iter()
                .find_map(|key| value.get(*key).and_then(|v| v.as_str()).map(str::to_string))
        })
        .unwrap_or_else(|| body.to_string())
}
