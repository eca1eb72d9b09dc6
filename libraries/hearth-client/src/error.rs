//! Error types for the Hearth backend client.

use hearth_core::HearthError;
use thiserror::Error;

/// Errors that can occur when talking to the Hearth backend.
#[derive(Error, Debug)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server returned an error response
    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// No token available, or the server wants one
    #[error("Authentication required")]
    AuthRequired,

    /// Credentials or token rejected
    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    /// Invalid base URL
    #[error("Invalid server URL: {0}")]
    InvalidUrl(String),

    /// Failed to parse server response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Request rejected before it was sent
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Server is offline or unreachable
    #[error("Server unreachable: {0}")]
    ServerUnreachable(String),
}

impl ClientError {
    /// Whether the error means the session token is missing or no longer valid
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Self::AuthRequired | Self::AuthFailed(_))
    }
}

impl From<ClientError> for HearthError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Request(_) | ClientError::ServerUnreachable(_) => {
                HearthError::network(err.to_string())
            }
            ClientError::InvalidInput(msg) => HearthError::invalid_input(msg),
            other => HearthError::catalog(other.to_string()),
        }
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
