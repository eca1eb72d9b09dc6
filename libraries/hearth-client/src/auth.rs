//! Authentication against the Hearth backend.

use crate::client::{error_from_response, parse_json, send, HearthClient};
use crate::error::{ClientError, Result};
use crate::types::{AuthResponse, Credentials, VerifyResponse};
use tracing::{debug, info, warn};

impl HearthClient {
    /// Login with username and password.
    ///
    /// On success the session token is stored for subsequent requests.
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthResponse> {
        self.authenticate("/auth/login", username, password).await
    }

    /// Create an account; the new session token is stored like on login.
    pub async fn signup(&self, username: &str, password: &str) -> Result<AuthResponse> {
        self.authenticate("/auth/signup", username, password).await
    }

    /// Verify the stored token and fetch the user it belongs to.
    pub async fn current_user(&self) -> Result<VerifyResponse> {
        let token = self.require_token().await?;
        self.verify_token(&token).await
    }

    /// Verify an arbitrary session token.
    pub async fn verify_token(&self, token: &str) -> Result<VerifyResponse> {
        let url = self.endpoint("/auth");
        debug!(url = %url, "Verifying session token");

        let response = send(self.http().get(&url).bearer_auth(token)).await?;
        parse_json(response, "token verification").await
    }

    /// Forget the session token.
    pub async fn logout(&self) {
        self.store_token(None).await;
        info!("Logged out");
    }

    async fn authenticate(&self, path: &str, username: &str, password: &str) -> Result<AuthResponse> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(ClientError::InvalidInput(
                "Username and password are required".into(),
            ));
        }

        let url = self.endpoint(path);
        debug!(url = %url, username = %username, "Authenticating");

        let response = send(
            self.http()
                .post(&url)
                .json(&Credentials { username, password }),
        )
        .await?;

        if response.status().as_u16() == 401 {
            let error = error_from_response(response).await;
            warn!(username = %username, "Authentication rejected");
            return Err(match error {
                ClientError::AuthRequired => {
                    ClientError::AuthFailed("Incorrect username or password".into())
                }
                other => other,
            });
        }

        let auth: AuthResponse = parse_json(response, "auth response").await?;
        self.store_token(Some(auth.token.clone())).await;

        info!(
            username = %auth.user.username,
            user_id = %auth.user.id,
            "Authenticated"
        );

        Ok(auth)
    }
}
