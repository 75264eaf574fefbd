//! Calls out to C1, the external identity gateway, to turn a client's
//! bearer token into a [`PlayerProfile`].
//!
//! C1 itself is out of scope for this server — this is just the HTTP
//! client that talks to whatever implements it.

use serde::Deserialize;

use skrawl_protocol::UserId;
use skrawl_session::{Authenticator, PlayerProfile, SessionError};

/// Validates bearer tokens against an HTTP identity gateway.
///
/// `base_url` and `service_key` come from the `identity-provider URL` /
/// `identity-provider service key` environment variables, the only two
/// that aren't optional.
pub struct HttpAuthenticator {
    client: reqwest::Client,
    base_url: String,
    service_key: String,
}

impl HttpAuthenticator {
    pub fn new(base_url: impl Into<String>, service_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            service_key: service_key.into(),
        }
    }
}

/// The shape C1 is expected to respond with on a successful verification.
#[derive(Debug, Deserialize)]
struct IdentityResponse {
    user_id: String,
    display_name: String,
    avatar_ref: Option<String>,
}

impl Authenticator for HttpAuthenticator {
    async fn authenticate(&self, token: &str) -> Result<PlayerProfile, SessionError> {
        if token.is_empty() {
            return Err(SessionError::AuthFailed("empty token".into()));
        }

        let response = self
            .client
            .post(format!("{}/verify", self.base_url))
            .bearer_auth(&self.service_key)
            .json(&serde_json::json!({ "token": token }))
            .send()
            .await
            .map_err(|e| SessionError::AuthFailed(e.to_string()))?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(SessionError::AuthFailed("token rejected by identity gateway".into()));
        }
        if !response.status().is_success() {
            return Err(SessionError::AuthFailed(format!(
                "identity gateway returned {}",
                response.status()
            )));
        }

        let body: IdentityResponse = response
            .json()
            .await
            .map_err(|e| SessionError::ProfileIncomplete(e.to_string()))?;

        if body.display_name.is_empty() {
            return Err(SessionError::ProfileIncomplete("missing display_name".into()));
        }

        Ok(PlayerProfile {
            user_id: UserId::new(body.user_id),
            display_name: body.display_name,
            avatar_ref: body.avatar_ref,
        })
    }
}
