//! OIDC client-credentials token source wrapping C2's outbound client
//! (§4.2): fetches and caches an access token, refreshing it automatically
//! before expiry.

use std::time::{Duration, Instant};

use serde::Deserialize;
use tokio::sync::Mutex;
use url::Url;

use crate::error::AuthorizerError;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    300
}

struct Cached {
    access_token: String,
    expires_at: Instant,
}

/// Holds a client-credentials grant against an OIDC token endpoint,
/// refreshing the cached access token shortly before it expires.
pub struct OidcTokenSource {
    client: reqwest::Client,
    token_url: Url,
    client_id: String,
    client_secret: String,
    cached: Mutex<Option<Cached>>,
}

/// Refresh this long before expiry so a concurrent request never observes
/// a token the issuer is about to reject.
const REFRESH_SKEW: Duration = Duration::from_secs(30);

impl OidcTokenSource {
    pub fn new(issuer: &Url, client_id: String, client_secret: String) -> Result<Self, AuthorizerError> {
        let token_url = issuer.join("/token").map_err(|e| {
            AuthorizerError::Oidc(format!("could not build token endpoint from issuer: {e}"))
        })?;
        Ok(Self {
            client: reqwest::Client::new(),
            token_url,
            client_id,
            client_secret,
            cached: Mutex::new(None),
        })
    }

    /// Returns a currently-valid access token, fetching or refreshing one
    /// from the token endpoint as needed.
    pub async fn access_token(&self) -> Result<String, AuthorizerError> {
        let mut guard = self.cached.lock().await;
        if let Some(cached) = guard.as_ref() {
            if cached.expires_at > Instant::now() + REFRESH_SKEW {
                return Ok(cached.access_token.clone());
            }
        }

        let response = self
            .client
            .post(self.token_url.clone())
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AuthorizerError::Oidc(format!("token request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AuthorizerError::Oidc(format!(
                "token endpoint returned {}",
                response.status()
            )));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthorizerError::Oidc(format!("malformed token response: {e}")))?;

        let expires_at = Instant::now() + Duration::from_secs(body.expires_in);
        *guard = Some(Cached {
            access_token: body.access_token.clone(),
            expires_at,
        });
        Ok(body.access_token)
    }
}
