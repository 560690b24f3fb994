//! OAuth2 client-credentials token handling for the commerce platform.

use std::time::{Duration, Instant};

use secrecy::{ExposeSecret, SecretString};
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use super::CommerceError;
use super::types::TokenResponse;

/// Tokens are refreshed this long before the vendor-reported expiry.
const EXPIRY_SKEW: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_fresh(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// Fetches and caches an access token for API calls.
pub struct TokenProvider {
    client: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: SecretString,
    scopes: String,
    token: RwLock<Option<CachedToken>>,
}

impl TokenProvider {
    pub fn new(
        client: reqwest::Client,
        auth_url: &str,
        client_id: String,
        client_secret: SecretString,
        scopes: String,
    ) -> Self {
        Self {
            client,
            token_url: format!("{}/oauth/token", auth_url.trim_end_matches('/')),
            client_id,
            client_secret,
            scopes,
            token: RwLock::new(None),
        }
    }

    /// Return a valid access token, fetching a new one when needed.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::Auth` if the token endpoint rejects the
    /// credentials, or `CommerceError::Http` if it cannot be reached.
    pub async fn access_token(&self) -> Result<String, CommerceError> {
        if let Some(token) = self.token.read().await.as_ref()
            && token.is_fresh()
        {
            return Ok(token.value.clone());
        }

        let mut guard = self.token.write().await;
        // Another task may have refreshed while we waited for the lock
        if let Some(token) = guard.as_ref()
            && token.is_fresh()
        {
            return Ok(token.value.clone());
        }

        let fetched = self.fetch().await?;
        let value = fetched.value.clone();
        *guard = Some(fetched);
        Ok(value)
    }

    /// Drop the cached token so the next call fetches a new one.
    pub async fn invalidate(&self) {
        *self.token.write().await = None;
    }

    #[instrument(skip(self))]
    async fn fetch(&self) -> Result<CachedToken, CommerceError> {
        let response = self
            .client
            .post(&self.token_url)
            .basic_auth(&self.client_id, Some(self.client_secret.expose_secret()))
            .form(&[
                ("grant_type", "client_credentials"),
                ("scope", self.scopes.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Commerce token endpoint rejected credentials"
            );
            return Err(CommerceError::Auth(format!("token endpoint returned {status}")));
        }

        let token: TokenResponse = serde_json::from_str(&body)?;
        debug!(expires_in = token.expires_in, "Fetched commerce access token");

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(EXPIRY_SKEW);
        Ok(CachedToken {
            value: token.access_token,
            expires_at: Instant::now() + lifetime,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cached_token_freshness() {
        let fresh = CachedToken {
            value: "t".to_string(),
            expires_at: Instant::now() + Duration::from_secs(30),
        };
        assert!(fresh.is_fresh());

        let stale = CachedToken {
            value: "t".to_string(),
            expires_at: Instant::now(),
        };
        assert!(!stale.is_fresh());
    }

    #[test]
    fn test_token_url_trailing_slash() {
        let provider = TokenProvider::new(
            reqwest::Client::new(),
            "https://auth.example.test/",
            "id".to_string(),
            SecretString::from("secret"),
            "scope".to_string(),
        );
        assert_eq!(provider.token_url, "https://auth.example.test/oauth/token");
    }
}
