use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::config;

/// What the external provider asserts about a caller after a successful
/// authorization-code exchange.
#[derive(Debug, Clone)]
pub struct ExternalIdentity {
    pub oauth_key: String,
    pub email: String,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("token exchange failed: {0}")]
    Exchange(String),

    #[error("profile fetch failed: {0}")]
    Profile(String),
}

/// Black-box identity provider: authorization code in, subject + email out.
#[async_trait]
pub trait Provider: Send + Sync {
    async fn exchange(&self, code: &str) -> Result<ExternalIdentity, ProviderError>;
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct ProfileResponse {
    id: i64,
    email: String,
}

/// Provider speaking the standard authorization-code flow over HTTP,
/// configured with the token and user-info endpoints.
pub struct HttpProvider {
    client: reqwest::Client,
    token_url: String,
    user_info_url: String,
    client_id: String,
    redirect_uri: String,
}

impl HttpProvider {
    pub fn from_config() -> Self {
        let oauth = &config::config().oauth;
        Self {
            client: reqwest::Client::new(),
            token_url: oauth.token_url.clone(),
            user_info_url: oauth.user_info_url.clone(),
            client_id: oauth.client_id.clone(),
            redirect_uri: oauth.redirect_uri.clone(),
        }
    }
}

#[async_trait]
impl Provider for HttpProvider {
    async fn exchange(&self, code: &str) -> Result<ExternalIdentity, ProviderError> {
        let token: TokenResponse = self
            .client
            .post(&self.token_url)
            .form(&[
                ("grant_type", "authorization_code"),
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("code", code),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::Exchange(e.to_string()))?
            .json()
            .await
            .map_err(|e| ProviderError::Exchange(e.to_string()))?;

        let profile: ProfileResponse = self
            .client
            .get(&self.user_info_url)
            .bearer_auth(&token.access_token)
            .send()
            .await
            .map_err(|e| ProviderError::Profile(e.to_string()))?
            .json()
            .await
            .map_err(|e| ProviderError::Profile(e.to_string()))?;

        Ok(ExternalIdentity {
            oauth_key: profile.id.to_string(),
            email: profile.email,
        })
    }
}
