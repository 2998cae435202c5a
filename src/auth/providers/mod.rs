/// Identity provider adapters
///
/// Providers form a closed set selected from configuration at startup.
/// Each variant performs the authorization-code exchange with its provider
/// and resolves the result into a [`UserIdentity`].
use crate::auth::config::{AuthConfig, ProviderConfig};
use crate::auth::error::AuthError;
use crate::auth::session::UserIdentity;
use serde::Deserialize;
use std::time::Duration;

pub mod google;

pub use google::GoogleProvider;

/// OAuth2 token response
#[derive(Debug, Clone, Deserialize)]
pub struct OAuth2TokenResponse {
    /// Access token for API requests
    pub access_token: String,

    /// Token type (usually "Bearer")
    #[serde(default)]
    pub token_type: Option<String>,

    /// Token expiration time in seconds
    #[serde(default)]
    pub expires_in: Option<u64>,

    /// OAuth2 scopes granted
    #[serde(default)]
    pub scope: Option<String>,
}

/// Configured identity provider
#[derive(Debug, Clone)]
pub enum IdentityProvider {
    Google(GoogleProvider),
}

impl IdentityProvider {
    /// Build the provider named in the configuration
    pub fn from_config(config: &AuthConfig) -> Result<Self, AuthError> {
        let google = config
            .providers
            .google
            .clone()
            .ok_or_else(|| AuthError::MissingConfig("auth.providers.google".to_string()))?;

        Ok(Self::Google(GoogleProvider::new(
            google,
            config.provider_timeout(),
        )?))
    }

    /// Provider name (used to bind anti-replay state)
    pub fn name(&self) -> &'static str {
        match self {
            Self::Google(_) => "google",
        }
    }

    /// Authorization URL the browser is redirected to
    pub fn begin_auth(&self, state: &str) -> Result<url::Url, AuthError> {
        match self {
            Self::Google(provider) => provider.authorization_url(state),
        }
    }

    /// Exchange an authorization code and resolve the user's identity
    pub async fn complete_auth(&self, code: &str) -> Result<UserIdentity, AuthError> {
        match self {
            Self::Google(provider) => provider.resolve_identity(code).await,
        }
    }
}

/// HTTP client shared by the provider implementations
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, AuthError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| AuthError::InvalidConfig {
            key: "auth.provider_timeout_secs".to_string(),
            reason: format!("Failed to create HTTP client: {}", e),
        })
}

/// Classify a response and decode its JSON body
pub(crate) async fn read_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
    context: &str,
) -> Result<T, AuthError> {
    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        tracing::warn!(%status, body = %error_text, "{} rejected by provider", context);
        return Err(AuthError::from_provider_status(status, context));
    }

    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes)
        .map_err(|e| AuthError::InvalidResponse(format!("{}: {}", context, e)))
}
