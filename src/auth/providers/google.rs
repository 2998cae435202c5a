/// Google OAuth2 Provider Implementation
///
/// Authorization-code flow against Google, resolving the profile through
/// the userinfo endpoint.
use super::{OAuth2TokenResponse, http_client, read_json};
use crate::auth::config::ProviderConfig;
use crate::auth::error::AuthError;
use crate::auth::session::UserIdentity;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v3/userinfo";

/// Google userinfo response
#[derive(Debug, Deserialize)]
struct GoogleUserInfoResponse {
    sub: String,
    email: Option<String>,
    name: Option<String>,
}

/// Google OAuth2 token request
#[derive(Debug, Serialize)]
struct GoogleTokenRequest<'a> {
    code: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
    redirect_uri: &'a str,
    grant_type: &'static str,
}

/// Google OAuth2 Provider
#[derive(Debug, Clone)]
pub struct GoogleProvider {
    config: ProviderConfig,
    http_client: reqwest::Client,
}

impl GoogleProvider {
    /// Create a new Google OAuth2 provider
    pub fn new(config: ProviderConfig, timeout: Duration) -> Result<Self, AuthError> {
        // Set default scopes if none provided
        let mut config = config;
        if config.scopes.is_empty() {
            config.scopes = vec![
                "openid".to_string(),
                "email".to_string(),
                "profile".to_string(),
            ];
        }

        Ok(Self {
            config,
            http_client: http_client(timeout)?,
        })
    }

    pub fn authorization_url(&self, state: &str) -> Result<url::Url, AuthError> {
        let auth_url = self.config.auth_url.as_deref().unwrap_or(GOOGLE_AUTH_URL);

        let mut url = url::Url::parse(auth_url).map_err(|e| AuthError::InvalidConfig {
            key: "auth.providers.google.auth_url".to_string(),
            reason: e.to_string(),
        })?;

        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", &self.config.scopes.join(" "))
            .append_pair("state", state);

        Ok(url)
    }

    /// Exchange the code for an access token, then fetch the profile
    pub async fn resolve_identity(&self, code: &str) -> Result<UserIdentity, AuthError> {
        let tokens = self.exchange_code(code).await?;
        let userinfo = self.get_user_info(&tokens.access_token).await?;
        Ok(Self::convert_userinfo(userinfo))
    }

    async fn exchange_code(&self, code: &str) -> Result<OAuth2TokenResponse, AuthError> {
        let token_url = self.config.token_url.as_deref().unwrap_or(GOOGLE_TOKEN_URL);

        let token_request = GoogleTokenRequest {
            code,
            client_id: &self.config.client_id,
            client_secret: &self.config.client_secret,
            redirect_uri: &self.config.redirect_uri,
            grant_type: "authorization_code",
        };

        let response = self
            .http_client
            .post(token_url)
            .form(&token_request)
            .send()
            .await?;

        let tokens: OAuth2TokenResponse = read_json(response, "Token request").await?;
        debug!(scope = ?tokens.scope, "Exchanged authorization code");
        Ok(tokens)
    }

    async fn get_user_info(&self, access_token: &str) -> Result<GoogleUserInfoResponse, AuthError> {
        let userinfo_url = self
            .config
            .userinfo_url
            .as_deref()
            .unwrap_or(GOOGLE_USERINFO_URL);

        let response = self
            .http_client
            .get(userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await?;

        read_json(response, "UserInfo request").await
    }

    /// Display name falls back to e-mail, then to the subject
    fn convert_userinfo(info: GoogleUserInfoResponse) -> UserIdentity {
        let username = info
            .name
            .filter(|n| !n.trim().is_empty())
            .or(info.email)
            .unwrap_or_else(|| info.sub.clone());

        UserIdentity {
            id: info.sub,
            username,
        }
    }
}
