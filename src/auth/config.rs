// Authentication Configuration
// Session secret, session cookie settings and identity provider credentials

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::error::AuthError;

/// Fixed provider callback path. Must match the redirect URI registered
/// with the identity provider byte-for-byte.
pub const CALLBACK_PATH: &str = "/google/callback";

const MIN_SECRET_LEN: usize = 32;

/// Ten years; longer lifetimes cannot be represented as timestamps safely
pub const MAX_SESSION_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// Main authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Secret used to sign session cookies (minimum 32 bytes)
    #[serde(default)]
    pub session_secret: String,

    /// Absolute session lifetime in seconds (default: 24 hours)
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,

    /// Timeout for each round trip to the identity provider
    #[serde(default = "default_provider_timeout")]
    pub provider_timeout_secs: u64,

    /// Cookie configuration
    #[serde(default)]
    pub cookie: CookieConfig,

    /// Identity provider configurations
    #[serde(default)]
    pub providers: ProvidersConfig,
}

impl AuthConfig {
    /// Validate configuration values
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.session_secret.is_empty() {
            return Err(AuthError::MissingConfig("auth.session_secret".to_string()));
        }

        if self.session_secret.len() < MIN_SECRET_LEN {
            return Err(AuthError::InvalidConfig {
                key: "auth.session_secret".to_string(),
                reason: format!("must be at least {} bytes", MIN_SECRET_LEN),
            });
        }

        if self.session_ttl_secs < 60 {
            return Err(AuthError::InvalidConfig {
                key: "auth.session_ttl_secs".to_string(),
                reason: "must be at least 60 seconds".to_string(),
            });
        }

        if self.session_ttl_secs > MAX_SESSION_TTL_SECS {
            return Err(AuthError::InvalidConfig {
                key: "auth.session_ttl_secs".to_string(),
                reason: format!("must be at most {} seconds", MAX_SESSION_TTL_SECS),
            });
        }

        if self.provider_timeout_secs == 0 {
            return Err(AuthError::InvalidConfig {
                key: "auth.provider_timeout_secs".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        self.cookie.validate()?;
        self.providers.validate()?;

        Ok(())
    }

    /// Session lifetime, clamped to [`MAX_SESSION_TTL_SECS`]
    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(
            i64::try_from(self.cookie_max_age_secs()).unwrap_or(i64::MAX),
        )
    }

    /// `Max-Age` of the session cookie, equal to the session lifetime
    pub fn cookie_max_age_secs(&self) -> u64 {
        self.session_ttl_secs.min(MAX_SESSION_TTL_SECS)
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_secret: String::new(), // Must be set explicitly
            session_ttl_secs: default_session_ttl(),
            provider_timeout_secs: default_provider_timeout(),
            cookie: CookieConfig::default(),
            providers: ProvidersConfig::default(),
        }
    }
}

/// Session cookie configuration. Path, HttpOnly and SameSite are fixed;
/// Secure follows the deployment's production flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CookieConfig {
    /// Cookie name
    #[serde(default = "default_cookie_name")]
    pub name: String,
}

impl CookieConfig {
    fn validate(&self) -> Result<(), AuthError> {
        if self.name.is_empty() {
            return Err(AuthError::InvalidConfig {
                key: "auth.cookie.name".to_string(),
                reason: "cannot be empty".to_string(),
            });
        }

        if self
            .name
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || ";,=".contains(c))
        {
            return Err(AuthError::InvalidConfig {
                key: "auth.cookie.name".to_string(),
                reason: "contains characters not allowed in a cookie name".to_string(),
            });
        }

        Ok(())
    }
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: default_cookie_name(),
        }
    }
}

/// Identity provider configurations
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProvidersConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google: Option<ProviderConfig>,
}

impl ProvidersConfig {
    fn validate(&self) -> Result<(), AuthError> {
        match self.google {
            Some(ref google) => google.validate("google"),
            None => Err(AuthError::MissingConfig(
                "auth.providers.google".to_string(),
            )),
        }
    }
}

/// OAuth2 provider configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProviderConfig {
    /// OAuth2 client ID
    #[serde(default)]
    pub client_id: String,

    /// OAuth2 client secret
    #[serde(default)]
    pub client_secret: String,

    /// OAuth2 redirect URI, the public URL of the callback path
    #[serde(default)]
    pub redirect_uri: String,

    /// OAuth2 scopes
    #[serde(default)]
    pub scopes: Vec<String>,

    /// Override for the authorization endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_url: Option<String>,

    /// Override for the token endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_url: Option<String>,

    /// Override for the userinfo endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub userinfo_url: Option<String>,
}

impl ProviderConfig {
    fn validate(&self, provider: &str) -> Result<(), AuthError> {
        if self.client_id.is_empty() {
            return Err(AuthError::MissingConfig(format!(
                "auth.providers.{}.client_id",
                provider
            )));
        }

        if self.client_secret.is_empty() {
            return Err(AuthError::MissingConfig(format!(
                "auth.providers.{}.client_secret",
                provider
            )));
        }

        let key = format!("auth.providers.{}.redirect_uri", provider);
        let redirect = url::Url::parse(&self.redirect_uri).map_err(|e| AuthError::InvalidConfig {
            key: key.clone(),
            reason: e.to_string(),
        })?;

        if redirect.path() != CALLBACK_PATH {
            return Err(AuthError::InvalidConfig {
                key,
                reason: format!("path must be exactly {}", CALLBACK_PATH),
            });
        }

        for (name, value) in [
            ("auth_url", &self.auth_url),
            ("token_url", &self.token_url),
            ("userinfo_url", &self.userinfo_url),
        ] {
            if let Some(value) = value {
                url::Url::parse(value).map_err(|e| AuthError::InvalidConfig {
                    key: format!("auth.providers.{}.{}", provider, name),
                    reason: e.to_string(),
                })?;
            }
        }

        Ok(())
    }
}

// Default value functions
fn default_session_ttl() -> u64 {
    86400 // 24 hours
}

fn default_provider_timeout() -> u64 {
    10
}

fn default_cookie_name() -> String {
    "connect.sid".to_string()
}
