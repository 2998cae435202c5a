// Authentication Error Types
// Terminal login failures, session store failures and configuration errors

use thiserror::Error;

/// Session-related errors
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session not found")]
    NotFound,

    #[error("Session expired")]
    Expired,

    #[error("Session storage error: {0}")]
    Storage(String),
}

#[derive(Debug, Error)]
pub enum AuthError {
    // Delegated-authentication outcomes. All of these end the current
    // login attempt; none are retried.
    #[error("Provider denied consent")]
    Denied,

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("Identity provider unavailable: {0}")]
    ProviderUnavailable(String),

    // Session errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    // Configuration errors
    #[error("Missing required configuration: {0}")]
    MissingConfig(String),

    #[error("Invalid configuration value for {key}: {reason}")]
    InvalidConfig { key: String, reason: String },
}

// Conversion from reqwest errors
impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() || err.is_request() {
            AuthError::ProviderUnavailable(err.to_string())
        } else {
            AuthError::InvalidResponse(err.to_string())
        }
    }
}

// Conversion from serde_json errors
impl From<serde_json::Error> for AuthError {
    fn from(err: serde_json::Error) -> Self {
        AuthError::InvalidResponse(err.to_string())
    }
}

impl AuthError {
    /// Stable label used in structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::Denied => "denied",
            AuthError::InvalidResponse(_) => "invalid_response",
            AuthError::ProviderUnavailable(_) => "provider_unavailable",
            AuthError::Session(_) => "session",
            AuthError::MissingConfig(_) | AuthError::InvalidConfig { .. } => "config",
        }
    }

    /// Classify a non-success HTTP status returned by the provider
    pub fn from_provider_status(status: reqwest::StatusCode, context: &str) -> Self {
        if status.is_server_error() {
            AuthError::ProviderUnavailable(format!("{} failed with status {}", context, status))
        } else {
            AuthError::InvalidResponse(format!("{} failed with status {}", context, status))
        }
    }
}
