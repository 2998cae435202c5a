//! Cross-origin trust boundary.
//!
//! Exactly one browser origin is trusted, with credentials. Requests from any
//! other origin are still routed but their responses carry no
//! `Access-Control-Allow-Origin`, so the browser withholds them.

use axum::http::{HeaderValue, Method};
use thiserror::Error;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OriginError {
    #[error("wildcard origin cannot be combined with credentials")]
    Wildcard,

    #[error("invalid origin '{0}': {1}")]
    Invalid(String, String),
}

/// A single `scheme://host[:port]` origin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustedOrigin(String);

impl TrustedOrigin {
    pub fn parse(value: &str) -> Result<Self, OriginError> {
        let value = value.trim();
        if value == "*" {
            return Err(OriginError::Wildcard);
        }

        let invalid = |reason: &str| OriginError::Invalid(value.to_string(), reason.to_string());

        let url = url::Url::parse(value).map_err(|e| invalid(&e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid("scheme must be http or https"));
        }
        if url.host_str().is_none() {
            return Err(invalid("missing host"));
        }
        if url.path() != "/" || url.query().is_some() || url.fragment().is_some() {
            return Err(invalid("must not carry a path, query or fragment"));
        }
        if !url.username().is_empty() || url.password().is_some() {
            return Err(invalid("must not carry credentials"));
        }

        Ok(Self(url.origin().ascii_serialization()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TrustedOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Credentialed CORS for the one trusted origin
pub fn cors_layer(origin: &TrustedOrigin) -> Result<CorsLayer, OriginError> {
    let value = HeaderValue::from_str(origin.as_str())
        .map_err(|e| OriginError::Invalid(origin.to_string(), e.to_string()))?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list([value]))
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::PUT,
            Method::PATCH,
            Method::POST,
            Method::DELETE,
        ])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true))
}
