// Session Cookie Codec
// Signed session cookie issue, removal and verification

use axum::http::HeaderMap;
use axum_extra::extract::SignedCookieJar;
use axum_extra::extract::cookie::{Cookie, Key, SameSite};
use sha2::{Digest, Sha512};
use time::Duration;

use super::store::SessionId;

/// Session cookie attributes shared by issue and removal
#[derive(Clone)]
pub struct SessionCookie {
    name: String,
    secure: bool,
    max_age_secs: i64,
    key: Key,
}

impl SessionCookie {
    /// `secret` must already have passed configuration validation
    pub fn new(name: impl Into<String>, secret: &str, secure: bool, max_age_secs: u64) -> Self {
        Self {
            name: name.into(),
            secure,
            max_age_secs: i64::try_from(max_age_secs).unwrap_or(i64::MAX),
            key: derive_key(secret),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    /// Cookie carrying a session identifier
    pub fn issue(&self, session_id: &SessionId) -> Cookie<'static> {
        self.build(
            session_id.as_str().to_string(),
            Duration::seconds(self.max_age_secs),
        )
    }

    /// Cookie instructing the browser to drop the session cookie
    pub fn removal(&self) -> Cookie<'static> {
        self.build(String::new(), Duration::ZERO)
    }

    /// Verified session identifier from the request, if any
    pub fn read(&self, headers: &HeaderMap) -> Option<SessionId> {
        let jar = SignedCookieJar::from_headers(headers, self.key.clone());
        let cookie = jar.get(&self.name)?;
        SessionId::parse(cookie.value())
    }

    /// Jar with no original cookies, used to emit a signed Set-Cookie
    pub fn empty_jar(&self) -> SignedCookieJar {
        SignedCookieJar::new(self.key.clone())
    }

    fn build(&self, value: String, max_age: Duration) -> Cookie<'static> {
        Cookie::build((self.name.clone(), value))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .max_age(max_age)
            .build()
    }
}

impl std::fmt::Debug for SessionCookie {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCookie")
            .field("name", &self.name)
            .field("secure", &self.secure)
            .field("max_age_secs", &self.max_age_secs)
            .finish_non_exhaustive()
    }
}

/// Stretch the configured secret to the 64 bytes the signing key needs
fn derive_key(secret: &str) -> Key {
    let digest = Sha512::digest(secret.as_bytes());
    Key::from(digest.as_slice())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, header};
    use axum::response::IntoResponse;

    const SECRET: &str = "test-session-secret-that-is-long-enough";

    fn set_cookie_header(jar: SignedCookieJar) -> String {
        let response = jar.into_response();
        response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .unwrap()
            .to_string()
    }

    #[test]
    fn test_issue_attributes_development() {
        let cookies = SessionCookie::new("connect.sid", SECRET, false, 86400);
        let id = SessionId::generate();
        let header = set_cookie_header(cookies.empty_jar().add(cookies.issue(&id)));

        assert!(header.starts_with("connect.sid="));
        assert!(header.contains("HttpOnly"));
        assert!(header.contains("SameSite=Lax"));
        assert!(header.contains("Path=/"));
        assert!(header.contains("Max-Age=86400"));
        assert!(!header.contains("Secure"));
    }

    #[test]
    fn test_max_age_never_wraps_negative() {
        let cookies = SessionCookie::new("connect.sid", SECRET, false, u64::MAX);
        let id = SessionId::generate();
        let header = set_cookie_header(cookies.empty_jar().add(cookies.issue(&id)));

        assert!(!header.contains("Max-Age=-"));
        assert!(header.contains(&format!("Max-Age={}", i64::MAX)));
    }

    #[test]
    fn test_issue_attributes_production() {
        let cookies = SessionCookie::new("connect.sid", SECRET, true, 86400);
        let id = SessionId::generate();
        let header = set_cookie_header(cookies.empty_jar().add(cookies.issue(&id)));

        assert!(header.contains("Secure"));
        assert!(header.contains("HttpOnly"));
    }

    #[test]
    fn test_signed_value_round_trips_through_headers() {
        let cookies = SessionCookie::new("connect.sid", SECRET, false, 86400);
        let id = SessionId::generate();
        let header = set_cookie_header(cookies.empty_jar().add(cookies.issue(&id)));

        // The signed value differs from the raw identifier
        let pair = header.split(';').next().unwrap().to_string();
        assert_ne!(pair, format!("connect.sid={}", id.as_str()));

        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(&pair).unwrap());
        assert_eq!(cookies.read(&headers), Some(id));
    }

    #[test]
    fn test_unsigned_or_foreign_cookie_ignored() {
        let cookies = SessionCookie::new("connect.sid", SECRET, false, 86400);
        let id = SessionId::generate();

        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("connect.sid={}", id.as_str())).unwrap(),
        );
        assert_eq!(cookies.read(&headers), None);

        // Signed with another secret
        let other = SessionCookie::new("connect.sid", &"x".repeat(40), false, 86400);
        let header = set_cookie_header(other.empty_jar().add(other.issue(&id)));
        let pair = header.split(';').next().unwrap().to_string();
        headers.insert(header::COOKIE, HeaderValue::from_str(&pair).unwrap());
        assert_eq!(cookies.read(&headers), None);
    }

    #[test]
    fn test_removal_cookie() {
        let cookies = SessionCookie::new("connect.sid", SECRET, true, 86400);
        let header = set_cookie_header(cookies.empty_jar().add(cookies.removal()));

        assert!(header.contains("Max-Age=0"));
        assert!(header.contains("Path=/"));
        assert!(header.contains("HttpOnly"));
        assert!(header.contains("SameSite=Lax"));
        assert!(header.contains("Secure"));
    }
}
