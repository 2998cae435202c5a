// Session Store
// Server-side session records keyed by an opaque, server-generated identifier

use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use super::error::SessionError;
use super::session::UserIdentity;

const SESSION_ID_BYTES: usize = 32;

/// Opaque session identifier. Only ever produced by [`SessionId::generate`]
/// or recovered from a cookie whose signature has already been verified.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn generate() -> Self {
        let random_bytes: [u8; SESSION_ID_BYTES] = rand::random();
        Self(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(random_bytes))
    }

    /// Accept a value only if it has the shape of a generated identifier
    pub fn parse(value: &str) -> Option<Self> {
        let decoded = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(value)
            .ok()?;
        (decoded.len() == SESSION_ID_BYTES).then(|| Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Prefix safe to put in logs
    pub fn short(&self) -> &str {
        &self.0[..8]
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({}…)", self.short())
    }
}

/// A server-side session record
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    identity: Option<UserIdentity>,
    dirty: bool,
}

/// `now + ttl`, saturating instead of overflowing
fn expiry_from(now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

impl Session {
    /// A fresh, anonymous session. Dirty until first saved.
    pub fn new(ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::generate(),
            created_at: now,
            expires_at: expiry_from(now, ttl),
            identity: None,
            dirty: true,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn identity(&self) -> Option<&UserIdentity> {
        self.identity.as_ref()
    }

    /// Attach an identity and restart the absolute lifetime
    pub fn attach_identity(&mut self, identity: UserIdentity, ttl: Duration) {
        self.identity = Some(identity);
        self.expires_at = expiry_from(Utc::now(), ttl);
        self.dirty = true;
    }

    pub fn clear_identity(&mut self) {
        if self.identity.take().is_some() {
            self.dirty = true;
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// No attributes left worth keeping
    pub fn is_unset(&self) -> bool {
        self.identity.is_none()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

/// Session persistence. Each operation touches exactly one key and is atomic
/// with respect to other operations on the same store.
pub trait SessionStore: Send + Sync + 'static {
    /// Look up a session by id
    fn load(
        &self,
        id: &SessionId,
    ) -> impl Future<Output = Result<Option<Session>, SessionError>> + Send;

    /// Insert or replace a session. Returns the stored copy with the dirty
    /// flag cleared.
    fn save(&self, session: Session) -> impl Future<Output = Result<Session, SessionError>> + Send;

    /// Remove a session. Returns whether a record existed.
    fn destroy(&self, id: &SessionId) -> impl Future<Output = Result<bool, SessionError>> + Send;

    /// Remove every session expired at `now`
    fn purge_expired(&self, now: DateTime<Utc>) -> impl Future<Output = usize> + Send;

    /// Number of stored records
    fn len(&self) -> impl Future<Output = usize> + Send;

    fn is_empty(&self) -> impl Future<Output = bool> + Send {
        async { self.len().await == 0 }
    }
}

/// In-process session store
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, Session>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    async fn load(&self, id: &SessionId) -> Result<Option<Session>, SessionError> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(id).cloned())
    }

    async fn save(&self, mut session: Session) -> Result<Session, SessionError> {
        session.dirty = false;
        let mut sessions = self.sessions.write().await;
        sessions.insert(session.id.clone(), session.clone());
        debug!(session = session.id.short(), "Saved session");
        Ok(session)
    }

    async fn destroy(&self, id: &SessionId) -> Result<bool, SessionError> {
        let mut sessions = self.sessions.write().await;
        let existed = sessions.remove(id).is_some();
        if existed {
            debug!(session = id.short(), "Destroyed session");
        }
        Ok(existed)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write().await;
        let initial_count = sessions.len();
        sessions.retain(|_, session| !session.is_expired_at(now));
        initial_count - sessions.len()
    }

    async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
