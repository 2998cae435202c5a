// Authentication Session Management
// Materializes resolved identities into the session store and hydrates them per request

use axum::http::HeaderMap;
use axum_extra::extract::cookie::Cookie;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::cookies::SessionCookie;
use super::error::SessionError;
use super::store::{Session, SessionId, SessionStore};

/// Minimal projection of the provider's profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Stable identifier assigned by the provider
    pub id: String,

    /// Display name
    pub username: String,
}

/// Request-scoped view of the hydrated session. The session id stays
/// crate-private; collaborators only ever see the identity.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    session_id: Option<SessionId>,
    identity: Option<UserIdentity>,
}

impl SessionContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub(crate) fn new(session_id: SessionId, identity: Option<UserIdentity>) -> Self {
        Self {
            session_id: Some(session_id),
            identity,
        }
    }

    pub fn identity(&self) -> Option<&UserIdentity> {
        self.identity.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    pub(crate) fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }
}

/// Session materializer: login, per-request hydration and logout
pub struct SessionManager<S: SessionStore> {
    store: S,
    cookie: SessionCookie,
    ttl: Duration,
}

impl<S: SessionStore> SessionManager<S> {
    pub fn new(store: S, cookie: SessionCookie, ttl: Duration) -> Self {
        Self { store, cookie, ttl }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn cookie(&self) -> &SessionCookie {
        &self.cookie
    }

    /// Resolve the request's cookie into a session context. Every failure
    /// mode (no cookie, bad signature, unknown, expired, store error)
    /// degrades to anonymous.
    pub async fn hydrate(&self, headers: &HeaderMap) -> SessionContext {
        let Some(session_id) = self.cookie.read(headers) else {
            return SessionContext::anonymous();
        };

        match self.load_live(&session_id).await {
            Ok(session) => SessionContext::new(session_id, session.identity().cloned()),
            Err(SessionError::NotFound) | Err(SessionError::Expired) => {
                SessionContext::anonymous()
            }
            Err(e) => {
                warn!(error = %e, "Session lookup failed, treating request as anonymous");
                SessionContext::anonymous()
            }
        }
    }

    /// Persist a freshly resolved identity in a new session and return the
    /// cookie that carries it.
    pub async fn login(&self, identity: UserIdentity) -> Result<(Session, Cookie<'static>), SessionError> {
        let mut session = Session::new(self.ttl);
        session.attach_identity(identity, self.ttl);
        let session = self.store.save(session).await?;

        info!(
            session = session.id().short(),
            user_id = session.identity().map(|u| u.id.as_str()).unwrap_or_default(),
            "Created session"
        );

        let cookie = self.cookie.issue(session.id());
        Ok((session, cookie))
    }

    /// Log in over whatever session the request already carried. The new
    /// session replaces the previous one, which is destroyed so its cookie
    /// stops authenticating.
    pub async fn regenerate(
        &self,
        previous: &SessionContext,
        identity: UserIdentity,
    ) -> Result<(Session, Cookie<'static>), SessionError> {
        let (session, cookie) = self.login(identity).await?;

        if let Some(old_id) = previous.session_id() {
            match self.store.destroy(old_id).await {
                Ok(true) => debug!(
                    old = old_id.short(),
                    new = session.id().short(),
                    "Replaced previous session"
                ),
                Ok(false) => {}
                Err(e) => warn!(error = %e, "Failed to destroy previous session"),
            }
        }

        Ok((session, cookie))
    }

    /// Clear the identity and destroy the backing record. Always returns
    /// the removal cookie, even when there was nothing to destroy.
    pub async fn logout(&self, context: &SessionContext) -> Cookie<'static> {
        if let Some(session_id) = context.session_id() {
            match self.store.load(session_id).await {
                Ok(Some(mut session)) => {
                    session.clear_identity();
                    if let Err(e) = self.commit(session).await {
                        warn!(error = %e, "Failed to destroy session during logout");
                    } else {
                        info!(session = session_id.short(), "Session invalidated");
                    }
                }
                Ok(None) => debug!("Logout for a session that no longer exists"),
                Err(e) => warn!(error = %e, "Session lookup failed during logout"),
            }
        }

        self.cookie.removal()
    }

    /// Write back a session that changed. A session with nothing left in it
    /// is removed instead of being stored as an empty record.
    pub async fn commit(&self, session: Session) -> Result<Option<Session>, SessionError> {
        if !session.is_dirty() {
            return Ok(Some(session));
        }

        if session.is_unset() {
            self.store.destroy(session.id()).await?;
            return Ok(None);
        }

        self.store.save(session).await.map(Some)
    }

    /// Remove expired sessions from the store
    pub async fn purge_expired(&self) -> usize {
        let removed = self.store.purge_expired(Utc::now()).await;
        if removed > 0 {
            info!("Cleaned up {} expired sessions", removed);
        }
        removed
    }

    async fn load_live(&self, session_id: &SessionId) -> Result<Session, SessionError> {
        let session = self
            .store
            .load(session_id)
            .await?
            .ok_or(SessionError::NotFound)?;

        if session.is_expired_at(Utc::now()) {
            self.store.destroy(session_id).await?;
            debug!(session = session_id.short(), "Dropped expired session");
            return Err(SessionError::Expired);
        }

        Ok(session)
    }
}
