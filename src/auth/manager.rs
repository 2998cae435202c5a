/// Authentication Manager
///
/// Central orchestrator for authentication operations, coordinating the
/// identity provider, the anti-replay state registry and the session
/// materializer.
use axum::http::HeaderMap;
use axum_extra::extract::cookie::Cookie;
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::callback::{self, CallbackOutcome, OAuthCallbackParams};
use crate::auth::cookies::SessionCookie;
use crate::auth::providers::IdentityProvider;
use crate::auth::session::{SessionContext, SessionManager};
use crate::auth::state::OAuthStateManager;
use crate::auth::store::{MemorySessionStore, SessionStore};
use crate::auth::{AuthConfig, AuthError};

/// SPA route completing client-side login state
pub const SPA_CALLBACK_ROUTE: &str = "/auth/callback";

/// SPA route shown after a failed login attempt
pub const SPA_LOGIN_ROUTE: &str = "/login";

/// Where the browser lands after the callback
#[derive(Debug, Clone)]
pub struct SpaRedirects {
    pub success: String,
    pub failure: String,
}

impl SpaRedirects {
    pub fn for_origin(spa_origin: &str) -> Self {
        let origin = spa_origin.trim_end_matches('/');
        Self {
            success: format!("{}{}", origin, SPA_CALLBACK_ROUTE),
            failure: format!("{}{}", origin, SPA_LOGIN_ROUTE),
        }
    }
}

/// Result of handling one provider callback
pub enum CallbackResult {
    /// Session persisted; cookie must be set on the redirect
    LoggedIn(Cookie<'static>),
    /// Nothing persisted
    Failed(AuthError),
}

/// Central authentication manager
pub struct AuthManager<S: SessionStore = MemorySessionStore> {
    provider: IdentityProvider,
    states: OAuthStateManager,
    sessions: SessionManager<S>,
    redirects: SpaRedirects,
}

impl AuthManager<MemorySessionStore> {
    /// Build the manager from validated configuration
    pub fn from_config(
        config: &AuthConfig,
        spa_origin: &str,
        production: bool,
    ) -> Result<Self, AuthError> {
        let cookie = SessionCookie::new(
            config.cookie.name.clone(),
            &config.session_secret,
            production,
            config.cookie_max_age_secs(),
        );

        Ok(Self::new(
            IdentityProvider::from_config(config)?,
            OAuthStateManager::default(),
            SessionManager::new(MemorySessionStore::new(), cookie, config.session_ttl()),
            SpaRedirects::for_origin(spa_origin),
        ))
    }
}

impl<S: SessionStore> AuthManager<S> {
    pub fn new(
        provider: IdentityProvider,
        states: OAuthStateManager,
        sessions: SessionManager<S>,
        redirects: SpaRedirects,
    ) -> Self {
        Self {
            provider,
            states,
            sessions,
            redirects,
        }
    }

    /// Generate the authorization URL for the configured provider
    pub async fn start_login(&self) -> Result<url::Url, AuthError> {
        let state = self.states.issue(self.provider.name()).await;
        let auth_url = self.provider.begin_auth(&state)?;

        info!(provider = self.provider.name(), "Starting login");
        Ok(auth_url)
    }

    /// Run the callback state machine and, on success, persist the session.
    /// A session already attached to the request is replaced, never kept.
    pub async fn handle_callback(
        &self,
        params: OAuthCallbackParams,
        previous: &SessionContext,
    ) -> CallbackResult {
        let identity = match callback::run(params, &self.states, &self.provider).await {
            CallbackOutcome::Authenticated(identity) => identity,
            CallbackOutcome::Failed(e) => {
                warn!(
                    provider = self.provider.name(),
                    kind = e.kind(),
                    error = %e,
                    "Login attempt failed"
                );
                return CallbackResult::Failed(e);
            }
        };

        match self.sessions.regenerate(previous, identity).await {
            Ok((_, cookie)) => CallbackResult::LoggedIn(cookie),
            Err(e) => {
                warn!(error = %e, "Failed to persist session after login");
                CallbackResult::Failed(e.into())
            }
        }
    }

    /// Hydrate the session attached to a request
    pub async fn hydrate(&self, headers: &HeaderMap) -> SessionContext {
        self.sessions.hydrate(headers).await
    }

    /// Destroy the session and return the removal cookie
    pub async fn logout(&self, context: &SessionContext) -> Cookie<'static> {
        self.sessions.logout(context).await
    }

    /// Purge expired sessions and expired anti-replay states
    pub async fn cleanup_expired(&self) -> (usize, usize) {
        let sessions = self.sessions.purge_expired().await;
        let states = self.states.cleanup_expired().await;
        (sessions, states)
    }

    pub fn redirects(&self) -> &SpaRedirects {
        &self.redirects
    }

    pub fn sessions(&self) -> &SessionManager<S> {
        &self.sessions
    }

    pub fn provider(&self) -> &IdentityProvider {
        &self.provider
    }
}

/// Shared handle used as axum state
pub type SharedAuthManager = Arc<AuthManager>;
