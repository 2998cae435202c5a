// Authentication Module
// OAuth2 login against an external provider with cookie-backed sessions

pub mod callback;
pub mod config;
pub mod cookies;
pub mod error;
pub mod manager;
pub mod middleware;
pub mod providers;
pub mod routes;
pub mod session;
pub mod state;
pub mod store;

pub use callback::{CallbackOutcome, OAuthCallbackParams};
pub use config::{AuthConfig, CookieConfig, ProviderConfig, ProvidersConfig};
pub use error::{AuthError, SessionError};
pub use manager::{AuthManager, CallbackResult, SharedAuthManager, SpaRedirects};
pub use middleware::{AuthenticatedUser, hydrate_session, require_auth};
pub use providers::IdentityProvider;
pub use routes::{create_auth_router, google_callback};
pub use session::{SessionContext, SessionManager, UserIdentity};
pub use state::OAuthStateManager;
pub use store::{MemorySessionStore, Session, SessionId, SessionStore};
