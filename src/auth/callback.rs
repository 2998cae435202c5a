/// Provider callback handling
///
/// A callback request moves through `AwaitingCallback -> Validating` and
/// ends in exactly one [`CallbackOutcome`]. Each request gets its own
/// instance; nothing here outlives the request, and nothing is persisted
/// before the outcome is `Authenticated`.
use serde::Deserialize;
use tracing::warn;

use super::error::AuthError;
use super::providers::IdentityProvider;
use super::session::UserIdentity;
use super::state::OAuthStateManager;

/// OAuth2 callback parameters
#[derive(Debug, Default, Deserialize)]
pub struct OAuthCallbackParams {
    /// Authorization code from provider
    pub code: Option<String>,

    /// Anti-replay state token
    pub state: Option<String>,

    /// Error from provider
    pub error: Option<String>,

    /// Error description from provider
    pub error_description: Option<String>,
}

/// The browser has returned from the provider
#[derive(Debug)]
pub struct AwaitingCallback {
    params: OAuthCallbackParams,
}

/// The provider response passed state validation; the code is ready to exchange
#[derive(Debug)]
pub struct Validating {
    code: String,
}

/// Terminal state of a callback
#[derive(Debug)]
pub enum CallbackOutcome {
    Authenticated(UserIdentity),
    Failed(AuthError),
}

impl AwaitingCallback {
    pub fn new(params: OAuthCallbackParams) -> Self {
        Self { params }
    }

    /// Check the provider's verdict and consume the anti-replay state
    pub async fn validate(
        self,
        states: &OAuthStateManager,
        provider: &IdentityProvider,
    ) -> Result<Validating, AuthError> {
        let OAuthCallbackParams {
            code,
            state,
            error,
            error_description,
        } = self.params;

        // A present state is consumed whatever the verdict so it cannot be replayed
        let state_check = match state {
            Some(state) => states.consume(&state, provider.name()).await,
            None => Err(AuthError::InvalidResponse("missing state".to_string())),
        };

        if let Some(error) = error {
            let description = error_description.unwrap_or_else(|| "Unknown error".to_string());
            warn!(error = %error, description = %description, "Provider returned an error");
            return Err(if error == "access_denied" {
                AuthError::Denied
            } else {
                AuthError::InvalidResponse(format!("{}: {}", error, description))
            });
        }

        state_check?;

        let code = code
            .filter(|c| !c.is_empty())
            .ok_or_else(|| AuthError::InvalidResponse("missing authorization code".to_string()))?;

        Ok(Validating { code })
    }
}

impl Validating {
    /// Exchange the code and resolve the identity
    pub async fn complete(self, provider: &IdentityProvider) -> CallbackOutcome {
        match provider.complete_auth(&self.code).await {
            Ok(identity) => CallbackOutcome::Authenticated(identity),
            Err(e) => CallbackOutcome::Failed(e),
        }
    }
}

/// Drive one callback request to its outcome
pub async fn run(
    params: OAuthCallbackParams,
    states: &OAuthStateManager,
    provider: &IdentityProvider,
) -> CallbackOutcome {
    match AwaitingCallback::new(params).validate(states, provider).await {
        Ok(validating) => validating.complete(provider).await,
        Err(e) => CallbackOutcome::Failed(e),
    }
}
