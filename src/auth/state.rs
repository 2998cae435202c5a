// OAuth State Management
// One-time anti-replay tokens issued with each authorization request

use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::error::AuthError;

/// Authorization requests older than this cannot be completed
const STATE_LIFETIME_SECS: i64 = 600;

#[derive(Debug, Clone)]
struct StateMetadata {
    provider: String,
    expires_at: DateTime<Utc>,
}

/// OAuth state parameter manager
#[derive(Debug, Clone)]
pub struct OAuthStateManager {
    lifetime: Duration,
    states: Arc<RwLock<HashMap<String, StateMetadata>>>,
}

impl Default for OAuthStateManager {
    fn default() -> Self {
        Self::new(STATE_LIFETIME_SECS)
    }
}

impl OAuthStateManager {
    pub fn new(lifetime_seconds: i64) -> Self {
        Self {
            lifetime: Duration::seconds(lifetime_seconds),
            states: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Issue a state token bound to `provider`
    pub async fn issue(&self, provider: &str) -> String {
        let random_bytes: [u8; 32] = rand::random();
        let state = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(random_bytes);
        let expires_at = Utc::now() + self.lifetime;

        self.states.write().await.insert(
            state.clone(),
            StateMetadata {
                provider: provider.to_string(),
                expires_at,
            },
        );

        debug!(provider, %expires_at, "Issued OAuth state");
        state
    }

    /// Validate and consume a state token. A token can be consumed once.
    pub async fn consume(&self, state: &str, provider: &str) -> Result<(), AuthError> {
        let metadata = self
            .states
            .write()
            .await
            .remove(state)
            .ok_or_else(|| AuthError::InvalidResponse("unknown or reused state".to_string()))?;

        if Utc::now() > metadata.expires_at {
            warn!(provider, "OAuth state expired");
            return Err(AuthError::InvalidResponse("state expired".to_string()));
        }

        if metadata.provider != provider {
            warn!(
                expected = provider,
                actual = %metadata.provider,
                "OAuth state issued for a different provider"
            );
            return Err(AuthError::InvalidResponse("state provider mismatch".to_string()));
        }

        Ok(())
    }

    /// Cleanup expired states
    pub async fn cleanup_expired(&self) -> usize {
        let now = Utc::now();
        let mut states = self.states.write().await;

        let initial_count = states.len();
        states.retain(|_, metadata| now <= metadata.expires_at);
        let removed = initial_count - states.len();

        if removed > 0 {
            debug!("Cleaned up {} expired OAuth states", removed);
        }

        removed
    }
}
