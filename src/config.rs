/// Configuration for the authgate server
///
/// Layered with figment: built-in defaults, an optional TOML file,
/// `AUTHGATE_`-prefixed environment variables (`__` separates nested keys)
/// and finally the bare `PORT` variable used by most hosting platforms.
use crate::auth::AuthConfig;
use crate::cors::TrustedOrigin;
use anyhow::Context;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const ENV_PREFIX: &str = "AUTHGATE_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,

    /// Browser origin of the single-page application
    pub spa_origin: String,

    /// Enables the `Secure` cookie attribute
    pub production: bool,

    pub log_format: LogFormat,

    /// Interval of the expired session / state sweep
    pub cleanup_interval_secs: u64,

    pub auth: AuthConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            spa_origin: "http://localhost:5173".to_string(),
            production: false,
            log_format: LogFormat::Text,
            cleanup_interval_secs: 300,
            auth: AuthConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from defaults, the optional file and the environment
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        Self::figment(path)
            .extract()
            .context("failed to load configuration")
    }

    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .merge(Env::raw().only(&["PORT"]))
    }

    /// Reject configurations the server must not start with
    pub fn validate(&self) -> anyhow::Result<TrustedOrigin> {
        let origin = TrustedOrigin::parse(&self.spa_origin).context("invalid spa_origin")?;

        if self.cleanup_interval_secs == 0 {
            anyhow::bail!("cleanup_interval_secs must be greater than zero");
        }

        self.auth.validate().context("invalid auth configuration")?;
        Ok(origin)
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }
}
