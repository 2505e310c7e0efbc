//! Dashboard configuration
//!
//! Loaded from an optional TOML file, then overridden from the environment:
//!
//! | variable | field |
//! |---|---|
//! | `SHOPSMART_APP_ID` | `app_id` |
//! | `SHOPSMART_AUTH_TOKEN` | `initial_auth_token` |
//! | `SHOPSMART_NOTIFICATION_TTL_MS` | `notification_ttl_ms` |
//! | `SHOPSMART_SEED_STRATEGY` | `seed_strategy` |

use crate::error::ConfigError;
use crate::notify::DEFAULT_DISMISS_AFTER;
use crate::seed::SeedStrategy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Application namespace used when none is configured
pub const DEFAULT_APP_ID: &str = "default-app-id";

const ENV_APP_ID: &str = "SHOPSMART_APP_ID";
const ENV_AUTH_TOKEN: &str = "SHOPSMART_AUTH_TOKEN";
const ENV_NOTIFICATION_TTL: &str = "SHOPSMART_NOTIFICATION_TTL_MS";
const ENV_SEED_STRATEGY: &str = "SHOPSMART_SEED_STRATEGY";

/// Dashboard configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Namespace for the shared collections
    pub app_id: String,
    /// Bootstrap token exchanged for a session, if any
    pub initial_auth_token: Option<String>,
    /// Notification auto-dismiss interval in milliseconds
    pub notification_ttl_ms: u64,
    /// How first-run seeding inserts the defaults
    pub seed_strategy: SeedStrategy,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            app_id: DEFAULT_APP_ID.to_string(),
            initial_auth_token: None,
            notification_ttl_ms: u64::try_from(DEFAULT_DISMISS_AFTER.as_millis()).unwrap_or(5000),
            seed_strategy: SeedStrategy::default(),
        }
    }
}

impl DashboardConfig {
    /// Parse TOML text
    ///
    /// # Errors
    /// `ConfigError::Parse` if the text does not match the schema
    pub fn from_toml_str(contents: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Read a config file
    ///
    /// # Errors
    /// `ConfigError::Read` or `ConfigError::Parse`
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents, path)
    }

    /// Defaults or file, then environment overrides
    ///
    /// # Errors
    /// File errors, or an environment variable with an invalid value
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides()?;
        tracing::debug!(
            app_id = %config.app_id,
            strategy = %config.seed_strategy,
            "configuration loaded"
        );
        Ok(config)
    }

    /// Apply `SHOPSMART_*` variables from the process environment
    ///
    /// # Errors
    /// `ConfigError::InvalidEnv` for unparseable values
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any variable source. Blank values are ignored.
    ///
    /// # Errors
    /// `ConfigError::InvalidEnv` for unparseable values
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        let var = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
        };

        if let Some(app_id) = var(ENV_APP_ID) {
            self.app_id = app_id;
        }
        if let Some(token) = var(ENV_AUTH_TOKEN) {
            self.initial_auth_token = Some(token);
        }
        if let Some(raw) = var(ENV_NOTIFICATION_TTL) {
            self.notification_ttl_ms = raw.parse().map_err(|_| ConfigError::InvalidEnv {
                key: ENV_NOTIFICATION_TTL,
                value: raw.clone(),
            })?;
        }
        if let Some(raw) = var(ENV_SEED_STRATEGY) {
            self.seed_strategy = raw.parse().map_err(|_| ConfigError::InvalidEnv {
                key: ENV_SEED_STRATEGY,
                value: raw.clone(),
            })?;
        }
        Ok(())
    }

    /// With application namespace
    #[must_use]
    pub fn with_app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = app_id.into();
        self
    }

    /// With bootstrap token
    #[must_use]
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.initial_auth_token = Some(token.into());
        self
    }

    /// With notification interval
    #[must_use]
    pub fn with_notification_ttl(mut self, ttl: Duration) -> Self {
        self.notification_ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// With seeding strategy
    #[must_use]
    pub fn with_seed_strategy(mut self, strategy: SeedStrategy) -> Self {
        self.seed_strategy = strategy;
        self
    }

    /// Notification interval
    #[inline]
    #[must_use]
    pub fn notification_ttl(&self) -> Duration {
        Duration::from_millis(self.notification_ttl_ms)
    }
}
