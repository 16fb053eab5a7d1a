//! Top-level configuration and environment loading.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use warden_identity::IdentityConfig;
use warden_session::{LoginMode, SessionConfig};

use crate::WardenError;

pub const ENV_API_URL: &str = "WARDEN_API_URL";
pub const ENV_ME_PATH: &str = "WARDEN_ME_PATH";
pub const ENV_LOGIN_PATH: &str = "WARDEN_LOGIN_PATH";
pub const ENV_REFRESH_PATH: &str = "WARDEN_REFRESH_PATH";
pub const ENV_TIMEOUT_SECS: &str = "WARDEN_TIMEOUT_SECS";
pub const ENV_LOGIN_MODE: &str = "WARDEN_LOGIN_MODE";
pub const ENV_STORE_PATH: &str = "WARDEN_STORE_PATH";

/// Everything needed to build a session manager.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WardenConfig {
    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub identity: IdentityConfig,

    /// Where a [`FileStore`](warden_store::FileStore) keeps the session.
    /// `None` means the host supplies its own store.
    #[serde(default)]
    pub store_path: Option<PathBuf>,
}

impl WardenConfig {
    /// Reads overrides from the process environment on top of the defaults.
    pub fn from_env() -> Result<Self, WardenError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), but reads variables through
    /// `lookup`. Unset and blank variables keep their defaults.
    ///
    /// # Errors
    /// [`WardenError::Config`] for a timeout that isn't a whole number of
    /// seconds or an unknown login mode.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, WardenError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let mut config = Self::default();

        if let Some(url) = var(ENV_API_URL) {
            config.identity.base_url = url;
        }
        if let Some(path) = var(ENV_ME_PATH) {
            config.identity.me_path = path;
        }
        if let Some(path) = var(ENV_LOGIN_PATH) {
            config.identity.login_path = path;
        }
        if let Some(path) = var(ENV_REFRESH_PATH) {
            config.identity.refresh_path = Some(path);
        }
        if let Some(secs) = var(ENV_TIMEOUT_SECS) {
            let secs: u64 = secs.parse().map_err(|_| {
                WardenError::Config(format!("{ENV_TIMEOUT_SECS} must be whole seconds, got {secs:?}"))
            })?;
            config.identity.request_timeout = Duration::from_secs(secs);
        }
        if let Some(mode) = var(ENV_LOGIN_MODE) {
            config.session.login_mode = mode
                .parse::<LoginMode>()
                .map_err(|e| WardenError::Config(format!("{ENV_LOGIN_MODE}: {e}")))?;
        }
        if let Some(path) = var(ENV_STORE_PATH) {
            config.store_path = Some(PathBuf::from(path));
        }

        Ok(config)
    }
}
