use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Where the identity authority lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Base URL of the authority. Paths below are appended to it as-is,
    /// so a base with a path prefix (`https://host/api`) keeps that prefix.
    pub base_url: String,

    /// Current-user lookup path.
    pub me_path: String,

    /// Credential exchange path.
    pub login_path: String,

    /// Current-user path used when refreshing. `None` reuses `me_path`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_path: Option<String>,

    /// Whole-request timeout. Elapsing counts as `Unreachable`.
    pub request_timeout: Duration,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            me_path: "/users/me".to_string(),
            login_path: "/auth/login".to_string(),
            refresh_path: None,
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl IdentityConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// The path refresh looks the user up at.
    pub fn refresh_path(&self) -> &str {
        self.refresh_path.as_deref().unwrap_or(&self.me_path)
    }
}
