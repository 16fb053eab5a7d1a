//! Session configuration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use warden_identity::{DEFAULT_DEMO_PREFIXES, TokenValidator};

// ---------------------------------------------------------------------------
// LoginMode
// ---------------------------------------------------------------------------

/// Where login sends credentials.
///
/// `Authority` is the only production mode and the default. `AcceptAll`
/// exists for demos and UI development: it accepts any non-empty
/// credentials without contacting anyone, and has to be asked for
/// explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoginMode {
    /// Exchange credentials with the identity authority.
    #[default]
    Authority,

    /// Accept any non-empty credentials and issue a demo token.
    AcceptAll,
}

impl fmt::Display for LoginMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authority => write!(f, "authority"),
            Self::AcceptAll => write!(f, "accept-all"),
        }
    }
}

impl FromStr for LoginMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "authority" => Ok(Self::Authority),
            "accept-all" | "accept_all" => Ok(Self::AcceptAll),
            other => Err(format!(
                "unknown login mode {other:?} (expected \"authority\" or \"accept-all\")"
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration for the session manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Where login sends credentials. Default: [`LoginMode::Authority`].
    pub login_mode: LoginMode,

    /// Token prefixes the validator treats as demo tokens.
    pub demo_token_prefixes: Vec<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            login_mode: LoginMode::default(),
            demo_token_prefixes: DEFAULT_DEMO_PREFIXES.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl SessionConfig {
    /// A config for demos: accept-all login, default prefixes.
    pub fn accept_all() -> Self {
        Self {
            login_mode: LoginMode::AcceptAll,
            ..Self::default()
        }
    }

    pub fn validator(&self) -> TokenValidator {
        TokenValidator::new(self.demo_token_prefixes.iter().cloned())
    }
}
