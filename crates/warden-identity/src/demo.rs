//! Accept-all login backend for demos and tests.
//!
//! Issues a demo token for any non-empty credentials without contacting
//! anyone. Never use this where a real authority exists; the session
//! manager only routes logins here when configured to.

use std::collections::BTreeSet;

use chrono::Utc;
use rand::Rng;
use warden_protocol::{Credentials, LoginGrant, User, UserId};

use crate::{IdentityError, LoginExchange};

/// Prefix of tokens issued by [`AcceptAllExchange`].
pub const DEMO_TOKEN_PREFIX: &str = "demo-token-";

/// A [`LoginExchange`] that accepts any non-empty credentials.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAllExchange;

impl AcceptAllExchange {
    /// Builds the grant synchronously: a fresh demo token and a synthesized
    /// user whose email is the identifier.
    pub fn grant(&self, credentials: &Credentials) -> LoginGrant {
        let now = Utc::now();
        let username = credentials
            .identifier
            .split('@')
            .next()
            .filter(|local| !local.is_empty())
            .unwrap_or("demo")
            .to_string();

        LoginGrant {
            token: format!("{DEMO_TOKEN_PREFIX}{}", generate_token()),
            user: User {
                id: UserId(1),
                email: credentials.identifier.clone(),
                username,
                full_name: "Demo User".to_string(),
                name: Some("Demo User".to_string()),
                avatar: None,
                is_active: true,
                is_superuser: false,
                roles: BTreeSet::from(["admin".to_string()]),
                created_at: now,
                updated_at: Some(now),
                last_login: Some(now),
            },
        }
    }
}

impl LoginExchange for AcceptAllExchange {
    async fn exchange(&self, credentials: &Credentials) -> Result<LoginGrant, IdentityError> {
        if !credentials.is_complete() {
            return Err(IdentityError::Unauthorized { status: 400 });
        }
        Ok(self.grant(credentials))
    }
}

/// Generates a random 32-character hex string (128 bits of entropy).
fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
