//! Core records: who the user is, what the login form hands over, and
//! what survives a reload.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timestamp;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// The identity authority's numeric identifier for a user.
///
/// Serialized as the bare number (`#[serde(transparent)]`), which is how
/// the authority sends it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A server-asserted identity record.
///
/// Users are snapshots: the session manager replaces the whole record on
/// every successful validation or refresh and never edits fields in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub username: String,
    pub full_name: String,

    /// Preferred display name, when the authority provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,

    /// `false` for disabled accounts.
    pub is_active: bool,

    /// Elevated-privilege flag.
    pub is_superuser: bool,

    /// Role names. Ordered so that two snapshots of the same user compare
    /// equal regardless of the order the authority listed them in.
    #[serde(default)]
    pub roles: BTreeSet<String>,

    #[serde(deserialize_with = "timestamp::deserialize")]
    pub created_at: DateTime<Utc>,

    #[serde(
        default,
        deserialize_with = "timestamp::option::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(
        default,
        deserialize_with = "timestamp::option::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    /// The name to show in UI: `name`, falling back to `full_name`.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.full_name)
    }

    /// Returns `true` if the user holds the given role.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// The identifier/secret pair a login form hands to the session manager.
///
/// Credentials are transient: they are never persisted and never become
/// part of a session. `Debug` redacts the secret so they can't leak
/// through logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub identifier: String,
    pub secret: String,
}

impl Credentials {
    pub fn new(identifier: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            secret: secret.into(),
        }
    }

    /// Both fields non-empty. Anything else is rejected before any
    /// network call.
    pub fn is_complete(&self) -> bool {
        !self.identifier.is_empty() && !self.secret.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("identifier", &self.identifier)
            .field("secret", &"<redacted>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Login grant / persisted record
// ---------------------------------------------------------------------------

/// What a successful login exchange returns.
///
/// Authorities differ on the token field name; `access_token` is accepted
/// as an alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginGrant {
    #[serde(alias = "access_token")]
    pub token: String,
    pub user: User,
}

/// The durable projection of a session: the bearer token plus the user
/// it was last validated as.
///
/// The cached user saves a network round-trip on reload and is always
/// written together with its token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedRecord {
    pub token: String,
    pub user: User,
}

impl From<LoginGrant> for PersistedRecord {
    fn from(grant: LoginGrant) -> Self {
        Self {
            token: grant.token,
            user: grant.user,
        }
    }
}
