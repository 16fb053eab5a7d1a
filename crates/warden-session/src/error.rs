//! Error types for the session layer.

use warden_identity::IdentityError;
use warden_store::StoreError;

/// Errors surfaced by session operations.
///
/// Only login reports errors to its caller. Startup resolves every failure
/// to `Unauthenticated` and refresh absorbs failures, so their errors show
/// up in logs and in [`RefreshOutcome`](crate::RefreshOutcome), never as a
/// failed call.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Login was called with an empty identifier or an empty secret.
    /// Rejected before anything else happens.
    #[error("identifier and secret must both be non-empty")]
    EmptyCredentials,

    /// The identity authority rejected the request or couldn't be reached.
    #[error(transparent)]
    Identity(#[from] IdentityError),

    /// The persisted record couldn't be written.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The runtime shut down before the transition task finished.
    #[error("session transition interrupted: {0}")]
    Interrupted(String),
}

impl SessionError {
    /// `true` when the authority explicitly refused the credentials.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Identity(e) if e.is_rejection())
    }

    /// `true` when the authority couldn't answer at all. Login forms should
    /// word this differently from a rejection.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Identity(IdentityError::Unreachable(_)))
    }
}
