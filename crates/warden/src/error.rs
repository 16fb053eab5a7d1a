//! Unified error type for Warden.

use warden_identity::IdentityError;
use warden_protocol::ProtocolError;
use warden_session::SessionError;
use warden_store::StoreError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `warden` facade you deal with this single error type
/// instead of importing errors from each sub-crate. The `#[from]`
/// attribute on each variant generates the `From` impls, so `?` converts
/// sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum WardenError {
    /// Encoding or decoding the persisted user failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The durable store failed or held garbage.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Token shape, authority rejection, or an unreachable authority.
    #[error(transparent)]
    Identity(#[from] IdentityError),

    /// A session operation failed (login only).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A configuration value couldn't be used.
    #[error("configuration error: {0}")]
    Config(String),
}
