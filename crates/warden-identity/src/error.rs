//! Error types for the identity layer.

/// Errors from validating a token or talking to the identity authority.
///
/// The session manager decides what each one means: the same
/// `Unreachable` ends a session at startup but is shrugged off during a
/// refresh.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    /// The token doesn't have a usable shape. Never reaches the network.
    #[error("malformed token")]
    MalformedToken,

    /// The authority answered and said no: an expired or revoked token,
    /// or rejected credentials.
    #[error("rejected by identity authority (HTTP {status})")]
    Unauthorized { status: u16 },

    /// The authority couldn't be reached, timed out, failed on its side,
    /// or answered with a body we couldn't read.
    #[error("identity authority unreachable: {0}")]
    Unreachable(String),

    /// The client was configured with something unusable (bad base URL).
    #[error("invalid identity configuration: {0}")]
    InvalidConfig(String),
}

impl IdentityError {
    /// `true` when the authority explicitly refused.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}
