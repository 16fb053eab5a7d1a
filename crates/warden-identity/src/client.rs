//! The two calls the session manager makes against the identity authority.
//!
//! Both are traits so the manager can run against a real HTTP authority in
//! production, an accept-all backend in demos, and scripted mocks in tests,
//! without changing any session code.

use warden_protocol::{Credentials, LoginGrant, User};

use crate::IdentityError;

/// Resolves a bearer token to the user it belongs to.
///
/// Implementations make exactly one attempt. Retry policy, if any, belongs
/// to the caller.
///
/// # Example
///
/// ```rust
/// use warden_identity::{IdentityClient, IdentityError};
/// use warden_protocol::User;
///
/// /// Knows no one.
/// struct Nobody;
///
/// impl IdentityClient for Nobody {
///     async fn fetch_current_user(&self, _token: &str) -> Result<User, IdentityError> {
///         Err(IdentityError::Unauthorized { status: 401 })
///     }
/// }
/// ```
pub trait IdentityClient: Send + Sync + 'static {
    /// Looks up the user for `token`.
    ///
    /// # Returns
    /// - `Ok(User)` — the authority accepted the token
    /// - `Err(IdentityError::Unauthorized)` — it answered with a non-success status
    /// - `Err(IdentityError::Unreachable)` — transport failure
    fn fetch_current_user(
        &self,
        token: &str,
    ) -> impl std::future::Future<Output = Result<User, IdentityError>> + Send;

    /// Looks up the user for `token` on behalf of a refresh. Same contract
    /// as [`fetch_current_user`](Self::fetch_current_user), which it
    /// defaults to; authorities that expose a separate refresh endpoint
    /// override it.
    fn refresh_current_user(
        &self,
        token: &str,
    ) -> impl std::future::Future<Output = Result<User, IdentityError>> + Send {
        self.fetch_current_user(token)
    }
}

/// Trades credentials for a token and the user it identifies.
pub trait LoginExchange: Send + Sync + 'static {
    /// # Returns
    /// - `Ok(LoginGrant)` — credentials accepted
    /// - `Err(IdentityError::Unauthorized)` — credentials rejected
    /// - `Err(IdentityError::Unreachable)` — the authority couldn't answer
    fn exchange(
        &self,
        credentials: &Credentials,
    ) -> impl std::future::Future<Output = Result<LoginGrant, IdentityError>> + Send;
}
