//! Session types: the one session a client process holds, and the
//! snapshots consumers see of it.
//!
//! A session tracks:
//! - WHO is signed in (`user`)
//! - WHAT proves it to the authority (`token`)
//! - WHERE it is in its lifecycle (`status`)
//! - WHEN the current token was adopted (`issued_at`)

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use warden_protocol::User;

// ---------------------------------------------------------------------------
// SessionStatus
// ---------------------------------------------------------------------------

/// The lifecycle state of the session.
///
/// ```text
///                  ┌──────── login ────────┐
///                  │                       ▼
///   Unauthenticated ──startup──→ Validating ──ok──→ Authenticated ⇄ Refreshing
///          ▲                        │                    │
///          └───────── rejected ─────┘◄──── logout ───────┘
/// ```
///
/// - **Unauthenticated**: no trusted token. Initial and terminal.
/// - **Validating**: startup is checking a persisted token with the
///   authority. Nothing is trusted yet, so no user or token is visible.
/// - **Authenticated**: token and user present and trusted.
/// - **Refreshing**: re-validating an authenticated session. The previous
///   user and token stay visible while the request is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionStatus {
    #[default]
    Unauthenticated,
    Validating,
    Authenticated,
    Refreshing,
}

impl SessionStatus {
    /// Returns `true` for the states an operation settles into.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Unauthenticated | Self::Authenticated)
    }

    /// Returns `true` when a trusted token and user are present.
    pub fn is_established(&self) -> bool {
        matches!(self, Self::Authenticated | Self::Refreshing)
    }

    /// Returns `true` if moving to `target` is a legal transition.
    pub fn can_transition_to(self, target: Self) -> bool {
        use SessionStatus::*;
        match (self, target) {
            // Logout is legal from every settled state.
            (Unauthenticated | Authenticated, Unauthenticated) => true,
            (Unauthenticated | Authenticated, Validating) => true,
            (Unauthenticated | Authenticated, Authenticated) => true,
            (Validating, Authenticated | Unauthenticated) => true,
            (Authenticated, Refreshing) => true,
            (Refreshing, Authenticated) => true,
            _ => false,
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthenticated => write!(f, "Unauthenticated"),
            Self::Validating => write!(f, "Validating"),
            Self::Authenticated => write!(f, "Authenticated"),
            Self::Refreshing => write!(f, "Refreshing"),
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// The session itself. Owned by the manager; consumers only ever get a
/// [`SessionSnapshot`].
///
/// Invariant: `status.is_established()` if and only if both `token` and
/// `user` are present. Every mutator below preserves it.
#[derive(Debug, Clone, Default)]
pub struct Session {
    token: Option<String>,
    user: Option<User>,
    status: SessionStatus,
    issued_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        self.issued_at
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some() && self.token.is_some()
    }

    /// Checks the status/data invariant.
    pub fn is_consistent(&self) -> bool {
        self.status.is_established() == self.is_authenticated()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            user: self.user.clone(),
            token: self.token.clone(),
            status: self.status,
            issued_at: self.issued_at,
            is_authenticated: self.is_authenticated(),
            is_loading: self.status == SessionStatus::Validating,
        }
    }

    // -- Transitions (manager only) ---------------------------------------

    /// Startup begins. Whatever was visible is withdrawn until validated.
    pub(crate) fn begin_validation(&mut self) {
        self.move_to(SessionStatus::Validating);
        self.token = None;
        self.user = None;
        self.issued_at = None;
    }

    /// Adopts a trusted token and user wholesale.
    pub(crate) fn establish(&mut self, token: String, user: User, issued_at: DateTime<Utc>) {
        self.move_to(SessionStatus::Authenticated);
        self.token = Some(token);
        self.user = Some(user);
        self.issued_at = Some(issued_at);
    }

    pub(crate) fn begin_refresh(&mut self) {
        self.move_to(SessionStatus::Refreshing);
    }

    /// Ends a refresh. `Some(user)` replaces the user wholesale; `None`
    /// keeps what was there.
    pub(crate) fn finish_refresh(&mut self, user: Option<User>) {
        self.move_to(SessionStatus::Authenticated);
        if let Some(user) = user {
            self.user = Some(user);
        }
    }

    /// Drops token and user.
    pub(crate) fn reset(&mut self) {
        self.move_to(SessionStatus::Unauthenticated);
        self.token = None;
        self.user = None;
        self.issued_at = None;
    }

    fn move_to(&mut self, next: SessionStatus) {
        debug_assert!(
            self.status.can_transition_to(next),
            "illegal session transition {} -> {}",
            self.status,
            next
        );
        tracing::trace!(from = %self.status, to = %next, "session transition");
        self.status = next;
    }
}

// ---------------------------------------------------------------------------
// SessionSnapshot
// ---------------------------------------------------------------------------

/// An immutable copy of the session, as handed to consumers.
///
/// `is_loading` is true only while startup validation is in flight. It is
/// not raised during a refresh, so a consumer that wants a refresh
/// indicator has to look at `status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub user: Option<User>,
    pub token: Option<String>,
    pub status: SessionStatus,
    pub issued_at: Option<DateTime<Utc>>,
    pub is_authenticated: bool,
    pub is_loading: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use warden_protocol::UserId;

    fn user(id: u64) -> User {
        User {
            id: UserId(id),
            email: format!("u{id}@example.com"),
            username: format!("u{id}"),
            full_name: format!("User {id}"),
            name: None,
            avatar: None,
            is_active: true,
            is_superuser: false,
            roles: BTreeSet::new(),
            created_at: Utc::now(),
            updated_at: None,
            last_login: None,
        }
    }

    #[test]
    fn test_new_session_is_unauthenticated_and_consistent() {
        let session = Session::new();
        assert_eq!(session.status(), SessionStatus::Unauthenticated);
        assert!(!session.is_authenticated());
        assert!(session.is_consistent());
    }

    #[test]
    fn test_establish_sets_token_and_user() {
        let mut session = Session::new();

        session.establish("a.b.c".into(), user(1), Utc::now());

        assert_eq!(session.status(), SessionStatus::Authenticated);
        assert_eq!(session.token(), Some("a.b.c"));
        assert_eq!(session.user().map(|u| u.id), Some(UserId(1)));
        assert!(session.is_consistent());
    }

    #[test]
    fn test_begin_validation_hides_previous_data() {
        let mut session = Session::new();
        session.establish("a.b.c".into(), user(1), Utc::now());

        session.begin_validation();

        assert_eq!(session.status(), SessionStatus::Validating);
        assert!(session.token().is_none());
        assert!(session.snapshot().is_loading);
        assert!(session.is_consistent());
    }

    #[test]
    fn test_refresh_keeps_data_visible() {
        let mut session = Session::new();
        session.establish("a.b.c".into(), user(1), Utc::now());

        session.begin_refresh();
        let during = session.snapshot();

        assert_eq!(during.status, SessionStatus::Refreshing);
        assert!(during.is_authenticated);
        assert!(!during.is_loading, "refresh never raises is_loading");
        assert!(session.is_consistent());
    }

    #[test]
    fn test_finish_refresh_with_user_replaces_wholesale() {
        let mut session = Session::new();
        session.establish("a.b.c".into(), user(1), Utc::now());
        session.begin_refresh();

        let mut updated = user(1);
        updated.full_name = "Renamed".into();
        session.finish_refresh(Some(updated.clone()));

        assert_eq!(session.status(), SessionStatus::Authenticated);
        assert_eq!(session.user(), Some(&updated));
    }

    #[test]
    fn test_finish_refresh_without_user_keeps_previous() {
        let original = user(1);
        let mut session = Session::new();
        session.establish("a.b.c".into(), original.clone(), Utc::now());
        session.begin_refresh();

        session.finish_refresh(None);

        assert_eq!(session.user(), Some(&original));
        assert_eq!(session.token(), Some("a.b.c"));
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut session = Session::new();
        session.establish("a.b.c".into(), user(1), Utc::now());

        session.reset();

        assert_eq!(session.status(), SessionStatus::Unauthenticated);
        assert!(session.token().is_none());
        assert!(session.user().is_none());
        assert!(session.issued_at().is_none());
    }

    #[test]
    fn test_status_can_transition_to() {
        use SessionStatus::*;
        assert!(Unauthenticated.can_transition_to(Validating));
        assert!(Validating.can_transition_to(Authenticated));
        assert!(Validating.can_transition_to(Unauthenticated));
        assert!(Authenticated.can_transition_to(Refreshing));
        assert!(Refreshing.can_transition_to(Authenticated));
        assert!(!Unauthenticated.can_transition_to(Refreshing));
        assert!(!Refreshing.can_transition_to(Unauthenticated));
        assert!(!Validating.can_transition_to(Refreshing));
        assert!(!Refreshing.can_transition_to(Validating));
    }

    #[test]
    fn test_status_is_settled() {
        assert!(SessionStatus::Unauthenticated.is_settled());
        assert!(SessionStatus::Authenticated.is_settled());
        assert!(!SessionStatus::Validating.is_settled());
        assert!(!SessionStatus::Refreshing.is_settled());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(SessionStatus::Refreshing.to_string(), "Refreshing");
    }
}
