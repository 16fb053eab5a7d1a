//! The session manager: owns the session and drives every transition.
//!
//! Responsibilities:
//! - Validating a persisted token at startup (and discarding it if the
//!   authority won't vouch for it)
//! - Issuing a new session on login
//! - Tearing the session down on logout
//! - Re-validating on refresh without ever evicting a trusted session
//! - Notifying subscribers after each settled transition
//!
//! # Ordering
//!
//! Every operation takes a FIFO transition lock (`tokio::sync::Mutex`) and
//! holds it until it has settled and notified. Two overlapping operations
//! therefore run one after the other in call order, and the persisted
//! record is never written from stale data.
//!
//! # No cancellation
//!
//! Each operation runs in its own spawned task. A caller that drops the
//! returned future stops waiting, but the transition still completes and
//! storage is still written.
//!
//! If a collaborator panics mid-transition, the session is settled as if
//! the operation had failed and the panic resurfaces in the caller.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use warden_identity::{AcceptAllExchange, IdentityClient, LoginExchange, TokenValidator, Url};
use warden_protocol::{Credentials, PersistedRecord, User};
use warden_store::{KeyValueStore, SessionStore, StoreError};

use crate::launch::take_logout_request;
use crate::subscription::{Listener, Subscribers};
use crate::{
    LoginMode, Session, SessionConfig, SessionError, SessionSnapshot, SessionStatus,
    Subscription,
};

/// What a refresh ended up doing.
#[derive(Debug)]
pub enum RefreshOutcome {
    /// The authority confirmed the token; the user was replaced.
    Refreshed,

    /// The refresh failed and the existing session was kept as-is.
    Retained(SessionError),

    /// There was no token to refresh.
    NoSession,
}

impl RefreshOutcome {
    pub fn is_refreshed(&self) -> bool {
        matches!(self, Self::Refreshed)
    }
}

/// Handle to the session manager.
///
/// Cheap to clone: clones share one session, one store, and one set of
/// subscribers. Hand a clone to each consumer instead of relying on any
/// ambient context.
///
/// ## Lifecycle
///
/// ```text
/// startup()   Unauthenticated → Validating → Authenticated | Unauthenticated
/// login()     Unauthenticated | Authenticated → Authenticated
/// refresh()   Authenticated → Refreshing → Authenticated
/// logout()    Authenticated → Unauthenticated
/// ```
pub struct SessionManager<I, L, S> {
    inner: Arc<Inner<I, L, S>>,
}

impl<I, L, S> Clone for SessionManager<I, L, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<I, L, S> {
    config: SessionConfig,
    validator: TokenValidator,
    identity: I,
    exchange: L,
    demo: AcceptAllExchange,
    store: SessionStore<S>,
    session: Mutex<Session>,
    transitions: tokio::sync::Mutex<()>,
    subscribers: Arc<Subscribers>,
}

impl<I, L, S> SessionManager<I, L, S>
where
    I: IdentityClient,
    L: LoginExchange,
    S: KeyValueStore,
{
    /// Creates a manager in the `Unauthenticated` state. Nothing is read
    /// from storage until [`startup`](Self::startup).
    pub fn new(config: SessionConfig, identity: I, exchange: L, store: S) -> Self {
        if config.login_mode == LoginMode::AcceptAll {
            tracing::warn!(
                "login mode is accept-all: any non-empty credentials will be accepted"
            );
        }

        Self {
            inner: Arc::new(Inner {
                validator: config.validator(),
                config,
                identity,
                exchange,
                demo: AcceptAllExchange,
                store: SessionStore::new(store),
                session: Mutex::new(Session::new()),
                transitions: tokio::sync::Mutex::new(()),
                subscribers: Arc::new(Subscribers::default()),
            }),
        }
    }

    // -- Reading ----------------------------------------------------------

    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.lock_session().snapshot()
    }

    pub fn status(&self) -> SessionStatus {
        self.inner.lock_session().status()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.lock_session().is_authenticated()
    }

    /// `true` only while startup validation is in flight.
    pub fn is_loading(&self) -> bool {
        self.status() == SessionStatus::Validating
    }

    pub fn user(&self) -> Option<User> {
        self.inner.lock_session().user().cloned()
    }

    pub fn token(&self) -> Option<String> {
        self.inner.lock_session().token().map(str::to_string)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    // -- Subscriptions ----------------------------------------------------

    /// Registers a listener that receives a snapshot after every settled
    /// transition.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&SessionSnapshot) + Send + Sync + 'static,
    {
        let listener: Listener = Arc::new(listener);
        self.inner.subscribers.add(listener)
    }

    // -- Operations -------------------------------------------------------

    /// Reconciles the persisted record with the authority.
    ///
    /// Always settles: `Authenticated` if the persisted token is
    /// well-formed and the authority accepts it, `Unauthenticated`
    /// otherwise. Any failure clears storage. Never returns an error.
    ///
    /// When the authority returns a user that differs from the cached one,
    /// the session adopts the returned user even if re-saving it fails. The
    /// store then keeps the older user until the next successful login or
    /// refresh writes the record again.
    pub async fn startup(&self) -> SessionSnapshot {
        self.run_startup(false).await
    }

    /// [`startup`](Self::startup) for a host that knows its launch URL.
    ///
    /// If `location` carries `logout=true`, the parameter is scrubbed from
    /// it, storage is cleared, and the session settles `Unauthenticated`
    /// without reading storage or contacting the authority.
    pub async fn startup_at(&self, location: &mut Url) -> SessionSnapshot {
        let logout_requested = take_logout_request(location);
        self.run_startup(logout_requested).await
    }

    /// Signs in with an identifier and secret.
    ///
    /// Empty input is rejected immediately with
    /// [`SessionError::EmptyCredentials`], without waiting for other
    /// operations. On any failure the previous session, if any, is kept.
    ///
    /// # Errors
    /// - [`SessionError::EmptyCredentials`] — blank identifier or secret
    /// - [`SessionError::Identity`] — rejected (`is_rejection`) or
    ///   unreachable (`is_unreachable`) authority
    /// - [`SessionError::Store`] — the new record couldn't be persisted
    pub async fn login(
        &self,
        identifier: &str,
        secret: &str,
    ) -> Result<SessionSnapshot, SessionError> {
        let credentials = Credentials::new(identifier, secret);
        if !credentials.is_complete() {
            tracing::debug!("login rejected: empty identifier or secret");
            return Err(SessionError::EmptyCredentials);
        }

        let inner = Arc::clone(&self.inner);
        detached(async move { inner.login(credentials).await }).await?
    }

    /// Signs out. Storage is cleared even if no one was signed in.
    pub async fn logout(&self) {
        let inner = Arc::clone(&self.inner);
        if let Err(e) = detached(async move { inner.logout().await }).await {
            tracing::warn!(error = %e, "logout did not complete");
        }
    }

    /// Re-validates the current token and replaces the user on success.
    ///
    /// Never signs anyone out: on failure the current user and token are
    /// kept, because a flaky network mustn't evict a session that was
    /// already trusted.
    pub async fn refresh(&self) -> RefreshOutcome {
        let inner = Arc::clone(&self.inner);
        detached(async move { inner.refresh().await })
            .await
            .unwrap_or_else(RefreshOutcome::Retained)
    }

    async fn run_startup(&self, logout_requested: bool) -> SessionSnapshot {
        let inner = Arc::clone(&self.inner);
        match detached(async move { inner.startup(logout_requested).await }).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(error = %e, "startup did not complete");
                self.snapshot()
            }
        }
    }
}

impl<I, L, S> Inner<I, L, S>
where
    I: IdentityClient,
    L: LoginExchange,
    S: KeyValueStore,
{
    async fn startup(&self, logout_requested: bool) -> SessionSnapshot {
        let _turn = self.transitions.lock().await;
        let _settle = SettleOnDrop { inner: self };

        if logout_requested {
            tracing::info!("logout requested at launch");
            self.clear_store();
            return self.settle(Session::reset);
        }

        self.commit(Session::begin_validation);
        match self.validate_persisted().await {
            Some(record) => {
                tracing::info!(user_id = %record.user.id, "persisted session validated");
                self.settle(|s| s.establish(record.token, record.user, Utc::now()))
            }
            None => self.settle(Session::reset),
        }
    }

    /// Startup's half of the failure policy: anything short of a confirmed
    /// token discards the record.
    async fn validate_persisted(&self) -> Option<PersistedRecord> {
        let record = match self.store.try_load() {
            Ok(Some(record)) => record,
            Ok(None) => {
                tracing::debug!("no persisted session");
                return None;
            }
            Err(StoreError::Corrupt(reason)) => {
                tracing::warn!(%reason, "discarding corrupt persisted session");
                self.clear_store();
                return None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "persisted session unreadable");
                return None;
            }
        };

        if !self.validator.is_well_formed(&record.token) {
            tracing::info!("discarding malformed persisted token");
            self.clear_store();
            return None;
        }

        if self.is_offline_demo(&record.token) {
            tracing::debug!("adopting cached demo session without lookup");
            return Some(record);
        }

        match self.identity.fetch_current_user(&record.token).await {
            Ok(user) => {
                if user != record.user {
                    let fresh = PersistedRecord {
                        token: record.token,
                        user,
                    };
                    if let Err(e) = self.store.save(&fresh) {
                        tracing::warn!(error = %e, "could not update cached user");
                    }
                    return Some(fresh);
                }
                Some(record)
            }
            Err(e) => {
                tracing::info!(error = %e, "persisted session not accepted, clearing");
                self.clear_store();
                None
            }
        }
    }

    async fn login(&self, credentials: Credentials) -> Result<SessionSnapshot, SessionError> {
        let _turn = self.transitions.lock().await;

        let exchanged = match self.config.login_mode {
            LoginMode::Authority => self.exchange.exchange(&credentials).await,
            LoginMode::AcceptAll => self.demo.exchange(&credentials).await,
        };
        let grant = exchanged.inspect_err(|e| {
            tracing::info!(error = %e, "login failed");
        })?;
        self.validator.validate(&grant.token).inspect_err(|_| {
            tracing::warn!("login returned a malformed token");
        })?;

        let record = PersistedRecord::from(grant);
        self.store.save(&record)?;

        tracing::info!(user_id = %record.user.id, "login succeeded");
        Ok(self.settle(|s| s.establish(record.token, record.user, Utc::now())))
    }

    async fn logout(&self) {
        let _turn = self.transitions.lock().await;

        self.clear_store();

        let signed_in = {
            let session = self.lock_session();
            session.status() != SessionStatus::Unauthenticated || session.token().is_some()
        };
        if !signed_in {
            tracing::debug!("logout while signed out; storage cleared");
            return;
        }

        tracing::info!("logged out");
        self.settle(Session::reset);
    }

    async fn refresh(&self) -> RefreshOutcome {
        let _turn = self.transitions.lock().await;
        let _settle = SettleOnDrop { inner: self };

        let current = {
            let session = self.lock_session();
            match (session.status(), session.token(), session.user()) {
                (SessionStatus::Authenticated, Some(token), Some(user)) => {
                    Some((token.to_string(), user.clone()))
                }
                _ => None,
            }
        };
        let Some((token, previous)) = current else {
            tracing::debug!("refresh skipped: no session");
            return RefreshOutcome::NoSession;
        };

        self.commit(Session::begin_refresh);

        let looked_up = if self.is_offline_demo(&token) {
            Ok(previous)
        } else {
            self.identity.refresh_current_user(&token).await
        };

        let refreshed = looked_up.map_err(SessionError::from).and_then(|user| {
            self.store.save(&PersistedRecord {
                token: token.clone(),
                user: user.clone(),
            })?;
            Ok(user)
        });

        // Refresh's half of the failure policy: keep what we had.
        match refreshed {
            Ok(user) => {
                tracing::debug!(user_id = %user.id, "session refreshed");
                self.settle(|s| s.finish_refresh(Some(user)));
                RefreshOutcome::Refreshed
            }
            Err(e) => {
                tracing::warn!(error = %e, "refresh failed, keeping current session");
                self.commit(|s| s.finish_refresh(None));
                RefreshOutcome::Retained(e)
            }
        }
    }

    /// Brings a transition that stopped midway to rest. A no-op once the
    /// session is settled.
    ///
    /// An abandoned startup counts as a failed one (storage cleared,
    /// subscribers told). An abandoned refresh counts as a failed one too,
    /// so the session it started from is kept as-is.
    fn settle_abandoned(&self) {
        let status = self.lock_session().status();
        match status {
            SessionStatus::Validating => {
                tracing::error!("startup abandoned during validation, clearing session");
                self.clear_store();
                self.settle(Session::reset);
            }
            SessionStatus::Refreshing => {
                tracing::error!("refresh abandoned, keeping current session");
                self.commit(|s| s.finish_refresh(None));
            }
            SessionStatus::Unauthenticated | SessionStatus::Authenticated => {}
        }
    }

    /// Demo tokens in accept-all mode have no authority to ask; the cached
    /// user is all there is.
    fn is_offline_demo(&self, token: &str) -> bool {
        self.config.login_mode == LoginMode::AcceptAll && self.validator.is_demo_token(token)
    }

    /// Applies a transition without telling anyone (intermediate states).
    fn commit(&self, apply: impl FnOnce(&mut Session)) -> SessionSnapshot {
        let mut session = self.lock_session();
        apply(&mut session);
        debug_assert!(session.is_consistent(), "session invariant broken: {session:?}");
        session.snapshot()
    }

    /// Applies a settling transition, releases the session, then notifies.
    fn settle(&self, apply: impl FnOnce(&mut Session)) -> SessionSnapshot {
        let snapshot = self.commit(apply);
        self.subscribers.notify(&snapshot);
        snapshot
    }

    fn clear_store(&self) {
        if let Err(e) = self.store.clear() {
            tracing::error!(error = %e, "failed to clear persisted session");
        }
    }

    // Mutations are plain field writes that can't panic halfway.
    fn lock_session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Settles the session when an operation's future is dropped before it
/// finished, which happens when a collaborator panics or the runtime shuts
/// down. Must be created after the transition lock so it runs while the
/// lock is still held.
struct SettleOnDrop<'a, I, L, S>
where
    I: IdentityClient,
    L: LoginExchange,
    S: KeyValueStore,
{
    inner: &'a Inner<I, L, S>,
}

impl<I, L, S> Drop for SettleOnDrop<'_, I, L, S>
where
    I: IdentityClient,
    L: LoginExchange,
    S: KeyValueStore,
{
    fn drop(&mut self) {
        self.inner.settle_abandoned();
    }
}

/// Runs `fut` to completion on its own task, even if the caller stops
/// waiting.
async fn detached<F>(fut: F) -> Result<F::Output, SessionError>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    match tokio::spawn(fut).await {
        Ok(output) => Ok(output),
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Err(e) => Err(SessionError::Interrupted(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_identity::IdentityError;
    use warden_protocol::LoginGrant;
    use warden_store::MemoryStore;

    /// Authority that refuses everything.
    struct Closed;

    impl IdentityClient for Closed {
        async fn fetch_current_user(&self, _token: &str) -> Result<User, IdentityError> {
            Err(IdentityError::Unauthorized { status: 401 })
        }
    }

    impl LoginExchange for Closed {
        async fn exchange(&self, _credentials: &Credentials) -> Result<LoginGrant, IdentityError> {
            Err(IdentityError::Unauthorized { status: 401 })
        }
    }

    fn manager(config: SessionConfig) -> SessionManager<Closed, Closed, MemoryStore> {
        SessionManager::new(config, Closed, Closed, MemoryStore::new())
    }

    #[tokio::test]
    async fn test_new_manager_is_unauthenticated_and_not_loading() {
        let mgr = manager(SessionConfig::default());

        assert_eq!(mgr.status(), SessionStatus::Unauthenticated);
        assert!(!mgr.is_loading());
        assert!(!mgr.is_authenticated());
        assert!(mgr.user().is_none());
        assert!(mgr.token().is_none());
    }

    #[tokio::test]
    async fn test_default_mode_never_accepts_arbitrary_credentials() {
        let mgr = manager(SessionConfig::default());

        let result = mgr.login("anyone", "anything").await;

        assert!(result.is_err_and(|e| e.is_rejection()));
        assert!(!mgr.is_authenticated());
    }

    #[tokio::test]
    async fn test_accept_all_mode_bypasses_exchange() {
        let mgr = manager(SessionConfig::accept_all());

        let snapshot = mgr.login("ada@example.com", "anything").await.unwrap();

        assert!(snapshot.is_authenticated);
        assert_eq!(mgr.user().unwrap().email, "ada@example.com");
    }

    #[tokio::test]
    async fn test_clones_share_one_session() {
        let mgr = manager(SessionConfig::accept_all());
        let consumer = mgr.clone();

        mgr.login("ada@example.com", "x").await.unwrap();

        assert!(consumer.is_authenticated());
        assert_eq!(consumer.token(), mgr.token());
    }

    #[tokio::test]
    async fn test_refresh_outcome_is_refreshed() {
        assert!(RefreshOutcome::Refreshed.is_refreshed());
        assert!(!RefreshOutcome::NoSession.is_refreshed());
    }
}
