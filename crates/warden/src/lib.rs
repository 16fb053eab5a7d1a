//! # Warden
//!
//! Client-side authentication session manager.
//!
//! Warden owns the one signed-in session a client process has: it
//! validates a persisted token at startup, exchanges credentials on login,
//! tears the session down on logout, and re-validates on refresh. Consumers
//! hold a cheap [`SessionManager`] handle and subscribe to immutable
//! snapshots.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use warden::prelude::*;
//!
//! # async fn run() -> Result<(), WardenError> {
//! let manager = Warden::builder()
//!     .config(WardenConfig::from_env()?)
//!     .store_path("session.json")
//!     .build_with_file_store()?;
//!
//! let _subscription = manager.subscribe(|snapshot| {
//!     println!("session is now {}", snapshot.status);
//! });
//!
//! manager.startup().await;
//! if !manager.is_authenticated() {
//!     manager.login("ada@example.com", "correct horse").await?;
//! }
//! # Ok(())
//! # }
//! ```

mod builder;
mod config;
mod error;

pub use builder::{HttpSessionManager, Warden, WardenBuilder};
pub use config::{
    ENV_API_URL, ENV_LOGIN_MODE, ENV_LOGIN_PATH, ENV_ME_PATH, ENV_REFRESH_PATH, ENV_STORE_PATH,
    ENV_TIMEOUT_SECS, WardenConfig,
};
pub use error::WardenError;

pub use warden_identity as identity;
pub use warden_protocol as protocol;
pub use warden_session as session;
pub use warden_store as store;

pub use warden_session::{
    LoginMode, RefreshOutcome, SessionConfig, SessionError, SessionManager, SessionSnapshot,
    SessionStatus, Subscription,
};

pub mod prelude {
    pub use crate::{HttpSessionManager, Warden, WardenConfig, WardenError};
    pub use warden_identity::{
        HttpIdentityClient, IdentityClient, IdentityConfig, IdentityError, LoginExchange, Url,
    };
    pub use warden_protocol::{Credentials, LoginGrant, User, UserId};
    pub use warden_session::{
        LoginMode, RefreshOutcome, SessionConfig, SessionError, SessionManager, SessionSnapshot,
        SessionStatus, Subscription,
    };
    pub use warden_store::{FileStore, KeyValueStore, MemoryStore};
}
