//! Session lifecycle management for Warden.
//!
//! This crate owns the one session a client process has:
//!
//! 1. **State machine** — `Unauthenticated`, `Validating`,
//!    `Authenticated`, `Refreshing` ([`SessionStatus`])
//! 2. **Lifecycle manager** — startup validation, login, logout and
//!    refresh, serialized in call order ([`SessionManager`])
//! 3. **Subscriptions** — consumers register a listener and get one
//!    immutable [`SessionSnapshot`] per settled transition
//!
//! # How it fits in the stack
//!
//! ```text
//! UI consumers (above)  ← hold a SessionManager handle, subscribe to snapshots
//!     ↕
//! Session Layer (this crate)  ← sole writer of the persisted record
//!     ↕
//! Identity + Store layers (below)  ← authority calls, durable storage
//! ```

mod config;
mod error;
mod launch;
mod manager;
mod session;
mod subscription;

pub use config::{LoginMode, SessionConfig};
pub use error::SessionError;
pub use launch::{LOGOUT_PARAM, take_logout_request};
pub use manager::{RefreshOutcome, SessionManager};
pub use session::{Session, SessionSnapshot, SessionStatus};
pub use subscription::Subscription;
