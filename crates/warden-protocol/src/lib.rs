//! Identity data model for Warden.
//!
//! This crate defines the records that move between the identity
//! authority, the session manager, and durable storage:
//!
//! - **Types** ([`User`], [`Credentials`], [`PersistedRecord`],
//!   [`LoginGrant`]) — what a session is made of.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how a cached user is
//!   turned into a storable string and back.
//! - **Errors** ([`ProtocolError`]) — what can go wrong while encoding or
//!   decoding.
//!
//! # Architecture
//!
//! The protocol layer knows nothing about HTTP, storage media, or the
//! session state machine. It only knows the shape of the data.
//!
//! ```text
//! Identity (HTTP) → Protocol (User) → Store (PersistedRecord) → Session
//! ```

mod codec;
mod error;
mod timestamp;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{Credentials, LoginGrant, PersistedRecord, User, UserId};
