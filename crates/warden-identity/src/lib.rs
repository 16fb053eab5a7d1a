//! Identity authority access for Warden.
//!
//! Warden doesn't issue or verify tokens itself. The identity authority
//! does, and this crate is everything the session manager knows about it:
//!
//! 1. **Validation** — a pure shape check that keeps obviously broken
//!    tokens off the network ([`TokenValidator`], [`is_well_formed`])
//! 2. **Lookup** — "who does this token belong to?" ([`IdentityClient`])
//! 3. **Login** — trading credentials for a token ([`LoginExchange`])
//!
//! [`HttpIdentityClient`] implements both traits over HTTP.
//! [`AcceptAllExchange`] is the demo login backend that accepts anything.
//!
//! # How it fits in the stack
//!
//! ```text
//! Session Layer (above)  ← decides what a failed lookup means
//!     ↕
//! Identity Layer (this crate)  ← one call per operation, no retries
//!     ↕
//! Protocol Layer (below)  ← provides User, Credentials, LoginGrant
//! ```

#![allow(async_fn_in_trait)]

mod client;
mod config;
mod demo;
mod error;
mod http;
mod validator;

pub use client::{IdentityClient, LoginExchange};
pub use config::IdentityConfig;
pub use demo::{AcceptAllExchange, DEMO_TOKEN_PREFIX};
pub use error::IdentityError;
pub use http::HttpIdentityClient;
pub use reqwest::Url;
pub use validator::{DEFAULT_DEMO_PREFIXES, TokenValidator, is_well_formed};
