//! `Warden` builder.
//!
//! Ties the layers together: config → HTTP identity client → store →
//! session manager.

use std::path::PathBuf;

use warden_identity::{HttpIdentityClient, IdentityConfig};
use warden_session::{LoginMode, SessionConfig, SessionManager};
use warden_store::{FileStore, KeyValueStore};

use crate::{WardenConfig, WardenError};

/// A session manager talking to the authority over HTTP.
pub type HttpSessionManager<S> = SessionManager<HttpIdentityClient, HttpIdentityClient, S>;

/// Entry point for building a session manager.
///
/// # Example
///
/// ```rust,no_run
/// use warden::prelude::*;
///
/// # fn main() -> Result<(), WardenError> {
/// let manager = Warden::builder()
///     .base_url("https://id.example.com/api")
///     .build(MemoryStore::new())?;
/// # let _ = manager;
/// # Ok(())
/// # }
/// ```
pub struct Warden;

impl Warden {
    /// Creates a builder with default settings.
    pub fn builder() -> WardenBuilder {
        WardenBuilder::new()
    }
}

/// Builder for configuring a [`HttpSessionManager`].
#[derive(Debug, Clone, Default)]
pub struct WardenBuilder {
    config: WardenConfig,
}

impl WardenBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole configuration, e.g. with one from
    /// [`WardenConfig::from_env`].
    pub fn config(mut self, config: WardenConfig) -> Self {
        self.config = config;
        self
    }

    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.config.session = config;
        self
    }

    pub fn identity_config(mut self, config: IdentityConfig) -> Self {
        self.config.identity = config;
        self
    }

    /// Sets the authority's base URL.
    pub fn base_url(mut self, url: &str) -> Self {
        self.config.identity.base_url = url.to_string();
        self
    }

    pub fn login_mode(mut self, mode: LoginMode) -> Self {
        self.config.session.login_mode = mode;
        self
    }

    /// Sets the file [`build_with_file_store`](Self::build_with_file_store)
    /// keeps the session in.
    pub fn store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.store_path = Some(path.into());
        self
    }

    /// Builds a manager over the given store.
    ///
    /// # Errors
    /// [`WardenError::Identity`] if the base URL doesn't parse.
    pub fn build<S: KeyValueStore>(self, store: S) -> Result<HttpSessionManager<S>, WardenError> {
        let client = HttpIdentityClient::new(&self.config.identity)?;
        tracing::debug!(
            me_url = %client.me_url(),
            login_mode = %self.config.session.login_mode,
            "session manager configured"
        );
        Ok(SessionManager::new(
            self.config.session,
            client.clone(),
            client,
            store,
        ))
    }

    /// Builds a manager over a [`FileStore`] at the configured path.
    ///
    /// # Errors
    /// - [`WardenError::Config`] if no store path was set
    /// - [`WardenError::Store`] if the file's directory can't be created
    /// - [`WardenError::Identity`] if the base URL doesn't parse
    pub fn build_with_file_store(self) -> Result<HttpSessionManager<FileStore>, WardenError> {
        let path = self
            .config
            .store_path
            .clone()
            .ok_or_else(|| WardenError::Config("no store path configured".to_string()))?;
        let store = FileStore::open(path)?;
        self.build(store)
    }
}
