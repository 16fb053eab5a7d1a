//! Durable session storage for Warden.
//!
//! Provides the [`KeyValueStore`] trait, a deliberately small seam over
//! whatever medium survives a reload (browser local storage, a JSON file,
//! an OS keychain), and [`SessionStore`], which projects a session onto two
//! keys of such a store.
//!
//! # Feature Flags
//!
//! - `file` (default) — [`FileStore`], a single JSON file replaced
//!   atomically on every write

mod error;
#[cfg(feature = "file")]
mod file;
mod memory;
mod session;

pub use error::StoreError;
#[cfg(feature = "file")]
pub use file::FileStore;
pub use memory::MemoryStore;
pub use session::{SessionStore, TOKEN_KEY, USER_KEY};

/// One mutation inside a [`KeyValueStore::apply`] batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOp {
    Set { key: String, value: String },
    Remove { key: String },
}

impl BatchOp {
    pub fn set(key: &str, value: impl Into<String>) -> Self {
        Self::Set {
            key: key.to_string(),
            value: value.into(),
        }
    }

    pub fn remove(key: &str) -> Self {
        Self::Remove {
            key: key.to_string(),
        }
    }
}

/// A string key-value medium that survives process restarts.
///
/// Implementations must make [`apply`](Self::apply) all-or-none: a reader
/// either sees every operation of a batch or none of them. The session
/// store relies on this to never expose a token without its user.
///
/// Operations are synchronous. Every medium Warden targets answers
/// without suspending (local storage is synchronous in browsers, and the
/// file backend writes a few hundred bytes).
pub trait KeyValueStore: Send + Sync + 'static {
    /// Reads several keys as one consistent view.
    fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<String>>, StoreError>;

    /// Applies a batch of mutations atomically, in order.
    fn apply(&self, batch: Vec<BatchOp>) -> Result<(), StoreError>;

    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.get_many(&[key])?.pop().flatten())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.apply(vec![BatchOp::set(key, value)])
    }

    /// Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.apply(vec![BatchOp::remove(key)])
    }
}
