//! The persisted projection of a session.
//!
//! A session is stored under two keys of a [`KeyValueStore`]: the bearer
//! token and the JSON-encoded user it was last validated as. Both keys are
//! read as one view, written in one batch, and removed in one batch.

use warden_protocol::{Codec, JsonCodec, PersistedRecord, User};

use crate::{BatchOp, KeyValueStore, StoreError};

/// Storage key holding the bearer token.
pub const TOKEN_KEY: &str = "auth_token";

/// Storage key holding the cached, encoded user.
pub const USER_KEY: &str = "user_data";

/// Loads, saves and clears the [`PersistedRecord`].
///
/// The session manager is the only writer. It owns one `SessionStore`
/// and nothing else in the process should touch the two keys.
#[derive(Debug)]
pub struct SessionStore<S, C = JsonCodec> {
    backend: S,
    codec: C,
}

impl<S: KeyValueStore> SessionStore<S, JsonCodec> {
    pub fn new(backend: S) -> Self {
        Self::with_codec(backend, JsonCodec)
    }
}

impl<S: KeyValueStore, C: Codec> SessionStore<S, C> {
    pub fn with_codec(backend: S, codec: C) -> Self {
        Self { backend, codec }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// Reads the record, distinguishing "nothing stored" from "stored but
    /// unusable".
    ///
    /// # Errors
    /// - [`StoreError::Corrupt`] — only one of the two keys is present, or
    ///   the user doesn't decode
    /// - [`StoreError::Io`] — the medium couldn't be read
    pub fn try_load(&self) -> Result<Option<PersistedRecord>, StoreError> {
        let mut values = self.backend.get_many(&[TOKEN_KEY, USER_KEY])?.into_iter();
        let token = values.next().flatten();
        let user = values.next().flatten();

        match (token, user) {
            (None, None) => Ok(None),
            (Some(token), Some(user)) => {
                let user: User = self
                    .codec
                    .decode(&user)
                    .map_err(|e| StoreError::Corrupt(format!("cached user: {e}")))?;
                Ok(Some(PersistedRecord { token, user }))
            }
            (Some(_), None) => Err(StoreError::Corrupt("token without cached user".into())),
            (None, Some(_)) => Err(StoreError::Corrupt("cached user without token".into())),
        }
    }

    /// Reads the record, treating every failure as "absent".
    ///
    /// A corrupt record must never stop startup; it's logged and ignored.
    pub fn load(&self) -> Option<PersistedRecord> {
        match self.try_load() {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unreadable persisted session");
                None
            }
        }
    }

    /// Overwrites the record. Token and user land in the same batch.
    pub fn save(&self, record: &PersistedRecord) -> Result<(), StoreError> {
        let user = self.codec.encode(&record.user)?;
        self.backend.apply(vec![
            BatchOp::set(TOKEN_KEY, record.token.as_str()),
            BatchOp::set(USER_KEY, user),
        ])
    }

    /// Removes the record. Clearing an empty store is fine.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.backend
            .apply(vec![BatchOp::remove(TOKEN_KEY), BatchOp::remove(USER_KEY)])
    }
}
