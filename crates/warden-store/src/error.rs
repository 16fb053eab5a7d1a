use warden_protocol::ProtocolError;

/// Errors that can occur in the storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading or writing the storage medium failed.
    #[error("storage i/o failed: {0}")]
    Io(#[from] std::io::Error),

    /// The medium holds data that can't be understood: an unparsable
    /// file, a token without its cached user, a user that won't decode.
    #[error("corrupt persisted record: {0}")]
    Corrupt(String),

    /// Encoding a record for storage failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
