//! Codec trait and implementations for storing records as text.
//!
//! Durable storage backends (browser local storage, a JSON file, an OS
//! keychain entry) all speak strings. A [`Codec`] converts records to
//! and from that representation, so the store never hard-codes a format.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// A codec that can encode records to text and decode text back.
///
/// `Send + Sync + 'static` because the codec lives inside the session
/// store, which is shared with spawned transition tasks.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into a string.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if the value can't be represented
    /// in this format.
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError>;

    /// Deserializes a string back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the text is malformed or doesn't
    /// match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &str) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// This is the format the identity authority already speaks, so a cached
/// user is stored exactly as it arrived.
///
/// ## Example
///
/// ```rust
/// use warden_protocol::{Codec, JsonCodec, UserId};
///
/// let codec = JsonCodec;
/// let text = codec.encode(&UserId(7)).unwrap();
/// assert_eq!(text, "7");
/// let back: UserId = codec.decode(&text).unwrap();
/// assert_eq!(back, UserId(7));
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError> {
        serde_json::to_string(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &str) -> Result<T, ProtocolError> {
        serde_json::from_str(data).map_err(ProtocolError::Decode)
    }
}
