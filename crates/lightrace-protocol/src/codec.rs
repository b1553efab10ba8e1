//! Codec trait and implementations for serializing/deserializing messages.
//!
//! The server never touches serde directly; it holds a [`Codec`] and asks
//! it to turn snapshots into text and raw frames into [`ActionMessage`]s.
//!
//! [`ActionMessage`]: crate::ActionMessage

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Converts wire messages to and from bytes.
///
/// `Send + Sync + 'static` because one codec instance is shared by every
/// connection task.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Serializes a value into a UTF-8 string, for text frames.
    ///
    /// The default goes through [`encode`](Self::encode) and fails with
    /// [`ProtocolError::InvalidMessage`] if the bytes are not UTF-8.
    fn encode_text<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<String, ProtocolError> {
        let bytes = self.encode(value)?;
        String::from_utf8(bytes).map_err(|e| {
            ProtocolError::InvalidMessage(format!("encoded text is not UTF-8: {e}"))
        })
    }

    /// Deserializes bytes back into a value.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// Existing clients speak JSON text frames, so this is the codec the
/// server uses. Behind the `json` feature (on by default).
///
/// ```rust
/// use lightrace_protocol::{Action, ActionMessage, Codec, JsonCodec};
///
/// let codec = JsonCodec;
/// let msg: ActionMessage = codec.decode(br#"{"action":"turn_left"}"#).unwrap();
/// assert_eq!(msg.action, Action::TurnLeft);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn encode_text<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<String, ProtocolError> {
        serde_json::to_string(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
