//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding wire messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serializing an outbound message failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// An inbound message could not be parsed.
    ///
    /// Covers malformed JSON, missing or extra fields, and action names
    /// outside the known set. The server treats all of these as a
    /// protocol violation.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The payload parsed but is not acceptable (e.g. not UTF-8 text
    /// where text is required).
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
