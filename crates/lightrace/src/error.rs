//! Unified error type for the Lightrace server.

use lightrace_arena::ArenaError;
use lightrace_protocol::ProtocolError;
use lightrace_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant lets `?` convert sub-crate
/// errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum LightraceError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// An arena-level error (join rejected, arena unavailable).
    #[error(transparent)]
    Arena(#[from] ArenaError),
}

#[cfg(test)]
mod tests {
    use lightrace_protocol::ArenaId;
    use lightrace_transport::ConnectionId;

    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err: LightraceError = TransportError::ConnectionClosed(ConnectionId::new(4)).into();
        assert!(matches!(err, LightraceError::Transport(_)));
        assert!(err.to_string().contains("conn-4"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err: LightraceError = ProtocolError::InvalidMessage("bad".into()).into();
        assert!(matches!(err, LightraceError::Protocol(_)));
    }

    #[test]
    fn test_from_arena_error() {
        let err: LightraceError = ArenaError::Unavailable(ArenaId(2)).into();
        assert!(matches!(err, LightraceError::Arena(_)));
        assert_eq!(err.to_string(), "arena A-2 is unavailable");
    }
}
