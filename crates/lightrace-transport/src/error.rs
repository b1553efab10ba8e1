use crate::ConnectionId;

/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Binding the listening socket failed.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Accepting a TCP connection failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),

    /// The WebSocket upgrade handshake failed.
    #[error("websocket handshake failed: {0}")]
    Handshake(String),

    /// Sending a frame to the peer failed.
    #[error("send to {conn} failed: {reason}")]
    SendFailed { conn: ConnectionId, reason: String },

    /// Reading a frame from the peer failed.
    #[error("receive from {conn} failed: {reason}")]
    ReceiveFailed { conn: ConnectionId, reason: String },

    /// The connection is already closed.
    #[error("connection {0} is closed")]
    ConnectionClosed(ConnectionId),
}
