//! `LightraceServer` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → arena registry.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use lightrace_arena::{ArenaConfig, Registry};
use lightrace_protocol::{Codec, JsonCodec};
use lightrace_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;
use tokio::task::JoinSet;

use crate::LightraceError;
use crate::handler::handle_connection;

/// How long shutdown waits for connections to deliver their final
/// snapshot and close frame.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<C: Codec> {
    /// Admission is serialized through this lock.
    pub(crate) registry: Mutex<Registry>,
    pub(crate) codec: C,
}

/// Builder for configuring and starting a Lightrace server.
///
/// # Example
///
/// ```rust,no_run
/// use lightrace::prelude::*;
///
/// # async fn start() -> Result<(), LightraceError> {
/// let server = LightraceServer::builder()
///     .bind("0.0.0.0:8081")
///     .arena_config(ArenaConfig { min_players: 2, ..ArenaConfig::default() })
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct LightraceServerBuilder {
    bind_addr: String,
    arena_config: ArenaConfig,
}

impl LightraceServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8081".to_string(),
            arena_config: ArenaConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the configuration every new arena is created with.
    pub fn arena_config(mut self, config: ArenaConfig) -> Self {
        self.arena_config = config;
        self
    }

    /// Binds the listener. Uses `WebSocketTransport` and `JsonCodec`.
    pub async fn build(self) -> Result<LightraceServer<JsonCodec>, LightraceError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;
        let config = self.arena_config.validated();
        tracing::info!(
            addr = %self.bind_addr,
            width = config.width,
            height = config.height,
            min_players = config.min_players,
            round_timeout_ms = config.round_timeout.map(|t| t.as_millis() as u64),
            forfeit_on_disconnect = config.forfeit_on_disconnect,
            "server configured"
        );

        let state = Arc::new(ServerState {
            registry: Mutex::new(Registry::new(config)),
            codec: JsonCodec,
        });

        Ok(LightraceServer { transport, state })
    }
}

impl Default for LightraceServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Lightrace server.
///
/// Call [`run()`](Self::run) or [`run_until()`](Self::run_until) to start
/// accepting connections.
pub struct LightraceServer<C: Codec = JsonCodec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl LightraceServer<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> LightraceServerBuilder {
        LightraceServerBuilder::new()
    }
}

impl<C: Codec> LightraceServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Accepts connections until the process is terminated.
    pub async fn run(self) -> Result<(), LightraceError> {
        self.run_until(std::future::pending()).await
    }

    /// Accepts connections until `signal` completes, then shuts every arena
    /// down and gives connections a moment to say goodbye.
    pub async fn run_until<F>(mut self, signal: F) -> Result<(), LightraceError>
    where
        F: Future<Output = ()>,
    {
        tracing::info!("Lightrace server running");
        tokio::pin!(signal);
        let mut connections = JoinSet::new();

        loop {
            tokio::select! {
                () = &mut signal => break,
                accepted = self.transport.accept() => match accepted {
                    Ok(conn) => {
                        let state = Arc::clone(&self.state);
                        connections.spawn(async move {
                            if let Err(e) = handle_connection(conn, state).await {
                                tracing::debug!(error = %e, "connection ended with error");
                            }
                        });
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "accept failed");
                    }
                },
                Some(_) = connections.join_next(), if !connections.is_empty() => {}
            }
        }

        tracing::info!(connections = connections.len(), "shutting down");
        self.state.registry.lock().await.shutdown_all().await;

        let drained = tokio::time::timeout(SHUTDOWN_GRACE, async {
            while connections.join_next().await.is_some() {}
        })
        .await;
        if drained.is_err() {
            tracing::warn!(
                remaining = connections.len(),
                "connections still open after grace period, aborting"
            );
            connections.shutdown().await;
        }

        self.transport.shutdown().await?;
        tracing::info!("Lightrace server stopped");
        Ok(())
    }
}
