//! Per-connection handler: seating and message routing.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Ask the registry for a seat (arena + player id)
//!   2. Loop: forward decoded actions to the arena, and arena snapshots to
//!      the socket, until either side closes

use std::sync::Arc;

use lightrace_arena::{ArenaError, ArenaHandle, ArenaOutbound, Teardown};
use lightrace_protocol::{ActionMessage, Codec, PlayerId};
use lightrace_transport::{CloseReason, Connection, WebSocketConnection};
use tokio::sync::mpsc;

use crate::LightraceError;
use crate::server::ServerState;

/// Drop guard that reports the player's disconnect to its arena when the
/// handler exits, including on error paths and panics.
///
/// `Drop` is synchronous, so the report is sent from a spawned task.
struct SeatGuard {
    arena: ArenaHandle,
    player_id: PlayerId,
}

impl Drop for SeatGuard {
    fn drop(&mut self) {
        let arena = self.arena.clone();
        let player_id = self.player_id;
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            runtime.spawn(async move {
                // The arena may already be gone.
                let _ = arena.disconnect(player_id).await;
            });
        }
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), LightraceError> {
    let conn_id = conn.id();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel();

    let seated = {
        let mut registry = state.registry.lock().await;
        registry.accept_connection(outbound_tx).await
    };
    let seat = match seated {
        Ok(seat) => seat,
        Err(ArenaError::ShuttingDown) => {
            tracing::debug!(%conn_id, "connection arrived during shutdown");
            conn.close(CloseReason::GoingAway).await?;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    let player_id = seat.player_id;
    let arena_id = seat.arena.arena_id();
    tracing::info!(%conn_id, %player_id, %arena_id, "player seated");

    let _guard = SeatGuard {
        arena: seat.arena.clone(),
        player_id,
    };

    loop {
        tokio::select! {
            outbound = outbound_rx.recv() => match outbound {
                Some(ArenaOutbound::Snapshot(snapshot)) => {
                    let text = state.codec.encode_text(&snapshot)?;
                    conn.send_text(&text).await?;
                }
                Some(ArenaOutbound::Closed(teardown)) => {
                    let reason = match teardown {
                        Teardown::Finished => CloseReason::Normal,
                        Teardown::Shutdown => CloseReason::GoingAway,
                    };
                    if let Err(e) = conn.close(reason).await {
                        tracing::debug!(%conn_id, error = %e, "close after teardown failed");
                    }
                    tracing::info!(%conn_id, %player_id, %arena_id, ?teardown, "arena closed, connection done");
                    break;
                }
                None => break,
            },

            inbound = conn.recv() => match inbound {
                Ok(Some(data)) => match state.codec.decode::<ActionMessage>(&data) {
                    Ok(msg) => {
                        if let Err(e) = seat.arena.submit_intent(player_id, msg.action).await {
                            tracing::debug!(%player_id, error = %e, "intent not delivered");
                        }
                    }
                    Err(e) => {
                        tracing::warn!(%conn_id, %player_id, error = %e, "protocol violation, dropping connection");
                        let reason = CloseReason::PolicyViolation("invalid action".into());
                        if let Err(e) = conn.close(reason).await {
                            tracing::debug!(%conn_id, error = %e, "close after violation failed");
                        }
                        break;
                    }
                },
                Ok(None) => {
                    tracing::info!(%conn_id, %player_id, "connection closed by client");
                    break;
                }
                Err(e) => {
                    tracing::debug!(%conn_id, %player_id, error = %e, "recv error");
                    break;
                }
            },
        }
    }

    // _guard drops here → disconnect is reported to the arena.
    Ok(())
}
