//! Arena registry: routes new connections to the arena currently accepting
//! players, creating one when needed.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use lightrace_protocol::{ArenaId, PlayerId};

use crate::{Arena, ArenaConfig, ArenaError, ArenaHandle, PlayerSender, spawn_arena};

/// Counter for generating unique arena IDs.
static NEXT_ARENA_ID: AtomicU64 = AtomicU64::new(1);

/// Where a connection ended up.
#[derive(Clone)]
pub struct Seat {
    pub arena: ArenaHandle,
    pub player_id: PlayerId,
}

/// Tracks every live arena and the one new players join.
///
/// At most one arena is accepting joins at any time. Callers serialize
/// access (the server keeps it behind a mutex), which makes swapping the
/// current arena atomic with respect to `accept_connection`.
pub struct Registry {
    config: ArenaConfig,
    arenas: HashMap<ArenaId, ArenaHandle>,
    current: Option<ArenaHandle>,
    /// Set by `shutdown_all`; no arena is created afterwards.
    shut_down: bool,
}

impl Registry {
    pub fn new(config: ArenaConfig) -> Self {
        Self {
            config: config.validated(),
            arenas: HashMap::new(),
            current: None,
            shut_down: false,
        }
    }

    /// Seats a new connection in the current arena, or in a fresh one if
    /// there is none or it no longer takes players.
    ///
    /// Fails with [`ArenaError::ShuttingDown`] once
    /// [`shutdown_all`](Self::shutdown_all) has run.
    pub async fn accept_connection(&mut self, outbound: PlayerSender) -> Result<Seat, ArenaError> {
        if self.shut_down {
            return Err(ArenaError::ShuttingDown);
        }
        self.prune();

        if let Some(current) = self.current.clone() {
            match current.join(outbound.clone()).await {
                Ok(ticket) => {
                    if ticket.started {
                        self.current = None;
                    }
                    return Ok(Seat {
                        arena: current,
                        player_id: ticket.player_id,
                    });
                }
                Err(e) if e.is_join_retryable() => {
                    tracing::debug!(arena_id = %current.arena_id(), error = %e, "current arena refused join");
                    self.current = None;
                }
                Err(e) => return Err(e),
            }
        }

        let arena = self.create_arena();
        let ticket = arena.join(outbound).await?;
        self.current = (!ticket.started).then(|| arena.clone());
        Ok(Seat {
            arena,
            player_id: ticket.player_id,
        })
    }

    fn create_arena(&mut self) -> ArenaHandle {
        let arena_id = ArenaId(NEXT_ARENA_ID.fetch_add(1, Ordering::Relaxed));
        let handle = spawn_arena(Arena::new(arena_id, self.config.clone()));
        self.arenas.insert(arena_id, handle.clone());
        tracing::info!(%arena_id, "arena created");
        handle
    }

    /// Forgets arenas whose actor has stopped.
    pub fn prune(&mut self) {
        self.arenas.retain(|_, handle| !handle.is_closed());
        if self.current.as_ref().is_some_and(ArenaHandle::is_closed) {
            self.current = None;
        }
    }

    /// Shuts every arena down and refuses further connections.
    pub async fn shutdown_all(&mut self) {
        self.shut_down = true;
        for (arena_id, handle) in self.arenas.drain() {
            if handle.shutdown().await.is_err() {
                tracing::debug!(%arena_id, "arena already stopped");
            }
        }
        self.current = None;
    }

    /// The arena currently taking joins, if any.
    pub fn current_arena(&self) -> Option<ArenaId> {
        self.current.as_ref().map(ArenaHandle::arena_id)
    }

    /// Number of arenas not yet pruned.
    pub fn arena_count(&self) -> usize {
        self.arenas.len()
    }
}
