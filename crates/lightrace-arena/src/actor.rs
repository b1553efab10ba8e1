//! Arena actor: a Tokio task that owns one [`Arena`] and its round timer.
//!
//! Every join, intent and disconnect for an arena goes through the actor's
//! channel, so the engine sees them strictly one at a time.

use lightrace_protocol::{Action, ArenaId, PlayerId};
use lightrace_tick::RoundTimer;
use tokio::sync::{mpsc, oneshot};

use crate::player::{PlayerSender, Teardown};
use crate::{Arena, ArenaError, Phase};

/// Default command channel size for arena actors.
const DEFAULT_CHANNEL_SIZE: usize = 64;

pub(crate) enum ArenaCommand {
    Join {
        outbound: PlayerSender,
        reply: oneshot::Sender<Result<JoinTicket, ArenaError>>,
    },
    Intent {
        player_id: PlayerId,
        action: Action,
    },
    Disconnect {
        player_id: PlayerId,
    },
    GetInfo {
        reply: oneshot::Sender<ArenaInfo>,
    },
    Shutdown,
}

/// Result of a successful join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinTicket {
    pub player_id: PlayerId,
    /// Whether this join filled the roster and started the arena.
    pub started: bool,
}

/// Arena metadata (not the board itself).
#[derive(Debug, Clone)]
pub struct ArenaInfo {
    pub arena_id: ArenaId,
    pub phase: Phase,
    pub player_count: usize,
    pub alive_count: usize,
    pub min_players: usize,
    pub rounds_played: u64,
}

/// Handle to a running arena actor. Cheap to clone.
#[derive(Clone)]
pub struct ArenaHandle {
    arena_id: ArenaId,
    sender: mpsc::Sender<ArenaCommand>,
}

impl ArenaHandle {
    pub fn arena_id(&self) -> ArenaId {
        self.arena_id
    }

    /// `true` once the actor has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Asks the arena to admit a player whose snapshots go to `outbound`.
    pub async fn join(&self, outbound: PlayerSender) -> Result<JoinTicket, ArenaError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(ArenaCommand::Join {
                outbound,
                reply: reply_tx,
            })
            .await
            .map_err(|_| ArenaError::Unavailable(self.arena_id))?;
        reply_rx
            .await
            .map_err(|_| ArenaError::Unavailable(self.arena_id))?
    }

    /// Forwards an intent (fire-and-forget).
    pub async fn submit_intent(
        &self,
        player_id: PlayerId,
        action: Action,
    ) -> Result<(), ArenaError> {
        self.sender
            .send(ArenaCommand::Intent { player_id, action })
            .await
            .map_err(|_| ArenaError::Unavailable(self.arena_id))
    }

    /// Reports that a player's connection is gone (fire-and-forget).
    pub async fn disconnect(&self, player_id: PlayerId) -> Result<(), ArenaError> {
        self.sender
            .send(ArenaCommand::Disconnect { player_id })
            .await
            .map_err(|_| ArenaError::Unavailable(self.arena_id))
    }

    pub async fn get_info(&self) -> Result<ArenaInfo, ArenaError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(ArenaCommand::GetInfo { reply: reply_tx })
            .await
            .map_err(|_| ArenaError::Unavailable(self.arena_id))?;
        reply_rx
            .await
            .map_err(|_| ArenaError::Unavailable(self.arena_id))
    }

    /// Tears the arena down: every player gets a final snapshot and a
    /// shutdown notice.
    pub async fn shutdown(&self) -> Result<(), ArenaError> {
        self.sender
            .send(ArenaCommand::Shutdown)
            .await
            .map_err(|_| ArenaError::Unavailable(self.arena_id))
    }
}

struct ArenaActor {
    arena: Arena,
    timer: RoundTimer,
    /// The arena window the timer was last armed for.
    armed_window: u64,
    receiver: mpsc::Receiver<ArenaCommand>,
}

impl ArenaActor {
    async fn run(mut self) {
        let arena_id = self.arena.id();
        tracing::info!(
            %arena_id,
            barrier_only = self.timer.is_barrier_only(),
            "arena actor started"
        );

        // The arena may already be running when handed to the actor.
        self.sync_timer();

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => match cmd {
                    Some(cmd) => self.handle(cmd),
                    None => {
                        // Every handle dropped.
                        self.arena.close(Teardown::Shutdown);
                    }
                },
                expiry = self.timer.wait_for_expiry() => {
                    tracing::debug!(
                        %arena_id,
                        window = expiry.window,
                        late_ms = expiry.late_by.as_millis() as u64,
                        "round timer fired"
                    );
                    self.arena.force_round();
                }
            }

            if self.arena.phase() == Phase::Closed {
                self.timer.disarm();
                break;
            }
            self.sync_timer();
        }

        let stats = self.timer.stats();
        tracing::info!(
            %arena_id,
            rounds = self.arena.rounds_played(),
            forced = stats.expirations,
            "arena actor stopped"
        );
    }

    fn handle(&mut self, cmd: ArenaCommand) {
        match cmd {
            ArenaCommand::Join { outbound, reply } => {
                let was_waiting = self.arena.phase().is_joinable();
                let result = self.arena.join(outbound).map(|player_id| JoinTicket {
                    player_id,
                    started: was_waiting && !self.arena.phase().is_joinable(),
                });
                let _ = reply.send(result);
            }
            ArenaCommand::Intent { player_id, action } => {
                if let Err(e) = self.arena.submit_intent(player_id, action) {
                    tracing::debug!(arena_id = %self.arena.id(), %player_id, error = %e, "intent dropped");
                }
            }
            ArenaCommand::Disconnect { player_id } => {
                if let Err(e) = self.arena.disconnect(player_id) {
                    tracing::warn!(arena_id = %self.arena.id(), %player_id, error = %e, "disconnect for unknown player");
                }
            }
            ArenaCommand::GetInfo { reply } => {
                let _ = reply.send(self.info());
            }
            ArenaCommand::Shutdown => {
                tracing::info!(arena_id = %self.arena.id(), "arena shutting down");
                self.arena.close(Teardown::Shutdown);
            }
        }
    }

    /// Re-arms the timer whenever the arena opened a new round window.
    fn sync_timer(&mut self) {
        let window = self.arena.window();
        if window != self.armed_window {
            self.armed_window = window;
            self.timer.arm();
        }
    }

    fn info(&self) -> ArenaInfo {
        ArenaInfo {
            arena_id: self.arena.id(),
            phase: self.arena.phase(),
            player_count: self.arena.players().len(),
            alive_count: self.arena.alive_count(),
            min_players: self.arena.config().min_players,
            rounds_played: self.arena.rounds_played(),
        }
    }
}

/// Spawns an actor task that owns `arena` and returns a handle to it.
///
/// The actor stops once the arena is closed, either because the match
/// ended or because it was shut down.
pub fn spawn_arena(arena: Arena) -> ArenaHandle {
    let (tx, rx) = mpsc::channel(DEFAULT_CHANNEL_SIZE);
    let arena_id = arena.id();
    let timer = RoundTimer::new(arena.config().timer_config());

    let actor = ArenaActor {
        arena,
        timer,
        armed_window: 0,
        receiver: rx,
    };
    tokio::spawn(actor.run());

    ArenaHandle {
        arena_id,
        sender: tx,
    }
}
