//! Error types for the arena layer.

use lightrace_protocol::{ArenaId, PlayerId};

use crate::Phase;

/// Errors that can occur during arena operations.
#[derive(Debug, thiserror::Error)]
pub enum ArenaError {
    /// The arena is past `Waiting` and takes no more players.
    #[error("arena {arena} is {phase}, not accepting joins")]
    JoinRejected { arena: ArenaId, phase: Phase },

    /// No empty cell is left to spawn on.
    #[error("arena {0} has no empty cell left")]
    BoardFull(ArenaId),

    /// A fixed spawn cell is off the grid or already taken.
    #[error("cannot spawn at ({x}, {y})")]
    BadSpawn { x: i32, y: i32 },

    /// The player id was never issued by this arena.
    #[error("player {0} not in arena {1}")]
    UnknownPlayer(PlayerId, ArenaId),

    /// The arena has been torn down.
    #[error("arena {0} is closed")]
    Closed(ArenaId),

    /// The arena's command channel is full or closed.
    #[error("arena {0} is unavailable")]
    Unavailable(ArenaId),

    /// The registry was shut down and opens no more arenas.
    #[error("registry is shutting down")]
    ShuttingDown,
}

impl ArenaError {
    /// Whether the registry should route the player to a fresh arena
    /// instead of failing the connection.
    pub fn is_join_retryable(&self) -> bool {
        matches!(
            self,
            Self::JoinRejected { .. } | Self::BoardFull(_) | Self::Closed(_) | Self::Unavailable(_)
        )
    }
}
