//! Arena configuration and lifecycle phase.

use std::time::Duration;

use lightrace_tick::RoundTimerConfig;

// ---------------------------------------------------------------------------
// ArenaConfig
// ---------------------------------------------------------------------------

/// Configuration shared by every arena the registry creates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Board width in cells.
    pub width: usize,

    /// Board height in cells.
    pub height: usize,

    /// Players required before the arena starts. Read once at startup.
    pub min_players: usize,

    /// Force-resolve a round that stays open this long. `None` means rounds
    /// advance only once every living player has acted.
    pub round_timeout: Option<Duration>,

    /// Whether a player whose connection goes away is marked dead.
    pub forfeit_on_disconnect: bool,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            width: 50,
            height: 50,
            min_players: 8,
            round_timeout: None,
            forfeit_on_disconnect: true,
        }
    }
}

impl ArenaConfig {
    /// Returns a copy with every field forced into a usable range.
    ///
    /// - the board is at least 1×1
    /// - `min_players` is in `1..=width * height`, so a starting arena
    ///   always has room for its whole roster
    /// - `round_timeout` is clamped like [`RoundTimerConfig::validated`]
    pub fn validated(mut self) -> Self {
        self.width = self.width.max(1);
        self.height = self.height.max(1);

        let clamped = self.min_players.clamp(1, self.capacity());
        if clamped != self.min_players {
            tracing::warn!(
                requested = self.min_players,
                clamped,
                "min_players out of range, clamping"
            );
            self.min_players = clamped;
        }

        self.round_timeout = self.timer_config().validated().timeout;
        self
    }

    /// The timer settings for one arena.
    pub fn timer_config(&self) -> RoundTimerConfig {
        RoundTimerConfig {
            timeout: self.round_timeout,
        }
    }

    /// Number of cells on the board.
    pub fn capacity(&self) -> usize {
        self.width.saturating_mul(self.height)
    }
}

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// The lifecycle phase of an arena.
///
/// Phases only move forward:
///
/// ```text
/// Waiting → Running → Closed
/// ```
///
/// An arena shut down before it started goes straight from `Waiting` to
/// `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    /// Accepting joins, not yet enough players.
    Waiting,
    /// Rounds are being played. No more joins.
    Running,
    /// Torn down. Never reused.
    Closed,
}

impl Phase {
    /// Returns `true` if the arena is accepting new players.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::Waiting)
    }

    /// Returns `true` while rounds are being played.
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// The phase that normally follows this one.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Waiting => Some(Self::Running),
            Self::Running => Some(Self::Closed),
            Self::Closed => None,
        }
    }

    /// Returns `true` if `target` lies strictly ahead of this phase.
    pub fn can_transition_to(self, target: Self) -> bool {
        target > self
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Waiting => write!(f, "Waiting"),
            Self::Running => write!(f, "Running"),
            Self::Closed => write!(f, "Closed"),
        }
    }
}
