//! Per-player state and the channel used to reach its connection.

use lightrace_protocol::{Action, Direction, PlayerId, PlayerView, Snapshot};
use tokio::sync::mpsc;

/// Slowest speed, in cells per round. Every player starts here.
pub const MIN_SPEED: u8 = 1;

/// Fastest speed, in cells per round.
pub const MAX_SPEED: u8 = 10;

// ---------------------------------------------------------------------------
// Outbound channel
// ---------------------------------------------------------------------------

/// Why an arena stopped talking to a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Teardown {
    /// The match ended: nobody is left alive.
    Finished,
    /// The server is shutting down.
    Shutdown,
}

/// A message from an arena to one player's connection handler.
#[derive(Debug, Clone, PartialEq)]
pub enum ArenaOutbound {
    /// World state after a round (or at start / teardown).
    Snapshot(Snapshot),
    /// The arena is gone. Always preceded by a final snapshot.
    Closed(Teardown),
}

/// Channel sender for delivering outbound messages to a player.
pub type PlayerSender = mpsc::UnboundedSender<ArenaOutbound>;

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// One racer.
///
/// Created by the arena on join and mutated only by it.
#[derive(Debug)]
pub struct Player {
    pub(crate) id: PlayerId,
    pub(crate) x: i32,
    pub(crate) y: i32,
    pub(crate) heading: Direction,
    pub(crate) speed: u8,
    pub(crate) alive: bool,
    pub(crate) pending: Option<Action>,
    outbound: PlayerSender,
}

impl Player {
    pub(crate) fn new(
        id: PlayerId,
        x: i32,
        y: i32,
        heading: Direction,
        outbound: PlayerSender,
    ) -> Self {
        Self {
            id,
            x,
            y,
            heading,
            speed: MIN_SPEED,
            alive: true,
            pending: None,
            outbound,
        }
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }

    pub fn position(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    pub fn heading(&self) -> Direction {
        self.heading
    }

    pub fn speed(&self) -> u8 {
        self.speed
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// The intent that will be applied next round, if any.
    pub fn pending(&self) -> Option<Action> {
        self.pending
    }

    /// Records the intent for the upcoming round. The latest call before
    /// resolution wins.
    pub fn set_intent(&mut self, action: Action) {
        self.pending = Some(action);
    }

    /// Applies and clears the pending intent.
    pub fn apply_intent(&mut self) {
        match self.pending.take() {
            Some(Action::SpeedUp) => self.speed = (self.speed + 1).min(MAX_SPEED),
            Some(Action::SlowDown) => {
                self.speed = self.speed.saturating_sub(1).max(MIN_SPEED);
            }
            Some(Action::TurnLeft) => self.heading = self.heading.turned_left(),
            Some(Action::TurnRight) => self.heading = self.heading.turned_right(),
            Some(Action::Nothing) | None => {}
        }
    }

    /// Marks the player dead. Position and trail stay where they are.
    pub(crate) fn kill(&mut self) {
        self.alive = false;
        self.pending = None;
    }

    /// Public view for snapshots.
    pub fn view(&self) -> PlayerView {
        PlayerView {
            x: self.x,
            y: self.y,
            direction: self.heading,
            speed: self.speed,
            active: self.alive,
        }
    }

    /// Queues a message for this player's connection. Silently dropped if
    /// the connection is gone.
    pub(crate) fn send(&self, msg: ArenaOutbound) {
        let _ = self.outbound.send(msg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player() -> Player {
        let (tx, _rx) = mpsc::unbounded_channel();
        Player::new(PlayerId(1), 5, 5, Direction::Up, tx)
    }

    #[test]
    fn test_new_player_defaults() {
        let p = player();
        assert_eq!(p.speed(), MIN_SPEED);
        assert!(p.is_alive());
        assert_eq!(p.pending(), None);
    }

    #[test]
    fn test_last_intent_wins() {
        let mut p = player();
        p.set_intent(Action::TurnLeft);
        p.set_intent(Action::SpeedUp);
        assert_eq!(p.pending(), Some(Action::SpeedUp));
        p.apply_intent();
        assert_eq!(p.speed(), 2);
        assert_eq!(p.heading(), Direction::Up);
    }

    #[test]
    fn test_apply_clears_pending() {
        let mut p = player();
        p.set_intent(Action::Nothing);
        p.apply_intent();
        assert_eq!(p.pending(), None);
    }

    #[test]
    fn test_speed_is_capped() {
        let mut p = player();
        for _ in 0..15 {
            p.set_intent(Action::SpeedUp);
            p.apply_intent();
        }
        assert_eq!(p.speed(), MAX_SPEED);
    }

    #[test]
    fn test_speed_never_drops_below_one() {
        let mut p = player();
        p.set_intent(Action::SlowDown);
        p.apply_intent();
        assert_eq!(p.speed(), MIN_SPEED);
    }

    #[test]
    fn test_turns() {
        let mut p = player();
        p.set_intent(Action::TurnLeft);
        p.apply_intent();
        assert_eq!(p.heading(), Direction::Left);
        p.set_intent(Action::TurnRight);
        p.apply_intent();
        p.set_intent(Action::TurnRight);
        p.apply_intent();
        assert_eq!(p.heading(), Direction::Right);
    }

    #[test]
    fn test_kill_freezes_and_clears_intent() {
        let mut p = player();
        p.set_intent(Action::SpeedUp);
        p.kill();
        assert!(!p.is_alive());
        assert_eq!(p.pending(), None);
        assert_eq!(p.position(), (5, 5));
        assert!(!p.view().active);
    }

    #[test]
    fn test_send_to_dropped_receiver_is_silent() {
        let p = player();
        p.send(ArenaOutbound::Closed(Teardown::Finished));
    }
}
