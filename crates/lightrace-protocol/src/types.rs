//! Wire types for Lightrace.
//!
//! Everything in this module travels over the socket: the single inbound
//! message (an [`ActionMessage`]) and the single outbound message (a
//! [`Snapshot`]), plus the small identity and direction types they use.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A player's identifier within one arena.
///
/// Ids are 1-based and assigned in join order, so the first player to
/// join an arena is always `PlayerId(1)`. Serialized as a plain number,
/// and as a string key inside the snapshot's `players` map.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(pub u32);

impl PlayerId {
    /// The board cell value that marks this player's trail.
    pub fn as_cell(self) -> i64 {
        i64::from(self.0)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A unique identifier for an arena (one match instance).
///
/// Never sent to clients; used for logging and bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArenaId(pub u64);

impl fmt::Display for ArenaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "A-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Board cell encoding
// ---------------------------------------------------------------------------

/// Wire value of an empty cell.
pub const CELL_EMPTY: i64 = 0;

/// Wire value of a cell blocked by a crash.
///
/// Negative so it can never collide with a player id.
pub const CELL_BLOCKED: i64 = -1;

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

/// The heading of a player on the grid.
///
/// `Up` decreases `y`; rows are indexed top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// All four headings, in a fixed order.
    pub const ALL: [Direction; 4] =
        [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    /// Rotates 90° counter-clockwise: up → left → down → right → up.
    pub fn turned_left(self) -> Self {
        match self {
            Self::Up => Self::Left,
            Self::Left => Self::Down,
            Self::Down => Self::Right,
            Self::Right => Self::Up,
        }
    }

    /// Rotates 90° clockwise: up → right → down → left → up.
    pub fn turned_right(self) -> Self {
        match self {
            Self::Up => Self::Right,
            Self::Right => Self::Down,
            Self::Down => Self::Left,
            Self::Left => Self::Up,
        }
    }

    /// The `(dx, dy)` of a single step in this direction.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }
}

// ---------------------------------------------------------------------------
// Inbound: actions
// ---------------------------------------------------------------------------

/// A player's declared action for the upcoming round.
///
/// The wire names are fixed by existing clients, hence `change_nothing`
/// rather than `nothing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    #[serde(rename = "change_nothing")]
    Nothing,
    SpeedUp,
    SlowDown,
    TurnLeft,
    TurnRight,
}

/// The only message a client may send: `{"action": "..."}`.
///
/// Unknown fields are rejected so malformed clients fail loudly instead
/// of silently doing nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActionMessage {
    pub action: Action,
}

// ---------------------------------------------------------------------------
// Outbound: snapshots
// ---------------------------------------------------------------------------

/// Public view of one player inside a [`Snapshot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    pub x: i32,
    pub y: i32,
    pub direction: Direction,
    pub speed: u8,
    /// `false` once the player has crashed (or forfeited).
    pub active: bool,
}

/// The full world state as seen by one recipient.
///
/// Every field except `you` is identical for all players of an arena
/// after a given round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub width: usize,
    pub height: usize,
    /// `cells[y][x]`: [`CELL_EMPTY`], [`CELL_BLOCKED`], or a player id.
    pub cells: Vec<Vec<i64>>,
    pub players: BTreeMap<PlayerId, PlayerView>,
    /// The recipient's own id.
    pub you: PlayerId,
    pub running: bool,
    /// When the current round will be force-resolved (RFC 3339), or an
    /// empty string if rounds only advance once everyone has acted.
    pub deadline: String,
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_id_serializes_as_plain_number() {
        let json = serde_json::to_string(&PlayerId(42)).unwrap();
        assert_eq!(json, "42");
    }

    #[test]
    fn test_ids_display() {
        assert_eq!(PlayerId(7).to_string(), "P-7");
        assert_eq!(ArenaId(3).to_string(), "A-3");
    }

    #[test]
    fn test_blocked_cell_never_matches_a_player() {
        assert!(PlayerId(1).as_cell() > CELL_EMPTY);
        assert!(CELL_BLOCKED < CELL_EMPTY);
    }

    // =====================================================================
    // Direction
    // =====================================================================

    #[test]
    fn test_turn_left_cycle() {
        let mut d = Direction::Up;
        let mut seen = Vec::new();
        for _ in 0..4 {
            d = d.turned_left();
            seen.push(d);
        }
        assert_eq!(
            seen,
            vec![Direction::Left, Direction::Down, Direction::Right, Direction::Up]
        );
    }

    #[test]
    fn test_turn_right_undoes_turn_left() {
        for d in Direction::ALL {
            assert_eq!(d.turned_left().turned_right(), d);
        }
    }

    #[test]
    fn test_up_moves_towards_row_zero() {
        assert_eq!(Direction::Up.delta(), (0, -1));
        assert_eq!(Direction::Right.delta(), (1, 0));
    }

    #[test]
    fn test_direction_serializes_lowercase() {
        let json = serde_json::to_string(&Direction::Left).unwrap();
        assert_eq!(json, "\"left\"");
    }

    // =====================================================================
    // Actions
    // =====================================================================

    #[test]
    fn test_action_wire_names() {
        let cases = [
            (r#"{"action":"change_nothing"}"#, Action::Nothing),
            (r#"{"action":"speed_up"}"#, Action::SpeedUp),
            (r#"{"action":"slow_down"}"#, Action::SlowDown),
            (r#"{"action":"turn_left"}"#, Action::TurnLeft),
            (r#"{"action":"turn_right"}"#, Action::TurnRight),
        ];
        for (json, expected) in cases {
            let msg: ActionMessage = serde_json::from_str(json).unwrap();
            assert_eq!(msg.action, expected, "{json}");
        }
    }

    #[test]
    fn test_unknown_action_is_rejected() {
        let result: Result<ActionMessage, _> =
            serde_json::from_str(r#"{"action":"jump"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_action_is_rejected() {
        let result: Result<ActionMessage, _> = serde_json::from_str("{}");
        assert!(result.is_err());
    }

    #[test]
    fn test_extra_fields_are_rejected() {
        let result: Result<ActionMessage, _> =
            serde_json::from_str(r#"{"action":"speed_up","speed":10}"#);
        assert!(result.is_err());
    }

    // =====================================================================
    // Snapshot
    // =====================================================================

    fn sample_snapshot() -> Snapshot {
        let mut players = BTreeMap::new();
        players.insert(
            PlayerId(2),
            PlayerView {
                x: 1,
                y: 0,
                direction: Direction::Down,
                speed: 3,
                active: false,
            },
        );
        players.insert(
            PlayerId(1),
            PlayerView {
                x: 0,
                y: 1,
                direction: Direction::Right,
                speed: 1,
                active: true,
            },
        );
        Snapshot {
            width: 2,
            height: 2,
            cells: vec![vec![0, 2], vec![1, -1]],
            players,
            you: PlayerId(1),
            running: true,
            deadline: String::new(),
        }
    }

    #[test]
    fn test_snapshot_json_shape() {
        let json = serde_json::to_value(sample_snapshot()).unwrap();

        assert_eq!(json["width"], 2);
        assert_eq!(json["cells"], serde_json::json!([[0, 2], [1, -1]]));
        assert_eq!(json["you"], 1);
        assert_eq!(json["running"], true);
        assert_eq!(json["deadline"], "");
        // Player ids become string keys.
        assert_eq!(json["players"]["2"]["direction"], "down");
        assert_eq!(json["players"]["2"]["active"], false);
        assert_eq!(json["players"]["1"]["speed"], 1);
    }

    #[test]
    fn test_snapshot_players_are_ordered_by_id() {
        let json = serde_json::to_string(&sample_snapshot()).unwrap();
        let first = json.find("\"1\":").unwrap();
        let second = json.find("\"2\":").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_snapshot_parses_back_from_client_json() {
        let json = serde_json::to_string(&sample_snapshot()).unwrap();
        let parsed: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.players[&PlayerId(1)].direction, Direction::Right);
    }
}
