//! Projection of arena state into the per-recipient [`Snapshot`].

use std::collections::BTreeMap;

use lightrace_protocol::{PlayerId, Snapshot};

use crate::{Board, Player};

/// Builds the snapshot one recipient sees.
///
/// Only `you` differs between recipients of the same round. Internal
/// bookkeeping (phase, jump parity) is reduced to `running`.
pub fn build_snapshot(
    board: &Board,
    players: &[Player],
    you: PlayerId,
    running: bool,
    deadline: &str,
) -> Snapshot {
    let players: BTreeMap<PlayerId, _> =
        players.iter().map(|p| (p.id(), p.view())).collect();

    Snapshot {
        width: board.width(),
        height: board.height(),
        cells: board.to_wire(),
        players,
        you,
        running,
        deadline: deadline.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use lightrace_protocol::Direction;
    use tokio::sync::mpsc;

    use super::*;

    #[test]
    fn test_snapshot_reflects_board_and_roster() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut board = Board::new(4, 3);
        board.place(1, 2, PlayerId(1));
        board.place(3, 0, PlayerId(2));
        let players = vec![
            Player::new(PlayerId(1), 1, 2, Direction::Up, tx.clone()),
            Player::new(PlayerId(2), 3, 0, Direction::Left, tx),
        ];

        let snap = build_snapshot(&board, &players, PlayerId(2), true, "");

        assert_eq!((snap.width, snap.height), (4, 3));
        assert_eq!(snap.cells[2][1], 1);
        assert_eq!(snap.cells[0][3], 2);
        assert_eq!(snap.you, PlayerId(2));
        assert!(snap.running);
        assert_eq!(snap.players.len(), 2);
        assert_eq!(snap.players[&PlayerId(2)].direction, Direction::Left);
        assert_eq!(snap.players[&PlayerId(1)].speed, 1);
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let mut board = Board::new(2, 2);
        let snap = build_snapshot(&board, &[], PlayerId(1), false, "x");
        board.block(0, 0);
        assert_eq!(snap.cells[0][0], 0);
        assert_eq!(snap.deadline, "x");
    }
}
