//! Integration tests for the arena actor and registry.

use std::time::Duration;

use lightrace_arena::{
    Arena, ArenaConfig, ArenaError, ArenaHandle, ArenaOutbound, Phase, PlayerSender, Registry,
    Teardown, spawn_arena,
};
use lightrace_protocol::{Action, ArenaId, Direction, PlayerId, Snapshot};
use tokio::sync::mpsc::{self, UnboundedReceiver};

// =========================================================================
// Helpers
// =========================================================================

fn channel() -> (PlayerSender, UnboundedReceiver<ArenaOutbound>) {
    mpsc::unbounded_channel()
}

fn config(min_players: usize) -> ArenaConfig {
    ArenaConfig {
        min_players,
        ..ArenaConfig::default()
    }
}

async fn next(rx: &mut UnboundedReceiver<ArenaOutbound>) -> ArenaOutbound {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for arena message")
        .expect("arena dropped the player channel")
}

async fn next_snapshot(rx: &mut UnboundedReceiver<ArenaOutbound>) -> Snapshot {
    match next(rx).await {
        ArenaOutbound::Snapshot(s) => s,
        other => panic!("expected snapshot, got {other:?}"),
    }
}

async fn wait_closed(handle: &ArenaHandle) {
    for _ in 0..200 {
        if handle.is_closed() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("arena {} never stopped", handle.arena_id());
}

/// Spawns an already-running arena with two players facing down, far apart.
fn spawn_running_pair(
    config: ArenaConfig,
) -> (
    ArenaHandle,
    UnboundedReceiver<ArenaOutbound>,
    UnboundedReceiver<ArenaOutbound>,
) {
    let mut arena = Arena::with_seed(ArenaId(100), config, 5);
    let (tx1, rx1) = channel();
    let (tx2, rx2) = channel();
    arena.join_at(5, 5, Direction::Down, tx1).unwrap();
    arena.join_at(30, 5, Direction::Down, tx2).unwrap();
    assert_eq!(arena.phase(), Phase::Running);
    (spawn_arena(arena), rx1, rx2)
}

// =========================================================================
// Actor
// =========================================================================

#[tokio::test]
async fn test_joins_through_handle_get_sequential_ids() {
    let handle = spawn_arena(Arena::new(ArenaId(1), config(3)));
    let mut receivers = Vec::new();
    let mut tickets = Vec::new();
    for _ in 0..3 {
        let (tx, rx) = channel();
        tickets.push(handle.join(tx).await.unwrap());
        receivers.push(rx);
    }

    let ids: Vec<_> = tickets.iter().map(|t| t.player_id).collect();
    assert_eq!(ids, vec![PlayerId(1), PlayerId(2), PlayerId(3)]);
    assert!(!tickets[0].started);
    assert!(!tickets[1].started);
    assert!(tickets[2].started);

    let info = handle.get_info().await.unwrap();
    assert_eq!(info.phase, Phase::Running);
    assert_eq!(info.player_count, 3);
    assert_eq!(info.min_players, 3);

    for (i, rx) in receivers.iter_mut().enumerate() {
        let snap = next_snapshot(rx).await;
        assert!(snap.running);
        assert_eq!(snap.you, PlayerId(i as u32 + 1));
    }
}

#[tokio::test]
async fn test_join_after_start_is_rejected() {
    let (handle, _rx1, _rx2) = spawn_running_pair(config(2));
    let err = handle.join(channel().0).await.unwrap_err();
    assert!(err.is_join_retryable());
}

#[tokio::test]
async fn test_intents_through_actor_resolve_round() {
    let (handle, mut rx1, mut rx2) = spawn_running_pair(config(2));
    next_snapshot(&mut rx1).await;
    next_snapshot(&mut rx2).await;

    handle.submit_intent(PlayerId(1), Action::SpeedUp).await.unwrap();
    handle.submit_intent(PlayerId(2), Action::TurnRight).await.unwrap();

    let snap = next_snapshot(&mut rx1).await;
    assert_eq!(snap.you, PlayerId(1));
    let p1 = &snap.players[&PlayerId(1)];
    assert_eq!((p1.x, p1.y, p1.speed), (5, 7, 2));
    let p2 = &snap.players[&PlayerId(2)];
    assert_eq!((p2.x, p2.y), (29, 5));
    assert_eq!(p2.direction, Direction::Left);

    assert_eq!(next_snapshot(&mut rx2).await.you, PlayerId(2));
    assert_eq!(handle.get_info().await.unwrap().rounds_played, 1);
}

#[tokio::test]
async fn test_disconnect_forfeits_through_actor() {
    let (handle, mut rx1, _rx2) = spawn_running_pair(config(2));
    next_snapshot(&mut rx1).await;

    handle.submit_intent(PlayerId(1), Action::Nothing).await.unwrap();
    handle.disconnect(PlayerId(2)).await.unwrap();

    let snap = next_snapshot(&mut rx1).await;
    assert!(!snap.players[&PlayerId(2)].active);
    assert!(snap.players[&PlayerId(1)].active);

    let info = handle.get_info().await.unwrap();
    assert_eq!(info.alive_count, 1);
    assert_eq!(info.rounds_played, 1);
}

#[tokio::test]
async fn test_shutdown_sends_final_snapshot_and_close() {
    let (handle, mut rx1, _rx2) = spawn_running_pair(config(2));
    next_snapshot(&mut rx1).await;

    handle.shutdown().await.unwrap();

    let last = next_snapshot(&mut rx1).await;
    assert!(!last.running);
    assert_eq!(next(&mut rx1).await, ArenaOutbound::Closed(Teardown::Shutdown));
    wait_closed(&handle).await;
    assert!(handle.get_info().await.is_err());
}

#[tokio::test]
async fn test_match_end_stops_actor() {
    let mut arena = Arena::with_seed(ArenaId(7), config(1), 1);
    let (tx, mut rx) = channel();
    arena.join_at(0, 0, Direction::Up, tx).unwrap();
    let handle = spawn_arena(arena);
    next_snapshot(&mut rx).await;

    handle.submit_intent(PlayerId(1), Action::Nothing).await.unwrap();

    let round = next_snapshot(&mut rx).await;
    assert!(!round.players[&PlayerId(1)].active);
    let last = next_snapshot(&mut rx).await;
    assert!(!last.running);
    assert_eq!(next(&mut rx).await, ArenaOutbound::Closed(Teardown::Finished));
    wait_closed(&handle).await;
}

#[tokio::test(start_paused = true)]
async fn test_round_timeout_forces_resolution() {
    let cfg = ArenaConfig {
        round_timeout: Some(Duration::from_millis(500)),
        ..config(2)
    };
    let (handle, mut rx1, _rx2) = spawn_running_pair(cfg);
    let start = next_snapshot(&mut rx1).await;
    assert!(!start.deadline.is_empty());

    // P1 acts, P2 stays silent.
    handle.submit_intent(PlayerId(1), Action::TurnLeft).await.unwrap();
    let before = tokio::time::Instant::now();

    let forced = next_snapshot(&mut rx1).await;
    assert!(before.elapsed() <= Duration::from_millis(500));
    assert_eq!(forced.players[&PlayerId(1)].direction, Direction::Right);
    let p2 = &forced.players[&PlayerId(2)];
    assert_eq!((p2.x, p2.y), (30, 6));
    assert!(p2.active);

    // The next window is armed as well.
    let again = next_snapshot(&mut rx1).await;
    assert_eq!(again.players[&PlayerId(2)].y, 7);
    assert_eq!(handle.get_info().await.unwrap().rounds_played, 2);
}

#[tokio::test(start_paused = true)]
async fn test_no_timeout_means_no_forced_rounds() {
    let (handle, mut rx1, _rx2) = spawn_running_pair(config(2));
    next_snapshot(&mut rx1).await;

    let waited = tokio::time::timeout(Duration::from_secs(600), rx1.recv()).await;
    assert!(waited.is_err());
    assert_eq!(handle.get_info().await.unwrap().rounds_played, 0);
}

// =========================================================================
// Registry
// =========================================================================

#[tokio::test]
async fn test_registry_fills_one_arena_then_opens_another() {
    let mut registry = Registry::new(config(2));
    let (tx1, _rx1) = channel();
    let (tx2, _rx2) = channel();
    let (tx3, _rx3) = channel();

    let a = registry.accept_connection(tx1).await.unwrap();
    assert_eq!(registry.current_arena(), Some(a.arena.arena_id()));

    let b = registry.accept_connection(tx2).await.unwrap();
    assert_eq!(a.arena.arena_id(), b.arena.arena_id());
    assert_eq!((a.player_id, b.player_id), (PlayerId(1), PlayerId(2)));
    assert_eq!(registry.current_arena(), None, "running arena is no longer current");

    let c = registry.accept_connection(tx3).await.unwrap();
    assert_ne!(c.arena.arena_id(), a.arena.arena_id());
    assert_eq!(c.player_id, PlayerId(1));
    assert_eq!(registry.arena_count(), 2);
}

#[tokio::test]
async fn test_registry_replaces_closed_current_arena() {
    let mut registry = Registry::new(config(3));
    let first = registry.accept_connection(channel().0).await.unwrap();
    first.arena.shutdown().await.unwrap();
    wait_closed(&first.arena).await;

    let second = registry.accept_connection(channel().0).await.unwrap();
    assert_ne!(second.arena.arena_id(), first.arena.arena_id());
    assert_eq!(second.player_id, PlayerId(1));
    assert_eq!(registry.arena_count(), 1, "closed arena was pruned");
}

#[tokio::test]
async fn test_registry_shutdown_all_closes_every_arena() {
    let mut registry = Registry::new(config(1));
    let (tx1, mut rx1) = channel();
    let (tx2, mut rx2) = channel();
    let a = registry.accept_connection(tx1).await.unwrap();
    let b = registry.accept_connection(tx2).await.unwrap();
    assert_ne!(a.arena.arena_id(), b.arena.arena_id());

    registry.shutdown_all().await;
    assert_eq!(registry.arena_count(), 0);
    assert_eq!(registry.current_arena(), None);

    for rx in [&mut rx1, &mut rx2] {
        // Start snapshot, final snapshot, close.
        next_snapshot(rx).await;
        next_snapshot(rx).await;
        assert_eq!(next(rx).await, ArenaOutbound::Closed(Teardown::Shutdown));
    }
}

#[tokio::test]
async fn test_registry_refuses_connections_after_shutdown() {
    let mut registry = Registry::new(config(2));
    registry.shutdown_all().await;

    let (tx, mut rx) = channel();
    let err = registry.accept_connection(tx).await.err();
    assert!(matches!(err, Some(ArenaError::ShuttingDown)));
    assert_eq!(registry.arena_count(), 0);
    assert_eq!(registry.current_arena(), None);
    assert!(rx.try_recv().is_err());
}
