//! The arena engine: admission, intent collection, round resolution and
//! teardown for one match.
//!
//! [`Arena`] is plain synchronous state. All concurrency lives in the actor
//! (see [`spawn_arena`](crate::spawn_arena)), which owns one `Arena` and
//! feeds it commands one at a time, so no method here ever observes a
//! half-resolved round.
//!
//! # Round resolution
//!
//! A round resolves as soon as every living player has a pending intent
//! (or when the round timer forces it). Players move in join order, one
//! cell per unit of speed:
//!
//! - off the grid: the player dies and stays on its last in-bounds cell
//! - into any non-empty cell: the player dies there and the cell becomes
//!   blocked, so anyone else who already stopped on it this round dies too
//! - every sixth round, all but the last two cells of a move are a jump:
//!   no checks and no trail

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use lightrace_protocol::{Action, ArenaId, Direction, PlayerId, Snapshot};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::board::Cell;
use crate::player::{ArenaOutbound, PlayerSender, Teardown};
use crate::snapshot::build_snapshot;
use crate::{ArenaConfig, ArenaError, Board, Phase, Player};

/// Rounds per jump cycle. The jump applies when the parity wraps to 0.
pub const JUMP_PERIOD: u8 = 6;

/// One match: board, roster and lifecycle.
pub struct Arena {
    id: ArenaId,
    config: ArenaConfig,
    board: Board,
    /// Indexed by join order; `players[i].id == PlayerId(i + 1)`.
    players: Vec<Player>,
    phase: Phase,
    round_parity: u8,
    rounds_played: u64,
    /// Bumped every time a round window opens.
    window: u64,
    deadline: Option<DateTime<Utc>>,
    rng: StdRng,
}

impl Arena {
    /// Creates a waiting arena with an OS-seeded RNG.
    pub fn new(id: ArenaId, config: ArenaConfig) -> Self {
        Self::with_rng(id, config, StdRng::from_os_rng())
    }

    /// Creates a waiting arena whose spawns are reproducible.
    pub fn with_seed(id: ArenaId, config: ArenaConfig, seed: u64) -> Self {
        Self::with_rng(id, config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(id: ArenaId, config: ArenaConfig, rng: StdRng) -> Self {
        let config = config.validated();
        Self {
            id,
            board: Board::new(config.width, config.height),
            config,
            players: Vec::new(),
            phase: Phase::Waiting,
            round_parity: 0,
            rounds_played: 0,
            window: 0,
            deadline: None,
            rng,
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn id(&self) -> ArenaId {
        self.id
    }

    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Players in join order.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.index_of(id).map(|i| &self.players[i])
    }

    pub fn alive_count(&self) -> usize {
        self.players.iter().filter(|p| p.alive).count()
    }

    /// Jump-cycle position of the last resolved round, in `0..JUMP_PERIOD`.
    pub fn round_parity(&self) -> u8 {
        self.round_parity
    }

    pub fn rounds_played(&self) -> u64 {
        self.rounds_played
    }

    /// Number of round windows opened so far. Changes exactly when a new
    /// window opens, so the actor can tell when to re-arm its timer.
    pub fn window(&self) -> u64 {
        self.window
    }

    /// When the open round will be force-resolved, if a timeout is set.
    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline
    }

    // -----------------------------------------------------------------------
    // Admission
    // -----------------------------------------------------------------------

    /// Admits a player on a random empty cell with a random heading.
    ///
    /// Starts the arena when the roster reaches `min_players`.
    pub fn join(&mut self, outbound: PlayerSender) -> Result<PlayerId, ArenaError> {
        self.ensure_joinable()?;
        if !self.board.has_empty() {
            return Err(ArenaError::BoardFull(self.id));
        }

        let (width, height) = (self.board.width() as i32, self.board.height() as i32);
        let (x, y) = loop {
            let x = self.rng.random_range(0..width);
            let y = self.rng.random_range(0..height);
            if self.board.is_empty(x, y) {
                break (x, y);
            }
        };
        let heading = Direction::ALL[self.rng.random_range(0..Direction::ALL.len())];

        self.join_at(x, y, heading, outbound)
    }

    /// Admits a player on a chosen cell and heading.
    pub fn join_at(
        &mut self,
        x: i32,
        y: i32,
        heading: Direction,
        outbound: PlayerSender,
    ) -> Result<PlayerId, ArenaError> {
        self.ensure_joinable()?;
        if !self.board.is_empty(x, y) {
            return Err(ArenaError::BadSpawn { x, y });
        }

        let id = PlayerId(self.players.len() as u32 + 1);
        self.board.place(x, y, id);
        self.players.push(Player::new(id, x, y, heading, outbound));

        info!(
            arena_id = %self.id,
            player_id = %id,
            x,
            y,
            ?heading,
            players = self.players.len(),
            min_players = self.config.min_players,
            "player joined"
        );

        if self.players.len() >= self.config.min_players {
            self.start();
        }
        Ok(id)
    }

    fn ensure_joinable(&self) -> Result<(), ArenaError> {
        if self.phase.is_joinable() {
            Ok(())
        } else {
            Err(ArenaError::JoinRejected {
                arena: self.id,
                phase: self.phase,
            })
        }
    }

    fn start(&mut self) {
        self.phase = Phase::Running;
        info!(arena_id = %self.id, players = self.players.len(), "arena started");
        self.open_window();
        self.broadcast();
    }

    // -----------------------------------------------------------------------
    // Intents and readiness
    // -----------------------------------------------------------------------

    /// Records a player's intent and resolves the round if it was the last
    /// one missing.
    ///
    /// Intents while waiting, and intents from dead players, are ignored.
    pub fn submit_intent(&mut self, id: PlayerId, action: Action) -> Result<(), ArenaError> {
        let index = self
            .index_of(id)
            .ok_or(ArenaError::UnknownPlayer(id, self.id))?;

        match self.phase {
            Phase::Closed => return Err(ArenaError::Closed(self.id)),
            Phase::Waiting => {
                debug!(arena_id = %self.id, player_id = %id, "intent before start, ignoring");
                return Ok(());
            }
            Phase::Running => {}
        }

        let player = &mut self.players[index];
        if !player.alive {
            debug!(arena_id = %self.id, player_id = %id, "intent from dead player, ignoring");
            return Ok(());
        }
        player.set_intent(action);

        if self.is_ready() {
            self.resolve_round();
        }
        Ok(())
    }

    /// `true` while running and every living player has a pending intent.
    pub fn is_ready(&self) -> bool {
        self.phase.is_running() && self.players.iter().all(|p| !p.alive || p.pending.is_some())
    }

    /// Resolves the open round even though some intents are missing.
    /// Missing intents count as [`Action::Nothing`].
    pub fn force_round(&mut self) {
        if !self.phase.is_running() {
            return;
        }
        let mut missing = 0;
        for player in self.players.iter_mut().filter(|p| p.alive && p.pending.is_none()) {
            player.set_intent(Action::Nothing);
            missing += 1;
        }
        info!(arena_id = %self.id, missing, "round deadline passed, forcing resolution");
        self.resolve_round();
    }

    // -----------------------------------------------------------------------
    // Resolution
    // -----------------------------------------------------------------------

    /// Applies every living player's intent and movement, broadcasts the
    /// result, and tears the arena down if nobody survived.
    ///
    /// No-op unless running.
    pub fn resolve_round(&mut self) {
        if !self.phase.is_running() {
            return;
        }

        self.round_parity = (self.round_parity + 1) % JUMP_PERIOD;
        let jump_round = self.round_parity == 0;

        for player in self.players.iter_mut().filter(|p| p.alive) {
            player.apply_intent();
            advance(&mut self.board, player, jump_round);
        }

        // A later mover may have crashed into the cell an earlier mover
        // stopped on.
        for player in self.players.iter_mut().filter(|p| p.alive) {
            if self.board.get(player.x, player.y) == Some(Cell::Blocked) {
                debug!(player_id = %player.id, x = player.x, y = player.y, "crashed into by later mover");
                player.kill();
            }
        }

        self.rounds_played += 1;
        let alive = self.alive_count();
        debug!(
            arena_id = %self.id,
            round = self.rounds_played,
            parity = self.round_parity,
            jump_round,
            alive,
            "round resolved"
        );

        if alive > 0 {
            self.open_window();
        }
        self.broadcast();
        if alive == 0 {
            self.close(Teardown::Finished);
        }
    }

    // -----------------------------------------------------------------------
    // Disconnects and teardown
    // -----------------------------------------------------------------------

    /// Reports that a player's connection is gone.
    ///
    /// With `forfeit_on_disconnect` the player dies where it stands, which
    /// may complete the round or end the match. A waiting arena whose
    /// players have all forfeited is closed before it ever starts.
    pub fn disconnect(&mut self, id: PlayerId) -> Result<(), ArenaError> {
        let index = self
            .index_of(id)
            .ok_or(ArenaError::UnknownPlayer(id, self.id))?;

        info!(arena_id = %self.id, player_id = %id, phase = %self.phase, "player disconnected");

        if !self.config.forfeit_on_disconnect || !self.players[index].alive {
            return Ok(());
        }
        self.players[index].kill();
        debug!(arena_id = %self.id, player_id = %id, "player forfeited");

        if self.alive_count() == 0 {
            self.close(Teardown::Finished);
        } else if self.is_ready() {
            self.resolve_round();
        }
        Ok(())
    }

    /// Sends every player a final snapshot followed by a close notice.
    /// Idempotent.
    pub fn close(&mut self, reason: Teardown) {
        if self.phase == Phase::Closed {
            return;
        }
        self.phase = Phase::Closed;
        self.deadline = None;

        for player in &self.players {
            player.send(ArenaOutbound::Snapshot(self.snapshot_for(player.id)));
            player.send(ArenaOutbound::Closed(reason));
        }

        info!(
            arena_id = %self.id,
            ?reason,
            rounds = self.rounds_played,
            players = self.players.len(),
            "arena closed"
        );
    }

    // -----------------------------------------------------------------------
    // Snapshots
    // -----------------------------------------------------------------------

    /// The state as seen by `you`.
    pub fn snapshot_for(&self, you: PlayerId) -> Snapshot {
        let deadline = self
            .deadline
            .map(|d| d.to_rfc3339_opts(SecondsFormat::Millis, true))
            .unwrap_or_default();
        build_snapshot(&self.board, &self.players, you, self.phase.is_running(), &deadline)
    }

    fn broadcast(&self) {
        for player in &self.players {
            player.send(ArenaOutbound::Snapshot(self.snapshot_for(player.id)));
        }
    }

    fn open_window(&mut self) {
        self.window += 1;
        self.deadline = self
            .config
            .round_timeout
            .and_then(|t| TimeDelta::from_std(t).ok())
            .and_then(|t| Utc::now().checked_add_signed(t));
    }

    fn index_of(&self, id: PlayerId) -> Option<usize> {
        let index = (id.0 as usize).checked_sub(1)?;
        (index < self.players.len()).then_some(index)
    }
}

/// Moves one player `speed` cells along its heading.
fn advance(board: &mut Board, player: &mut Player, jump_round: bool) {
    let (dx, dy) = player.heading.delta();
    let speed = i32::from(player.speed);
    let mut last_in_bounds = (player.x, player.y);

    for step in 0..speed {
        let (nx, ny) = (player.x + dx, player.y + dy);

        if jump_round && step < speed - 2 {
            player.x = nx;
            player.y = ny;
            if board.in_bounds(nx, ny) {
                last_in_bounds = (nx, ny);
            }
            continue;
        }

        if !board.in_bounds(nx, ny) {
            (player.x, player.y) = last_in_bounds;
            debug!(player_id = %player.id, step, "left the board");
            player.kill();
            return;
        }

        player.x = nx;
        player.y = ny;
        last_in_bounds = (nx, ny);

        if !board.is_empty(nx, ny) {
            board.block(nx, ny);
            debug!(player_id = %player.id, x = nx, y = ny, step, "crashed");
            player.kill();
            return;
        }
        board.place(nx, ny, player.id);
    }
}

// =========================================================================
// Tests
// =========================================================================
