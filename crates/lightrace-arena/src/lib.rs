//! Arena lifecycle and round resolution for Lightrace.
//!
//! Each arena (one match) runs as an isolated Tokio task (actor model)
//! owning its board, roster and round timer.
//!
//! # Key types
//!
//! - [`Arena`]: the synchronous engine (joins, intents, round resolution)
//! - [`Registry`]: routes connections to the arena accepting players
//! - [`ArenaHandle`]: send commands to a running arena actor
//! - [`Phase`]: lifecycle state machine
//! - [`ArenaConfig`]: board size, roster size, timeout, forfeit policy

mod actor;
mod arena;
mod board;
mod config;
mod error;
mod player;
mod registry;
mod snapshot;

pub use actor::{ArenaHandle, ArenaInfo, JoinTicket, spawn_arena};
pub use arena::{Arena, JUMP_PERIOD};
pub use board::{Board, Cell};
pub use config::{ArenaConfig, Phase};
pub use error::ArenaError;
pub use player::{ArenaOutbound, MAX_SPEED, MIN_SPEED, Player, PlayerSender, Teardown};
pub use registry::{Registry, Seat};
pub use snapshot::build_snapshot;
