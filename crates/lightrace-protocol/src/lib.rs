//! Wire protocol for Lightrace.
//!
//! This crate defines what clients and the server say to each other:
//!
//! - **Types** ([`ActionMessage`], [`Snapshot`], [`Direction`], ids):
//!   the structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those structures
//!   are converted to and from bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong while doing so.
//!
//! ```text
//! Transport (bytes) → Protocol (ActionMessage / Snapshot) → Arena (game rules)
//! ```
//!
//! The protocol layer knows nothing about connections or arenas.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    Action, ActionMessage, ArenaId, CELL_BLOCKED, CELL_EMPTY, Direction,
    PlayerId, PlayerView, Snapshot,
};
