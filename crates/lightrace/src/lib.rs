//! # Lightrace
//!
//! Server for a real-time, grid-based light-trail racing game.
//!
//! Players connect over WebSocket, are grouped into arenas of a fixed
//! size, and send one action per round. Each round every living player
//! moves, leaving an impassable trail; the last ones standing win. After
//! every round each player receives the full board.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lightrace::prelude::*;
//!
//! # async fn start() -> Result<(), LightraceError> {
//! let server = LightraceServer::builder()
//!     .bind("0.0.0.0:8081")
//!     .build()
//!     .await?;
//! server.run_until(async { let _ = tokio::signal::ctrl_c().await; }).await
//! # }
//! ```

mod error;
mod handler;
mod server;

pub use error::LightraceError;
pub use server::{LightraceServer, LightraceServerBuilder};

/// Everything needed to configure and run a server, plus the wire types
/// clients exchange with it.
pub mod prelude {
    pub use crate::{LightraceError, LightraceServer, LightraceServerBuilder};
    pub use lightrace_arena::ArenaConfig;
    pub use lightrace_protocol::{
        Action, ActionMessage, CELL_BLOCKED, CELL_EMPTY, Direction, PlayerId, PlayerView,
        Snapshot,
    };
}
