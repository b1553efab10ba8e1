//! Round deadline timer for Lightrace.
//!
//! Rounds normally advance only once every living player has submitted an
//! intent. A [`RoundTimer`] adds an optional upper bound: each time a round
//! window opens the arena arms the timer, and if the window is still open
//! when the deadline passes the arena force-resolves it.
//!
//! # Barrier-only mode
//!
//! With no timeout configured, [`RoundTimer::wait_for_expiry`] pends
//! forever. This keeps the arena's `tokio::select!` loop identical whether
//! or not a timeout is in use.
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* join, intent, disconnect */ }
//!         expiry = timer.wait_for_expiry() => {
//!             arena.force_round();
//!         }
//!     }
//! }
//! ```

use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for a [`RoundTimer`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoundTimerConfig {
    /// How long a round window may stay open. `None` = barrier-only.
    pub timeout: Option<Duration>,
}

impl RoundTimerConfig {
    /// Shortest accepted timeout. Anything lower would resolve rounds
    /// before a client could plausibly answer.
    pub const MIN_TIMEOUT: Duration = Duration::from_millis(50);

    /// Longest accepted timeout.
    pub const MAX_TIMEOUT: Duration = Duration::from_secs(3600);

    /// A config that force-resolves rounds after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
        }
    }

    /// Clamps the timeout into `[MIN_TIMEOUT, MAX_TIMEOUT]`.
    ///
    /// Called automatically by [`RoundTimer::new`].
    pub fn validated(mut self) -> Self {
        if let Some(timeout) = self.timeout {
            let clamped = timeout.clamp(Self::MIN_TIMEOUT, Self::MAX_TIMEOUT);
            if clamped != timeout {
                warn!(
                    requested_ms = timeout.as_millis() as u64,
                    clamped_ms = clamped.as_millis() as u64,
                    "round timeout out of range, clamping"
                );
            }
            self.timeout = Some(clamped);
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Expiry info and stats
// ---------------------------------------------------------------------------

/// Returned by [`RoundTimer::wait_for_expiry`] when a window runs out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expiry {
    /// The window that expired (1 for the first armed window).
    pub window: u64,
    /// How far past the deadline the timer actually woke up.
    pub late_by: Duration,
}

/// Counters kept by the timer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimerStats {
    /// Windows opened with [`RoundTimer::arm`].
    pub windows_armed: u64,
    /// Windows that ran out before being re-armed or disarmed.
    pub expirations: u64,
}

// ---------------------------------------------------------------------------
// Timer
// ---------------------------------------------------------------------------

/// One-shot-per-window deadline timer. One per arena actor.
pub struct RoundTimer {
    timeout: Option<Duration>,
    /// Deadline of the open window, if armed.
    deadline: Option<Instant>,
    window: u64,
    stats: TimerStats,
}

impl RoundTimer {
    /// Creates a disarmed timer from config.
    pub fn new(config: RoundTimerConfig) -> Self {
        let config = config.validated();
        match config.timeout {
            Some(t) => debug!(timeout_ms = t.as_millis() as u64, "round timer created"),
            None => debug!("round timer created in barrier-only mode"),
        }
        Self {
            timeout: config.timeout,
            deadline: None,
            window: 0,
            stats: TimerStats::default(),
        }
    }

    /// Opens a new round window, replacing any window still open.
    ///
    /// Returns the deadline, or `None` in barrier-only mode.
    pub fn arm(&mut self) -> Option<Instant> {
        let timeout = self.timeout?;
        let deadline = Instant::now() + timeout;
        self.window += 1;
        self.deadline = Some(deadline);
        self.stats.windows_armed += 1;
        trace!(window = self.window, "round window armed");
        Some(deadline)
    }

    /// Closes the current window without firing.
    pub fn disarm(&mut self) {
        if self.deadline.take().is_some() {
            trace!(window = self.window, "round window disarmed");
        }
    }

    /// Waits until the open window expires.
    ///
    /// Pends forever when disarmed or in barrier-only mode. The
    /// window is consumed on expiry, so this fires at most once per
    /// [`arm`](Self::arm). Cancel-safe: dropping the future before it
    /// completes leaves the window untouched.
    pub async fn wait_for_expiry(&mut self) -> Expiry {
        let Some(deadline) = self.deadline else {
            return std::future::pending().await;
        };

        time::sleep_until(deadline).await;

        let late_by = Instant::now().saturating_duration_since(deadline);
        self.deadline = None;
        self.stats.expirations += 1;
        debug!(
            window = self.window,
            late_ms = late_by.as_millis() as u64,
            "round window expired"
        );

        Expiry {
            window: self.window,
            late_by,
        }
    }

    /// Whether a window is currently open and counting down.
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Whether this timer can ever fire.
    pub fn is_barrier_only(&self) -> bool {
        self.timeout.is_none()
    }

    /// The configured (clamped) timeout.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Number of the most recently armed window (0 before the first).
    pub fn window(&self) -> u64 {
        self.window
    }

    /// Counters since creation.
    pub fn stats(&self) -> &TimerStats {
        &self.stats
    }
}
