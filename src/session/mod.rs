//! # Telemetry Session Module
//!
//! The state machine arbitrating between live streaming and backlog replay.
//!
//! Four flags collapse to three observable modes: Idle (nothing set), Live
//! (`subscribed_live`), and Backlog (`backlog_in_progress`, single-flight).
//! Transport callbacks and the producer loop touch the same state from
//! different execution contexts, so all fields live behind one mutex and the
//! transition methods below are the only mutation surface — no raw field
//! access, no module-level globals.

use std::sync::Mutex;

use tracing::{debug, info, warn};

/// The four session flags, reset as a unit on disconnect
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct SessionFlags {
    subscribed_live: bool,
    subscribed_backlog: bool,
    backlog_requested: bool,
    backlog_in_progress: bool,
}

/// Telemetry session state, shared between the transport event handlers and
/// the producer loop via `Arc`
#[derive(Debug, Default)]
pub struct TelemetrySession {
    flags: Mutex<SessionFlags>,
}

impl TelemetrySession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscription change on the live notification channel
    pub fn on_subscribe_live(&self, enabled: bool) {
        self.flags.lock().unwrap().subscribed_live = enabled;
        info!("Live notify subscription: {}", enabled);
    }

    /// Subscription change on the backlog notification channel
    pub fn on_subscribe_backlog(&self, enabled: bool) {
        self.flags.lock().unwrap().subscribed_backlog = enabled;
        info!("Backlog notify subscription: {}", enabled);
    }

    /// Inbound "replay backlog" command
    ///
    /// At most one replay may run at a time: while a replay is in progress
    /// the request is dropped with a log line, not queued.
    pub fn on_backlog_command(&self) {
        let mut flags = self.flags.lock().unwrap();
        if flags.backlog_in_progress {
            warn!("Backlog replay already in progress, dropping request");
            return;
        }
        flags.backlog_requested = true;
        debug!("Backlog replay requested");
    }

    /// Atomically read and clear the pending backlog request
    ///
    /// Polled by the producer loop once per tick to decide whether to enter
    /// a replay.
    pub fn take_backlog_request(&self) -> bool {
        let mut flags = self.flags.lock().unwrap();
        std::mem::take(&mut flags.backlog_requested)
    }

    /// Mark a backlog replay as started
    pub fn enter_backlog(&self) {
        self.flags.lock().unwrap().backlog_in_progress = true;
    }

    /// Mark the backlog replay as finished
    ///
    /// Called on every exit path, including an early abort on notify
    /// failure, so the in-progress flag is never left stuck.
    pub fn exit_backlog(&self) {
        self.flags.lock().unwrap().backlog_in_progress = false;
    }

    /// Whether the client is subscribed to live notifications
    pub fn live_subscribed(&self) -> bool {
        self.flags.lock().unwrap().subscribed_live
    }

    /// Whether the client is subscribed to backlog notifications
    pub fn backlog_subscribed(&self) -> bool {
        self.flags.lock().unwrap().subscribed_backlog
    }

    /// Whether a backlog replay is currently running
    pub fn backlog_in_progress(&self) -> bool {
        self.flags.lock().unwrap().backlog_in_progress
    }

    /// Transport link lost: reset everything to Idle
    ///
    /// A reconnecting client must re-subscribe and re-request backlog
    /// explicitly; no state survives a disconnect.
    pub fn on_disconnect(&self) {
        *self.flags.lock().unwrap() = SessionFlags::default();
        info!("Link lost, session reset to idle");
    }
}
