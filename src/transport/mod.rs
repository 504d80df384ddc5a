//! # Transport Module
//!
//! The seam between the telemetry core and the wireless stack.
//!
//! The core never talks to a radio directly: it needs "send these bytes to
//! the current peer" (the [`Transport`] trait) and "tell me when link or
//! subscription state changes" ([`LinkEvents`]). Connection establishment,
//! attribute registration, pairing, and frame encoding all live on the other
//! side of this boundary.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::session::TelemetrySession;

/// Inbound command opcode: replay the persisted backlog
pub const OPCODE_BACKLOG_REQUEST: u8 = 0x01;

/// The two logical notification channels, so a client can distinguish
/// stream types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Freshly produced samples, pushed as they happen
    Live,
    /// Replay of previously persisted samples
    Backlog,
}

/// Errors surfaced by a transport notify
#[derive(Debug, Error)]
pub enum TransportError {
    /// No peer is connected or the link dropped mid-send
    #[error("No active link")]
    NoLink,

    /// The transport's outbound buffers are exhausted
    #[error("Notify buffer exhausted")]
    BufferExhausted,

    /// Any other stack-specific failure
    #[error("Transport error: {0}")]
    Other(String),
}

/// Outbound notify primitive the core consumes
#[async_trait]
pub trait Transport: Send + Sync {
    /// Push one frame to the current peer on the given channel
    async fn notify(&self, channel: Channel, payload: &[u8]) -> Result<(), TransportError>;
}

/// Inbound event surface, bound to a [`TelemetrySession`]
///
/// The wireless stack invokes these from its own execution context; each
/// handler only flips session flags and returns, so none of them may block
/// on storage or pacing.
#[derive(Debug, Clone)]
pub struct LinkEvents {
    session: Arc<TelemetrySession>,
}

impl LinkEvents {
    pub fn new(session: Arc<TelemetrySession>) -> Self {
        Self { session }
    }

    /// A peer connected
    pub fn on_link_established(&self) {
        info!("Link established");
    }

    /// The peer disconnected; the session resets to idle
    pub fn on_link_lost(&self) {
        self.session.on_disconnect();
    }

    /// The peer changed its subscription on a notification channel
    pub fn on_subscribe_changed(&self, channel: Channel, enabled: bool) {
        match channel {
            Channel::Live => self.session.on_subscribe_live(enabled),
            Channel::Backlog => self.session.on_subscribe_backlog(enabled),
        }
    }

    /// The peer wrote a command; unrecognized opcodes are logged and ignored
    pub fn on_command_received(&self, opcode: u8) {
        match opcode {
            OPCODE_BACKLOG_REQUEST => self.session.on_backlog_command(),
            other => warn!("Ignoring unknown command opcode 0x{:02X}", other),
        }
    }
}

/// Channel-backed transport for running the pipeline without radio hardware
///
/// Frames are forwarded to an mpsc receiver; a closed receiver reads as a
/// dropped link.
pub struct LoopbackTransport {
    tx: tokio::sync::mpsc::UnboundedSender<(Channel, Vec<u8>)>,
}

impl LoopbackTransport {
    /// Create the transport and the receiving end of its frame stream
    pub fn new() -> (
        Self,
        tokio::sync::mpsc::UnboundedReceiver<(Channel, Vec<u8>)>,
    ) {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl Transport for LoopbackTransport {
    async fn notify(&self, channel: Channel, payload: &[u8]) -> Result<(), TransportError> {
        self.tx
            .send((channel, payload.to_vec()))
            .map_err(|_| TransportError::NoLink)?;
        debug!("Loopback notify on {:?} ({} bytes)", channel, payload.len());
        Ok(())
    }
}
