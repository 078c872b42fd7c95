//! The protocol engine seam and the marshalling boundary.
//!
//! The engine owns the wire protocol: handshake, encodings, transport.  It
//! reports back asynchronously, usually from its own update-producer thread.
//! Those reports must never touch session state directly.  Instead the engine
//! posts them through an [`EngineEventSender`], which tags every event with
//! the [`SessionId`] of the connect attempt it belongs to and pushes it onto a
//! single-consumer channel drained by the session thread.
//!
//! # Why tag events with a session id? (for beginners)
//!
//! After a disconnect the old engine thread may still be winding down and
//! post a late "connection lost" or "framebuffer update".  If the user has
//! already reconnected, that late event would be applied to the *new*
//! session.  Tagging lets the session drop anything whose id no longer
//! matches the live attempt.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rfb_core::{FramebufferInfo, KeyEvent, PointerEvent, Rect};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

/// Errors reported by a protocol engine.
///
/// These never cross the marshalling boundary as errors; the session turns
/// every one of them into a single connection-lost notification.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("connection closed")]
    Closed,
}

/// Identifies one connect attempt.  A fresh id is allocated on every
/// `connect`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parameters handed to [`ProtocolEngine::open`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenRequest {
    pub host: String,
    pub port: u16,
    pub display: u16,
    /// Ask the server to leave other viewers connected.
    pub shared: bool,
    pub view_only: bool,
}

/// Deferred paint of a decoded rectangle into the local surface.
///
/// Runs on the session thread, before the invalidation rectangle is computed.
pub struct DrawOp(Box<dyn FnOnce() + Send>);

impl DrawOp {
    pub fn new(draw: impl FnOnce() + Send + 'static) -> Self {
        Self(Box::new(draw))
    }

    pub fn run(self) {
        (self.0)()
    }
}

impl fmt::Debug for DrawOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DrawOp")
    }
}

/// Inbound notifications from the engine.
#[derive(Debug)]
pub enum EngineEvent {
    /// The transport is open; `needs_password` tells whether the server
    /// selected a password security type.
    Opened { needs_password: bool },
    /// One framebuffer update response has been decoded.  `rect` is in
    /// framebuffer coordinates.
    FramebufferUpdate { rect: Rect, draw: Option<DrawOp> },
    ConnectionLost { reason: String },
    RemoteClipboardChanged { text: String },
}

/// An engine event tagged with the attempt it belongs to.
#[derive(Debug)]
pub struct MarshalledEvent {
    pub session: SessionId,
    pub event: EngineEvent,
}

/// Thread-safe handle the engine uses to post events to the session thread.
///
/// Cloning is cheap; all clones share the same connection-lost latch, so at
/// most one `ConnectionLost` per attempt ever reaches the channel no matter
/// how many threads report it.
#[derive(Debug, Clone)]
pub struct EngineEventSender {
    session: SessionId,
    tx: mpsc::UnboundedSender<MarshalledEvent>,
    lost: Arc<AtomicBool>,
}

impl EngineEventSender {
    pub fn new(session: SessionId, tx: mpsc::UnboundedSender<MarshalledEvent>) -> Self {
        Self {
            session,
            tx,
            lost: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn session_id(&self) -> SessionId {
        self.session
    }

    /// Posts `event` without blocking.
    ///
    /// Returns `false` if the event was suppressed (duplicate connection
    /// loss) or the session side has gone away.
    pub fn send(&self, event: EngineEvent) -> bool {
        if matches!(event, EngineEvent::ConnectionLost { .. })
            && self.lost.swap(true, Ordering::AcqRel)
        {
            debug!(session = %self.session, "duplicate connection loss suppressed");
            return false;
        }
        self.tx
            .send(MarshalledEvent {
                session: self.session,
                event,
            })
            .is_ok()
    }
}

/// Wire protocol collaborator.
///
/// Methods are called only from the session thread.  Implementations that
/// run a background producer post results through the sender given to
/// [`ProtocolEngine::open`].
pub trait ProtocolEngine: Send + Sync {
    /// Starts opening the transport.  Completion is reported later as
    /// [`EngineEvent::Opened`].
    fn open(&self, request: &OpenRequest, events: EngineEventSender) -> Result<(), EngineError>;

    /// Checks a password against the server.  `Ok(false)` means rejected.
    fn verify_credential(&self, password: &str) -> Result<bool, EngineError>;

    /// Finishes the handshake and returns the remote framebuffer description.
    fn complete_handshake(&self) -> Result<FramebufferInfo, EngineError>;

    /// Starts the update-producer thread.
    fn start_updates(&self) -> Result<(), EngineError>;

    fn request_update(&self, full: bool) -> Result<(), EngineError>;

    fn send_key_event(&self, event: KeyEvent) -> Result<(), EngineError>;

    fn send_pointer_event(&self, event: PointerEvent) -> Result<(), EngineError>;

    fn send_clipboard_text(&self, text: &str) -> Result<(), EngineError>;

    /// Tears down the transport.  Must be safe to call more than once.
    fn close(&self);
}
