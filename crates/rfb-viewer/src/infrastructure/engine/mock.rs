//! Mock protocol engine for unit tests and the demo binary.
//!
//! # Why a mock engine?
//!
//! A real engine needs a reachable RFB server.  The `MockProtocolEngine`
//! replaces the wire with in-memory recording: every call is pushed into a
//! `Mutex<Vec<EngineCall>>` so tests can assert exactly what the session
//! sent and in what order.
//!
//! It also keeps the [`EngineEventSender`] handed to `open`, so tests can
//! play the update-producer thread: [`MockProtocolEngine::lose_connection`],
//! [`MockProtocolEngine::deliver_update`] and friends post events exactly as
//! a background thread would.
//!
//! # Usage in tests
//!
//! ```ignore
//! let engine = Arc::new(MockProtocolEngine::new(info).with_password("secret"));
//! // ... connect a session, drain events ...
//! engine.lose_connection("reset by peer");
//! assert_eq!(engine.count(|c| matches!(c, EngineCall::Close)), 1);
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use rfb_core::{FramebufferInfo, KeyEvent, PointerEvent, Rect};

use crate::application::engine::{
    DrawOp, EngineError, EngineEvent, EngineEventSender, OpenRequest, ProtocolEngine,
};

/// One recorded engine call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    Open(OpenRequest),
    VerifyCredential(String),
    CompleteHandshake,
    StartUpdates,
    RequestUpdate { full: bool },
    Key(KeyEvent),
    Pointer(PointerEvent),
    Clipboard(String),
    Close,
}

/// A scripted engine that records every call.
pub struct MockProtocolEngine {
    calls: Mutex<Vec<EngineCall>>,
    sender: Mutex<Option<EngineEventSender>>,
    framebuffer: FramebufferInfo,
    /// `Some` makes `open` report `needs_password = true` and only this
    /// password verifies.
    password: Option<String>,
    fail_open: Option<String>,
    fail_sends: AtomicBool,
}

impl Default for MockProtocolEngine {
    fn default() -> Self {
        Self::new(FramebufferInfo {
            width: 1024,
            height: 768,
            name: "mock desktop".to_string(),
        })
    }
}

impl MockProtocolEngine {
    /// An engine that opens without a password and reports `framebuffer`.
    pub fn new(framebuffer: FramebufferInfo) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            sender: Mutex::new(None),
            framebuffer,
            password: None,
            fail_open: None,
            fail_sends: AtomicBool::new(false),
        }
    }

    /// Requires `password` during the handshake.
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Makes `open` fail synchronously with a transport error.
    #[must_use]
    pub fn failing_open(mut self, reason: impl Into<String>) -> Self {
        self.fail_open = Some(reason.into());
        self
    }

    /// When set, every outbound send returns [`EngineError::Transport`].
    pub fn set_fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    /// All recorded calls, in order.
    pub fn calls(&self) -> Vec<EngineCall> {
        lock(&self.calls).clone()
    }

    /// Number of recorded calls matching `pred`.
    pub fn count(&self, pred: impl Fn(&EngineCall) -> bool) -> usize {
        lock(&self.calls).iter().filter(|c| pred(c)).count()
    }

    /// Key events sent so far.
    pub fn key_events(&self) -> Vec<KeyEvent> {
        lock(&self.calls)
            .iter()
            .filter_map(|c| match c {
                EngineCall::Key(k) => Some(*k),
                _ => None,
            })
            .collect()
    }

    /// Pointer events sent so far.
    pub fn pointer_events(&self) -> Vec<PointerEvent> {
        lock(&self.calls)
            .iter()
            .filter_map(|c| match c {
                EngineCall::Pointer(p) => Some(*p),
                _ => None,
            })
            .collect()
    }

    /// The `full` flag of every update request, in order.
    pub fn update_requests(&self) -> Vec<bool> {
        lock(&self.calls)
            .iter()
            .filter_map(|c| match c {
                EngineCall::RequestUpdate { full } => Some(*full),
                _ => None,
            })
            .collect()
    }

    pub fn clear_calls(&self) {
        lock(&self.calls).clear();
    }

    /// The sender from the most recent `open`, for posting from other threads.
    pub fn sender(&self) -> Option<EngineEventSender> {
        lock(&self.sender).clone()
    }

    /// Posts `event` as the producer thread would.  Returns `false` when
    /// nothing was delivered.
    pub fn emit(&self, event: EngineEvent) -> bool {
        self.sender().is_some_and(|s| s.send(event))
    }

    pub fn lose_connection(&self, reason: impl Into<String>) -> bool {
        self.emit(EngineEvent::ConnectionLost { reason: reason.into() })
    }

    pub fn deliver_update(&self, rect: Rect) -> bool {
        self.emit(EngineEvent::FramebufferUpdate { rect, draw: None })
    }

    pub fn deliver_update_with(&self, rect: Rect, draw: DrawOp) -> bool {
        self.emit(EngineEvent::FramebufferUpdate { rect, draw: Some(draw) })
    }

    pub fn change_remote_clipboard(&self, text: impl Into<String>) -> bool {
        self.emit(EngineEvent::RemoteClipboardChanged { text: text.into() })
    }

    fn record(&self, call: EngineCall) {
        lock(&self.calls).push(call);
    }

    fn send(&self, call: EngineCall) -> Result<(), EngineError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(EngineError::Transport("mock send failure".into()));
        }
        self.record(call);
        Ok(())
    }
}

impl ProtocolEngine for MockProtocolEngine {
    fn open(&self, request: &OpenRequest, events: EngineEventSender) -> Result<(), EngineError> {
        self.record(EngineCall::Open(request.clone()));
        if let Some(reason) = &self.fail_open {
            return Err(EngineError::Transport(reason.clone()));
        }
        *lock(&self.sender) = Some(events.clone());
        events.send(EngineEvent::Opened {
            needs_password: self.password.is_some(),
        });
        Ok(())
    }

    fn verify_credential(&self, password: &str) -> Result<bool, EngineError> {
        self.record(EngineCall::VerifyCredential(password.to_string()));
        Ok(self.password.as_deref() == Some(password))
    }

    fn complete_handshake(&self) -> Result<FramebufferInfo, EngineError> {
        self.record(EngineCall::CompleteHandshake);
        Ok(self.framebuffer.clone())
    }

    fn start_updates(&self) -> Result<(), EngineError> {
        self.record(EngineCall::StartUpdates);
        Ok(())
    }

    fn request_update(&self, full: bool) -> Result<(), EngineError> {
        self.send(EngineCall::RequestUpdate { full })
    }

    fn send_key_event(&self, event: KeyEvent) -> Result<(), EngineError> {
        self.send(EngineCall::Key(event))
    }

    fn send_pointer_event(&self, event: PointerEvent) -> Result<(), EngineError> {
        self.send(EngineCall::Pointer(event))
    }

    fn send_clipboard_text(&self, text: &str) -> Result<(), EngineError> {
        self.send(EngineCall::Clipboard(text.to_string()))
    }

    fn close(&self) {
        self.record(EngineCall::Close);
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
