//! Session: the connect → authenticate → initialize → run → disconnect
//! state machine.
//!
//! # States
//!
//! ```text
//!               connect()              Opened / authenticate() ok
//! Disconnected ───────────> Connecting ──────────────────────────> Connected
//!      ^                       │                                       │
//!      │  cancel / auth fail / │ loss                 disconnect() /   │
//!      └───────────────────────┘                      engine loss      v
//!      └──────────────────────────────────────────────────────── Disconnecting
//! ```
//!
//! # Threading
//!
//! A `Session` is owned by exactly one thread (the event loop task in
//! [`super::event_loop`]).  All public calls and all marshalled engine events
//! arrive there, so the state enum, modifier snapshot and scheduler flags
//! need no locks.  Engine threads only ever hold an
//! [`EngineEventSender`](super::engine::EngineEventSender).
//!
//! # Failure discipline
//!
//! - Caller mistakes (`InvalidState`, `InvalidArgument`) are returned as
//!   [`SessionError`] and leave the state untouched.
//! - Remote failures (transport loss, rejected password, failed send) never
//!   surface as errors.  Each becomes exactly one
//!   [`SessionObserver::on_connection_lost`] call.
//! - A missing credential is a soft cancel: the attempt is abandoned and no
//!   notification fires.

use std::fmt;
use std::sync::Arc;

use rfb_core::{
    protocol::messages::port_for_display, DesktopTransformPolicy, FramebufferInfo, KeySymbol,
    ModifierState, Point, Rect, Size, SpecialKeys,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use super::engine::{
    DrawOp, EngineError, EngineEvent, EngineEventSender, MarshalledEvent, OpenRequest,
    ProtocolEngine, SessionId,
};
use super::forward_input::{InputForwarder, Outbound, ReservedKeyHook};
use super::special_keys::send_sequence;
use super::update_scheduler::UpdateScheduler;
use crate::infrastructure::input_source::RawInputEvent;

/// Reason reported when the server rejects the password.
pub const AUTHENTICATION_FAILED: &str = "Authentication failed";

/// Viewport used until the hosting view reports its real size.
pub const DEFAULT_VIEWPORT: Size = Size::new(800, 600);

/// Lifecycle state of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected,
    Disconnecting,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::Disconnected => "disconnected",
            SessionState::Connecting => "connecting",
            SessionState::Connected => "connected",
            SessionState::Disconnecting => "disconnecting",
        };
        f.write_str(s)
    }
}

/// Errors returned synchronously to the caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("{operation} is not valid while {state}")]
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Arguments to [`Session::connect`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectParams {
    pub host: String,
    /// Display number; must not be negative.
    pub display: i32,
    /// Explicit TCP port.  `None` means `5900 + display`.
    pub port: Option<u16>,
    pub shared: bool,
    pub view_only: bool,
    pub scaled: bool,
    pub intercept_reserved_keys: bool,
}

impl ConnectParams {
    pub fn new(host: impl Into<String>, display: i32) -> Self {
        Self {
            host: host.into(),
            display,
            port: None,
            shared: true,
            view_only: false,
            scaled: false,
            intercept_reserved_keys: true,
        }
    }

    #[must_use]
    pub fn view_only(mut self, view_only: bool) -> Self {
        self.view_only = view_only;
        self
    }

    #[must_use]
    pub fn scaled(mut self, scaled: bool) -> Self {
        self.scaled = scaled;
        self
    }

    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    fn validate(&self) -> Result<(u16, u16), SessionError> {
        if self.host.trim().is_empty() {
            return Err(SessionError::InvalidArgument("host must not be empty".into()));
        }
        let display = u16::try_from(self.display).map_err(|_| {
            SessionError::InvalidArgument(format!("display {} is out of range", self.display))
        })?;
        let port = match self.port {
            Some(p) => p,
            None => port_for_display(display).ok_or_else(|| {
                SessionError::InvalidArgument(format!("display {display} has no valid port"))
            })?,
        };
        Ok((display, port))
    }
}

/// Supplies passwords on demand.
///
/// Called synchronously on the session thread and may block on user
/// interaction.  On a multi-threaded Tokio runtime the call runs inside
/// `block_in_place`; on a current-thread runtime it blocks the whole loop, so
/// interactive providers need the multi-threaded flavour.  `None` means the
/// user cancelled.
#[cfg_attr(test, mockall::automock)]
pub trait CredentialProvider: Send + Sync {
    fn request_credential(&self, host: &str) -> Option<String>;
}

/// Notifications to the renderer/UI.
pub trait SessionObserver: Send + Sync {
    fn on_connect_complete(&self, width: u32, height: u32, name: &str);
    /// `None` for a requested disconnect, `Some(reason)` for a failure.
    fn on_connection_lost(&self, reason: Option<&str>);
    fn on_clipboard_changed(&self, text: &str);
    /// Viewport rectangle that must be repainted.
    fn on_invalidate(&self, rect: Rect);
}

/// Details of the live connect attempt.
#[derive(Debug, Clone)]
struct Attempt {
    id: SessionId,
    host: String,
    port: u16,
    display: u16,
    shared: bool,
    view_only: bool,
    intercept_reserved_keys: bool,
}

/// The session state machine.  See the module docs.
pub struct Session {
    engine: Arc<dyn ProtocolEngine>,
    credentials: Arc<dyn CredentialProvider>,
    observer: Arc<dyn SessionObserver>,
    hook: Arc<dyn ReservedKeyHook>,
    events: mpsc::UnboundedSender<MarshalledEvent>,

    state: SessionState,
    attempt: Option<Attempt>,
    password_pending: bool,
    hook_armed: bool,
    scaled: bool,
    viewport: Size,
    framebuffer: Option<FramebufferInfo>,
    policy: DesktopTransformPolicy,
    scheduler: UpdateScheduler,
    input: InputForwarder,
}

impl Session {
    /// Creates a disconnected session.
    ///
    /// `events` is the producer half of the marshalling channel; every engine
    /// opened by this session posts through a clone of it.
    pub fn new(
        engine: Arc<dyn ProtocolEngine>,
        credentials: Arc<dyn CredentialProvider>,
        observer: Arc<dyn SessionObserver>,
        hook: Arc<dyn ReservedKeyHook>,
        events: mpsc::UnboundedSender<MarshalledEvent>,
    ) -> Self {
        Self {
            engine,
            credentials,
            observer,
            hook,
            events,
            state: SessionState::Disconnected,
            attempt: None,
            password_pending: false,
            hook_armed: false,
            scaled: false,
            viewport: DEFAULT_VIEWPORT,
            framebuffer: None,
            policy: DesktopTransformPolicy::design_mode(DEFAULT_VIEWPORT),
            scheduler: UpdateScheduler::new(),
            input: InputForwarder::default(),
        }
    }

    /// Replaces the default key translator (e.g. with a platform layout).
    #[must_use]
    pub fn with_input_forwarder(mut self, input: InputForwarder) -> Self {
        self.input = input;
        self
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Id of the live connect attempt, if any.
    pub fn session_id(&self) -> Option<SessionId> {
        self.attempt.as_ref().map(|a| a.id)
    }

    pub fn is_password_pending(&self) -> bool {
        self.password_pending
    }

    pub fn is_view_only(&self) -> bool {
        self.attempt.as_ref().is_some_and(|a| a.view_only)
    }

    pub fn policy(&self) -> &DesktopTransformPolicy {
        &self.policy
    }

    pub fn framebuffer(&self) -> Option<&FramebufferInfo> {
        self.framebuffer.as_ref()
    }

    pub fn modifiers(&self) -> ModifierState {
        self.input.modifiers()
    }

    pub fn scheduler(&self) -> &UpdateScheduler {
        &self.scheduler
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────────

    /// Starts a connect attempt.
    ///
    /// Returns once the engine has been asked to open the transport; the
    /// outcome arrives later as marshalled engine events.  A synchronous
    /// `open` failure is reported through `on_connection_lost` like any other
    /// remote failure and still returns `Ok`.
    ///
    /// # Errors
    ///
    /// [`SessionError::InvalidState`] unless disconnected;
    /// [`SessionError::InvalidArgument`] for an empty host or a negative or
    /// out-of-range display.
    pub fn connect(&mut self, params: ConnectParams) -> Result<SessionId, SessionError> {
        self.require(&[SessionState::Disconnected], "connect")?;
        let (display, port) = params.validate()?;

        let id = SessionId::new();
        let attempt = Attempt {
            id,
            host: params.host.trim().to_string(),
            port,
            display,
            shared: params.shared,
            view_only: params.view_only,
            intercept_reserved_keys: params.intercept_reserved_keys,
        };
        let request = OpenRequest {
            host: attempt.host.clone(),
            port,
            display,
            shared: attempt.shared,
            view_only: attempt.view_only,
        };

        info!(session = %id, host = %attempt.host, port, "connecting");
        self.attempt = Some(attempt);
        self.scaled = params.scaled;
        self.state = SessionState::Connecting;

        let sender = EngineEventSender::new(id, self.events.clone());
        if let Err(e) = self.engine.open(&request, sender) {
            warn!(session = %id, "open failed: {e}");
            self.surface_failure(e.to_string());
        }
        Ok(id)
    }

    /// Submits a password for the pending credential request.
    ///
    /// The pending flag is cleared before verification, so a second call
    /// without a fresh request always fails.  A rejected password is not an
    /// error here; it ends the attempt with `on_connection_lost("Authentication
    /// failed")`.
    ///
    /// # Errors
    ///
    /// [`SessionError::InvalidState`] if no credential is pending or the
    /// session is already connected.
    pub fn authenticate(&mut self, password: &str) -> Result<(), SessionError> {
        if !self.password_pending || self.state == SessionState::Connected {
            return Err(self.invalid("authenticate"));
        }
        self.password_pending = false;

        match self.engine.verify_credential(password) {
            Ok(true) => {
                debug!("credential accepted");
                self.initialize();
            }
            Ok(false) => {
                warn!("credential rejected");
                self.abandon_attempt(AUTHENTICATION_FAILED.to_string());
            }
            Err(e) => {
                warn!("credential verification failed: {e}");
                self.abandon_attempt(e.to_string());
            }
        }
        Ok(())
    }

    /// Ends a connected session.
    ///
    /// # Errors
    ///
    /// [`SessionError::InvalidState`] unless connected.  In particular a
    /// second call, or a call after the connection was lost, fails without
    /// firing another notification.
    pub fn disconnect(&mut self) -> Result<(), SessionError> {
        self.require(&[SessionState::Connected, SessionState::Disconnecting], "disconnect")?;
        self.teardown(None);
        Ok(())
    }

    // ── Marshalled engine events ──────────────────────────────────────────────

    /// Applies one engine event on the session thread.
    ///
    /// Events tagged with a retired session id are dropped.
    pub fn handle_engine_event(&mut self, marshalled: MarshalledEvent) {
        if self.session_id() != Some(marshalled.session) {
            debug!(session = %marshalled.session, "dropping stale engine event");
            return;
        }
        match marshalled.event {
            EngineEvent::Opened { needs_password } => self.on_opened(needs_password),
            EngineEvent::FramebufferUpdate { rect, draw } => self.on_framebuffer_update(rect, draw),
            EngineEvent::ConnectionLost { reason } => self.on_connection_lost(reason),
            EngineEvent::RemoteClipboardChanged { text } => {
                if self.state == SessionState::Connected {
                    self.observer.on_clipboard_changed(&text);
                }
            }
        }
    }

    fn on_opened(&mut self, needs_password: bool) {
        if self.state != SessionState::Connecting {
            debug!(state = %self.state, "ignoring late Opened");
            return;
        }
        if !needs_password {
            self.initialize();
            return;
        }

        self.password_pending = true;
        let host = self.attempt.as_ref().map(|a| a.host.clone()).unwrap_or_default();
        match self.request_credential(&host) {
            Some(password) => {
                if let Err(e) = self.authenticate(&password) {
                    warn!("authenticate after credential prompt failed: {e}");
                }
            }
            None => self.soft_cancel(),
        }
    }

    fn on_framebuffer_update(&mut self, rect: Rect, draw: Option<DrawOp>) {
        if self.state != SessionState::Connected {
            debug!(state = %self.state, "ignoring framebuffer update");
            return;
        }
        if let Some(draw) = draw {
            draw.run();
        }
        let dirty = self.policy.adjust_update_rectangle(rect);
        if !dirty.is_empty() {
            self.observer.on_invalidate(dirty);
        }
        self.scheduler.on_update_drawn();
        self.issue_update_request();
    }

    fn on_connection_lost(&mut self, reason: String) {
        match self.state {
            SessionState::Connected | SessionState::Disconnecting => {
                warn!("connection lost: {reason}");
                self.state = SessionState::Disconnecting;
                self.teardown(Some(reason));
            }
            SessionState::Connecting => {
                warn!("connection lost while connecting: {reason}");
                self.surface_failure(reason);
            }
            SessionState::Disconnected => {
                debug!("ignoring connection loss while disconnected");
            }
        }
    }

    // ── Input ─────────────────────────────────────────────────────────────────

    /// Forwards one raw input event.  View-only sessions drop it silently.
    ///
    /// # Errors
    ///
    /// [`SessionError::InvalidState`] unless connected.
    pub fn handle_input(&mut self, event: &RawInputEvent) -> Result<(), SessionError> {
        self.require(&[SessionState::Connected], "input")?;
        if self.is_view_only() {
            trace!("view-only; input dropped");
            return Ok(());
        }
        let outbound = self.input.handle(event, &self.policy);
        self.send_outbound(&outbound);
        Ok(())
    }

    /// Sends one of the predefined combinations.  `release_after = None`
    /// uses the combination's default.
    ///
    /// # Errors
    ///
    /// [`SessionError::InvalidState`] unless connected.
    pub fn send_special_keys(
        &mut self,
        keys: SpecialKeys,
        release_after: Option<bool>,
    ) -> Result<(), SessionError> {
        let release = release_after.unwrap_or_else(|| keys.releases_by_default());
        self.send_key_sequence(keys.sequence(), release)
    }

    /// Presses `sequence` in order and optionally releases it in reverse.
    ///
    /// # Errors
    ///
    /// [`SessionError::InvalidState`] unless connected.
    pub fn send_key_sequence(
        &mut self,
        sequence: &[KeySymbol],
        release_after: bool,
    ) -> Result<(), SessionError> {
        self.require(&[SessionState::Connected], "send special keys")?;
        if self.is_view_only() {
            trace!("view-only; special keys dropped");
            return Ok(());
        }
        if let Err(e) = send_sequence(self.engine.as_ref(), sequence, release_after) {
            self.transport_failed(e);
        }
        Ok(())
    }

    /// Pushes local clipboard text to the server.
    ///
    /// # Errors
    ///
    /// [`SessionError::InvalidState`] unless connected.
    pub fn fill_server_clipboard(&mut self, text: &str) -> Result<(), SessionError> {
        self.require(&[SessionState::Connected], "fill server clipboard")?;
        if self.is_view_only() {
            trace!("view-only; clipboard dropped");
            return Ok(());
        }
        if let Err(e) = self.engine.send_clipboard_text(text) {
            self.transport_failed(e);
        }
        Ok(())
    }

    // ── Display ───────────────────────────────────────────────────────────────

    /// Makes the next update request a full refresh.
    ///
    /// # Errors
    ///
    /// [`SessionError::InvalidState`] unless connected.
    pub fn request_full_refresh(&mut self) -> Result<(), SessionError> {
        self.require(&[SessionState::Connected], "request full refresh")?;
        self.scheduler.request_full_refresh();
        self.issue_update_request();
        Ok(())
    }

    /// Switches between scaled and clipped display.  Takes effect
    /// immediately when connected, otherwise on the next connect.
    pub fn set_scaled(&mut self, scaled: bool) {
        self.scaled = scaled;
        if self.state == SessionState::Connected && self.policy.is_scaled() != scaled {
            self.policy = self.policy.with_scaling(scaled);
            info!(scaled, "display mode changed");
            self.observer.on_invalidate(Rect::at(Point::default(), self.viewport));
        }
    }

    /// Records the hosting view's size.
    pub fn set_viewport(&mut self, size: Size) {
        self.viewport = size;
        self.policy.set_viewport(size);
    }

    /// Scrolls a clipped view; returns the effective offset.
    pub fn scroll_to(&mut self, offset: Point) -> Point {
        let effective = self.policy.scroll_to(offset);
        if self.policy.auto_scroll() {
            self.observer.on_invalidate(Rect::at(Point::default(), self.viewport));
        }
        effective
    }

    // ── Internals ─────────────────────────────────────────────────────────────

    fn initialize(&mut self) {
        let info = match self.engine.complete_handshake() {
            Ok(info) => info,
            Err(e) => {
                warn!("handshake failed: {e}");
                self.abandon_attempt(e.to_string());
                return;
            }
        };
        let policy = match DesktopTransformPolicy::for_session(info.size(), self.viewport, self.scaled) {
            Ok(p) => p,
            Err(e) => {
                warn!("unusable framebuffer: {e}");
                self.abandon_attempt(e.to_string());
                return;
            }
        };

        self.policy = policy;
        self.framebuffer = Some(info.clone());
        self.state = SessionState::Connected;
        if let Some(a) = &self.attempt {
            info!(
                session = %a.id,
                host = %a.host,
                port = a.port,
                display = a.display,
                width = info.width,
                height = info.height,
                name = %info.name,
                "connected"
            );
        }
        self.observer.on_connect_complete(info.width, info.height, &info.name);

        if self.attempt.as_ref().is_some_and(|a| a.intercept_reserved_keys) {
            self.hook.arm();
            self.hook_armed = true;
        }
        if let Err(e) = self.engine.start_updates() {
            self.transport_failed(e);
            return;
        }
        self.scheduler.request_full_refresh();
        self.issue_update_request();
    }

    /// Asks the provider for a password.  On a multi-threaded runtime the
    /// worker is handed over to `block_in_place` so a prompt waiting on the
    /// user does not stall other tasks.
    fn request_credential(&self, host: &str) -> Option<String> {
        let provider = self.credentials.as_ref();
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| provider.request_credential(host))
            }
            _ => provider.request_credential(host),
        }
    }

    fn issue_update_request(&mut self) {
        if self.state != SessionState::Connected {
            return;
        }
        if let Some(request) = self.scheduler.next_request() {
            trace!(?request, "requesting update");
            if let Err(e) = self.engine.request_update(request.is_full()) {
                self.transport_failed(e);
            }
        }
    }

    fn send_outbound(&mut self, outbound: &[Outbound]) {
        for item in outbound {
            let result = match *item {
                Outbound::Key(k) => self.engine.send_key_event(k),
                Outbound::Pointer(p) => self.engine.send_pointer_event(p),
            };
            if let Err(e) = result {
                self.transport_failed(e);
                return;
            }
        }
    }

    /// An outbound call failed while connected: same path as an engine loss.
    fn transport_failed(&mut self, error: EngineError) {
        self.on_connection_lost(error.to_string());
    }

    /// Full teardown of a connected session.  Fires exactly one notification.
    fn teardown(&mut self, reason: Option<String>) {
        self.state = SessionState::Disconnecting;
        let id = self.attempt.take().map(|a| a.id);
        self.engine.close();
        if self.hook_armed {
            self.hook.disarm();
            self.hook_armed = false;
        }
        self.reset_local_state();
        info!(session = ?id, reason = reason.as_deref().unwrap_or("requested"), "disconnected");
        self.observer.on_connection_lost(reason.as_deref());
    }

    /// Ends a not-yet-connected attempt whose transport is open.
    fn abandon_attempt(&mut self, reason: String) {
        self.engine.close();
        self.surface_failure(reason);
    }

    /// Reports a failure of a not-yet-connected attempt without teardown.
    fn surface_failure(&mut self, reason: String) {
        self.attempt = None;
        self.reset_local_state();
        self.observer.on_connection_lost(Some(&reason));
    }

    /// No credential supplied: drop the attempt quietly.
    fn soft_cancel(&mut self) {
        info!("credential request cancelled; abandoning connect attempt");
        self.attempt = None;
        self.engine.close();
        self.reset_local_state();
    }

    fn reset_local_state(&mut self) {
        self.password_pending = false;
        self.input.reset();
        self.scheduler.reset();
        self.framebuffer = None;
        self.policy = DesktopTransformPolicy::design_mode(self.viewport);
        self.state = SessionState::Disconnected;
    }

    fn require(&self, allowed: &[SessionState], operation: &'static str) -> Result<(), SessionError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(self.invalid(operation))
        }
    }

    fn invalid(&self, operation: &'static str) -> SessionError {
        SessionError::InvalidState {
            operation,
            state: self.state,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
