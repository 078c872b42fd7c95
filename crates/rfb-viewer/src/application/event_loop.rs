//! The session thread: one Tokio task owning the [`Session`].
//!
//! # Architecture
//!
//! ```text
//!  UI / input task ──SessionCommand──┐
//!                                    ├──> SessionLoop::run ──> Session
//!  engine threads ──MarshalledEvent──┘        (single owner)
//! ```
//!
//! Two channels feed the loop.  Commands arrive on a bounded channel from
//! any number of [`SessionHandle`] clones; engine events arrive on the
//! unbounded marshalling channel, which engine threads can post to without
//! blocking.  Because only this task touches the session, no lock protects
//! its state.
//!
//! # Why oneshot replies? (for beginners)
//!
//! A command like `connect` must report `InvalidState` back to the caller.
//! The handle sends the command together with a `oneshot::Sender`; the loop
//! answers through it once the session has processed the call.

use std::sync::Arc;

use rfb_core::{Point, Size, SpecialKeys};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::engine::{MarshalledEvent, ProtocolEngine, SessionId};
use super::forward_input::ReservedKeyHook;
use super::session::{
    ConnectParams, CredentialProvider, Session, SessionError, SessionObserver, SessionState,
};
use crate::infrastructure::input_source::RawInputEvent;

/// Capacity of the command channel.
const COMMAND_CAPACITY: usize = 256;

/// Errors returned by [`SessionHandle`] calls.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoopError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("session loop has stopped")]
    Stopped,
}

type Reply<T> = oneshot::Sender<Result<T, SessionError>>;

/// Requests processed by the session thread.
#[derive(Debug)]
pub enum SessionCommand {
    Connect { params: ConnectParams, reply: Reply<SessionId> },
    Authenticate { password: String, reply: Reply<()> },
    Disconnect { reply: Reply<()> },
    Input(RawInputEvent),
    SpecialKeys { keys: SpecialKeys, release_after: Option<bool>, reply: Reply<()> },
    FillClipboard { text: String, reply: Reply<()> },
    RequestFullRefresh { reply: Reply<()> },
    SetScaled(bool),
    SetViewport(Size),
    ScrollTo(Point),
    State { reply: oneshot::Sender<SessionState> },
    Shutdown,
}

/// Cloneable front end to a running [`SessionLoop`].
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    pub async fn connect(&self, params: ConnectParams) -> Result<SessionId, LoopError> {
        self.call(|reply| SessionCommand::Connect { params, reply }).await
    }

    pub async fn authenticate(&self, password: impl Into<String>) -> Result<(), LoopError> {
        let password = password.into();
        self.call(|reply| SessionCommand::Authenticate { password, reply }).await
    }

    pub async fn disconnect(&self) -> Result<(), LoopError> {
        self.call(|reply| SessionCommand::Disconnect { reply }).await
    }

    /// Fire-and-forget: input outside a connected session is dropped.
    pub async fn input(&self, event: RawInputEvent) -> Result<(), LoopError> {
        self.post(SessionCommand::Input(event)).await
    }

    pub async fn send_special_keys(
        &self,
        keys: SpecialKeys,
        release_after: Option<bool>,
    ) -> Result<(), LoopError> {
        self.call(|reply| SessionCommand::SpecialKeys { keys, release_after, reply }).await
    }

    pub async fn fill_server_clipboard(&self, text: impl Into<String>) -> Result<(), LoopError> {
        let text = text.into();
        self.call(|reply| SessionCommand::FillClipboard { text, reply }).await
    }

    pub async fn request_full_refresh(&self) -> Result<(), LoopError> {
        self.call(|reply| SessionCommand::RequestFullRefresh { reply }).await
    }

    pub async fn set_scaled(&self, scaled: bool) -> Result<(), LoopError> {
        self.post(SessionCommand::SetScaled(scaled)).await
    }

    pub async fn set_viewport(&self, size: Size) -> Result<(), LoopError> {
        self.post(SessionCommand::SetViewport(size)).await
    }

    pub async fn scroll_to(&self, offset: Point) -> Result<(), LoopError> {
        self.post(SessionCommand::ScrollTo(offset)).await
    }

    pub async fn state(&self) -> Result<SessionState, LoopError> {
        let (reply, rx) = oneshot::channel();
        self.post(SessionCommand::State { reply }).await?;
        rx.await.map_err(|_| LoopError::Stopped)
    }

    /// Asks the loop to disconnect (if connected) and exit.
    pub async fn shutdown(&self) -> Result<(), LoopError> {
        self.post(SessionCommand::Shutdown).await
    }

    async fn post(&self, command: SessionCommand) -> Result<(), LoopError> {
        self.tx.send(command).await.map_err(|_| LoopError::Stopped)
    }

    async fn call<T>(&self, make: impl FnOnce(Reply<T>) -> SessionCommand) -> Result<T, LoopError> {
        let (reply, rx) = oneshot::channel();
        self.post(make(reply)).await?;
        let result = rx.await.map_err(|_| LoopError::Stopped)?;
        Ok(result?)
    }
}

/// Owns the session and drains both channels.
pub struct SessionLoop {
    session: Session,
    commands: mpsc::Receiver<SessionCommand>,
    engine_events: mpsc::UnboundedReceiver<MarshalledEvent>,
}

impl SessionLoop {
    /// Builds the session, its marshalling channel, and a handle to it.
    pub fn new(
        engine: Arc<dyn ProtocolEngine>,
        credentials: Arc<dyn CredentialProvider>,
        observer: Arc<dyn SessionObserver>,
        hook: Arc<dyn ReservedKeyHook>,
    ) -> (Self, SessionHandle) {
        let (event_tx, engine_events) = mpsc::unbounded_channel();
        let (tx, commands) = mpsc::channel(COMMAND_CAPACITY);
        let session = Session::new(engine, credentials, observer, hook, event_tx);
        (
            Self {
                session,
                commands,
                engine_events,
            },
            SessionHandle { tx },
        )
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Spawns [`Self::run`] on the current runtime.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Runs until [`SessionCommand::Shutdown`] or every handle is dropped.
    pub async fn run(mut self) {
        info!("session loop started");
        loop {
            // Engine events already queued are applied before the next command.
            tokio::select! {
                biased;
                Some(event) = self.engine_events.recv() => {
                    self.session.handle_engine_event(event);
                }
                command = self.commands.recv() => match command {
                    Some(SessionCommand::Shutdown) | None => break,
                    Some(command) => self.dispatch(command),
                },
            }
        }
        if self.session.state() == SessionState::Connected {
            let _ = self.session.disconnect();
        }
        info!("session loop stopped");
    }

    fn dispatch(&mut self, command: SessionCommand) {
        let s = &mut self.session;
        match command {
            SessionCommand::Connect { params, reply } => {
                let _ = reply.send(s.connect(params));
            }
            SessionCommand::Authenticate { password, reply } => {
                let _ = reply.send(s.authenticate(&password));
            }
            SessionCommand::Disconnect { reply } => {
                let _ = reply.send(s.disconnect());
            }
            SessionCommand::Input(event) => {
                if let Err(e) = s.handle_input(&event) {
                    debug!("input dropped: {e}");
                }
            }
            SessionCommand::SpecialKeys { keys, release_after, reply } => {
                let _ = reply.send(s.send_special_keys(keys, release_after));
            }
            SessionCommand::FillClipboard { text, reply } => {
                let _ = reply.send(s.fill_server_clipboard(&text));
            }
            SessionCommand::RequestFullRefresh { reply } => {
                let _ = reply.send(s.request_full_refresh());
            }
            SessionCommand::SetScaled(scaled) => s.set_scaled(scaled),
            SessionCommand::SetViewport(size) => s.set_viewport(size),
            SessionCommand::ScrollTo(offset) => {
                s.scroll_to(offset);
            }
            SessionCommand::State { reply } => {
                let _ = reply.send(s.state());
            }
            SessionCommand::Shutdown => {}
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::session::MockCredentialProvider;
    use crate::infrastructure::engine::mock::{EngineCall, MockProtocolEngine};
    use crate::infrastructure::input_source::mock::MockRawInputSource;
    use crate::infrastructure::ui_bridge::{mock::RecordingObserver, ViewerEvent};
    use rfb_core::ModifierState;

    fn spawn_loop(
        engine: MockProtocolEngine,
        credentials: MockCredentialProvider,
    ) -> (SessionHandle, Arc<MockProtocolEngine>, Arc<RecordingObserver>, JoinHandle<()>) {
        let engine = Arc::new(engine);
        let observer = Arc::new(RecordingObserver::new());
        let (lp, handle) = SessionLoop::new(
            Arc::clone(&engine) as Arc<dyn ProtocolEngine>,
            Arc::new(credentials),
            Arc::clone(&observer) as Arc<dyn SessionObserver>,
            Arc::new(MockRawInputSource::new()),
        );
        let join = lp.spawn();
        (handle, engine, observer, join)
    }

    /// Waits until the loop has drained everything posted so far.
    async fn settle(handle: &SessionHandle) -> SessionState {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        handle.state().await.unwrap()
    }

    #[tokio::test]
    async fn test_connect_round_trip_through_loop() {
        // Arrange
        let mut creds = MockCredentialProvider::new();
        creds.expect_request_credential().returning(|_| Some("pw".into()));
        let (handle, _engine, observer, _join) =
            spawn_loop(MockProtocolEngine::default().with_password("pw"), creds);

        // Act
        handle.connect(ConnectParams::new("host", 0)).await.unwrap();
        let state = settle(&handle).await;

        // Assert
        assert_eq!(state, SessionState::Connected);
        assert_eq!(
            observer.count(|e| matches!(e, ViewerEvent::ConnectComplete { .. })),
            1
        );
    }

    #[tokio::test]
    async fn test_invalid_state_is_returned_to_caller() {
        let (handle, _e, _o, _j) = spawn_loop(MockProtocolEngine::default(), MockCredentialProvider::new());

        let result = handle.disconnect().await;

        assert!(matches!(
            result,
            Err(LoopError::Session(SessionError::InvalidState { .. }))
        ));
    }

    #[tokio::test]
    async fn test_input_is_forwarded_when_connected() {
        let (handle, engine, _o, _j) = spawn_loop(MockProtocolEngine::default(), MockCredentialProvider::new());
        handle.connect(ConnectParams::new("host", 0)).await.unwrap();
        settle(&handle).await;

        handle
            .input(RawInputEvent::Key { vk_code: 0x0D, modifiers: ModifierState::empty(), pressed: true })
            .await
            .unwrap();
        settle(&handle).await;

        assert_eq!(engine.key_events().len(), 1);
    }

    #[tokio::test]
    async fn test_loss_from_foreign_thread_is_marshalled() {
        // Arrange
        let (handle, engine, observer, _j) =
            spawn_loop(MockProtocolEngine::default(), MockCredentialProvider::new());
        handle.connect(ConnectParams::new("host", 0)).await.unwrap();
        settle(&handle).await;
        let sender = engine.sender().unwrap();

        // Act – two producer threads report the loss concurrently
        let threads: Vec<_> = ["a", "b"]
            .into_iter()
            .map(|r| {
                let s = sender.clone();
                std::thread::spawn(move || {
                    s.send(crate::application::engine::EngineEvent::ConnectionLost { reason: r.into() })
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }
        let state = settle(&handle).await;

        // Assert
        assert_eq!(state, SessionState::Disconnected);
        assert_eq!(observer.count(|e| matches!(e, ViewerEvent::ConnectionLost { .. })), 1);
        assert_eq!(engine.count(|c| *c == EngineCall::Close), 1);
    }

    #[tokio::test]
    async fn test_shutdown_disconnects_live_session() {
        let (handle, _engine, observer, join) =
            spawn_loop(MockProtocolEngine::default(), MockCredentialProvider::new());
        handle.connect(ConnectParams::new("host", 0)).await.unwrap();
        settle(&handle).await;

        handle.shutdown().await.unwrap();
        join.await.unwrap();

        assert_eq!(
            observer.events().last(),
            Some(&ViewerEvent::ConnectionLost { reason: None })
        );
        assert_eq!(handle.state().await, Err(LoopError::Stopped));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_blocking_credential_prompt_on_multi_thread_runtime() {
        // Arrange: the prompt blocks its thread for a while
        let mut creds = MockCredentialProvider::new();
        creds.expect_request_credential().times(1).returning(|_| {
            std::thread::sleep(std::time::Duration::from_millis(50));
            Some("pw".into())
        });
        let (handle, _engine, observer, _join) =
            spawn_loop(MockProtocolEngine::default().with_password("pw"), creds);
        let ticker = tokio::spawn(async {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        });

        // Act
        handle.connect(ConnectParams::new("host", 0)).await.unwrap();
        let state = settle(&handle).await;

        // Assert
        ticker.await.unwrap();
        assert_eq!(state, SessionState::Connected);
        assert_eq!(observer.count(|e| matches!(e, ViewerEvent::ConnectComplete { .. })), 1);
    }
}
