//! Raw local input delivered to the session.
//!
//! On a desktop the producer is a low-level keyboard/mouse hook running on
//! its own message-loop thread (WH_KEYBOARD_LL on Windows, an XInput grab on
//! X11).  Such a hook sees reserved combinations like Alt+Tab or the Windows
//! key before the OS acts on them, which is why the session arms it only
//! while a remote desktop is live.
//!
//! Every event carries the full modifier bitset at the time it was captured.
//! The session compares it with its previous snapshot to emit modifier
//! press/release events on the wire.
//!
//! # Testability
//!
//! The [`RawInputSource`] trait lets tests and the demo binary inject
//! synthetic events via [`mock::MockRawInputSource`].

use rfb_core::ModifierState;
use tokio::sync::mpsc;

pub mod mock;

/// Pointer button identifier used in [`RawInputEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

/// One captured local input event.  Coordinates are viewport pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawInputEvent {
    Key {
        /// Windows Virtual Key code.
        vk_code: u8,
        modifiers: ModifierState,
        pressed: bool,
    },
    PointerMove {
        x: i32,
        y: i32,
        modifiers: ModifierState,
    },
    PointerButton {
        button: MouseButton,
        pressed: bool,
        x: i32,
        y: i32,
        modifiers: ModifierState,
    },
    /// Vertical wheel; positive = away from the user.
    Wheel {
        delta: i16,
        x: i32,
        y: i32,
        modifiers: ModifierState,
    },
}

impl RawInputEvent {
    /// The modifier snapshot captured with this event.
    pub fn modifiers(&self) -> ModifierState {
        match self {
            RawInputEvent::Key { modifiers, .. }
            | RawInputEvent::PointerMove { modifiers, .. }
            | RawInputEvent::PointerButton { modifiers, .. }
            | RawInputEvent::Wheel { modifiers, .. } => *modifiers,
        }
    }
}

/// Error type for input source operations.
#[derive(Debug, thiserror::Error)]
pub enum InputSourceError {
    #[error("failed to install input hook: {0}")]
    HookInstallFailed(String),
    #[error("input source has already been stopped")]
    AlreadyStopped,
}

/// Produces [`RawInputEvent`]s from the local machine.
///
/// `start` may be called from the async runtime; the returned receiver is fed
/// from whatever thread the platform hook runs on.
pub trait RawInputSource: Send + Sync {
    fn start(&self) -> Result<mpsc::UnboundedReceiver<RawInputEvent>, InputSourceError>;
    fn stop(&self);
}
