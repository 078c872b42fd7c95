//! Event values exchanged with the protocol engine.
//!
//! The engine owns the RFB wire format (RFC 6143).  The session only deals
//! in the logical content of the client-to-server `KeyEvent` and
//! `PointerEvent` messages and the `ServerInit` description of the remote
//! framebuffer.

use serde::{Deserialize, Serialize};

use crate::domain::geometry::{Point, Size};
use crate::keymap::keysym::KeySymbol;

// ── Protocol constants ────────────────────────────────────────────────────────

/// TCP port of display `:0`.  Display `:n` listens on `BASE_PORT + n`.
pub const BASE_PORT: u16 = 5900;

/// Returns the conventional TCP port for a display number.
///
/// Returns `None` if the display number would overflow the port range.
pub fn port_for_display(display: u16) -> Option<u16> {
    BASE_PORT.checked_add(display)
}

// ── Key events ────────────────────────────────────────────────────────────────

/// KeyEvent: press or release of a single KeySym.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyEvent {
    /// The X11 KeySym.
    pub symbol: KeySymbol,
    /// `true` for key-down, `false` for key-up.
    pub pressed: bool,
}

impl KeyEvent {
    /// A key-down event for `symbol`.
    pub const fn press(symbol: KeySymbol) -> Self {
        Self { symbol, pressed: true }
    }

    /// A key-up event for `symbol`.
    pub const fn release(symbol: KeySymbol) -> Self {
        Self { symbol, pressed: false }
    }
}

// ── Pointer events ────────────────────────────────────────────────────────────

/// RFB pointer button mask.
///
/// Bits 0–2 are the left, middle and right buttons.  Wheel motion is sent as
/// a press-and-release of button 4 (up) or 5 (down).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PointerButtons(pub u8);

impl PointerButtons {
    pub const LEFT: u8 = 1 << 0;
    pub const MIDDLE: u8 = 1 << 1;
    pub const RIGHT: u8 = 1 << 2;
    pub const WHEEL_UP: u8 = 1 << 3;
    pub const WHEEL_DOWN: u8 = 1 << 4;

    /// No buttons held.
    pub const fn none() -> Self {
        PointerButtons(0)
    }

    /// Returns `true` if the left button is held.
    pub fn left(self) -> bool {
        self.0 & Self::LEFT != 0
    }

    /// Returns `true` if the middle button is held.
    pub fn middle(self) -> bool {
        self.0 & Self::MIDDLE != 0
    }

    /// Returns `true` if the right button is held.
    pub fn right(self) -> bool {
        self.0 & Self::RIGHT != 0
    }

    /// Returns the mask with the wheel bits added for one wheel notch.
    ///
    /// Positive `delta` scrolls up, negative scrolls down, zero is a no-op.
    #[must_use]
    pub fn with_wheel(self, delta: i16) -> Self {
        match delta.signum() {
            1 => PointerButtons(self.0 | Self::WHEEL_UP),
            -1 => PointerButtons(self.0 | Self::WHEEL_DOWN),
            _ => self,
        }
    }

    /// Returns the mask without any wheel bits.
    #[must_use]
    pub fn without_wheel(self) -> Self {
        PointerButtons(self.0 & !(Self::WHEEL_UP | Self::WHEEL_DOWN))
    }
}

/// PointerEvent: button mask plus a position in framebuffer coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub buttons: PointerButtons,
    pub position: Point,
}

// ── Server description ────────────────────────────────────────────────────────

/// Remote framebuffer description reported at the end of the handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FramebufferInfo {
    pub width: u32,
    pub height: u32,
    /// Desktop name announced by the server.
    pub name: String,
}

impl FramebufferInfo {
    /// The framebuffer dimensions.
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}
