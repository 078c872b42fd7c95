//! X11 KeySym values used on the RFB wire.
//!
//! The RFB `KeyEvent` message carries a 32-bit X11 KeySym rather than a
//! platform key code.  Values are defined in X11/keysymdef.h.
//! Reference: https://gitlab.freedesktop.org/xorg/proto/xorgproto/-/blob/master/include/X11/keysymdef.h
//!
//! # Printable vs. function keysyms
//!
//! Latin-1 printable characters use their code point as the KeySym
//! (`XK_a` = 0x61, `XK_A` = 0x41).  Keys that do not produce a character
//! (arrows, function keys, modifiers, editing keys) live in the 0xFFxx
//! "function" range.  Characters above U+00FF are encoded as
//! `0x0100_0000 | codepoint`.

use serde::{Deserialize, Serialize};

/// A protocol-level key identifier (X11 KeySym).
///
/// Distinct from the local virtual key code that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeySymbol(pub u32);

/// Offset applied to Unicode code points above Latin-1.
const UNICODE_KEYSYM_OFFSET: u32 = 0x0100_0000;

impl KeySymbol {
    // ── Editing / control ────────────────────────────────────────────────────
    pub const BACKSPACE: KeySymbol = KeySymbol(0xFF08);
    pub const TAB: KeySymbol = KeySymbol(0xFF09);
    pub const CLEAR: KeySymbol = KeySymbol(0xFF0B);
    pub const RETURN: KeySymbol = KeySymbol(0xFF0D);
    pub const PAUSE: KeySymbol = KeySymbol(0xFF13);
    pub const SCROLL_LOCK: KeySymbol = KeySymbol(0xFF14);
    pub const ESCAPE: KeySymbol = KeySymbol(0xFF1B);
    pub const DELETE: KeySymbol = KeySymbol(0xFFFF);

    // ── Cursor control ───────────────────────────────────────────────────────
    pub const HOME: KeySymbol = KeySymbol(0xFF50);
    pub const LEFT: KeySymbol = KeySymbol(0xFF51);
    pub const UP: KeySymbol = KeySymbol(0xFF52);
    pub const RIGHT: KeySymbol = KeySymbol(0xFF53);
    pub const DOWN: KeySymbol = KeySymbol(0xFF54);
    pub const PAGE_UP: KeySymbol = KeySymbol(0xFF55);
    pub const PAGE_DOWN: KeySymbol = KeySymbol(0xFF56);
    pub const END: KeySymbol = KeySymbol(0xFF57);

    // ── Misc functions ───────────────────────────────────────────────────────
    pub const PRINT: KeySymbol = KeySymbol(0xFF61);
    pub const INSERT: KeySymbol = KeySymbol(0xFF63);
    pub const MENU: KeySymbol = KeySymbol(0xFF67);
    pub const CANCEL: KeySymbol = KeySymbol(0xFF69);
    pub const HELP: KeySymbol = KeySymbol(0xFF6A);
    pub const NUM_LOCK: KeySymbol = KeySymbol(0xFF7F);

    // ── Keypad ───────────────────────────────────────────────────────────────
    pub const KP_ENTER: KeySymbol = KeySymbol(0xFF8D);
    pub const KP_MULTIPLY: KeySymbol = KeySymbol(0xFFAA);
    pub const KP_ADD: KeySymbol = KeySymbol(0xFFAB);
    pub const KP_SEPARATOR: KeySymbol = KeySymbol(0xFFAC);
    pub const KP_SUBTRACT: KeySymbol = KeySymbol(0xFFAD);
    pub const KP_DECIMAL: KeySymbol = KeySymbol(0xFFAE);
    pub const KP_DIVIDE: KeySymbol = KeySymbol(0xFFAF);
    pub const KP_0: KeySymbol = KeySymbol(0xFFB0);

    // ── Function keys (F1 = 0xFFBE … F24 = 0xFFD5) ────────────────────────────
    pub const F1: KeySymbol = KeySymbol(0xFFBE);
    pub const F4: KeySymbol = KeySymbol(0xFFC1);
    pub const F12: KeySymbol = KeySymbol(0xFFC9);

    // ── Modifiers ────────────────────────────────────────────────────────────
    pub const SHIFT_L: KeySymbol = KeySymbol(0xFFE1);
    pub const SHIFT_R: KeySymbol = KeySymbol(0xFFE2);
    pub const CONTROL_L: KeySymbol = KeySymbol(0xFFE3);
    pub const CONTROL_R: KeySymbol = KeySymbol(0xFFE4);
    pub const CAPS_LOCK: KeySymbol = KeySymbol(0xFFE5);
    pub const ALT_L: KeySymbol = KeySymbol(0xFFE9);
    pub const ALT_R: KeySymbol = KeySymbol(0xFFEA);
    /// The Windows / Command key.  Most servers bind it as Super.
    pub const SUPER_L: KeySymbol = KeySymbol(0xFFEB);
    pub const SUPER_R: KeySymbol = KeySymbol(0xFFEC);

    /// Returns the KeySym for function key `F<n>` (1–24).
    pub const fn function(n: u8) -> Option<KeySymbol> {
        if n >= 1 && n <= 24 {
            Some(KeySymbol(Self::F1.0 + (n as u32 - 1)))
        } else {
            None
        }
    }

    /// Returns the KeySym for keypad digit `d` (0–9).
    pub const fn keypad_digit(d: u8) -> Option<KeySymbol> {
        if d <= 9 {
            Some(KeySymbol(Self::KP_0.0 + d as u32))
        } else {
            None
        }
    }

    /// Returns the KeySym a printable character maps to.
    pub fn from_char(c: char) -> KeySymbol {
        let cp = c as u32;
        if cp <= 0xFF {
            KeySymbol(cp)
        } else {
            KeySymbol(UNICODE_KEYSYM_OFFSET | cp)
        }
    }

    /// Returns the raw 32-bit value sent on the wire.
    pub fn value(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for KeySymbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:04X}", self.0)
    }
}
