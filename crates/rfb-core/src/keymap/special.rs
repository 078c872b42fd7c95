//! Predefined key sequences for reserved combinations.
//!
//! Some combinations (Ctrl+Alt+Del, Alt+F4, Ctrl+Esc) are swallowed by the
//! local OS before the viewer ever sees them, so the UI offers them as
//! explicit commands.  A sequence is pressed in order and, when requested,
//! released in strictly reverse order.

use serde::{Deserialize, Serialize};

use super::keysym::KeySymbol;
use crate::protocol::messages::KeyEvent;

/// The reserved key combinations the viewer can send on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpecialKeys {
    /// Left Control held down (no automatic release).
    Ctrl,
    /// Left Alt held down (no automatic release).
    Alt,
    CtrlAltDel,
    AltF4,
    CtrlEsc,
}

const CTRL: &[KeySymbol] = &[KeySymbol::CONTROL_L];
const ALT: &[KeySymbol] = &[KeySymbol::ALT_L];
const CTRL_ALT_DEL: &[KeySymbol] = &[KeySymbol::CONTROL_L, KeySymbol::ALT_L, KeySymbol::DELETE];
const ALT_F4: &[KeySymbol] = &[KeySymbol::ALT_L, KeySymbol::F4];
const CTRL_ESC: &[KeySymbol] = &[KeySymbol::CONTROL_L, KeySymbol::ESCAPE];

impl SpecialKeys {
    /// The keys of this combination in press order.
    pub fn sequence(self) -> &'static [KeySymbol] {
        match self {
            SpecialKeys::Ctrl => CTRL,
            SpecialKeys::Alt => ALT,
            SpecialKeys::CtrlAltDel => CTRL_ALT_DEL,
            SpecialKeys::AltF4 => ALT_F4,
            SpecialKeys::CtrlEsc => CTRL_ESC,
        }
    }

    /// Whether the combination is released right after being pressed when
    /// the caller does not say otherwise.
    pub fn releases_by_default(self) -> bool {
        !matches!(self, SpecialKeys::Ctrl | SpecialKeys::Alt)
    }

    /// Key events for this combination.
    pub fn events(self, release_after: bool) -> Vec<KeyEvent> {
        sequence_events(self.sequence(), release_after)
    }
}

impl std::str::FromStr for SpecialKeys {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '+', '_'], "").as_str() {
            "ctrl" => Ok(SpecialKeys::Ctrl),
            "alt" => Ok(SpecialKeys::Alt),
            "ctrlaltdel" => Ok(SpecialKeys::CtrlAltDel),
            "altf4" => Ok(SpecialKeys::AltF4),
            "ctrlesc" => Ok(SpecialKeys::CtrlEsc),
            other => Err(format!("unknown special key combination: {other}")),
        }
    }
}

/// Presses every symbol in `sequence` in order and, if `release_after` is set,
/// releases them in reverse order.
pub fn sequence_events(sequence: &[KeySymbol], release_after: bool) -> Vec<KeyEvent> {
    let presses = sequence.iter().map(|&s| KeyEvent::press(s));
    if release_after {
        let releases = sequence.iter().rev().map(|&s| KeyEvent::release(s));
        presses.chain(releases).collect()
    } else {
        presses.collect()
    }
}
