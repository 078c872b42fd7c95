//! Key translation for outbound keyboard events.
//!
//! Local input arrives as Windows-style virtual key codes plus a modifier
//! bitset.  The RFB wire wants X11 KeySyms.  Translation happens in two
//! steps:
//!
//! 1. The static table in [`windows_vk`] covers every non-printable key.
//! 2. Everything else goes through a [`KeyboardLayout`] with the Shift state
//!    only, so that Ctrl+C still sends `c` and the remote applies Control
//!    itself from the separately synced modifier events.

pub mod keysym;
pub mod modifiers;
pub mod special;
pub mod us_layout;
pub mod windows_vk;

use std::sync::Arc;

use tracing::trace;

pub use keysym::KeySymbol;
pub use modifiers::{sync_modifiers, Modifier, ModifierState};
pub use us_layout::UsLayout;

use crate::protocol::messages::KeyEvent;

/// Layout-aware conversion from a virtual key to the characters it types.
///
/// Implementations may return several characters (dead-key compositions);
/// the translator keeps the last one.
pub trait KeyboardLayout: Send + Sync {
    /// Characters produced by `vk` under `modifiers`.  Empty when the key
    /// produces no text.
    fn characters(&self, vk: u8, modifiers: ModifierState) -> Vec<char>;
}

/// Maps local virtual keys to protocol KeySyms.
#[derive(Clone)]
pub struct KeyTranslator {
    layout: Arc<dyn KeyboardLayout>,
}

impl Default for KeyTranslator {
    fn default() -> Self {
        Self::new(Arc::new(UsLayout))
    }
}

impl std::fmt::Debug for KeyTranslator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyTranslator").finish_non_exhaustive()
    }
}

impl KeyTranslator {
    /// Creates a translator that falls back to `layout` for printable keys.
    pub fn new(layout: Arc<dyn KeyboardLayout>) -> Self {
        Self { layout }
    }

    /// Translates `vk` to the KeySym sent on the wire.
    ///
    /// Lookup order: the static table, then the layout with Control, Alt and
    /// Meta zeroed (last character wins), then the raw code unchanged.
    pub fn translate(&self, vk: u8, modifiers: ModifierState) -> KeySymbol {
        if let Some(sym) = windows_vk::vk_to_keysym(vk) {
            return sym;
        }
        match self.layout.characters(vk, modifiers.shift_only()).last() {
            Some(&c) => KeySymbol::from_char(c),
            None => {
                trace!("no layout mapping for VK 0x{vk:02X}; sending raw code");
                KeySymbol(u32::from(vk))
            }
        }
    }

    /// Returns `true` for keys whose effect is conveyed only through
    /// [`Self::sync_modifiers`] and which must never be sent as ordinary
    /// key events.
    pub fn is_modifier_key(vk: u8) -> bool {
        Modifier::from_virtual_key(vk).is_some()
    }

    /// Key events that bring the remote modifier state from `previous` to
    /// `current`.  See [`modifiers::sync_modifiers`].
    pub fn sync_modifiers(previous: ModifierState, current: ModifierState) -> Vec<KeyEvent> {
        sync_modifiers(previous, current)
    }
}
