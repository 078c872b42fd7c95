//! Modifier key state and the edge-triggered modifier differ.
//!
//! The local raw input source reports the full modifier bitset with every
//! event.  The remote side, however, only learns about modifiers through
//! explicit press/release key events.  [`sync_modifiers`] bridges the two: it
//! compares the previous snapshot with the current one and emits exactly one
//! key event per bit that changed.

use serde::{Deserialize, Serialize};

use super::keysym::KeySymbol;
use super::windows_vk::vk;
use crate::protocol::messages::KeyEvent;

/// One of the eight tracked modifier keys.
///
/// The declaration order is the order in which [`sync_modifiers`] emits
/// events: Shift L/R, Control L/R, Alt L/R, Meta L/R.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Modifier {
    LeftShift,
    RightShift,
    LeftControl,
    RightControl,
    LeftAlt,
    RightAlt,
    LeftMeta,
    RightMeta,
}

impl Modifier {
    /// All modifiers in emission order.
    pub const ALL: [Modifier; 8] = [
        Modifier::LeftShift,
        Modifier::RightShift,
        Modifier::LeftControl,
        Modifier::RightControl,
        Modifier::LeftAlt,
        Modifier::RightAlt,
        Modifier::LeftMeta,
        Modifier::RightMeta,
    ];

    /// The bit this modifier occupies in a [`ModifierState`].
    pub const fn bit(self) -> u8 {
        1 << (self as u8)
    }

    /// The dedicated KeySym sent when this modifier changes.
    pub const fn key_symbol(self) -> KeySymbol {
        match self {
            Modifier::LeftShift => KeySymbol::SHIFT_L,
            Modifier::RightShift => KeySymbol::SHIFT_R,
            Modifier::LeftControl => KeySymbol::CONTROL_L,
            Modifier::RightControl => KeySymbol::CONTROL_R,
            Modifier::LeftAlt => KeySymbol::ALT_L,
            Modifier::RightAlt => KeySymbol::ALT_R,
            Modifier::LeftMeta => KeySymbol::SUPER_L,
            Modifier::RightMeta => KeySymbol::SUPER_R,
        }
    }

    /// Maps a Windows VK code to the sided modifier it represents.
    ///
    /// The generic `VK_SHIFT`, `VK_CONTROL` and `VK_MENU` codes resolve to the
    /// left-hand variant.
    pub fn from_virtual_key(code: u8) -> Option<Modifier> {
        match code {
            vk::LSHIFT | vk::SHIFT => Some(Modifier::LeftShift),
            vk::RSHIFT => Some(Modifier::RightShift),
            vk::LCONTROL | vk::CONTROL => Some(Modifier::LeftControl),
            vk::RCONTROL => Some(Modifier::RightControl),
            vk::LMENU | vk::MENU => Some(Modifier::LeftAlt),
            vk::RMENU => Some(Modifier::RightAlt),
            vk::LWIN => Some(Modifier::LeftMeta),
            vk::RWIN => Some(Modifier::RightMeta),
            _ => None,
        }
    }
}

/// Bitset of currently held modifier keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModifierState(pub u8);

impl ModifierState {
    pub const LEFT_SHIFT: u8 = 1 << 0;
    pub const RIGHT_SHIFT: u8 = 1 << 1;
    pub const LEFT_CONTROL: u8 = 1 << 2;
    pub const RIGHT_CONTROL: u8 = 1 << 3;
    pub const LEFT_ALT: u8 = 1 << 4;
    pub const RIGHT_ALT: u8 = 1 << 5;
    pub const LEFT_META: u8 = 1 << 6;
    pub const RIGHT_META: u8 = 1 << 7;

    /// No modifiers held.
    pub const fn empty() -> Self {
        ModifierState(0)
    }

    /// Returns `true` if `modifier` is held.
    pub fn contains(self, modifier: Modifier) -> bool {
        self.0 & modifier.bit() != 0
    }

    /// Returns a copy with `modifier` set or cleared.
    #[must_use]
    pub fn with(self, modifier: Modifier, held: bool) -> Self {
        if held {
            ModifierState(self.0 | modifier.bit())
        } else {
            ModifierState(self.0 & !modifier.bit())
        }
    }

    /// Returns `true` if either Shift modifier is active.
    pub fn shift(self) -> bool {
        self.0 & (Self::LEFT_SHIFT | Self::RIGHT_SHIFT) != 0
    }

    /// Returns `true` if either Control modifier is active.
    pub fn control(self) -> bool {
        self.0 & (Self::LEFT_CONTROL | Self::RIGHT_CONTROL) != 0
    }

    /// Returns `true` if either Alt modifier is active.
    pub fn alt(self) -> bool {
        self.0 & (Self::LEFT_ALT | Self::RIGHT_ALT) != 0
    }

    /// Returns `true` if either Meta (Win/Cmd/Super) modifier is active.
    pub fn meta(self) -> bool {
        self.0 & (Self::LEFT_META | Self::RIGHT_META) != 0
    }

    /// The same state with Control, Alt and Meta cleared.
    #[must_use]
    pub fn shift_only(self) -> Self {
        ModifierState(self.0 & (Self::LEFT_SHIFT | Self::RIGHT_SHIFT))
    }

    /// Iterates over the held modifiers in emission order.
    pub fn iter(self) -> impl Iterator<Item = Modifier> {
        Modifier::ALL.into_iter().filter(move |m| self.contains(*m))
    }
}

/// Emits one key event per modifier whose state differs between `previous`
/// and `current`, in [`Modifier::ALL`] order.
///
/// A press is emitted when the bit is now set, a release when it is now clear.
/// Unchanged bits never produce an event.
pub fn sync_modifiers(previous: ModifierState, current: ModifierState) -> Vec<KeyEvent> {
    let changed = previous.0 ^ current.0;
    if changed == 0 {
        return Vec::new();
    }
    Modifier::ALL
        .into_iter()
        .filter(|m| changed & m.bit() != 0)
        .map(|m| KeyEvent {
            symbol: m.key_symbol(),
            pressed: current.contains(m),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifier_bits_match_state_constants() {
        assert_eq!(Modifier::LeftShift.bit(), ModifierState::LEFT_SHIFT);
        assert_eq!(Modifier::RightShift.bit(), ModifierState::RIGHT_SHIFT);
        assert_eq!(Modifier::LeftControl.bit(), ModifierState::LEFT_CONTROL);
        assert_eq!(Modifier::RightControl.bit(), ModifierState::RIGHT_CONTROL);
        assert_eq!(Modifier::LeftAlt.bit(), ModifierState::LEFT_ALT);
        assert_eq!(Modifier::RightAlt.bit(), ModifierState::RIGHT_ALT);
        assert_eq!(Modifier::LeftMeta.bit(), ModifierState::LEFT_META);
        assert_eq!(Modifier::RightMeta.bit(), ModifierState::RIGHT_META);
    }

    #[test]
    fn test_sync_modifiers_equal_states_emit_nothing() {
        for bits in [0u8, 0x01, 0x5A, 0xFF] {
            let s = ModifierState(bits);
            assert!(sync_modifiers(s, s).is_empty(), "bits {bits:#04x}");
        }
    }

    #[test]
    fn test_sync_modifiers_single_press() {
        // Arrange
        let prev = ModifierState::empty();
        let curr = prev.with(Modifier::LeftControl, true);

        // Act
        let events = sync_modifiers(prev, curr);

        // Assert
        assert_eq!(events, vec![KeyEvent::press(KeySymbol::CONTROL_L)]);
    }

    #[test]
    fn test_sync_modifiers_single_release() {
        let prev = ModifierState(ModifierState::RIGHT_ALT);
        let events = sync_modifiers(prev, ModifierState::empty());
        assert_eq!(events, vec![KeyEvent::release(KeySymbol::ALT_R)]);
    }

    #[test]
    fn test_sync_modifiers_ignores_unchanged_bits() {
        // Arrange – LeftShift held throughout, RightMeta newly pressed
        let prev = ModifierState(ModifierState::LEFT_SHIFT);
        let curr = ModifierState(ModifierState::LEFT_SHIFT | ModifierState::RIGHT_META);

        // Act
        let events = sync_modifiers(prev, curr);

        // Assert
        assert_eq!(events, vec![KeyEvent::press(KeySymbol::SUPER_R)]);
    }

    #[test]
    fn test_sync_modifiers_emits_in_fixed_order() {
        // Arrange – every bit flips
        let prev = ModifierState(0b1010_1010);
        let curr = ModifierState(0b0101_0101);

        // Act
        let events = sync_modifiers(prev, curr);

        // Assert
        let symbols: Vec<KeySymbol> = events.iter().map(|e| e.symbol).collect();
        assert_eq!(
            symbols,
            vec![
                KeySymbol::SHIFT_L,
                KeySymbol::SHIFT_R,
                KeySymbol::CONTROL_L,
                KeySymbol::CONTROL_R,
                KeySymbol::ALT_L,
                KeySymbol::ALT_R,
                KeySymbol::SUPER_L,
                KeySymbol::SUPER_R,
            ]
        );
        let pressed: Vec<bool> = events.iter().map(|e| e.pressed).collect();
        assert_eq!(pressed, vec![true, false, true, false, true, false, true, false]);
    }

    #[test]
    fn test_sync_modifiers_event_count_equals_changed_bits_for_all_pairs() {
        for prev in 0u8..=255 {
            for curr in [0u8, 0x0F, 0xF0, 0xFF, prev.rotate_left(1)] {
                let events = sync_modifiers(ModifierState(prev), ModifierState(curr));
                assert_eq!(events.len() as u32, (prev ^ curr).count_ones());
            }
        }
    }

    #[test]
    fn test_shift_only_clears_other_modifiers() {
        let s = ModifierState(0xFF).shift_only();
        assert!(s.shift());
        assert!(!s.control());
        assert!(!s.alt());
        assert!(!s.meta());
    }

    #[test]
    fn test_from_virtual_key_maps_generic_codes_to_left_variant() {
        assert_eq!(Modifier::from_virtual_key(0x10), Some(Modifier::LeftShift));
        assert_eq!(Modifier::from_virtual_key(0x11), Some(Modifier::LeftControl));
        assert_eq!(Modifier::from_virtual_key(0x12), Some(Modifier::LeftAlt));
        assert_eq!(Modifier::from_virtual_key(0xA1), Some(Modifier::RightShift));
        assert_eq!(Modifier::from_virtual_key(0x5C), Some(Modifier::RightMeta));
        assert_eq!(Modifier::from_virtual_key(0x41), None);
    }

    #[test]
    fn test_iter_yields_held_modifiers_in_order() {
        let s = ModifierState(ModifierState::RIGHT_META | ModifierState::LEFT_SHIFT);
        let held: Vec<Modifier> = s.iter().collect();
        assert_eq!(held, vec![Modifier::LeftShift, Modifier::RightMeta]);
    }
}
