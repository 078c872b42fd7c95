//! Windows Virtual Key (VK) code to X11 KeySym translation table.
//!
//! Reference: Windows Virtual-Key Codes (winuser.h) and X11/keysymdef.h.
//! Windows VK codes range from 0x00 to 0xFF.
//!
//! # What goes in this table
//!
//! Only keys that do **not** produce a character: editing keys, navigation,
//! function keys, the keypad operators, lock keys, and modifiers.  Letters,
//! digits, and punctuation are deliberately absent; their KeySym depends on
//! the active keyboard layout and the Shift state, so they go through the
//! layout-aware fallback in [`super::KeyTranslator`].
//!
//! `VK_TO_KEYSYM_TABLE` is a compile-time constant array of 256 entries,
//! indexed by VK code.  A zero entry means "no static mapping".

use super::keysym::KeySymbol;

/// Looks up the static KeySym for a Windows VK code.
///
/// Returns `None` when the key is printable (or unknown) and must be resolved
/// through the keyboard layout instead.
pub fn vk_to_keysym(vk: u8) -> Option<KeySymbol> {
    match VK_TO_KEYSYM_TABLE[vk as usize] {
        0 => None,
        sym => Some(KeySymbol(sym)),
    }
}

/// Generic and sided modifier VK codes.
pub mod vk {
    pub const SHIFT: u8 = 0x10;
    pub const CONTROL: u8 = 0x11;
    pub const MENU: u8 = 0x12;
    pub const ESCAPE: u8 = 0x1B;
    pub const SPACE: u8 = 0x20;
    pub const DELETE: u8 = 0x2E;
    pub const LWIN: u8 = 0x5B;
    pub const RWIN: u8 = 0x5C;
    pub const F4: u8 = 0x73;
    pub const LSHIFT: u8 = 0xA0;
    pub const RSHIFT: u8 = 0xA1;
    pub const LCONTROL: u8 = 0xA2;
    pub const RCONTROL: u8 = 0xA3;
    pub const LMENU: u8 = 0xA4;
    pub const RMENU: u8 = 0xA5;
}

/// Complete VK → KeySym mapping table indexed by VK code (0x00–0xFF).
///
/// Reference: https://learn.microsoft.com/windows/win32/inputdev/virtual-key-codes
const VK_TO_KEYSYM_TABLE: [u32; 256] = {
    let mut t = [0u32; 256];

    // ── Control / editing keys ───────────────────────────────────────────────
    t[0x08] = 0xFF08; // VK_BACK      -> XK_BackSpace
    t[0x09] = 0xFF09; // VK_TAB       -> XK_Tab
    t[0x0C] = 0xFF0B; // VK_CLEAR     -> XK_Clear
    t[0x0D] = 0xFF0D; // VK_RETURN    -> XK_Return
    t[0x13] = 0xFF13; // VK_PAUSE     -> XK_Pause
    t[0x14] = 0xFFE5; // VK_CAPITAL   -> XK_Caps_Lock
    t[0x1B] = 0xFF1B; // VK_ESCAPE    -> XK_Escape
    t[0x03] = 0xFF69; // VK_CANCEL    -> XK_Cancel
    t[0x2D] = 0xFF63; // VK_INSERT    -> XK_Insert
    t[0x2E] = 0xFFFF; // VK_DELETE    -> XK_Delete
    t[0x2F] = 0xFF6A; // VK_HELP      -> XK_Help
    t[0x2C] = 0xFF61; // VK_SNAPSHOT  -> XK_Print
    t[0x5D] = 0xFF67; // VK_APPS      -> XK_Menu
    t[0x91] = 0xFF14; // VK_SCROLL    -> XK_Scroll_Lock
    t[0x90] = 0xFF7F; // VK_NUMLOCK   -> XK_Num_Lock

    // ── Navigation ───────────────────────────────────────────────────────────
    t[0x21] = 0xFF55; // VK_PRIOR     -> XK_Page_Up
    t[0x22] = 0xFF56; // VK_NEXT      -> XK_Page_Down
    t[0x23] = 0xFF57; // VK_END       -> XK_End
    t[0x24] = 0xFF50; // VK_HOME      -> XK_Home
    t[0x25] = 0xFF51; // VK_LEFT      -> XK_Left
    t[0x26] = 0xFF52; // VK_UP        -> XK_Up
    t[0x27] = 0xFF53; // VK_RIGHT     -> XK_Right
    t[0x28] = 0xFF54; // VK_DOWN      -> XK_Down

    // ── Keypad (VK_NUMPAD0=0x60 … VK_DIVIDE=0x6F) ────────────────────────────
    let mut i = 0;
    while i < 10 {
        t[0x60 + i] = 0xFFB0 + i as u32; // VK_NUMPADn -> XK_KP_n
        i += 1;
    }
    t[0x6A] = 0xFFAA; // VK_MULTIPLY  -> XK_KP_Multiply
    t[0x6B] = 0xFFAB; // VK_ADD       -> XK_KP_Add
    t[0x6C] = 0xFFAC; // VK_SEPARATOR -> XK_KP_Separator
    t[0x6D] = 0xFFAD; // VK_SUBTRACT  -> XK_KP_Subtract
    t[0x6E] = 0xFFAE; // VK_DECIMAL   -> XK_KP_Decimal
    t[0x6F] = 0xFFAF; // VK_DIVIDE    -> XK_KP_Divide

    // ── Function keys (VK_F1=0x70 … VK_F24=0x87) ─────────────────────────────
    let mut f = 0;
    while f < 24 {
        t[0x70 + f] = 0xFFBE + f as u32;
        f += 1;
    }

    // ── Modifiers ────────────────────────────────────────────────────────────
    // Generic codes fall back to the left-hand keysym.
    t[0x10] = 0xFFE1; // VK_SHIFT     -> XK_Shift_L
    t[0x11] = 0xFFE3; // VK_CONTROL   -> XK_Control_L
    t[0x12] = 0xFFE9; // VK_MENU      -> XK_Alt_L
    t[0xA0] = 0xFFE1; // VK_LSHIFT    -> XK_Shift_L
    t[0xA1] = 0xFFE2; // VK_RSHIFT    -> XK_Shift_R
    t[0xA2] = 0xFFE3; // VK_LCONTROL  -> XK_Control_L
    t[0xA3] = 0xFFE4; // VK_RCONTROL  -> XK_Control_R
    t[0xA4] = 0xFFE9; // VK_LMENU     -> XK_Alt_L
    t[0xA5] = 0xFFEA; // VK_RMENU     -> XK_Alt_R
    t[0x5B] = 0xFFEB; // VK_LWIN      -> XK_Super_L
    t[0x5C] = 0xFFEC; // VK_RWIN      -> XK_Super_R

    t
};

#[cfg(test)]
mod tests {
    use super::*;

    /// Pairs of (VK code, expected KeySym) for the non-printable keys.
    const STANDARD_MAPPINGS: &[(u8, KeySymbol)] = &[
        (0x08, KeySymbol::BACKSPACE),
        (0x09, KeySymbol::TAB),
        (0x0D, KeySymbol::RETURN),
        (0x1B, KeySymbol::ESCAPE),
        (0x2D, KeySymbol::INSERT),
        (0x2E, KeySymbol::DELETE),
        (0x24, KeySymbol::HOME),
        (0x23, KeySymbol::END),
        (0x21, KeySymbol::PAGE_UP),
        (0x22, KeySymbol::PAGE_DOWN),
        (0x25, KeySymbol::LEFT),
        (0x26, KeySymbol::UP),
        (0x27, KeySymbol::RIGHT),
        (0x28, KeySymbol::DOWN),
        (0x70, KeySymbol::F1),
        (0x73, KeySymbol::F4),
        (0x7B, KeySymbol::F12),
        (0x60, KeySymbol::KP_0),
        (0x6A, KeySymbol::KP_MULTIPLY),
        (0x6F, KeySymbol::KP_DIVIDE),
        (0xA0, KeySymbol::SHIFT_L),
        (0xA1, KeySymbol::SHIFT_R),
        (0xA2, KeySymbol::CONTROL_L),
        (0xA3, KeySymbol::CONTROL_R),
        (0xA4, KeySymbol::ALT_L),
        (0xA5, KeySymbol::ALT_R),
        (0x5B, KeySymbol::SUPER_L),
        (0x5C, KeySymbol::SUPER_R),
        (0x14, KeySymbol::CAPS_LOCK),
        (0x90, KeySymbol::NUM_LOCK),
        (0x91, KeySymbol::SCROLL_LOCK),
    ];

    #[test]
    fn test_all_standard_vk_codes_map_to_correct_keysym() {
        for &(vk, expected) in STANDARD_MAPPINGS {
            assert_eq!(
                vk_to_keysym(vk),
                Some(expected),
                "vk_to_keysym(0x{vk:02X}) should return {expected}"
            );
        }
    }

    #[test]
    fn test_printable_keys_have_no_static_mapping() {
        // Letters, digits, space and OEM punctuation depend on the layout.
        for vk in [0x41u8, 0x5A, 0x30, 0x39, 0x20, 0xBA, 0xBF, 0xDE] {
            assert_eq!(vk_to_keysym(vk), None, "VK 0x{vk:02X} must be layout-resolved");
        }
    }

    #[test]
    fn test_vk_to_keysym_never_panics_for_any_u8() {
        for vk in 0u8..=255 {
            let _ = vk_to_keysym(vk);
        }
    }

    #[test]
    fn test_all_24_function_keys_are_mapped() {
        for n in 0u8..24 {
            let vk = 0x70 + n;
            assert_eq!(vk_to_keysym(vk), KeySymbol::function(n + 1));
        }
    }
}
