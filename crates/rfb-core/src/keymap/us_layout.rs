//! US-QWERTY keyboard layout used as the default character fallback.
//!
//! On a real desktop this role is played by the OS (`ToUnicode` on Windows,
//! `XLookupString` on X11), which knows the user's active layout.  This
//! table covers the standard 104-key US layout and is what the session uses
//! unless a platform layout is injected.

use super::modifiers::ModifierState;
use super::KeyboardLayout;

/// Standard US-QWERTY layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct UsLayout;

impl KeyboardLayout for UsLayout {
    fn characters(&self, vk: u8, modifiers: ModifierState) -> Vec<char> {
        let shift = modifiers.shift();
        let c = match vk {
            // VK_A … VK_Z
            0x41..=0x5A => {
                let base = (b'a' + (vk - 0x41)) as char;
                if shift {
                    base.to_ascii_uppercase()
                } else {
                    base
                }
            }
            // VK_0 … VK_9
            0x30..=0x39 => {
                const SHIFTED: [char; 10] = [')', '!', '@', '#', '$', '%', '^', '&', '*', '('];
                let idx = (vk - 0x30) as usize;
                if shift {
                    SHIFTED[idx]
                } else {
                    (b'0' + idx as u8) as char
                }
            }
            0x20 => ' ',
            0xBA => pick(shift, ';', ':'), // VK_OEM_1
            0xBB => pick(shift, '=', '+'), // VK_OEM_PLUS
            0xBC => pick(shift, ',', '<'), // VK_OEM_COMMA
            0xBD => pick(shift, '-', '_'), // VK_OEM_MINUS
            0xBE => pick(shift, '.', '>'), // VK_OEM_PERIOD
            0xBF => pick(shift, '/', '?'), // VK_OEM_2
            0xC0 => pick(shift, '`', '~'), // VK_OEM_3
            0xDB => pick(shift, '[', '{'), // VK_OEM_4
            0xDC => pick(shift, '\\', '|'), // VK_OEM_5
            0xDD => pick(shift, ']', '}'), // VK_OEM_6
            0xDE => pick(shift, '\'', '"'), // VK_OEM_7
            _ => return Vec::new(),
        };
        vec![c]
    }
}

fn pick(shift: bool, plain: char, shifted: char) -> char {
    if shift {
        shifted
    } else {
        plain
    }
}
