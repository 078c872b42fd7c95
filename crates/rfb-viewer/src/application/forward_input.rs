//! InputForwarder: turns raw local input into outbound protocol events.
//!
//! For every event, keyboard or pointer, the forwarder first compares the
//! captured modifier bitset with its previous snapshot and emits one key
//! event per changed modifier.  Only then is the primary event produced:
//!
//! - keys go through [`KeyTranslator`]; modifier keys themselves are never
//!   sent as ordinary key events,
//! - pointer positions go through the active [`DesktopTransformPolicy`] and
//!   are dropped when outside its mouse-move rectangle,
//! - wheel notches become a press and release of button 4 or 5.

use rfb_core::{
    keymap::sync_modifiers, DesktopTransformPolicy, KeyEvent, KeyTranslator, ModifierState,
    Point, PointerButtons, PointerEvent,
};
use tracing::trace;

use crate::infrastructure::input_source::{MouseButton, RawInputEvent};

/// Interception of reserved key combinations by the raw input source.
///
/// Armed while a session is connected so that Alt+Tab, the Windows key and
/// similar reach the remote desktop instead of the local shell.
pub trait ReservedKeyHook: Send + Sync {
    fn arm(&self);
    fn disarm(&self);
}

/// One outbound protocol event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outbound {
    Key(KeyEvent),
    Pointer(PointerEvent),
}

/// Stateful translator owned by the session.
#[derive(Debug, Default)]
pub struct InputForwarder {
    translator: KeyTranslator,
    modifiers: ModifierState,
    buttons: PointerButtons,
}

impl InputForwarder {
    pub fn new(translator: KeyTranslator) -> Self {
        Self {
            translator,
            modifiers: ModifierState::empty(),
            buttons: PointerButtons::none(),
        }
    }

    /// The modifier snapshot last synced to the remote side.
    pub fn modifiers(&self) -> ModifierState {
        self.modifiers
    }

    pub fn buttons(&self) -> PointerButtons {
        self.buttons
    }

    /// Translates one raw event into the ordered list of protocol events.
    pub fn handle(&mut self, event: &RawInputEvent, policy: &DesktopTransformPolicy) -> Vec<Outbound> {
        let mut out: Vec<Outbound> = self
            .sync(event.modifiers())
            .into_iter()
            .map(Outbound::Key)
            .collect();

        match *event {
            RawInputEvent::Key { vk_code, pressed, .. } => {
                if KeyTranslator::is_modifier_key(vk_code) {
                    trace!("VK 0x{vk_code:02X} conveyed through modifier sync only");
                } else {
                    let symbol = self.translator.translate(vk_code, self.modifiers);
                    out.push(Outbound::Key(KeyEvent { symbol, pressed }));
                }
            }
            RawInputEvent::PointerMove { x, y, .. } => {
                out.extend(self.pointer(policy, Point::new(x, y), self.buttons));
            }
            RawInputEvent::PointerButton { button, pressed, x, y, .. } => {
                let bit = button_bit(button);
                self.buttons = if pressed {
                    PointerButtons(self.buttons.0 | bit)
                } else {
                    PointerButtons(self.buttons.0 & !bit)
                };
                out.extend(self.pointer(policy, Point::new(x, y), self.buttons));
            }
            RawInputEvent::Wheel { delta, x, y, .. } => {
                if delta != 0 {
                    let at = Point::new(x, y);
                    out.extend(self.pointer(policy, at, self.buttons.with_wheel(delta)));
                    out.extend(self.pointer(policy, at, self.buttons));
                }
            }
        }
        out
    }

    /// Forgets the modifier and button snapshots.  Used on teardown.
    pub fn reset(&mut self) {
        self.modifiers = ModifierState::empty();
        self.buttons = PointerButtons::none();
    }

    fn sync(&mut self, current: ModifierState) -> Vec<KeyEvent> {
        let events = sync_modifiers(self.modifiers, current);
        self.modifiers = current;
        events
    }

    fn pointer(
        &self,
        policy: &DesktopTransformPolicy,
        local: Point,
        buttons: PointerButtons,
    ) -> Option<Outbound> {
        let event = policy.update_remote_pointer(local, buttons);
        if event.is_none() {
            trace!(x = local.x, y = local.y, "pointer outside desktop area; dropped");
        }
        event.map(Outbound::Pointer)
    }
}

fn button_bit(button: MouseButton) -> u8 {
    match button {
        MouseButton::Left => PointerButtons::LEFT,
        MouseButton::Middle => PointerButtons::MIDDLE,
        MouseButton::Right => PointerButtons::RIGHT,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use rfb_core::{KeySymbol, Size};

    fn policy() -> DesktopTransformPolicy {
        DesktopTransformPolicy::clipped(Size::new(1024, 768), Size::new(800, 600)).unwrap()
    }

    fn key(vk_code: u8, modifiers: u8, pressed: bool) -> RawInputEvent {
        RawInputEvent::Key {
            vk_code,
            modifiers: ModifierState(modifiers),
            pressed,
        }
    }

    #[test]
    fn test_modifier_sync_precedes_primary_key() {
        // Arrange
        let mut f = InputForwarder::default();

        // Act – Shift held while pressing 'a'
        let out = f.handle(&key(0x41, ModifierState::LEFT_SHIFT, true), &policy());

        // Assert
        assert_eq!(
            out,
            vec![
                Outbound::Key(KeyEvent::press(KeySymbol::SHIFT_L)),
                Outbound::Key(KeyEvent::press(KeySymbol(u32::from(b'A')))),
            ]
        );
    }

    #[test]
    fn test_modifier_key_is_not_sent_as_ordinary_key() {
        let mut f = InputForwarder::default();

        let down = f.handle(&key(0xA2, ModifierState::LEFT_CONTROL, true), &policy());
        let up = f.handle(&key(0xA2, 0, false), &policy());

        assert_eq!(down, vec![Outbound::Key(KeyEvent::press(KeySymbol::CONTROL_L))]);
        assert_eq!(up, vec![Outbound::Key(KeyEvent::release(KeySymbol::CONTROL_L))]);
    }

    #[test]
    fn test_unchanged_modifiers_emit_only_primary_key() {
        let mut f = InputForwarder::default();
        f.handle(&key(0xA0, ModifierState::LEFT_SHIFT, true), &policy());

        let out = f.handle(&key(0x31, ModifierState::LEFT_SHIFT, true), &policy());

        assert_eq!(out, vec![Outbound::Key(KeyEvent::press(KeySymbol(u32::from(b'!'))))]);
    }

    #[test]
    fn test_pointer_event_also_syncs_modifiers() {
        // Arrange
        let mut f = InputForwarder::default();
        let ev = RawInputEvent::PointerMove {
            x: 10,
            y: 20,
            modifiers: ModifierState(ModifierState::RIGHT_ALT),
        };

        // Act
        let out = f.handle(&ev, &policy());

        // Assert
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], Outbound::Key(KeyEvent::press(KeySymbol::ALT_R)));
        assert!(matches!(out[1], Outbound::Pointer(p) if p.position == Point::new(10, 20)));
    }

    #[test]
    fn test_pointer_outside_rectangle_is_dropped_after_sync() {
        let mut f = InputForwarder::default();
        let ev = RawInputEvent::PointerMove {
            x: 900,
            y: 10,
            modifiers: ModifierState(ModifierState::LEFT_META),
        };

        let out = f.handle(&ev, &policy());

        assert_eq!(out, vec![Outbound::Key(KeyEvent::press(KeySymbol::SUPER_L))]);
    }

    #[test]
    fn test_button_state_is_tracked_between_events() {
        // Arrange
        let mut f = InputForwarder::default();
        let down = RawInputEvent::PointerButton {
            button: MouseButton::Left,
            pressed: true,
            x: 5,
            y: 5,
            modifiers: ModifierState::empty(),
        };
        let mv = RawInputEvent::PointerMove { x: 6, y: 6, modifiers: ModifierState::empty() };

        // Act
        f.handle(&down, &policy());
        let out = f.handle(&mv, &policy());

        // Assert – the drag carries the held button
        assert!(matches!(out[0], Outbound::Pointer(p) if p.buttons.left()));
    }

    #[test]
    fn test_wheel_sends_press_then_release_of_wheel_button() {
        let mut f = InputForwarder::default();
        let ev = RawInputEvent::Wheel { delta: -120, x: 1, y: 1, modifiers: ModifierState::empty() };

        let out = f.handle(&ev, &policy());

        let masks: Vec<u8> = out
            .iter()
            .filter_map(|o| match o {
                Outbound::Pointer(p) => Some(p.buttons.0),
                Outbound::Key(_) => None,
            })
            .collect();
        assert_eq!(masks, vec![PointerButtons::WHEEL_DOWN, 0]);
    }

    #[test]
    fn test_reset_forgets_modifier_snapshot() {
        let mut f = InputForwarder::default();
        f.handle(&key(0xA0, ModifierState::LEFT_SHIFT, true), &policy());

        f.reset();

        assert_eq!(f.modifiers(), ModifierState::empty());
        // Shift still physically held: the next event re-presses it remotely.
        let out = f.handle(&key(0x41, ModifierState::LEFT_SHIFT, true), &policy());
        assert_eq!(out[0], Outbound::Key(KeyEvent::press(KeySymbol::SHIFT_L)));
    }
}
