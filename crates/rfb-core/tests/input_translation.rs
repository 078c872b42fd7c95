//! Integration tests for the rfb-core input pipeline.
//!
//! These tests drive the public API the way the session does for each local
//! key: sync modifiers first, then translate the primary key.

use rfb_core::{
    keymap::{sync_modifiers, KeyTranslator, Modifier, ModifierState},
    DesktopTransformPolicy, KeyEvent, KeySymbol, Point, PointerButtons, Size, SpecialKeys,
};

/// Produces the wire events for one key press the same way the session does.
fn key_down(
    translator: &KeyTranslator,
    previous: ModifierState,
    current: ModifierState,
    vk: u8,
) -> Vec<KeyEvent> {
    let mut events = sync_modifiers(previous, current);
    if !KeyTranslator::is_modifier_key(vk) {
        events.push(KeyEvent::press(translator.translate(vk, current)));
    }
    events
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[test]
fn test_ctrl_c_sends_control_then_lowercase_c() {
    let t = KeyTranslator::default();
    let ctrl = ModifierState::empty().with(Modifier::LeftControl, true);

    let events = key_down(&t, ModifierState::empty(), ctrl, 0x43);

    assert_eq!(
        events,
        vec![
            KeyEvent::press(KeySymbol::CONTROL_L),
            KeyEvent::press(KeySymbol(u32::from(b'c'))),
        ]
    );
}

#[test]
fn test_shift_1_sends_exclamation_mark() {
    let t = KeyTranslator::default();
    let shift = ModifierState(ModifierState::LEFT_SHIFT);

    let events = key_down(&t, shift, shift, 0x31);

    assert_eq!(events, vec![KeyEvent::press(KeySymbol(u32::from(b'!')))]);
}

#[test]
fn test_pressing_a_modifier_key_only_emits_the_sync_event() {
    let t = KeyTranslator::default();
    let alt = ModifierState(ModifierState::RIGHT_ALT);

    let events = key_down(&t, ModifierState::empty(), alt, 0xA5);

    assert_eq!(events, vec![KeyEvent::press(KeySymbol::ALT_R)]);
}

#[test]
fn test_releasing_all_modifiers_before_plain_key() {
    let t = KeyTranslator::default();
    let held = ModifierState(ModifierState::LEFT_SHIFT | ModifierState::LEFT_META);

    let events = key_down(&t, held, ModifierState::empty(), 0x0D);

    assert_eq!(
        events,
        vec![
            KeyEvent::release(KeySymbol::SHIFT_L),
            KeyEvent::release(KeySymbol::SUPER_L),
            KeyEvent::press(KeySymbol::RETURN),
        ]
    );
}

#[test]
fn test_special_key_presets_parse_and_sequence() {
    let keys: SpecialKeys = "ctrl+alt+del".parse().expect("preset must parse");
    let events = keys.events(keys.releases_by_default());
    assert_eq!(events.len(), 6);
    assert_eq!(events.first(), Some(&KeyEvent::press(KeySymbol::CONTROL_L)));
    assert_eq!(events.last(), Some(&KeyEvent::release(KeySymbol::CONTROL_L)));
}

#[test]
fn test_pointer_through_scaled_policy() {
    let policy = DesktopTransformPolicy::for_session(
        Size::new(1600, 1200),
        Size::new(800, 600),
        true,
    )
    .expect("framebuffer has area");

    let ev = policy
        .update_remote_pointer(Point::new(400, 300), PointerButtons::none().with_wheel(-1))
        .expect("point is inside the viewport");

    assert_eq!(ev.position, Point::new(800, 600));
    assert_eq!(ev.buttons.0, PointerButtons::WHEEL_DOWN);
}
