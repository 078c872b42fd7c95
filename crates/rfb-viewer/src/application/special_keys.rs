//! SpecialKeySequencer: sends predefined reserved combinations.
//!
//! The lifecycle check (Connected only) lives in the session; this module
//! only pushes the ordered key events to the engine.

use rfb_core::{keymap::special::sequence_events, KeySymbol};
use tracing::debug;

use super::engine::{EngineError, ProtocolEngine};

/// Presses `sequence` in order and, if `release_after`, releases it in
/// reverse.  Stops at the first engine error.
///
/// Returns the number of key events sent.
pub fn send_sequence(
    engine: &dyn ProtocolEngine,
    sequence: &[KeySymbol],
    release_after: bool,
) -> Result<usize, EngineError> {
    let events = sequence_events(sequence, release_after);
    for event in &events {
        engine.send_key_event(*event)?;
    }
    debug!(count = events.len(), release_after, "special key sequence sent");
    Ok(events.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::engine::mock::MockProtocolEngine;
    use rfb_core::{KeyEvent, SpecialKeys};

    #[test]
    fn test_ctrl_alt_del_reaches_engine_in_mirrored_order() {
        // Arrange
        let engine = MockProtocolEngine::default();

        // Act
        let sent = send_sequence(&engine, SpecialKeys::CtrlAltDel.sequence(), true).unwrap();

        // Assert
        assert_eq!(sent, 6);
        assert_eq!(
            engine.key_events(),
            vec![
                KeyEvent::press(KeySymbol::CONTROL_L),
                KeyEvent::press(KeySymbol::ALT_L),
                KeyEvent::press(KeySymbol::DELETE),
                KeyEvent::release(KeySymbol::DELETE),
                KeyEvent::release(KeySymbol::ALT_L),
                KeyEvent::release(KeySymbol::CONTROL_L),
            ]
        );
    }

    #[test]
    fn test_hold_sequence_sends_press_only() {
        let engine = MockProtocolEngine::default();

        send_sequence(&engine, SpecialKeys::Alt.sequence(), false).unwrap();

        assert_eq!(engine.key_events(), vec![KeyEvent::press(KeySymbol::ALT_L)]);
    }

    #[test]
    fn test_engine_failure_stops_the_sequence() {
        let engine = MockProtocolEngine::default();
        engine.set_fail_sends(true);

        let result = send_sequence(&engine, SpecialKeys::CtrlEsc.sequence(), true);

        assert!(result.is_err());
        assert!(engine.key_events().is_empty());
    }
}
