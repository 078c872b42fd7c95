//! Mock input source for unit testing and the demo binary.
//!
//! Lets tests inject synthetic [`RawInputEvent`]s and observe whether the
//! session armed reserved-key interception, without any OS hook.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard};

use tokio::sync::mpsc;

use super::{InputSourceError, RawInputEvent, RawInputSource};
use crate::application::forward_input::ReservedKeyHook;

/// A mock [`RawInputSource`] that also acts as the [`ReservedKeyHook`].
#[derive(Default)]
pub struct MockRawInputSource {
    sender: Mutex<Option<mpsc::UnboundedSender<RawInputEvent>>>,
    armed: AtomicBool,
    arm_count: AtomicU32,
    disarm_count: AtomicU32,
}

impl MockRawInputSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Injects a synthetic event, as if captured from hardware.
    ///
    /// Returns `false` if the source is not started or the receiver is gone.
    pub fn inject_event(&self, event: RawInputEvent) -> bool {
        match &*self.lock_sender() {
            Some(sender) => sender.send(event).is_ok(),
            None => false,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::SeqCst)
    }

    pub fn arm_count(&self) -> u32 {
        self.arm_count.load(Ordering::SeqCst)
    }

    pub fn disarm_count(&self) -> u32 {
        self.disarm_count.load(Ordering::SeqCst)
    }

    fn lock_sender(&self) -> MutexGuard<'_, Option<mpsc::UnboundedSender<RawInputEvent>>> {
        self.sender.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl RawInputSource for MockRawInputSource {
    fn start(&self) -> Result<mpsc::UnboundedReceiver<RawInputEvent>, InputSourceError> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.lock_sender() = Some(tx);
        Ok(rx)
    }

    fn stop(&self) {
        // Dropping the sender closes the channel.
        *self.lock_sender() = None;
    }
}

impl ReservedKeyHook for MockRawInputSource {
    fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
        self.arm_count.fetch_add(1, Ordering::SeqCst);
    }

    fn disarm(&self) {
        self.armed.store(false, Ordering::SeqCst);
        self.disarm_count.fetch_add(1, Ordering::SeqCst);
    }
}
