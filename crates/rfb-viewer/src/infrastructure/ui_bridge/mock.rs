//! Recording observer for tests.
//!
//! Every notification is pushed into a `Mutex<Vec<ViewerEvent>>` so that
//! assertions can check exactly what the UI would have seen, and how often.

use std::sync::{Mutex, MutexGuard};

use rfb_core::Rect;

use super::ViewerEvent;
use crate::application::session::SessionObserver;

#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ViewerEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ViewerEvent> {
        self.lock().clone()
    }

    pub fn count(&self, pred: impl Fn(&ViewerEvent) -> bool) -> usize {
        self.lock().iter().filter(|e| pred(e)).count()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ViewerEvent>> {
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn push(&self, event: ViewerEvent) {
        self.lock().push(event);
    }
}

impl SessionObserver for RecordingObserver {
    fn on_connect_complete(&self, width: u32, height: u32, name: &str) {
        self.push(ViewerEvent::ConnectComplete {
            width,
            height,
            name: name.to_string(),
        });
    }

    fn on_connection_lost(&self, reason: Option<&str>) {
        self.push(ViewerEvent::ConnectionLost {
            reason: reason.map(str::to_string),
        });
    }

    fn on_clipboard_changed(&self, text: &str) {
        self.push(ViewerEvent::ClipboardChanged {
            text: text.to_string(),
        });
    }

    fn on_invalidate(&self, rect: Rect) {
        self.push(ViewerEvent::Invalidate { rect });
    }
}
