//! Bridge from session notifications to the UI.
//!
//! The session reports through the [`SessionObserver`] trait, called on the
//! session thread.  A UI usually lives elsewhere (a render loop, a WebView),
//! so [`ChannelObserver`] turns each callback into a serializable
//! [`ViewerEvent`] and posts it on a channel the UI drains at its own pace.
//!
//! # DTOs
//!
//! `ViewerEvent` derives `serde::Serialize` so a frontend can receive it as
//! JSON.  The shape is a tagged union:
//!
//! ```json
//! { "type": "ConnectComplete", "width": 1024, "height": 768, "name": "desk" }
//! { "type": "ConnectionLost",  "reason": null }
//! ```

pub mod mock;

use rfb_core::Rect;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::trace;

use crate::application::session::SessionObserver;

/// One notification for the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ViewerEvent {
    ConnectComplete { width: u32, height: u32, name: String },
    /// `reason` is `None` for a requested disconnect.
    ConnectionLost { reason: Option<String> },
    ClipboardChanged { text: String },
    Invalidate { rect: Rect },
}

/// [`SessionObserver`] that forwards every callback as a [`ViewerEvent`].
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<ViewerEvent>,
}

impl ChannelObserver {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ViewerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn post(&self, event: ViewerEvent) {
        if self.tx.send(event).is_err() {
            trace!("UI receiver dropped; viewer event discarded");
        }
    }
}

impl SessionObserver for ChannelObserver {
    fn on_connect_complete(&self, width: u32, height: u32, name: &str) {
        self.post(ViewerEvent::ConnectComplete {
            width,
            height,
            name: name.to_string(),
        });
    }

    fn on_connection_lost(&self, reason: Option<&str>) {
        self.post(ViewerEvent::ConnectionLost {
            reason: reason.map(str::to_string),
        });
    }

    fn on_clipboard_changed(&self, text: &str) {
        self.post(ViewerEvent::ClipboardChanged {
            text: text.to_string(),
        });
    }

    fn on_invalidate(&self, rect: Rect) {
        self.post(ViewerEvent::Invalidate { rect });
    }
}
