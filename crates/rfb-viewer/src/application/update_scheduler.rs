//! Decides whether the next framebuffer update request is full or
//! incremental.
//!
//! Requests are strictly paced: a new one is issued only after the previous
//! update has been drawn, never ahead of it.

/// Kind of update request sent to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateRequest {
    Full,
    Incremental,
}

impl UpdateRequest {
    pub fn is_full(self) -> bool {
        self == UpdateRequest::Full
    }
}

#[derive(Debug, Default)]
pub struct UpdateScheduler {
    full_refresh: bool,
    outstanding: bool,
}

impl UpdateScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next request a full refresh.  One-shot.
    pub fn request_full_refresh(&mut self) {
        self.full_refresh = true;
    }

    /// Returns the next request to issue, consuming the full-refresh flag, or
    /// `None` while a request is still outstanding.
    pub fn next_request(&mut self) -> Option<UpdateRequest> {
        if self.outstanding {
            return None;
        }
        self.outstanding = true;
        if std::mem::take(&mut self.full_refresh) {
            Some(UpdateRequest::Full)
        } else {
            Some(UpdateRequest::Incremental)
        }
    }

    /// Marks the outstanding request as answered and drawn.
    pub fn on_update_drawn(&mut self) {
        self.outstanding = false;
    }

    pub fn is_outstanding(&self) -> bool {
        self.outstanding
    }

    pub fn is_full_refresh_pending(&self) -> bool {
        self.full_refresh
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
