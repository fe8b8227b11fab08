//! Cancellable repeating task driving the per-frame tracking cycle.
//!
//! The host owns the real callback mechanism (new-video-frame callbacks or
//! display refresh). The scheduler records whether a cycle has been
//! requested and whether the task is still alive; the host asks
//! [`CycleScheduler::take_due`] from its callback and runs a cycle only when
//! it returns true. Cancelling flips a single shared liveness flag, after
//! which no further cycle runs.

use crate::video::VideoSource;
use std::{cell::Cell, rc::Rc};

/// Callback the host should use to fire the next cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackKind {
    /// Fire when the video source has decoded a new frame
    VideoFrame,
    /// Fire on every display refresh
    DisplayRefresh,
}

/// Shared liveness flag of a scheduler
#[derive(Debug, Clone)]
pub struct CancelHandle {
    alive: Rc<Cell<bool>>,
}

impl CancelHandle {
    fn new() -> Self {
        Self {
            alive: Rc::new(Cell::new(true)),
        }
    }

    /// Stop the task; no cycle runs after this returns
    pub fn cancel(&self) {
        self.alive.set(false);
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.alive.get()
    }
}

/// Repeating cycle task with a liveness flag
#[derive(Debug)]
pub struct CycleScheduler {
    kind: CallbackKind,
    liveness: CancelHandle,
    pending: bool,
}

impl CycleScheduler {
    #[must_use]
    pub fn new(kind: CallbackKind) -> Self {
        Self {
            kind,
            liveness: CancelHandle::new(),
            pending: false,
        }
    }

    /// Pick the callback kind a video source supports
    ///
    /// New-frame callbacks tie detection cadence to real frames and avoid
    /// detecting twice on a stale one, so they win when available.
    #[must_use]
    pub fn for_source(source: &dyn VideoSource, prefer_video_frame: bool) -> Self {
        let kind = if prefer_video_frame && source.supports_frame_callback() {
            CallbackKind::VideoFrame
        } else {
            CallbackKind::DisplayRefresh
        };
        log::debug!("Cycle scheduler using {kind:?} callbacks");
        Self::new(kind)
    }

    #[must_use]
    pub fn kind(&self) -> CallbackKind {
        self.kind
    }

    /// Handle that cancels this scheduler from elsewhere
    #[must_use]
    pub fn cancel_handle(&self) -> CancelHandle {
        self.liveness.clone()
    }

    /// Request the next cycle; returns false once cancelled
    pub fn request_next(&mut self) -> bool {
        if !self.liveness.is_alive() {
            self.pending = false;
            return false;
        }
        self.pending = true;
        true
    }

    /// Consume a pending request; true means the host should run a cycle now
    pub fn take_due(&mut self) -> bool {
        if !self.liveness.is_alive() {
            self.pending = false;
            return false;
        }
        std::mem::take(&mut self.pending)
    }

    pub fn cancel(&mut self) {
        self.liveness.cancel();
        self.pending = false;
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.liveness.is_alive()
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending && self.liveness.is_alive()
    }
}
