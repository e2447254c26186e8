// SPDX-License-Identifier: MPL-2.0
//! Next-frame scheduling.
//!
//! The mutation watcher defers translation of inserted nodes to the next
//! render frame. Hosts with a real frame loop implement [`FrameScheduler`];
//! [`FrameQueue`] is a frame loop pumped by hand, used by the command-line
//! renderer and by tests.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

/// Work deferred to the next frame.
pub type FrameCallback = Box<dyn FnOnce()>;

/// Runs callbacks before the next frame is painted.
pub trait FrameScheduler {
    fn request_frame(&self, callback: FrameCallback);
}

impl<T: FrameScheduler + ?Sized> FrameScheduler for Rc<T> {
    fn request_frame(&self, callback: FrameCallback) {
        (**self).request_frame(callback);
    }
}

/// A frame loop advanced explicitly with [`FrameQueue::run_frame`].
#[derive(Default)]
pub struct FrameQueue {
    pending: RefCell<VecDeque<FrameCallback>>,
    frames: Cell<u64>,
}

impl FrameQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Callbacks waiting for the next frame.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Frames run so far.
    #[must_use]
    pub fn frames_run(&self) -> u64 {
        self.frames.get()
    }

    /// Runs the callbacks that were queued before this call and returns how
    /// many ran. Callbacks requested while the frame runs wait for the next one.
    pub fn run_frame(&self) -> usize {
        let due: Vec<FrameCallback> = self.pending.borrow_mut().drain(..).collect();
        let count = due.len();
        for callback in due {
            callback();
        }
        self.frames.set(self.frames.get() + 1);
        log::trace!("frame {} ran {count} callback(s)", self.frames.get());
        count
    }

    /// Runs frames until nothing is pending, at most `limit` times. Returns
    /// the number of frames run.
    pub fn run_until_idle(&self, limit: usize) -> usize {
        let mut frames = 0;
        while frames < limit && self.pending() > 0 {
            self.run_frame();
            frames += 1;
        }
        frames
    }
}

impl FrameScheduler for FrameQueue {
    fn request_frame(&self, callback: FrameCallback) {
        self.pending.borrow_mut().push_back(callback);
    }
}

impl std::fmt::Debug for FrameQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameQueue")
            .field("pending", &self.pending())
            .field("frames", &self.frames.get())
            .finish()
    }
}
