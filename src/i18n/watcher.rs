// SPDX-License-Identifier: MPL-2.0
//! Batching state for inserted nodes.
//!
//! Every notification burst adds its inserted elements to one pending batch.
//! The first burst after a flush asks for a frame; later bursts only grow the
//! batch, so any number of insertions between two frames costs one flush.

use crate::dom::{Document, MutationRecord, NodeId};
use std::cell::{Cell, RefCell};
use std::collections::HashSet;

use super::guard::ReentrancyGuard;

#[derive(Debug, Default)]
struct Batch {
    nodes: Vec<NodeId>,
    seen: HashSet<NodeId>,
}

impl Batch {
    fn push(&mut self, node: NodeId) {
        if self.seen.insert(node) {
            self.nodes.push(node);
        }
    }
}

/// Collects inserted elements between frames.
#[derive(Debug, Default)]
pub struct MutationWatcher {
    pending: RefCell<Batch>,
    scheduled: Cell<bool>,
}

impl MutationWatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one notification burst.
    ///
    /// Ignores everything while `guard` is held. Returns `true` when the
    /// caller must request a frame: the batch is non-empty and no frame is
    /// already pending.
    pub fn record(&self, doc: &Document, records: &[MutationRecord], guard: &ReentrancyGuard) -> bool {
        if guard.is_active() {
            return false;
        }
        let mut pending = self.pending.borrow_mut();
        for node in records.iter().flat_map(MutationRecord::added_nodes) {
            if doc.is_element(*node) {
                pending.push(*node);
            }
        }
        if pending.nodes.is_empty() || self.scheduled.get() {
            return false;
        }
        self.scheduled.set(true);
        true
    }

    /// Takes the pending batch in insertion order and clears the scheduled
    /// flag, so insertions made by whoever handles the batch start a new one.
    pub fn take_batch(&self) -> Vec<NodeId> {
        self.scheduled.set(false);
        let batch = std::mem::take(&mut *self.pending.borrow_mut());
        batch.nodes
    }

    /// Puts a batch that could not be handled back in front of the queue.
    /// Returns `true` when the caller must request a frame again.
    pub fn restore(&self, nodes: Vec<NodeId>) -> bool {
        let mut pending = self.pending.borrow_mut();
        let newer = std::mem::take(&mut *pending);
        for node in nodes.into_iter().chain(newer.nodes) {
            pending.push(node);
        }
        if pending.nodes.is_empty() || self.scheduled.get() {
            return false;
        }
        self.scheduled.set(true);
        true
    }

    /// Whether a frame has been requested and not yet handled.
    #[must_use]
    pub fn is_scheduled(&self) -> bool {
        self.scheduled.get()
    }

    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.borrow().nodes.len()
    }
}
