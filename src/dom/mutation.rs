// SPDX-License-Identifier: MPL-2.0
//! Mutation records and subtree observers.

use super::{Document, NodeId};
use std::fmt;
use std::rc::Rc;

/// Callback invoked synchronously after every mutation inside an observed subtree.
pub type ObserverCallback = Rc<dyn Fn(&Document, &[MutationRecord])>;

/// Handle returned by [`Document::observe`], used to disconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(pub(super) u64);

/// What changed on the record's target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationKind {
    /// Children were inserted into and/or removed from the target.
    ChildList {
        added: Vec<NodeId>,
        removed: Vec<NodeId>,
    },
    /// An attribute of the target was set or removed.
    Attributes {
        name: String,
        old_value: Option<String>,
    },
    /// The data of a text node changed.
    CharacterData { old_value: String },
}

/// A single change reported to observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    pub target: NodeId,
    pub kind: MutationKind,
}

impl MutationRecord {
    /// Nodes inserted by this mutation; empty for attribute and text changes.
    #[must_use]
    pub fn added_nodes(&self) -> &[NodeId] {
        match &self.kind {
            MutationKind::ChildList { added, .. } => added,
            _ => &[],
        }
    }
}

pub(super) struct Observer {
    pub(super) id: ObserverId,
    pub(super) target: NodeId,
    pub(super) callback: ObserverCallback,
}

impl fmt::Debug for Observer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observer")
            .field("id", &self.id)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

impl Document {
    /// Registers `callback` for every mutation whose target is `target` or one
    /// of its descendants.
    pub fn observe(&mut self, target: NodeId, callback: ObserverCallback) -> ObserverId {
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        self.observers.push(Observer {
            id,
            target,
            callback,
        });
        id
    }

    /// Removes an observer. Unknown ids are ignored.
    pub fn disconnect(&mut self, id: ObserverId) {
        self.observers.retain(|observer| observer.id != id);
    }

    /// Number of registered observers.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    pub(super) fn notify(&self, record: MutationRecord) {
        if self.observers.is_empty() {
            return;
        }
        // Collected first so a callback never runs while `observers` is iterated.
        let callbacks: Vec<ObserverCallback> = self
            .observers
            .iter()
            .filter(|observer| self.contains(observer.target, record.target))
            .map(|observer| Rc::clone(&observer.callback))
            .collect();
        let records = std::slice::from_ref(&record);
        for callback in callbacks {
            callback(self, records);
        }
    }
}
