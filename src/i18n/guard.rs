// SPDX-License-Identifier: MPL-2.0
//! Re-entrancy guard for translation passes.
//!
//! Held for the whole duration of any code path that writes to the observed
//! document. The mutation watcher ignores every notification delivered while
//! it is held, so the engine never reacts to its own writes.

use std::cell::Cell;
use std::rc::Rc;

/// Shared flag; clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct ReentrancyGuard {
    active: Rc<Cell<bool>>,
}

impl ReentrancyGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a scope is currently held.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    /// Marks the guard active until the returned scope is dropped.
    ///
    /// Nested scopes restore the state they found, so only the outermost
    /// release clears the flag. Release happens during unwinding too.
    #[must_use = "the guard is released as soon as the scope is dropped"]
    pub fn acquire(&self) -> GuardScope {
        GuardScope {
            active: Rc::clone(&self.active),
            previous: self.active.replace(true),
        }
    }
}

/// Releases the guard on drop.
#[derive(Debug)]
pub struct GuardScope {
    active: Rc<Cell<bool>>,
    previous: bool,
}

impl Drop for GuardScope {
    fn drop(&mut self) {
        self.active.set(self.previous);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    #[test]
    fn scope_sets_and_clears_flag() {
        let guard = ReentrancyGuard::new();
        assert!(!guard.is_active());
        {
            let _scope = guard.acquire();
            assert!(guard.is_active());
        }
        assert!(!guard.is_active());
    }

    #[test]
    fn nested_scopes_release_at_outermost() {
        let guard = ReentrancyGuard::new();
        let outer = guard.acquire();
        {
            let _inner = guard.acquire();
        }
        assert!(guard.is_active());
        drop(outer);
        assert!(!guard.is_active());
    }

    #[test]
    fn clones_share_state() {
        let guard = ReentrancyGuard::new();
        let observer = guard.clone();
        let _scope = guard.acquire();
        assert!(observer.is_active());
    }

    #[test]
    fn panic_inside_scope_releases_guard() {
        let guard = ReentrancyGuard::new();
        let result = catch_unwind(AssertUnwindSafe(|| {
            let _scope = guard.acquire();
            panic!("write failed mid-pass");
        }));
        assert!(result.is_err());
        assert!(!guard.is_active());
    }
}
