//! Thread-scoped stack of override contexts.
//!
//! Each thread carries its own stack; scopes entered on one thread are
//! invisible to every other thread. Frames are pushed and popped strictly
//! LIFO, and lookups scan from the newest frame toward the oldest so that
//! nested scopes shadow outer ones.

use std::cell::RefCell;

use rustc_hash::FxHashMap;

use crate::error::{Result, VersionError};
use crate::identity::Identity;

/// One scope's overrides: identity to chosen version name. Populated at
/// scope entry, read-only afterwards.
pub(crate) type OverrideMap = FxHashMap<Identity, String>;

#[derive(Debug, Default)]
pub(crate) struct ContextStack {
    frames: Vec<OverrideMap>,
}

impl ContextStack {
    pub(crate) fn depth(&self) -> usize {
        self.frames.len()
    }

    pub(crate) fn push(&mut self) {
        self.frames.push(OverrideMap::default());
    }

    /// Remove the most recently pushed frame.
    pub(crate) fn pop(&mut self) -> Result<()> {
        match self.frames.pop() {
            Some(_) => Ok(()),
            None => Err(VersionError::EmptyStack),
        }
    }

    /// Current (most recently pushed) frame.
    pub(crate) fn top_mut(&mut self) -> Result<&mut OverrideMap> {
        self.frames.last_mut().ok_or(VersionError::EmptyStack)
    }

    /// First hit scanning newest to oldest.
    pub(crate) fn search(&self, identity: &Identity) -> Option<String> {
        self.frames.iter().rev().find_map(|frame| frame.get(identity).cloned())
    }
}

thread_local! {
    static CONTEXT: RefCell<ContextStack> = const { RefCell::new(ContextStack { frames: Vec::new() }) };
}

/// Run `f` against the calling thread's context stack.
pub(crate) fn with_stack<F, T>(f: F) -> T
where
    F: FnOnce(&mut ContextStack) -> T,
{
    CONTEXT.with(|cell| f(&mut cell.borrow_mut()))
}

/// Version name the calling thread's scopes currently select for
/// `identity`, innermost scope first.
pub fn active_version(identity: &Identity) -> Option<String> {
    with_stack(|stack| stack.search(identity))
}

/// Number of override scopes active on the calling thread.
pub fn depth() -> usize {
    with_stack(|stack| stack.depth())
}
