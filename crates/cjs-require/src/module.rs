// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module handles

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Shared, identity-stable handle on a loaded module
pub type ModuleHandle<V> = Rc<Module<V>>;

/// One loaded module instance and its exports
pub struct Module<V> {
    id: String,
    exports: RefCell<V>,
}

impl<V: Clone> Module<V> {
    /// Create a module whose exports start as `exports`
    pub fn new(id: impl Into<String>, exports: V) -> ModuleHandle<V> {
        Rc::new(Self {
            id: id.into(),
            exports: RefCell::new(exports),
        })
    }

    /// Resolved path for file modules, the registered name for native ones
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current `module.exports`
    pub fn exports(&self) -> V {
        self.exports.borrow().clone()
    }

    /// Replace `module.exports` wholesale
    pub fn set_exports(&self, exports: V) {
        *self.exports.borrow_mut() = exports;
    }
}

impl<V> fmt::Debug for Module<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module").field("id", &self.id).finish_non_exhaustive()
    }
}

/// Lifecycle of a path-keyed cache entry.
///
/// A failed module is removed from the cache outright, so there is no
/// failed state: a later require starts again from scratch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleState {
    /// Handle registered, source not yet compiled
    Pending,
    /// Module body is running; cyclic requires see partial exports
    Executing,
    /// Module body returned successfully
    Complete,
}

impl ModuleState {
    /// Whether the body has not finished yet
    pub fn is_loading(self) -> bool {
        !matches!(self, Self::Complete)
    }
}
