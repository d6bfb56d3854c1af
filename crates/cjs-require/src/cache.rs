// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module caches for require()

use crate::module::{ModuleHandle, ModuleState};
use std::collections::HashMap;
use std::rc::Rc;

/// Cached module entry
#[derive(Debug)]
pub struct CachedModule<V> {
    /// The module handle
    pub handle: ModuleHandle<V>,
    /// Where the module is in its lifecycle
    pub state: ModuleState,
}

impl<V> Clone for CachedModule<V> {
    fn clone(&self) -> Self {
        Self {
            handle: Rc::clone(&self.handle),
            state: self.state,
        }
    }
}

/// Module cache keyed by resolved path or bare-specifier key.
///
/// Not synchronized: each module system owns its caches and is driven from
/// one thread.
#[derive(Debug)]
pub struct ModuleCache<V> {
    cache: HashMap<String, CachedModule<V>>,
}

impl<V> ModuleCache<V> {
    /// Create a new empty cache
    pub fn new() -> Self {
        Self {
            cache: HashMap::new(),
        }
    }

    /// Get just the handle for a key
    pub fn handle(&self, key: &str) -> Option<ModuleHandle<V>> {
        self.cache.get(key).map(|entry| Rc::clone(&entry.handle))
    }

    /// Lifecycle state of a cached module
    pub fn state(&self, key: &str) -> Option<ModuleState> {
        self.cache.get(key).map(|entry| entry.state)
    }

    /// Add a module to the cache, replacing any previous entry
    pub fn set(&mut self, key: impl Into<String>, handle: ModuleHandle<V>, state: ModuleState) {
        self.cache.insert(key.into(), CachedModule { handle, state });
    }

    /// Move an existing entry to `state`. Returns false if `key` is absent.
    pub fn set_state(&mut self, key: &str, state: ModuleState) -> bool {
        match self.cache.get_mut(key) {
            Some(entry) => {
                entry.state = state;
                true
            }
            None => false,
        }
    }

    /// Remove a module from the cache
    pub fn delete(&mut self, key: &str) -> Option<CachedModule<V>> {
        self.cache.remove(key)
    }

    /// Remove every entry holding `handle`, returning how many were removed
    pub fn delete_handle(&mut self, handle: &ModuleHandle<V>) -> usize {
        let before = self.cache.len();
        self.cache.retain(|_, entry| !Rc::ptr_eq(&entry.handle, handle));
        before - self.cache.len()
    }

    /// Get all cached keys, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.cache.keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl<V> Default for ModuleCache<V> {
    fn default() -> Self {
        Self::new()
    }
}
