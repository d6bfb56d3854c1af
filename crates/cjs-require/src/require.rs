// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! CommonJS require() implementation
//!
//! [`Require`] is the per-engine module system. It owns three caches:
//!
//! - path-keyed: every module file by resolved path, plus the joined path of
//!   each relative request that reached it;
//! - bare-keyed: the joined `start/specifier` key of each bare request;
//! - native: instantiated native modules by name.
//!
//! A file module is cached *before* its body runs, so a cyclic require gets
//! the partially populated handle instead of recursing. A failed load
//! removes the entry again.

use crate::cache::ModuleCache;
use crate::engine::{Engine, ModuleScope, RequireFn};
use crate::error::{RequireError, Result};
use crate::module::{Module, ModuleHandle, ModuleState};
use crate::path;
use crate::registry::{NativeLoader, Registry};
use crate::resolver::{Request, RequestKind, Resolver};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Result of a dry-run resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    /// Native module, by registered name
    Native(String),
    /// Module file, by resolved path
    File(String),
}

struct State<E: Engine> {
    engine: Rc<E>,
    registry: Rc<Registry<E>>,
    natives: RefCell<HashMap<String, NativeLoader<E>>>,
    modules: RefCell<ModuleCache<E::Value>>,
    node_modules: RefCell<HashMap<String, ModuleHandle<E::Value>>>,
    native_modules: RefCell<HashMap<String, ModuleHandle<E::Value>>>,
}

/// Module system for one engine instance
pub struct Require<E: Engine> {
    state: Rc<State<E>>,
}

impl<E: Engine> Clone for Require<E> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
        }
    }
}

impl<E: Engine> Require<E> {
    /// Create a module system for `engine` backed by `registry`
    pub fn new(registry: Rc<Registry<E>>, engine: Rc<E>) -> Self {
        Self {
            state: Rc::new(State {
                engine,
                registry,
                natives: RefCell::new(HashMap::new()),
                modules: RefCell::new(ModuleCache::new()),
                node_modules: RefCell::new(HashMap::new()),
                native_modules: RefCell::new(HashMap::new()),
            }),
        }
    }

    /// The engine modules run in
    pub fn engine(&self) -> &Rc<E> {
        &self.state.engine
    }

    /// The shared registry
    pub fn registry(&self) -> &Rc<Registry<E>> {
        &self.state.registry
    }

    /// Register a native module for this instance only.
    ///
    /// Instance natives take precedence over the registry's.
    pub fn register_native<F>(&self, name: impl Into<String>, loader: F)
    where
        F: Fn(&E, &ModuleHandle<E::Value>) -> anyhow::Result<()> + 'static,
    {
        self.state
            .natives
            .borrow_mut()
            .insert(name.into(), Rc::new(loader));
    }

    /// `require(specifier)` from host code; returns the module's exports
    pub fn require(&self, specifier: &str) -> Result<E::Value> {
        Ok(self.require_module(specifier)?.exports())
    }

    /// `require(specifier)` on behalf of the module at `caller_path`
    pub fn require_from(&self, specifier: &str, caller_path: &str) -> Result<E::Value> {
        Ok(self.require_module_from(specifier, caller_path)?.exports())
    }

    /// Like [`require`](Self::require), but returns the module handle
    pub fn require_module(&self, specifier: &str) -> Result<ModuleHandle<E::Value>> {
        let caller_dir = self.host_caller_dir();
        self.resolve_module(specifier, &caller_dir)
    }

    /// Like [`require_from`](Self::require_from), but returns the module handle
    pub fn require_module_from(
        &self,
        specifier: &str,
        caller_path: &str,
    ) -> Result<ModuleHandle<E::Value>> {
        self.resolve_module(specifier, &path::dirname(caller_path))
    }

    /// A host-level `require` for the embedder to expose as a global
    pub fn require_fn(&self) -> RequireFn<E::Value> {
        let state = Rc::downgrade(&self.state);
        Rc::new(move |specifier: &str| {
            let state = state.upgrade().ok_or(RequireError::Detached)?;
            Require { state }.require(specifier)
        })
    }

    /// Work out what `specifier` would load without running anything.
    ///
    /// Uses the same search order as [`require`](Self::require) but only checks
    /// that candidate files exist. `caller_path` defaults to the engine's
    /// current script, then to the top level.
    pub fn resolve(&self, specifier: &str, caller_path: Option<&str>) -> Result<Resolved> {
        let caller_dir = match caller_path {
            Some(caller) => path::dirname(caller),
            None => self.host_caller_dir(),
        };
        let request = Request::parse(specifier, &caller_dir)?;

        if self.has_native(specifier) {
            return Ok(Resolved::Native(specifier.to_string()));
        }
        if let Some(module) = self.cached(&request) {
            return Ok(Resolved::File(module.id().to_string()));
        }

        let registry = &self.state.registry;
        Resolver::new(registry.source_loader(), registry.global_folders())
            .resolve_request(&request)
            .map(Resolved::File)
    }

    /// Lifecycle state of the module cached under `key`.
    ///
    /// `key` may be a module path, a joined relative request, a bare request
    /// key or a native name. `None` means nothing is cached there, including
    /// after a failed load.
    pub fn module_state(&self, key: &str) -> Option<ModuleState> {
        let handle = self.cached_handle(key)?;
        Some(
            self.state
                .modules
                .borrow()
                .state(handle.id())
                .unwrap_or(ModuleState::Complete),
        )
    }

    /// Whether anything is cached under `key` in any cache
    pub fn is_cached(&self, key: &str) -> bool {
        self.cached_handle(key).is_some()
    }

    /// Every path-keyed cache entry, sorted
    pub fn cached_paths(&self) -> Vec<String> {
        self.state.modules.borrow().keys()
    }

    /// Every bare-specifier cache key, sorted
    pub fn cached_packages(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.state.node_modules.borrow().keys().cloned().collect();
        keys.sort();
        keys
    }

    fn cached_handle(&self, key: &str) -> Option<ModuleHandle<E::Value>> {
        let state = &self.state;
        state
            .modules
            .borrow()
            .handle(key)
            .or_else(|| state.node_modules.borrow().get(key).cloned())
            .or_else(|| state.native_modules.borrow().get(key).cloned())
    }

    fn cached(&self, request: &Request) -> Option<ModuleHandle<E::Value>> {
        match request.kind {
            RequestKind::Relative => self.state.modules.borrow().handle(&request.key),
            RequestKind::Bare => self.state.node_modules.borrow().get(&request.key).cloned(),
        }
    }

    fn host_caller_dir(&self) -> String {
        self.state
            .engine
            .caller_path()
            .map(|caller| path::dirname(&caller))
            .unwrap_or_else(|| ".".to_string())
    }

    /// Resolve and load `specifier` as required from a module in `caller_dir`
    fn resolve_module(&self, specifier: &str, caller_dir: &str) -> Result<ModuleHandle<E::Value>> {
        let request = Request::parse(specifier, caller_dir)?;

        if let Some(module) = self.load_native(specifier)? {
            return Ok(module);
        }

        if let Some(module) = self.cached(&request) {
            return Ok(module);
        }

        let module = self
            .search(&request)?
            .ok_or_else(|| RequireError::module_not_found(specifier))?;

        match request.kind {
            RequestKind::Relative => {
                let mut modules = self.state.modules.borrow_mut();
                let state = modules.state(module.id()).unwrap_or(ModuleState::Complete);
                modules.set(request.key, Rc::clone(&module), state);
            }
            RequestKind::Bare => {
                self.state
                    .node_modules
                    .borrow_mut()
                    .insert(request.key, Rc::clone(&module));
            }
        }

        Ok(module)
    }

    fn search(&self, request: &Request) -> Result<Option<ModuleHandle<E::Value>>> {
        let registry = Rc::clone(&self.state.registry);
        let resolver = Resolver::new(registry.source_loader(), registry.global_folders());
        let mut probe = |candidate: &str| self.load_module(candidate);
        resolver.search(request, &mut probe)
    }

    fn has_native(&self, name: &str) -> bool {
        self.state.native_modules.borrow().contains_key(name)
            || self.state.natives.borrow().contains_key(name)
            || self.state.registry.native(name).is_some()
    }

    /// Instantiate a native module once per instance; `Ok(None)` if `name`
    /// is not registered.
    fn load_native(&self, name: &str) -> Result<Option<ModuleHandle<E::Value>>> {
        let cached = self.state.native_modules.borrow().get(name).cloned();
        if let Some(module) = cached {
            return Ok(Some(module));
        }

        let local = self.state.natives.borrow().get(name).cloned();
        let Some(loader) = local.or_else(|| self.state.registry.native(name)) else {
            return Ok(None);
        };

        let engine = self.state.engine.as_ref();
        let module = Module::new(name, engine.new_object());
        self.state
            .native_modules
            .borrow_mut()
            .insert(name.to_string(), Rc::clone(&module));

        if let Err(e) = loader(engine, &module) {
            self.state.native_modules.borrow_mut().remove(name);
            return Err(RequireError::Execution(e));
        }

        tracing::debug!(module = %name, "native module loaded");
        Ok(Some(module))
    }

    /// Load the module file at `module_path`, reusing a cached handle.
    ///
    /// `Ok(None)` means there is no such file and nothing was cached.
    fn load_module(&self, module_path: &str) -> Result<Option<ModuleHandle<E::Value>>> {
        let cached = {
            let modules = self.state.modules.borrow();
            modules
                .handle(module_path)
                .map(|module| (module, modules.state(module_path)))
        };
        if let Some((module, state)) = cached {
            if state.is_some_and(ModuleState::is_loading) {
                tracing::debug!(module = %module_path, "cyclic require of an unfinished module");
            }
            return Ok(Some(module));
        }

        let module = Module::new(module_path, self.state.engine.new_object());
        self.state
            .modules
            .borrow_mut()
            .set(module_path, Rc::clone(&module), ModuleState::Pending);

        match self.load_module_file(module_path, &module) {
            Ok(true) => {
                self.state
                    .modules
                    .borrow_mut()
                    .set_state(module_path, ModuleState::Complete);
                tracing::debug!(module = %module_path, "module loaded");
                Ok(Some(module))
            }
            Ok(false) => {
                self.state.modules.borrow_mut().delete(module_path);
                Ok(None)
            }
            Err(e) => {
                self.evict(&module);
                tracing::debug!(module = %module_path, "evicted module after failed load");
                Err(e)
            }
        }
    }

    /// Drop every cache entry pointing at `module`.
    ///
    /// A cyclic require may have cached the module under a request key while
    /// its body was still running; those aliases go too.
    fn evict(&self, module: &ModuleHandle<E::Value>) {
        self.state.modules.borrow_mut().delete_handle(module);
        self.state
            .node_modules
            .borrow_mut()
            .retain(|_, cached| !Rc::ptr_eq(cached, module));
    }

    /// Compile and execute; `Ok(false)` when the file does not exist
    fn load_module_file(&self, module_path: &str, module: &ModuleHandle<E::Value>) -> Result<bool> {
        let engine = self.state.engine.as_ref();
        let Some(program) = self.state.registry.compiled_source(engine, module_path)? else {
            return Ok(false);
        };
        self.execute_module(module_path, &program, module)?;
        Ok(true)
    }

    /// Run the compiled wrapper as
    /// `wrapper.call(exports, exports, require, module)`
    fn execute_module(
        &self,
        module_path: &str,
        program: &E::Program,
        module: &ModuleHandle<E::Value>,
    ) -> Result<()> {
        let engine = self.state.engine.as_ref();
        let function = engine.run_program(program).map_err(RequireError::Execution)?;
        if !engine.is_function(&function) {
            return Err(RequireError::InvalidModule(module_path.to_string()));
        }

        self.state
            .modules
            .borrow_mut()
            .set_state(module_path, ModuleState::Executing);

        let exports = module.exports();
        let scope = ModuleScope {
            this: exports.clone(),
            exports,
            require: self.bound_require(module_path),
            module: Rc::clone(module),
        };
        engine
            .call_module(&function, scope)
            .map_err(RequireError::Execution)
    }

    /// A `require` whose relative specifiers resolve against `module_path`'s directory
    fn bound_require(&self, module_path: &str) -> RequireFn<E::Value> {
        let state = Rc::downgrade(&self.state);
        let caller_dir = path::dirname(module_path);
        Rc::new(move |specifier: &str| {
            let state = state.upgrade().ok_or(RequireError::Detached)?;
            Require { state }
                .resolve_module(specifier, &caller_dir)
                .map(|module| module.exports())
        })
    }
}
