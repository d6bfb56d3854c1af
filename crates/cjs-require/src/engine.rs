// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! The scripting engine seam
//!
//! The module system never parses or runs JavaScript itself. It hands wrapped
//! source to an [`Engine`], runs the resulting program to obtain the wrapper
//! function, and calls that function with a [`ModuleScope`].

use crate::error::Result;
use crate::module::ModuleHandle;
use std::rc::Rc;

/// A `require` function as seen from inside a module.
///
/// Returns the required module's `exports`.
pub type RequireFn<V> = Rc<dyn Fn(&str) -> Result<V>>;

/// Values handed to a module wrapper when it is called
pub struct ModuleScope<V> {
    /// Receiver of the call; the module's initial `exports`
    pub this: V,
    /// The `exports` parameter
    pub exports: V,
    /// The `require` parameter, bound to this module's path
    pub require: RequireFn<V>,
    /// The `module` parameter
    pub module: ModuleHandle<V>,
}

/// Operations the module system needs from the host interpreter
pub trait Engine: 'static {
    /// Any engine value
    type Value: Clone + 'static;

    /// A compiled, not yet executed script
    type Program;

    /// Create an empty object, used as a fresh module's `exports`
    fn new_object(&self) -> Self::Value;

    /// Compile wrapped module source. `name` is the module path and should be
    /// used as the script name in stack traces.
    fn compile(&self, name: &str, source: &str) -> anyhow::Result<Self::Program>;

    /// Run a compiled program and return its completion value
    fn run_program(&self, program: &Self::Program) -> anyhow::Result<Self::Value>;

    /// Whether `value` can be called
    fn is_function(&self, value: &Self::Value) -> bool;

    /// Call a module wrapper as `function.call(this, exports, require, module)`
    fn call_module(
        &self,
        function: &Self::Value,
        scope: ModuleScope<Self::Value>,
    ) -> anyhow::Result<()>;

    /// Script name of the code currently calling into the host, if the engine
    /// can tell.
    ///
    /// Only consulted for host-level requires that carry no caller path.
    fn caller_path(&self) -> Option<String> {
        None
    }
}
