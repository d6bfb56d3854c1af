// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # cjs-require
//!
//! CommonJS `require()` for embedded JavaScript engines.
//!
//! This crate decides *which* source a `require` call loads and wires it into
//! the engine; it never parses JavaScript. It provides:
//!
//! - Node.js module resolution: native modules, relative and absolute files,
//!   directories with `package.json` `main` or `index` fallback, global
//!   folders and `node_modules` ascent
//! - One module instance per resolved path, cached before execution so that
//!   cyclic requires see partial exports
//! - The `(exports, require, module)` function wrapper, including `.json`
//!   modules
//! - Filesystem and in-memory source loaders
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cjs_require::{MemoryLoader, Registry, Require};
//! use std::rc::Rc;
//!
//! let registry = Registry::builder()
//!     .source_loader(MemoryLoader::new().with("/app/main.js", "exports.answer = 42;"))
//!     .native_module("os", |engine: &MyEngine, module| {
//!         module.set_exports(engine.os_object());
//!         Ok(())
//!     })
//!     .build();
//!
//! let require = Require::new(Rc::new(registry), Rc::new(MyEngine::new()));
//! let exports = require.require("/app/main.js")?;
//! ```
//!
//! The engine is supplied through the [`Engine`] trait.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod manifest;
mod module;
pub mod path;
pub mod registry;
pub mod resolver;
mod require;
pub mod source;

// Re-exports
pub use cache::{CachedModule, ModuleCache};
pub use config::RequireConfig;
pub use engine::{Engine, ModuleScope, RequireFn};
pub use error::{RequireError, Result};
pub use manifest::PackageManifest;
pub use module::{Module, ModuleHandle, ModuleState};
pub use registry::{
    MODULE_WRAPPER_HEAD, MODULE_WRAPPER_TAIL, NativeLoader, Registry, RegistryBuilder,
};
pub use require::{Require, Resolved};
pub use resolver::{Request, RequestKind, Resolver};
pub use source::{FsLoader, MemoryLoader, SourceLoader};

/// Version of the cjs-require crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
