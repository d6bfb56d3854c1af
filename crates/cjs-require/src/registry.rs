// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Shared module registry
//!
//! A [`Registry`] is built once and shared by every module system on the
//! thread. It holds the shared native module table, the source loader and the
//! global search folders, and knows how to turn a module file into a program.

use crate::config::RequireConfig;
use crate::engine::Engine;
use crate::error::{RequireError, Result};
use crate::module::ModuleHandle;
use crate::path;
use crate::source::{FsLoader, SourceLoader};
use std::collections::HashMap;
use std::io;
use std::rc::Rc;

/// Populates a fresh module's exports without touching the filesystem
pub type NativeLoader<E> =
    Rc<dyn Fn(&E, &ModuleHandle<<E as Engine>::Value>) -> anyhow::Result<()>>;

/// Opening of the CommonJS function wrapper
pub const MODULE_WRAPPER_HEAD: &str = "(function(exports, require, module) {";

/// Closing of the CommonJS function wrapper
pub const MODULE_WRAPPER_TAIL: &str = "\n})";

/// Wrap module source in the CommonJS function wrapper.
///
/// `.json` files become a module that assigns the parsed document to
/// `module.exports`.
pub fn wrap_source(module_path: &str, source: &str) -> String {
    let body = if path::extname(module_path) == path::DATA_EXTENSION {
        // A JSON string literal is also a valid JS string literal.
        let literal = serde_json::Value::String(source.to_string()).to_string();
        format!("module.exports = JSON.parse({})", literal)
    } else {
        source.to_string()
    };
    format!("{}{}{}", MODULE_WRAPPER_HEAD, body, MODULE_WRAPPER_TAIL)
}

/// Shared configuration and native table for module systems
pub struct Registry<E: Engine> {
    natives: HashMap<String, NativeLoader<E>>,
    loader: Box<dyn SourceLoader>,
    global_folders: Vec<String>,
}

impl<E: Engine> Registry<E> {
    /// Start building a registry
    pub fn builder() -> RegistryBuilder<E> {
        RegistryBuilder::new()
    }

    /// Registry reading from the local filesystem, with no natives
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Look up a shared native module
    pub fn native(&self, name: &str) -> Option<NativeLoader<E>> {
        self.natives.get(name).cloned()
    }

    /// The source loader
    pub fn source_loader(&self) -> &dyn SourceLoader {
        self.loader.as_ref()
    }

    /// Folders searched before node_modules ascent
    pub fn global_folders(&self) -> &[String] {
        &self.global_folders
    }

    /// Read raw bytes for `module_path`.
    ///
    /// `None` when the file is missing or cannot be read; either way the
    /// search moves on to the next candidate.
    pub fn source(&self, module_path: &str) -> Option<Vec<u8>> {
        match self.loader.load(module_path) {
            Ok(bytes) => Some(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::debug!(
                    module = %module_path,
                    error = %e,
                    "skipping unreadable module file"
                );
                None
            }
        }
    }

    /// Load, wrap and compile `module_path`; `Ok(None)` when there is no
    /// readable file there
    pub fn compiled_source(&self, engine: &E, module_path: &str) -> Result<Option<E::Program>> {
        let Some(bytes) = self.source(module_path) else {
            return Ok(None);
        };
        let source = String::from_utf8(bytes).map_err(|e| RequireError::load(module_path, e))?;
        let wrapped = wrap_source(module_path, &source);
        engine
            .compile(module_path, &wrapped)
            .map(Some)
            .map_err(|e| RequireError::load(module_path, e))
    }
}

impl<E: Engine> Default for Registry<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [`Registry`]
pub struct RegistryBuilder<E: Engine> {
    natives: HashMap<String, NativeLoader<E>>,
    loader: Option<Box<dyn SourceLoader>>,
    global_folders: Vec<String>,
}

impl<E: Engine> RegistryBuilder<E> {
    /// Create a builder with no natives, no global folders and the filesystem loader
    pub fn new() -> Self {
        Self {
            natives: HashMap::new(),
            loader: None,
            global_folders: Vec::new(),
        }
    }

    /// Use `loader` for module sources and manifests
    pub fn source_loader(mut self, loader: impl SourceLoader + 'static) -> Self {
        self.loader = Some(Box::new(loader));
        self
    }

    /// Add one global search folder
    pub fn global_folder(mut self, folder: &str) -> Self {
        if !folder.is_empty() {
            self.global_folders.push(path::clean(folder));
        }
        self
    }

    /// Add several global search folders, in search order
    pub fn global_folders<'a>(mut self, folders: impl IntoIterator<Item = &'a str>) -> Self {
        for folder in folders {
            self = self.global_folder(folder);
        }
        self
    }

    /// Apply a loaded configuration
    pub fn config(self, config: &RequireConfig) -> Self {
        self.global_folders(config.global_folders.iter().map(String::as_str))
    }

    /// Register a shared native module
    pub fn native_module<F>(mut self, name: impl Into<String>, loader: F) -> Self
    where
        F: Fn(&E, &ModuleHandle<E::Value>) -> anyhow::Result<()> + 'static,
    {
        self.natives.insert(name.into(), Rc::new(loader));
        self
    }

    /// Finish building
    pub fn build(self) -> Registry<E> {
        Registry {
            natives: self.natives,
            loader: self.loader.unwrap_or_else(|| Box::new(FsLoader::new())),
            global_folders: self.global_folders,
        }
    }
}

impl<E: Engine> Default for RegistryBuilder<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_js() {
        assert_eq!(
            wrap_source("/a.js", "exports.a = 1;"),
            "(function(exports, require, module) {exports.a = 1;\n})"
        );
    }

    #[test]
    fn test_wrap_json() {
        let wrapped = wrap_source("/data.json", "{\"k\": \"v'\"}\n");
        assert_eq!(
            wrapped,
            "(function(exports, require, module) {module.exports = JSON.parse(\"{\\\"k\\\": \\\"v'\\\"}\\n\")\n})"
        );
    }

    #[test]
    fn test_wrap_extensionless_is_source() {
        assert_eq!(
            wrap_source("/bin/tool", "x"),
            "(function(exports, require, module) {x\n})"
        );
    }
}
