// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Error types for module resolution and loading

use thiserror::Error;

/// Result type for require operations
pub type Result<T> = std::result::Result<T, RequireError>;

/// Errors that can occur while resolving, loading or executing a module
#[derive(Debug, Error)]
pub enum RequireError {
    /// The specifier normalized to an empty path
    #[error("Illegal module name: '{0}'")]
    IllegalModuleName(String),

    /// No native loader, file, index or node_modules candidate matched
    #[error("Cannot find module '{0}'")]
    ModuleNotFound(String),

    /// The compiled source did not evaluate to a callable wrapper
    #[error("Invalid module: '{0}'")]
    InvalidModule(String),

    /// The module body (or a native loader) raised an error.
    ///
    /// The engine's error is kept as-is so the host can downcast it.
    #[error(transparent)]
    Execution(anyhow::Error),

    /// The source exists but could not be read or compiled
    #[error("Error loading module '{path}': {source}")]
    Load {
        /// Resolved path of the module
        path: String,
        /// Underlying failure
        #[source]
        source: anyhow::Error,
    },

    /// Configuration file error
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A bound require function outlived its module system
    #[error("Module system has been dropped")]
    Detached,
}

impl RequireError {
    /// Create a module not found error
    pub fn module_not_found(module: impl Into<String>) -> Self {
        Self::ModuleNotFound(module.into())
    }

    /// Create a load error for `path`
    pub fn load(path: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::Load {
            path: path.into(),
            source: source.into(),
        }
    }

    /// Whether this error means "nothing was found", as opposed to a failure
    /// inside a module that was found.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ModuleNotFound(_))
    }
}
