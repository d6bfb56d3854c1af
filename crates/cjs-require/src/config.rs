// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Configuration for the module registry

use crate::error::{RequireError, Result};
use crate::path;
use serde::Deserialize;
use std::path::Path;

/// Registry configuration, usually read from a JSON file
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RequireConfig {
    /// Folders searched for bare specifiers before any node_modules ascent
    pub global_folders: Vec<String>,
}

impl RequireConfig {
    /// Parse configuration from JSON text
    pub fn from_json(text: &str) -> Result<Self> {
        let mut config: Self =
            serde_json::from_str(text).map_err(|e| RequireError::Config(e.to_string()))?;
        config.normalize();
        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn from_file(file: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(file)
            .map_err(|e| RequireError::Config(format!("{}: {}", file.display(), e)))?;
        Self::from_json(&text)
    }

    /// Parse a `NODE_PATH`-style list (colon separated)
    pub fn from_search_path(list: &str) -> Self {
        let mut config = Self {
            global_folders: list.split(':').map(str::to_string).collect(),
        };
        config.normalize();
        config
    }

    /// Drop empty folders and clean the rest
    fn normalize(&mut self) {
        self.global_folders.retain(|f| !f.is_empty());
        for folder in &mut self.global_folders {
            *folder = path::clean(folder);
        }
    }
}
