// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Minimal package.json structure for directory loading

use serde::Deserialize;

/// The only part of a package manifest the loader looks at
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageManifest {
    /// Entry point relative to the package directory
    #[serde(default)]
    pub main: Option<String>,
}

impl PackageManifest {
    /// Parse manifest bytes
    pub fn parse(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    /// The `main` entry, if present and non-empty
    pub fn main_entry(&self) -> Option<&str> {
        self.main.as_deref().filter(|m| !m.is_empty())
    }
}

/// Read the `main` entry out of raw manifest bytes.
///
/// Malformed JSON, a non-string `main`, or an empty one all yield `None`.
pub fn main_entry(bytes: &[u8]) -> Option<String> {
    PackageManifest::parse(bytes)
        .ok()
        .and_then(|pkg| pkg.main_entry().map(str::to_string))
}
