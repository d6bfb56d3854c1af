// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Source providers
//!
//! A [`SourceLoader`] turns a cleaned module path into bytes. A missing file
//! is reported as [`io::ErrorKind::NotFound`]. Resolution treats every read
//! error the same way and moves on to the next candidate.

use crate::path;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;

/// Byte source for module files and manifests
pub trait SourceLoader {
    /// Read the whole file at `path`.
    ///
    /// Directories must be reported as `NotFound`.
    fn load(&self, path: &str) -> io::Result<Vec<u8>>;

    /// Whether a readable file exists at `path`
    fn is_file(&self, path: &str) -> bool {
        self.load(path).is_ok()
    }
}

fn not_found(path: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("Module file '{}' not found", path),
    )
}

/// Reads modules from the local filesystem
#[derive(Debug, Clone, Default)]
pub struct FsLoader {
    root: Option<PathBuf>,
}

impl FsLoader {
    /// Loader resolving paths as given (relative paths against the cwd)
    pub fn new() -> Self {
        Self { root: None }
    }

    /// Loader that maps every module path beneath `root`.
    ///
    /// `/lib/a.js` is read from `<root>/lib/a.js`. Paths are cleaned as if
    /// absolute first, so `..` stops at `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn host_path(&self, path: &str) -> PathBuf {
        match &self.root {
            Some(root) => {
                let rooted = path::clean(&format!("/{}", path));
                root.join(rooted.trim_start_matches('/'))
            }
            None => PathBuf::from(path),
        }
    }
}

fn missing_kind(kind: io::ErrorKind) -> bool {
    matches!(
        kind,
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory | io::ErrorKind::IsADirectory
    )
}

impl SourceLoader for FsLoader {
    fn load(&self, path: &str) -> io::Result<Vec<u8>> {
        let host = self.host_path(path);
        match fs::metadata(&host) {
            Ok(meta) if meta.is_dir() => return Err(not_found(path)),
            Ok(_) => {}
            Err(e) if missing_kind(e.kind()) => return Err(not_found(path)),
            Err(e) => return Err(e),
        }
        fs::read(&host).map_err(|e| {
            if missing_kind(e.kind()) {
                not_found(path)
            } else {
                e
            }
        })
    }

    fn is_file(&self, path: &str) -> bool {
        fs::metadata(self.host_path(path)).is_ok_and(|meta| meta.is_file())
    }
}

/// In-memory module files, keyed by cleaned path
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    files: HashMap<String, Vec<u8>>,
}

impl MemoryLoader {
    /// Create an empty loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file, builder style
    pub fn with(mut self, path: &str, contents: impl Into<Vec<u8>>) -> Self {
        self.insert(path, contents);
        self
    }

    /// Add or replace a file
    pub fn insert(&mut self, path: &str, contents: impl Into<Vec<u8>>) {
        self.files.insert(path::clean(path), contents.into());
    }
}

impl SourceLoader for MemoryLoader {
    fn load(&self, path: &str) -> io::Result<Vec<u8>> {
        self.files
            .get(&path::clean(path))
            .cloned()
            .ok_or_else(|| not_found(path))
    }

    fn is_file(&self, path: &str) -> bool {
        self.files.contains_key(&path::clean(path))
    }
}

impl<L: SourceLoader + ?Sized> SourceLoader for std::rc::Rc<L> {
    fn load(&self, path: &str) -> io::Result<Vec<u8>> {
        (**self).load(path)
    }

    fn is_file(&self, path: &str) -> bool {
        (**self).is_file(path)
    }
}

impl<L: SourceLoader + ?Sized> SourceLoader for std::cell::RefCell<L> {
    fn load(&self, path: &str) -> io::Result<Vec<u8>> {
        self.borrow().load(path)
    }

    fn is_file(&self, path: &str) -> bool {
        self.borrow().is_file(path)
    }
}
