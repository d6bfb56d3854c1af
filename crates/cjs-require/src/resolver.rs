// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module path resolution (Node.js "all together" algorithm)
//!
//! The search order lives here once. What happens at each candidate is left
//! to a probe: loading a module uses a probe that compiles and runs the
//! file, a dry-run resolve uses one that only checks the file exists. A probe
//! returns `Ok(None)` to move on to the next candidate; an error aborts the
//! whole search.

use crate::error::{RequireError, Result};
use crate::manifest;
use crate::path::{self, DATA_EXTENSION, NODE_MODULES, PACKAGE_JSON, SOURCE_EXTENSION};
use crate::source::SourceLoader;

/// How a specifier is looked up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// `./x`, `../x`, `/x`, `.` or `..`: file or directory relative to the start
    Relative,
    /// A package name, searched in global folders and node_modules
    Bare,
}

/// A classified require request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// The specifier as written
    pub specifier: String,
    /// The specifier with `.` and `..` collapsed
    pub normalized: String,
    /// Directory the search starts from
    pub start: String,
    /// `start` joined with `normalized`; the cache key for this request
    pub key: String,
    /// Lookup strategy
    pub kind: RequestKind,
}

impl Request {
    /// Classify `specifier` as required from a module in `caller_dir`
    pub fn parse(specifier: &str, caller_dir: &str) -> Result<Self> {
        let normalized = path::normalize_specifier(specifier);
        if normalized.is_empty() {
            return Err(RequireError::IllegalModuleName(specifier.to_string()));
        }

        let start = if specifier.starts_with('/') {
            "/".to_string()
        } else {
            caller_dir.to_string()
        };
        let key = path::join(&[&start, &normalized]);
        let kind = if path::is_relative_specifier(specifier) {
            RequestKind::Relative
        } else {
            RequestKind::Bare
        };

        Ok(Self {
            specifier: specifier.to_string(),
            normalized,
            start,
            key,
            kind,
        })
    }
}

/// Walks the candidate files for a request
#[derive(Clone, Copy)]
pub struct Resolver<'a> {
    loader: &'a dyn SourceLoader,
    global_folders: &'a [String],
}

impl<'a> Resolver<'a> {
    /// Create a resolver reading manifests through `loader`
    pub fn new(loader: &'a dyn SourceLoader, global_folders: &'a [String]) -> Self {
        Self {
            loader,
            global_folders,
        }
    }

    /// Resolve `specifier` to a file path without loading anything.
    ///
    /// Native modules are not consulted here; see
    /// [`Require::resolve`](crate::Require::resolve) for that.
    pub fn resolve(&self, specifier: &str, caller_dir: &str) -> Result<String> {
        let request = Request::parse(specifier, caller_dir)?;
        self.resolve_request(&request)
    }

    /// Dry-run search for an already classified request
    pub fn resolve_request(&self, request: &Request) -> Result<String> {
        let loader = self.loader;
        let mut probe = |candidate: &str| -> Result<Option<String>> {
            Ok(loader.is_file(candidate).then(|| candidate.to_string()))
        };
        self.search(request, &mut probe)?
            .ok_or_else(|| RequireError::module_not_found(&request.specifier))
    }

    /// Run the search matching the request's kind
    pub fn search<T, P>(&self, request: &Request, probe: &mut P) -> Result<Option<T>>
    where
        P: FnMut(&str) -> Result<Option<T>>,
    {
        match request.kind {
            RequestKind::Relative => self.load_as_file_or_directory(&request.key, probe),
            RequestKind::Bare => self.load_node_modules(&request.normalized, &request.start, probe),
        }
    }

    /// Try `path` as a file, then as a directory
    pub fn load_as_file_or_directory<T, P>(&self, path: &str, probe: &mut P) -> Result<Option<T>>
    where
        P: FnMut(&str) -> Result<Option<T>>,
    {
        if let Some(found) = self.load_as_file(path, probe)? {
            return Ok(Some(found));
        }
        self.load_as_directory(path, probe)
    }

    /// Try `path`, then `path.js`, then `path.json`
    pub fn load_as_file<T, P>(&self, path: &str, probe: &mut P) -> Result<Option<T>>
    where
        P: FnMut(&str) -> Result<Option<T>>,
    {
        let candidates = [
            path.to_string(),
            format!("{}{}", path, SOURCE_EXTENSION),
            format!("{}{}", path, DATA_EXTENSION),
        ];
        first_match(&candidates, probe)
    }

    /// Try `path/index.js`, then `path/index.json`
    pub fn load_index<T, P>(&self, path: &str, probe: &mut P) -> Result<Option<T>>
    where
        P: FnMut(&str) -> Result<Option<T>>,
    {
        let candidates = [
            path::join(&[path, &format!("index{}", SOURCE_EXTENSION)]),
            path::join(&[path, &format!("index{}", DATA_EXTENSION)]),
        ];
        first_match(&candidates, probe)
    }

    /// Load a directory through its manifest's `main`, falling back to its index.
    ///
    /// When `main` is set but does not name a file, the index of the `main`
    /// path is tried, not the index of the directory itself.
    pub fn load_as_directory<T, P>(&self, path: &str, probe: &mut P) -> Result<Option<T>>
    where
        P: FnMut(&str) -> Result<Option<T>>,
    {
        let Some(main) = self.manifest_main(path) else {
            return self.load_index(path, probe);
        };

        let main_path = path::join(&[path, &main]);
        if let Some(found) = self.load_as_file(&main_path, probe)? {
            return Ok(Some(found));
        }
        self.load_index(&main_path, probe)
    }

    /// The `main` entry of `dir/package.json`, if it can be read and has one
    pub fn manifest_main(&self, dir: &str) -> Option<String> {
        let manifest_path = path::join(&[dir, PACKAGE_JSON]);
        match self.loader.load(&manifest_path) {
            Ok(bytes) => {
                let main = manifest::main_entry(&bytes);
                if main.is_none() {
                    tracing::trace!(manifest = %manifest_path, "manifest has no usable main");
                }
                main
            }
            Err(_) => None,
        }
    }

    /// Search the global folders, then every node_modules from `start` upwards
    pub fn load_node_modules<T, P>(
        &self,
        specifier: &str,
        start: &str,
        probe: &mut P,
    ) -> Result<Option<T>>
    where
        P: FnMut(&str) -> Result<Option<T>>,
    {
        for folder in self.global_folders {
            let candidate = path::join(&[folder, specifier]);
            if let Some(found) = self.load_as_file_or_directory(&candidate, probe)? {
                return Ok(Some(found));
            }
        }

        for dir in node_modules_dirs(start) {
            let candidate = path::join(&[&dir, specifier]);
            if let Some(found) = self.load_as_file_or_directory(&candidate, probe)? {
                return Ok(Some(found));
            }
        }

        Ok(None)
    }
}

fn first_match<T, P>(candidates: &[String], probe: &mut P) -> Result<Option<T>>
where
    P: FnMut(&str) -> Result<Option<T>>,
{
    for candidate in candidates {
        tracing::trace!(candidate = %candidate, "probing module candidate");
        if let Some(found) = probe(candidate)? {
            return Ok(Some(found));
        }
    }
    Ok(None)
}

/// node_modules directories to search from `start`, nearest first.
///
/// A directory already named `node_modules` is used as is. The walk stops at
/// the root (where the parent is the directory itself) and at `..`, whose
/// lexical parent would be `.`.
pub fn node_modules_dirs(start: &str) -> Vec<String> {
    let mut dirs = Vec::new();
    let mut current = start.to_string();
    loop {
        if path::basename(&current) == NODE_MODULES {
            dirs.push(current.clone());
        } else {
            dirs.push(path::join(&[&current, NODE_MODULES]));
        }

        if current == ".." {
            break;
        }
        let parent = path::dirname(&current);
        if parent == current {
            break;
        }
        current = parent;
    }
    dirs
}
