// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Lexical POSIX path helpers.
//!
//! Module paths are plain `/`-separated strings. Nothing here touches the
//! filesystem: `.` and `..` are collapsed textually, so `/app/src/../util`
//! becomes `/app/util` whether or not either directory exists.

/// Name of the dependency directory searched during ascent
pub const NODE_MODULES: &str = "node_modules";

/// Manifest file read when loading a directory
pub const PACKAGE_JSON: &str = "package.json";

/// Extension tried first when loading a file
pub const SOURCE_EXTENSION: &str = ".js";

/// Extension tried second when loading a file
pub const DATA_EXTENSION: &str = ".json";

/// Collapse `.` and `..` segments and repeated separators.
///
/// An empty path cleans to `.`. A `..` at the root of an absolute path is
/// dropped; in a relative path it is kept.
pub fn clean(path: &str) -> String {
    if path.is_empty() {
        return ".".to_string();
    }

    let rooted = path.starts_with('/');
    let mut components: Vec<&str> = Vec::new();

    for component in path.split('/') {
        match component {
            "" | "." => continue,
            ".." => {
                if components.last().is_some_and(|last| *last != "..") {
                    components.pop();
                } else if !rooted {
                    components.push("..");
                }
            }
            c => components.push(c),
        }
    }

    let result = components.join("/");
    if rooted {
        format!("/{}", result)
    } else if result.is_empty() {
        ".".to_string()
    } else {
        result
    }
}

/// Normalize a require specifier.
///
/// Unlike [`clean`], an empty specifier stays empty so the caller can
/// reject it.
pub fn normalize_specifier(specifier: &str) -> String {
    if specifier.is_empty() {
        String::new()
    } else {
        clean(specifier)
    }
}

/// Join path elements with `/` and clean the result.
///
/// Empty elements are skipped. A later absolute element does not reset the
/// path: `join(&["/a", "/b"])` is `/a/b`.
pub fn join(paths: &[&str]) -> String {
    let parts: Vec<&str> = paths.iter().copied().filter(|p| !p.is_empty()).collect();
    if parts.is_empty() {
        return String::new();
    }
    clean(&parts.join("/"))
}

/// Everything but the last element of `path`, cleaned.
///
/// `dirname("a")` and `dirname("..")` are both `.`; `dirname("/a")` is `/`.
pub fn dirname(path: &str) -> String {
    match path.rfind('/') {
        Some(i) => clean(&path[..=i]),
        None => ".".to_string(),
    }
}

/// Last element of `path`, ignoring trailing separators.
pub fn basename(path: &str) -> String {
    if path.is_empty() {
        return ".".to_string();
    }
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return "/".to_string();
    }
    match trimmed.rfind('/') {
        Some(i) => trimmed[i + 1..].to_string(),
        None => trimmed.to_string(),
    }
}

/// Extension of the last element, including the dot
pub fn extname(path: &str) -> &str {
    let tail = path.rsplit('/').next().unwrap_or(path);
    match tail.rfind('.') {
        Some(i) => &tail[i..],
        None => "",
    }
}

/// Whether a raw specifier names a file relative to the caller or the root.
///
/// Classification looks at the text as written, before normalization, so
/// `./x/../y` is relative even though it cleans to `y`.
pub fn is_relative_specifier(specifier: &str) -> bool {
    specifier.starts_with("./")
        || specifier.starts_with('/')
        || specifier.starts_with("../")
        || specifier == "."
        || specifier == ".."
}
