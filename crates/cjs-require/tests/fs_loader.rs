//! End-to-end loading from a real directory tree

mod common;

use cjs_require::{FsLoader, RequireConfig};
use common::{named, registry, setup_with};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, path: &str, contents: &str) {
    let file = root.join(path);
    fs::create_dir_all(file.parent().unwrap()).unwrap();
    fs::write(file, contents).unwrap();
}

fn fixture() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "app/main.js", "main");
    write(root, "app/lib/index.js", "lib");
    write(root, "app/node_modules/left-pad/package.json", r#"{"main": "pad.js"}"#);
    write(root, "app/node_modules/left-pad/pad.js", "left-pad");
    write(root, "vendor/colors.js", "colors");
    write(root, "config.json", r#"{"globalFolders": ["/vendor", ""]}"#);
    dir
}

#[test]
fn test_loads_tree_through_fs_loader() {
    let dir = fixture();
    let config = RequireConfig::from_file(&dir.path().join("config.json")).unwrap();
    assert_eq!(config.global_folders, vec!["/vendor".to_string()]);

    let (engine, require) = setup_with(
        registry()
            .source_loader(FsLoader::with_root(dir.path()))
            .config(&config),
    );
    engine.define("lib", named("lib"));
    engine.define("left-pad", named("left-pad"));
    engine.define("colors", named("colors"));
    engine.define("main", |scope| {
        scope.exports.set("lib", (scope.require)("./lib")?);
        scope.exports.set("pad", (scope.require)("left-pad")?);
        scope.exports.set("colors", (scope.require)("colors")?);
        Ok(())
    });

    let main = require.require("/app/main.js").unwrap();
    assert_eq!(main.get("lib").get("name").as_str(), Some("lib"));
    assert_eq!(main.get("pad").get("name").as_str(), Some("left-pad"));
    assert_eq!(main.get("colors").get("name").as_str(), Some("colors"));
    assert!(require.is_cached("/app/lib/index.js"));
    assert!(require.is_cached("/app/node_modules/left-pad/pad.js"));
}

#[test]
fn test_directory_is_not_a_module_file() {
    let dir = fixture();
    let (engine, require) =
        setup_with(registry().source_loader(FsLoader::with_root(dir.path())));
    engine.define("lib", named("lib"));

    // "/app/lib" exists as a directory; only its index may load
    let module = require.require_module("/app/lib").unwrap();
    assert_eq!(module.id(), "/app/lib/index.js");
}

#[test]
fn test_missing_config_file() {
    let dir = TempDir::new().unwrap();
    let err = RequireConfig::from_file(&dir.path().join("absent.json")).unwrap_err();
    assert!(err.to_string().contains("absent.json"));
}

#[test]
fn test_parent_specifier_stays_inside_root() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("root");
    write(dir.path(), "secret.js", "secret");
    write(&root, "main.js", "main");

    let (engine, require) = setup_with(registry().source_loader(FsLoader::with_root(root)));
    engine.define("secret", named("secret"));

    let err = require.require_module("../secret").unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(engine.run_count("secret"), 0);
}
