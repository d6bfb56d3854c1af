// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! cjs-resolve - show which file a CommonJS `require()` would load

use cjs_require::{FsLoader, RequireConfig, Resolver, VERSION, path};
use clap::Parser;
use owo_colors::OwoColorize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "cjs-resolve",
    about = "Resolve a require() specifier the way the module loader does",
    version = VERSION,
    author = "Pegasus Heavy Industries"
)]
struct Cli {
    /// Module specifier, e.g. `./lib`, `/abs/x` or `left-pad`
    specifier: String,

    /// File the require() call is made from
    #[arg(long, value_name = "FILE")]
    from: Option<String>,

    /// Folder searched for bare specifiers before node_modules
    #[arg(
        long = "global-folder",
        value_name = "DIR",
        env = "NODE_PATH",
        value_delimiter = ':'
    )]
    global_folders: Vec<String>,

    /// JSON configuration file with `globalFolders`
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log every candidate path tried
    #[arg(long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("cjs_require=trace")
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter("cjs_require=warn")
            .with_writer(std::io::stderr)
            .init();
    }

    let mut folders: Vec<String> = cli
        .global_folders
        .iter()
        .filter(|folder| !folder.is_empty())
        .map(|folder| path::clean(folder))
        .collect();
    if let Some(file) = &cli.config {
        match RequireConfig::from_file(file) {
            Ok(config) => folders.extend(config.global_folders),
            Err(e) => {
                eprintln!("{}: {}", "Error".red().bold(), e);
                std::process::exit(1);
            }
        }
    }

    tracing::debug!(folders = ?folders, "global folders");

    let caller_dir = cli
        .from
        .as_deref()
        .map(path::dirname)
        .unwrap_or_else(|| ".".to_string());

    let loader = FsLoader::new();
    match Resolver::new(&loader, &folders).resolve(&cli.specifier, &caller_dir) {
        Ok(resolved) => println!("{}", resolved),
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            std::process::exit(1);
        }
    }

    Ok(())
}
