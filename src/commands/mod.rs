//! Subcommand handlers for the `termstage` binary.

pub mod check;
pub mod config;
pub mod run;

use std::path::{Path, PathBuf};

/// Directory that relative paths inside a script file are resolved against.
pub fn script_base_dir(script: &Path) -> PathBuf {
    match script.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
