//! Path resolution utilities for casetrack
//!
//! Locates the workspace root and builds paths to the files kept under
//! `.casetrack/`.

use std::path::{Path, PathBuf};

use crate::errors::{CaseError, Result};

/// Name of the per-workspace directory holding config and session files
pub const WORKSPACE_DIR: &str = ".casetrack";

/// Find the workspace root.
///
/// Walks up from `start_cwd` looking for a directory that contains
/// `.casetrack/`. When none is found the starting directory itself is the
/// workspace.
///
/// # Errors
/// * `FileNotFound` - If the starting directory cannot be resolved
pub fn find_workspace_root(start_cwd: &Path) -> Result<PathBuf> {
    let start = start_cwd.canonicalize().map_err(|e| {
        CaseError::FileNotFound(format!("Cannot resolve path {}: {}", start_cwd.display(), e))
    })?;

    let mut current = start.as_path();
    loop {
        if current.join(WORKSPACE_DIR).is_dir() {
            return Ok(current.to_path_buf());
        }
        match current.parent() {
            Some(parent) if parent != current => current = parent,
            _ => return Ok(start),
        }
    }
}

/// Resolve the current working directory, optionally using an override.
pub fn resolve_cwd(cwd_option: Option<&Path>) -> PathBuf {
    match cwd_option {
        Some(path) => path.to_path_buf(),
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

pub fn get_casetrack_dir(root: &Path) -> PathBuf {
    root.join(WORKSPACE_DIR)
}

pub fn get_config_path(root: &Path) -> PathBuf {
    get_casetrack_dir(root).join("config.json")
}

pub fn get_session_path(root: &Path) -> PathBuf {
    get_casetrack_dir(root).join("session.json")
}
