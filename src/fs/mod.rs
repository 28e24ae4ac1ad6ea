//! File system utilities for casetrack
//!
//! Provides workspace resolution and JSON file operations.

mod json;
mod paths;

pub use json::{read_config, read_json, read_session};
pub use paths::{
    find_workspace_root, get_casetrack_dir, get_config_path, get_session_path, resolve_cwd,
    WORKSPACE_DIR,
};
