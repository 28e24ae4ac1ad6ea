//! JSON file operations with schema validation

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::errors::{CaseError, Result};
use crate::schemas::{Config, Session};

use super::paths::{get_config_path, get_session_path};

/// Read and deserialize a JSON file.
///
/// # Errors
/// * `FileNotFound` - If the file does not exist
/// * `InvalidJson` - If the file is not valid JSON for `T`
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            CaseError::FileNotFound(format!("File not found: {}", path.display()))
        } else {
            CaseError::Io(e)
        }
    })?;

    serde_json::from_str(&content).map_err(|e| {
        CaseError::InvalidJson(format!("Invalid JSON in file {}: {}", path.display(), e))
    })
}

/// Read `.casetrack/config.json`, or defaults when it does not exist
pub fn read_config(root: &Path) -> Result<Config> {
    let path = get_config_path(root);
    if !path.exists() {
        return Ok(Config::default());
    }
    read_json(&path)
}

/// Read `.casetrack/session.json` if present
pub fn read_session(root: &Path) -> Result<Option<Session>> {
    let path = get_session_path(root);
    if !path.exists() {
        return Ok(None);
    }
    read_json(&path).map(Some)
}
