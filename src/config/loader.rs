//! Configuration and session loading with defaults and overrides

use std::path::Path;

use tracing::debug;

use crate::errors::{CaseError, Result};
use crate::fs;
use crate::schemas::{Config, Session};

pub const ENV_API_URL: &str = "CASETRACK_API_URL";
pub const ENV_TIMEOUT_MS: &str = "CASETRACK_TIMEOUT_MS";
pub const ENV_TOKEN: &str = "CASETRACK_TOKEN";

/// Load configuration for a workspace.
///
/// Reads `.casetrack/config.json` (defaults when absent), then applies the
/// `CASETRACK_API_URL` and `CASETRACK_TIMEOUT_MS` environment overrides.
pub fn load_config(root: &Path) -> Result<Config> {
    let config = fs::read_config(root)?;
    apply_overrides(config, |key| std::env::var(key).ok())
}

/// Apply environment-style overrides read through `lookup`
pub fn apply_overrides<F>(mut config: Config, lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
        debug!(api_url = %url, "api url overridden from environment");
        config.api_url = url.trim().to_string();
    }
    if let Some(raw) = lookup(ENV_TIMEOUT_MS) {
        config.timeout_ms = raw.trim().parse().map_err(|_| {
            CaseError::ConfigError(format!("{} must be a number, got {:?}", ENV_TIMEOUT_MS, raw))
        })?;
    }
    Ok(config)
}

/// Command-line identity overrides
#[derive(Debug, Clone, Default)]
pub struct SessionOverrides {
    pub user_id: Option<u64>,
    pub role: Option<String>,
}

/// Build the session for a workspace.
///
/// Starts from `.casetrack/session.json` when present, applies the
/// command-line overrides and the `CASETRACK_TOKEN` environment variable,
/// then validates the result.
pub fn load_session(root: &Path, overrides: &SessionOverrides) -> Result<Session> {
    let stored = fs::read_session(root)?;
    resolve_session(stored, overrides, |key| std::env::var(key).ok())
}

pub fn resolve_session<F>(
    stored: Option<Session>,
    overrides: &SessionOverrides,
    lookup: F,
) -> Result<Session>
where
    F: Fn(&str) -> Option<String>,
{
    let mut session = stored.unwrap_or_else(|| Session::new(0, ""));
    if let Some(user_id) = overrides.user_id {
        session.user_id = user_id;
    }
    if let Some(role) = &overrides.role {
        session.role = role.clone();
    }
    if let Some(token) = lookup(ENV_TOKEN).filter(|t| !t.trim().is_empty()) {
        session.token = Some(token);
    }
    session.validate()?;
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::StepOnePolicy;
    use std::collections::HashMap;
    use std::fs as std_fs;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_load_config_from_file() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join(".casetrack");
        std_fs::create_dir(&dir).unwrap();
        std_fs::write(
            dir.join("config.json"),
            r#"{ "step_one_policy": "advance", "max_reconcile_attempts": 5 }"#,
        )
        .unwrap();

        let config = apply_overrides(fs::read_config(temp.path()).unwrap(), env(&[])).unwrap();
        assert_eq!(config.step_one_policy, StepOnePolicy::Advance);
        assert_eq!(config.max_reconcile_attempts, 5);
        // Default for unspecified field
        assert_eq!(config.timeout_ms, 15_000);
    }

    #[test]
    fn test_env_overrides() {
        let config = apply_overrides(
            Config::default(),
            env(&[
                (ENV_API_URL, " https://rh.example.com/api "),
                (ENV_TIMEOUT_MS, "2500"),
            ]),
        )
        .unwrap();
        assert_eq!(config.api_url, "https://rh.example.com/api");
        assert_eq!(config.timeout_ms, 2500);
    }

    #[test]
    fn test_bad_timeout_is_config_error() {
        let err = apply_overrides(Config::default(), env(&[(ENV_TIMEOUT_MS, "soon")])).unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_session_overrides_and_token() {
        let stored = Session::new(12, "jefe");
        let overrides = SessionOverrides {
            user_id: None,
            role: Some("admin".to_string()),
        };
        let session =
            resolve_session(Some(stored), &overrides, env(&[(ENV_TOKEN, "abc")])).unwrap();
        assert_eq!(session.user_id, 12);
        assert_eq!(session.role, "admin");
        assert_eq!(session.token.as_deref(), Some("abc"));
    }

    #[test]
    fn test_session_without_identity_is_rejected() {
        let err = resolve_session(None, &SessionOverrides::default(), env(&[])).unwrap_err();
        assert_eq!(err.code(), "VALIDATION");
    }

    #[test]
    fn test_load_session_from_file() {
        let temp = TempDir::new().unwrap();
        std_fs::create_dir_all(fs::get_casetrack_dir(temp.path())).unwrap();
        std_fs::write(
            fs::get_session_path(temp.path()),
            r#"{"user_id": 7, "role": "empleado"}"#,
        )
        .unwrap();

        let overrides = SessionOverrides {
            user_id: Some(9),
            role: None,
        };
        let session = resolve_session(fs::read_session(temp.path()).unwrap(), &overrides, env(&[]))
            .unwrap();
        assert_eq!(session.user_id, 9);
        assert_eq!(session.role, "empleado");
    }
}
