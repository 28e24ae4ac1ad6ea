//! Session schema - The identity the core acts on behalf of

use serde::{Deserialize, Serialize};

use crate::errors::{CaseError, Result};

/// Decoded identity supplied by the session provider.
///
/// Passed explicitly into the state machine and the HTTP repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: u64,

    pub role: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Bearer token forwarded to the backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Session {
    pub fn new(user_id: u64, role: impl Into<String>) -> Self {
        Session {
            user_id,
            role: role.into(),
            display_name: None,
            token: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Return a new Session carrying the given bearer token
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    /// Reject sessions without a usable identity
    pub fn validate(&self) -> Result<()> {
        if self.user_id == 0 {
            return Err(CaseError::Validation(
                "session has no user id; sign in first".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether the role may create and drive cases
    pub fn is_supervisor(&self) -> bool {
        matches!(
            self.role.trim().to_ascii_lowercase().as_str(),
            "jefe" | "supervisor" | "admin"
        )
    }
}
