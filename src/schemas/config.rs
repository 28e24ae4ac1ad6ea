//! Config schema - Configuration for casetrack

use serde::{Deserialize, Serialize};

/// What saving step 1 does to the case's step pointer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StepOnePolicy {
    /// Saving step 1 leaves the pointer where it is (new cases start at 1)
    #[default]
    Hold,
    /// Saving step 1 moves the pointer to at least step 2
    Advance,
}

/// Main configuration for casetrack
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Schema version for forward compatibility
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Base URL of the REST backend
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Connect/read/write timeout for backend requests
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Step pointer policy applied when step 1 is saved
    #[serde(default)]
    pub step_one_policy: StepOnePolicy,

    /// Compensating pointer writes allowed after a step completion
    #[serde(default = "default_max_reconcile_attempts")]
    pub max_reconcile_attempts: u32,

    /// Largest evidence file accepted for upload
    #[serde(default = "default_max_evidence_bytes")]
    pub max_evidence_bytes: u64,

    /// MIME types accepted for evidence uploads
    #[serde(default = "default_allowed_evidence_types")]
    pub allowed_evidence_types: Vec<String>,
}

fn default_schema_version() -> u32 {
    1
}

fn default_api_url() -> String {
    "http://localhost:5269/api".to_string()
}

fn default_timeout_ms() -> u64 {
    15_000
}

fn default_max_reconcile_attempts() -> u32 {
    3
}

fn default_max_evidence_bytes() -> u64 {
    10 * 1024 * 1024
}

fn default_allowed_evidence_types() -> Vec<String> {
    vec![
        "image/jpeg".to_string(),
        "image/jpg".to_string(),
        "image/png".to_string(),
        "application/pdf".to_string(),
    ]
}

impl Default for Config {
    fn default() -> Self {
        Config {
            schema_version: default_schema_version(),
            api_url: default_api_url(),
            timeout_ms: default_timeout_ms(),
            step_one_policy: StepOnePolicy::Hold,
            max_reconcile_attempts: default_max_reconcile_attempts(),
            max_evidence_bytes: default_max_evidence_bytes(),
            allowed_evidence_types: default_allowed_evidence_types(),
        }
    }
}
