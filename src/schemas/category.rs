//! Category schema - Immutable reference data for case classification

use serde::{Deserialize, Serialize};

/// A kind of disciplinary incident (e.g. "Retardo")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub category_id: u64,
    pub name: String,
    #[serde(default)]
    pub description: String,
}
