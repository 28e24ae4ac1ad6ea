//! Case schema - The disciplinary case and its step-1 data

use serde::{Deserialize, Serialize};

use super::Step;

/// Case-level lifecycle flag, orthogonal to the current step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CaseStatus {
    /// Case can still be edited and advanced
    #[default]
    Active,
    /// Terminal: read-only from now on
    Closed,
}

impl CaseStatus {
    /// Backend `estatus` code (1 = active, 0 = closed)
    pub fn code(self) -> u8 {
        match self {
            CaseStatus::Active => 1,
            CaseStatus::Closed => 0,
        }
    }

    /// Parse a backend `estatus` code; anything other than 0 counts as active
    pub fn from_code(code: i64) -> Self {
        if code == 0 {
            CaseStatus::Closed
        } else {
            CaseStatus::Active
        }
    }
}

impl std::fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaseStatus::Active => write!(f, "active"),
            CaseStatus::Closed => write!(f, "closed"),
        }
    }
}

/// Who closed a case, when, and why
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Closure {
    pub justification: String,
    pub closed_by: Option<u64>,
    /// ISO 8601 timestamp
    pub closed_at: String,
}

impl Closure {
    /// Record a closure happening now
    pub fn now(justification: impl Into<String>, closed_by: Option<u64>) -> Self {
        Closure {
            justification: justification.into(),
            closed_by,
            closed_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Step-1 form data ("Señalar Problema")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CaseDraft {
    pub affected_user_id: u64,
    pub category_id: u64,
    pub description: String,
    pub impact: String,
    pub observed_conduct: String,
}

/// A disciplinary case tracked through six sequential steps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Case {
    /// Backend id; 0 until the case has been created
    pub id: u64,

    /// Employee the case is raised against
    pub affected_user_id: u64,

    /// Supervisor who created and drives the case
    pub supervisor_user_id: u64,

    pub category_id: u64,

    pub description: String,

    pub impact: String,

    pub observed_conduct: String,

    /// Authoritative step pointer, always within 1..=6
    pub current_step: Step,

    pub status: CaseStatus,

    /// ISO 8601 creation timestamp as reported by the backend
    #[serde(default)]
    pub created_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closure: Option<Closure>,
}

impl Case {
    /// Build a not-yet-persisted case at step 1 from a draft
    pub fn from_draft(draft: CaseDraft, supervisor_user_id: u64) -> Self {
        Case {
            id: 0,
            affected_user_id: draft.affected_user_id,
            supervisor_user_id,
            category_id: draft.category_id,
            description: draft.description,
            impact: draft.impact,
            observed_conduct: draft.observed_conduct,
            current_step: Step::ReportProblem,
            status: CaseStatus::Active,
            created_at: None,
            closure: None,
        }
    }

    /// Whether the case has not been persisted yet
    pub fn is_new(&self) -> bool {
        self.id == 0
    }

    pub fn is_closed(&self) -> bool {
        self.status == CaseStatus::Closed
    }

    /// The step-1 data currently on the case
    pub fn draft(&self) -> CaseDraft {
        CaseDraft {
            affected_user_id: self.affected_user_id,
            category_id: self.category_id,
            description: self.description.clone(),
            impact: self.impact.clone(),
            observed_conduct: self.observed_conduct.clone(),
        }
    }

    /// Step the edit dialog offers after the current one (stays at 6)
    pub fn next_step(&self) -> Step {
        crate::domain::get_next_step(self.current_step).unwrap_or(self.current_step)
    }

    // ===== IMMUTABLE BUILDER METHODS =====

    /// Return a new Case with the step-1 fields replaced
    pub fn with_draft(mut self, draft: CaseDraft) -> Self {
        self.affected_user_id = draft.affected_user_id;
        self.category_id = draft.category_id;
        self.description = draft.description;
        self.impact = draft.impact;
        self.observed_conduct = draft.observed_conduct;
        self
    }

    /// Return a new Case with the step pointer set
    pub fn with_step(mut self, step: Step) -> Self {
        self.current_step = step;
        self
    }

    /// Return a new Case marked closed with the given closure
    pub fn with_closure(mut self, closure: Closure) -> Self {
        self.status = CaseStatus::Closed;
        self.closure = Some(closure);
        self
    }
}
