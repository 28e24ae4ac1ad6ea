//! Confirmation tokens and operation outcomes
//!
//! Irreversible actions are split in two: a `request_*` call validates and
//! returns a token, and the matching `confirm_*` call consumes it. Tokens can
//! only be built by the machine.

use serde::Serialize;

use crate::schemas::{Case, Step, StepRecord};

/// A validated, not yet applied complete-and-advance
#[derive(Debug)]
pub struct PendingAdvance {
    pub(crate) case_id: u64,
    pub(crate) step: Step,
    pub(crate) record_id: Option<u64>,
}

impl PendingAdvance {
    pub fn case_id(&self) -> u64 {
        self.case_id
    }

    pub fn step(&self) -> Step {
        self.step
    }

    /// Whether confirming also closes the case
    pub fn finalizes(&self) -> bool {
        self.step.next().is_none()
    }

    /// Question to put to the user
    pub fn prompt(&self) -> String {
        match self.step.next() {
            Some(next) => format!(
                "Complete {} of case {} and continue to {}?",
                self.step, self.case_id, next
            ),
            None => format!(
                "Complete {} of case {}? The case will be closed.",
                self.step, self.case_id
            ),
        }
    }
}

/// A validated, not yet applied close
#[derive(Debug)]
pub struct PendingClose {
    pub(crate) case_id: u64,
    pub(crate) step: Step,
    pub(crate) record_id: Option<u64>,
    pub(crate) justification: String,
    pub(crate) already_closed: bool,
}

impl PendingClose {
    pub fn case_id(&self) -> u64 {
        self.case_id
    }

    pub fn justification(&self) -> &str {
        &self.justification
    }

    /// Whether confirming will be a no-op
    pub fn already_closed(&self) -> bool {
        self.already_closed
    }

    pub fn prompt(&self) -> String {
        if self.already_closed {
            return format!("Case {} is already closed.", self.case_id);
        }
        format!(
            "Close case {} from {}? This cannot be undone.",
            self.case_id, self.step
        )
    }
}

/// Result of a confirmed advance
#[derive(Debug, Clone, Serialize)]
pub struct AdvanceOutcome {
    /// The case as re-read after the advance
    pub case: Case,
    pub completed: Step,
    /// True when completing step 6 closed the case
    pub closed: bool,
}

/// Result of a confirmed close
#[derive(Debug, Clone, Serialize)]
pub struct CloseOutcome {
    pub case: Case,
    /// True when the case was closed before this call
    pub already_closed: bool,
}

/// A case with every step record saved so far
#[derive(Debug, Clone, Serialize)]
pub struct CaseOverview {
    pub case: Case,
    pub records: Vec<StepRecord>,
}

impl CaseOverview {
    pub fn record(&self, step: Step) -> Option<&StepRecord> {
        self.records.iter().find(|r| r.step() == step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_prompt_mentions_next_step() {
        let pending = PendingAdvance {
            case_id: 75,
            step: Step::EvaluateResults,
            record_id: Some(44),
        };
        assert!(pending.prompt().contains("step 5"));
        assert!(!pending.finalizes());
    }

    #[test]
    fn test_final_advance_prompt_warns_about_close() {
        let pending = PendingAdvance {
            case_id: 75,
            step: Step::AdministrativeRecord,
            record_id: Some(60),
        };
        assert!(pending.finalizes());
        assert!(pending.prompt().contains("closed"));
    }

    #[test]
    fn test_close_prompt() {
        let pending = PendingClose {
            case_id: 90,
            step: Step::DetermineCause,
            record_id: Some(1),
            justification: "Renuncia".to_string(),
            already_closed: false,
        };
        assert!(pending.prompt().contains("cannot be undone"));
        assert_eq!(pending.justification(), "Renuncia");
    }
}
