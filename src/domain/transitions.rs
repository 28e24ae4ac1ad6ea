//! Step pointer and closure transitions
//!
//! Pure functions for applying transitions to cases. The pointer only ever
//! moves forward and closing is idempotent.

use crate::schemas::{Case, Closure, Step, StepOnePolicy};

use super::states::get_next_step;
use super::validation::{can_close, can_complete, validate_justification, ValidationContext};

/// Result of a transition attempt
#[derive(Debug)]
pub enum TransitionResult {
    /// Successful transition with the new case state
    Success {
        /// The case with its updated pointer or closure
        next_case: Case,
    },
    /// Failed transition with error message
    Error {
        /// Description of why the transition failed
        error: String,
    },
}

impl TransitionResult {
    /// Check if the transition was successful
    pub fn is_success(&self) -> bool {
        matches!(self, TransitionResult::Success { .. })
    }

    /// Check if the transition failed
    pub fn is_error(&self) -> bool {
        matches!(self, TransitionResult::Error { .. })
    }

    /// Get the next case if the transition was successful
    pub fn case(self) -> Option<Case> {
        match self {
            TransitionResult::Success { next_case } => Some(next_case),
            TransitionResult::Error { .. } => None,
        }
    }

    /// Get the error message if the transition failed
    pub fn error(self) -> Option<String> {
        match self {
            TransitionResult::Success { .. } => None,
            TransitionResult::Error { error } => Some(error),
        }
    }
}

/// Complete `step` and move the pointer to the next one.
///
/// Completing step 6 leaves the pointer at 6; the caller closes the case.
/// Never mutates the input case.
pub fn apply_advance(case: &Case, step: Step, ctx: &ValidationContext) -> TransitionResult {
    let validation = can_complete(case, step, ctx);
    if !validation.valid {
        return TransitionResult::Error {
            error: validation
                .reason
                .unwrap_or_else(|| "Transition validation failed".to_string()),
        };
    }

    let next_step = get_next_step(step).unwrap_or(step);
    TransitionResult::Success {
        next_case: case.clone().with_step(next_step),
    }
}

/// Close `case`. Closing an already-closed case keeps the first closure.
pub fn apply_close(
    case: &Case,
    step: Step,
    justification: &str,
    closed_by: Option<u64>,
    ctx: &ValidationContext,
) -> TransitionResult {
    if case.is_closed() {
        return TransitionResult::Success {
            next_case: case.clone(),
        };
    }

    let validation = validate_justification(justification);
    if !validation.valid {
        return TransitionResult::Error {
            error: validation
                .reason
                .unwrap_or_else(|| "Justification validation failed".to_string()),
        };
    }

    let validation = can_close(case, step, ctx);
    if !validation.valid {
        return TransitionResult::Error {
            error: validation
                .reason
                .unwrap_or_else(|| "Close validation failed".to_string()),
        };
    }

    let closure = Closure::now(justification.trim(), closed_by);
    TransitionResult::Success {
        next_case: case.clone().with_closure(closure),
    }
}

/// Where the pointer sits after step 1 is saved.
///
/// `Hold` keeps it where it is; `Advance` moves it to at least step 2.
/// Neither policy ever moves it backwards.
pub fn pointer_after_step_one_save(current: Step, policy: StepOnePolicy) -> Step {
    let floor = match policy {
        StepOnePolicy::Hold => Step::ReportProblem,
        StepOnePolicy::Advance => Step::DetermineCause,
    };
    current.max(floor)
}

/// Apply a step-1 save to an existing case
pub fn apply_step_one_save(case: &Case, policy: StepOnePolicy) -> Case {
    let next_step = pointer_after_step_one_save(case.current_step, policy);
    case.clone().with_step(next_step)
}
