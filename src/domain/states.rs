//! Step state machine definitions
//!
//! The case lifecycle follows a linear progression:
//! 1 Señalar Problema → 2 Determinar Causa → 3 Plan de Acción →
//! 4 Evaluar Resultados → 5 Nota de Incumplimiento → 6 Acta Administrativa
//!
//! Closing is orthogonal to the step and can happen from any of them.

use crate::schemas::Step;

/// The canonical ordering of case steps.
///
/// IMPORTANT: This is the source of truth for step ordering.
pub const CASE_STEPS: &[Step] = &[
    Step::ReportProblem,
    Step::DetermineCause,
    Step::ActionPlan,
    Step::EvaluateResults,
    Step::NonComplianceNote,
    Step::AdministrativeRecord,
];

/// Get the 0-based index of a step in the progression.
pub fn get_step_index(step: Step) -> usize {
    CASE_STEPS
        .iter()
        .position(|&s| s == step)
        .unwrap_or(usize::MAX)
}

/// Returns the next step in the progression.
///
/// Returns None for the final step; the pointer never moves past 6.
pub fn get_next_step(current: Step) -> Option<Step> {
    let index = get_step_index(current);
    if index >= CASE_STEPS.len() - 1 {
        return None;
    }
    Some(CASE_STEPS[index + 1])
}

/// Steps strictly between `from` (inclusive) and `to` (exclusive), in order.
///
/// These are the steps whose completion moves the pointer from `from` to `to`.
pub fn steps_between(from: Step, to: Step) -> Vec<Step> {
    CASE_STEPS
        .iter()
        .copied()
        .filter(|s| *s >= from && *s < to)
        .collect()
}
