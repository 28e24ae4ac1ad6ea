//! Step record synchronization
//!
//! Opening the screen for step N compares the case pointer with N. A case
//! that has not reached N is only brought forward after the user confirms the
//! repair; a missing intermediate record stops the repair with a sync error.

use serde::Serialize;
use tracing::{info, warn};

use crate::domain::{steps_between, CASE_STEPS};
use crate::errors::{CaseError, Result};
use crate::machine::StepMachine;
use crate::repository::CaseRepository;
use crate::schemas::{Case, RecordStatus, Step, StepRecord};

/// What the screen for a step should show
#[derive(Debug)]
pub enum StepView {
    /// The case has reached the step; edit in place
    Ready {
        case: Case,
        record: Option<StepRecord>,
    },
    /// The case is closed; show read-only
    Closed {
        case: Case,
        record: Option<StepRecord>,
    },
    /// The case pointer is behind the step; repair needs confirmation
    Behind { case: Case, repair: PendingRepair },
}

/// A validated, not yet applied catch-up from the case pointer to a step
#[derive(Debug)]
pub struct PendingRepair {
    case_id: u64,
    from: Step,
    target: Step,
}

impl PendingRepair {
    pub fn case_id(&self) -> u64 {
        self.case_id
    }

    pub fn current(&self) -> Step {
        self.from
    }

    pub fn target(&self) -> Step {
        self.target
    }

    /// Steps that will be completed, in order
    pub fn steps(&self) -> Vec<Step> {
        steps_between(self.from, self.target)
    }

    pub fn prompt(&self) -> String {
        let numbers: Vec<String> = self
            .steps()
            .iter()
            .map(|s| s.number().to_string())
            .collect();
        format!(
            "Case {} is at {} but {} was opened. Complete step(s) {} to catch up?",
            self.case_id,
            self.from,
            self.target,
            numbers.join(", ")
        )
    }
}

/// Result of a confirmed repair
#[derive(Debug, Clone, Serialize)]
pub struct RepairOutcome {
    pub case: Case,
    /// Steps whose record was completed, in order
    pub completed: Vec<Step>,
}

fn missing_record(step: Step) -> CaseError {
    CaseError::Sync(format!(
        "step record missing, return to {} and save first",
        step
    ))
}

impl<R: CaseRepository> StepMachine<R> {
    /// Load the screen for `step` of a case, detecting pointer drift
    pub async fn open_step(&self, case_id: u64, step: Step) -> Result<StepView> {
        let case = self.repository().get_case(case_id).await?;
        let record = if step.has_record() {
            self.repository().get_step_record(case_id, step).await?
        } else {
            None
        };

        if case.is_closed() {
            return Ok(StepView::Closed { case, record });
        }
        if case.current_step >= step {
            return Ok(StepView::Ready { case, record });
        }

        // Check every intermediate record now so the user is not offered a
        // repair that cannot finish.
        for between in steps_between(case.current_step, step) {
            if between.has_record()
                && self
                    .repository()
                    .get_step_record(case_id, between)
                    .await?
                    .is_none()
            {
                return Err(missing_record(between));
            }
        }

        warn!(
            case_id,
            at = %case.current_step,
            opened = %step,
            "case pointer behind opened step"
        );
        let repair = PendingRepair {
            case_id,
            from: case.current_step,
            target: step,
        };
        Ok(StepView::Behind { case, repair })
    }

    /// Apply a confirmed repair: complete each step from the case pointer up
    /// to the opened step.
    pub async fn confirm_repair(&self, repair: PendingRepair) -> Result<RepairOutcome> {
        let PendingRepair {
            case_id, target, ..
        } = repair;
        let _guard = self.in_flight().acquire(case_id)?;

        let mut completed = Vec::new();
        let mut case = self.repository().get_case(case_id).await?;

        for _ in 0..CASE_STEPS.len() {
            if case.is_closed() {
                return Err(CaseError::Precondition(format!("case {} is closed", case_id)));
            }
            if case.current_step >= target {
                info!(case_id, step = %case.current_step, "case pointer repaired");
                return Ok(RepairOutcome { case, completed });
            }

            let step = case.current_step;
            let next = step.next().unwrap_or(step);
            if !step.has_record() {
                case = self.complete_and_advance(&case, step, None).await?;
            } else {
                let record = self
                    .repository()
                    .get_step_record(case_id, step)
                    .await?
                    .ok_or_else(|| missing_record(step))?;
                case = match record.status {
                    RecordStatus::Active => {
                        self.complete_and_advance(&case, step, Some(&record)).await?
                    }
                    // Completed earlier but the pointer never moved.
                    RecordStatus::Completed => self.reconcile_pointer(case_id, next).await?,
                };
            }
            completed.push(step);
        }

        Err(CaseError::Sync(format!(
            "case {} did not reach {} after completing {} step(s)",
            case_id,
            target,
            completed.len()
        )))
    }
}
