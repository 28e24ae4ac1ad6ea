//! Step filter, text search and per-step counts

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::errors::CaseError;
use crate::schemas::Step;

use super::CaseUi;

/// Which steps a list shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StepFilter {
    #[default]
    All,
    Only(Step),
}

impl StepFilter {
    pub fn matches(self, step: Step) -> bool {
        match self {
            StepFilter::All => true,
            StepFilter::Only(only) => only == step,
        }
    }
}

impl FromStr for StepFilter {
    type Err = CaseError;

    /// Accepts `all`/`todos`, a step number or a step key such as `PLAN_ACCION`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") || s.eq_ignore_ascii_case("todos") {
            return Ok(StepFilter::All);
        }
        let by_number = s.parse::<u8>().ok().and_then(Step::from_number);
        let by_key = || {
            crate::domain::CASE_STEPS
                .iter()
                .copied()
                .find(|step| step.key().eq_ignore_ascii_case(s))
        };
        by_number
            .or_else(by_key)
            .map(StepFilter::Only)
            .ok_or_else(|| CaseError::Validation(format!("unknown step filter: {}", s)))
    }
}

impl fmt::Display for StepFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepFilter::All => write!(f, "all"),
            StepFilter::Only(step) => write!(f, "{}", step.number()),
        }
    }
}

fn matches_search(case: &CaseUi, needle: &str) -> bool {
    [&case.employee, &case.category, &case.raised_by]
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
}

/// Cases matching both the step filter and the search text.
///
/// The search is a case-insensitive substring match against the employee,
/// category and supervisor names; blank search text matches everything.
pub fn filter(cases: &[CaseUi], step: StepFilter, search: &str) -> Vec<CaseUi> {
    let needle = search.trim().to_lowercase();
    cases
        .iter()
        .filter(|case| step.matches(case.current_step))
        .filter(|case| needle.is_empty() || matches_search(case, &needle))
        .cloned()
        .collect()
}

/// Number of cases at each step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StepCounts {
    pub step1: usize,
    pub step2: usize,
    pub step3: usize,
    pub step4: usize,
    pub step5: usize,
    pub step6: usize,
    pub total: usize,
}

impl StepCounts {
    pub fn get(&self, step: Step) -> usize {
        match step {
            Step::ReportProblem => self.step1,
            Step::DetermineCause => self.step2,
            Step::ActionPlan => self.step3,
            Step::EvaluateResults => self.step4,
            Step::NonComplianceNote => self.step5,
            Step::AdministrativeRecord => self.step6,
        }
    }

    fn bump(&mut self, step: Step) {
        let slot = match step {
            Step::ReportProblem => &mut self.step1,
            Step::DetermineCause => &mut self.step2,
            Step::ActionPlan => &mut self.step3,
            Step::EvaluateResults => &mut self.step4,
            Step::NonComplianceNote => &mut self.step5,
            Step::AdministrativeRecord => &mut self.step6,
        };
        *slot += 1;
        self.total += 1;
    }
}

pub fn count_by_step(cases: &[CaseUi]) -> StepCounts {
    let mut counts = StepCounts::default();
    for case in cases {
        counts.bump(case.current_step);
    }
    counts
}
