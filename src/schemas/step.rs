//! Step schema - The six ordered stages of a case

use serde::{Deserialize, Serialize};

/// One of the six fixed stages a case moves through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Step {
    /// Señalar Problema - step 1, data lives on the case itself
    ReportProblem,
    /// Determinar Causa - step 2, accepts evidence uploads
    DetermineCause,
    /// Plan de Acción - step 3
    ActionPlan,
    /// Evaluar Resultados - step 4
    EvaluateResults,
    /// Nota de Incumplimiento - step 5
    NonComplianceNote,
    /// Acta Administrativa - step 6, completing it finalizes the case
    AdministrativeRecord,
}

impl Step {
    /// The 1-based step number used by the backend (`id_paso`)
    pub fn number(self) -> u8 {
        match self {
            Step::ReportProblem => 1,
            Step::DetermineCause => 2,
            Step::ActionPlan => 3,
            Step::EvaluateResults => 4,
            Step::NonComplianceNote => 5,
            Step::AdministrativeRecord => 6,
        }
    }

    /// Look up a step by its 1-based number
    pub fn from_number(number: u8) -> Option<Step> {
        match number {
            1 => Some(Step::ReportProblem),
            2 => Some(Step::DetermineCause),
            3 => Some(Step::ActionPlan),
            4 => Some(Step::EvaluateResults),
            5 => Some(Step::NonComplianceNote),
            6 => Some(Step::AdministrativeRecord),
            _ => None,
        }
    }

    /// Display name shown to users
    pub fn label(self) -> &'static str {
        match self {
            Step::ReportProblem => "Señalar Problema",
            Step::DetermineCause => "Determinar Causa",
            Step::ActionPlan => "Plan de Acción",
            Step::EvaluateResults => "Evaluar Resultados",
            Step::NonComplianceNote => "Nota de Incumplimiento",
            Step::AdministrativeRecord => "Acta Administrativa",
        }
    }

    /// Stable upper-case key used for filters and badges
    pub fn key(self) -> &'static str {
        match self {
            Step::ReportProblem => "SENALAR_PROBLEMA",
            Step::DetermineCause => "DETERMINAR_CAUSA",
            Step::ActionPlan => "PLAN_ACCION",
            Step::EvaluateResults => "EVALUAR_RESULTADOS",
            Step::NonComplianceNote => "NOTA_INCUMPLIMIENTO",
            Step::AdministrativeRecord => "ACTA_ADMINISTRATIVA",
        }
    }

    /// Whether this step keeps its data in a separate step record
    pub fn has_record(self) -> bool {
        self != Step::ReportProblem
    }

    /// The following step, or None after step 6
    pub fn next(self) -> Option<Step> {
        crate::domain::get_next_step(self)
    }

    /// Base path of this step's record endpoints, None for step 1
    pub fn resource(self) -> Option<&'static str> {
        match self {
            Step::ReportProblem => None,
            Step::DetermineCause => Some("DeterminarCausa"),
            Step::ActionPlan => Some("PlanAccion"),
            Step::EvaluateResults => Some("EvaluarResultados"),
            Step::NonComplianceNote => Some("NotaIncumplimiento"),
            Step::AdministrativeRecord => Some("ActaAdministrativa"),
        }
    }
}

impl TryFrom<u8> for Step {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Step::from_number(value).ok_or_else(|| format!("Unknown step: {}", value))
    }
}

impl From<Step> for u8 {
    fn from(step: Step) -> u8 {
        step.number()
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "step {} ({})", self.number(), self.label())
    }
}

impl std::str::FromStr for Step {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(number) = trimmed.parse::<u8>() {
            return Step::try_from(number);
        }
        let upper = trimmed.to_ascii_uppercase();
        [
            Step::ReportProblem,
            Step::DetermineCause,
            Step::ActionPlan,
            Step::EvaluateResults,
            Step::NonComplianceNote,
            Step::AdministrativeRecord,
        ]
        .into_iter()
        .find(|step| step.key() == upper)
        .ok_or_else(|| format!("Unknown step: {}", s))
    }
}
