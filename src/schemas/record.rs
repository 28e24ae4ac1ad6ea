//! Step record schema - Per-step detail payloads for steps 2 through 6
//!
//! Field names on the wire follow the backend tables (`causas_identificadas`,
//! `metas_claras`, ...); the Rust side uses descriptive English names.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{CaseError, Result};

use super::{Evidence, Step};

/// Status of a step record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    /// Saved, still editable, not yet completed
    #[default]
    Active,
    /// Completed via "continue"
    Completed,
}

impl RecordStatus {
    /// Backend `estatus` code (1 = active, 0 = completed)
    pub fn code(self) -> u8 {
        match self {
            RecordStatus::Active => 1,
            RecordStatus::Completed => 0,
        }
    }

    pub fn from_code(code: i64) -> Self {
        if code == 0 {
            RecordStatus::Completed
        } else {
            RecordStatus::Active
        }
    }
}

/// Step 2 - Determinar Causa
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CauseFields {
    #[serde(rename = "causas_identificadas", default)]
    pub identified_causes: String,

    #[serde(
        rename = "comentarios_adicionales",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_comments: Option<String>,
}

/// Step 3 - Plan de Acción
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ActionPlanFields {
    #[serde(rename = "metas_claras", default)]
    pub clear_goals: String,

    #[serde(
        rename = "herramientas_necesarias",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub required_tools: Option<String>,

    #[serde(rename = "capacitacion_sesion", default)]
    pub training_session: String,

    #[serde(
        rename = "documentacion_capacitacion",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub training_documentation: Option<String>,
}

/// Step 4 - Evaluar Resultados
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EvaluationFields {
    #[serde(rename = "sesion_privada", default)]
    pub private_session: String,

    #[serde(rename = "comparacion", default)]
    pub comparison: String,

    #[serde(rename = "avances", default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<String>,

    #[serde(rename = "compromisos", default, skip_serializing_if = "Option::is_none")]
    pub commitments: Option<String>,
}

/// Step 5 - Nota de Incumplimiento
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct NonComplianceFields {
    #[serde(rename = "comportamiento", default)]
    pub behavior: String,

    #[serde(rename = "observaciones", default)]
    pub observations: String,
}

/// Step 6 - Acta Administrativa
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AdministrativeRecordFields {
    #[serde(rename = "colaborador", default)]
    pub collaborator: String,

    #[serde(rename = "historial", default)]
    pub history: String,

    #[serde(rename = "evidencias", default, skip_serializing_if = "Option::is_none")]
    pub evidence_notes: Option<String>,

    #[serde(
        rename = "version_colaborador",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub collaborator_statement: Option<String>,

    #[serde(rename = "firmas", default, skip_serializing_if = "Option::is_none")]
    pub signatures: Option<String>,
}

/// Step-specific form data for steps 2..=6
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepFields {
    DetermineCause(CauseFields),
    ActionPlan(ActionPlanFields),
    EvaluateResults(EvaluationFields),
    NonComplianceNote(NonComplianceFields),
    AdministrativeRecord(AdministrativeRecordFields),
}

impl StepFields {
    /// The step these fields belong to
    pub fn step(&self) -> Step {
        match self {
            StepFields::DetermineCause(_) => Step::DetermineCause,
            StepFields::ActionPlan(_) => Step::ActionPlan,
            StepFields::EvaluateResults(_) => Step::EvaluateResults,
            StepFields::NonComplianceNote(_) => Step::NonComplianceNote,
            StepFields::AdministrativeRecord(_) => Step::AdministrativeRecord,
        }
    }

    /// Wire keys of every field a step carries. Empty for step 1.
    pub fn keys(step: Step) -> &'static [&'static str] {
        match step {
            Step::ReportProblem => &[],
            Step::DetermineCause => &["causas_identificadas", "comentarios_adicionales"],
            Step::ActionPlan => &[
                "metas_claras",
                "herramientas_necesarias",
                "capacitacion_sesion",
                "documentacion_capacitacion",
            ],
            Step::EvaluateResults => &["sesion_privada", "comparacion", "avances", "compromisos"],
            Step::NonComplianceNote => &["comportamiento", "observaciones"],
            Step::AdministrativeRecord => &[
                "colaborador",
                "historial",
                "evidencias",
                "version_colaborador",
                "firmas",
            ],
        }
    }

    /// Required fields as (wire key, value) pairs
    pub fn required(&self) -> Vec<(&'static str, &str)> {
        match self {
            StepFields::DetermineCause(f) => vec![("causas_identificadas", &f.identified_causes)],
            StepFields::ActionPlan(f) => vec![
                ("metas_claras", &f.clear_goals),
                ("capacitacion_sesion", &f.training_session),
            ],
            StepFields::EvaluateResults(f) => vec![
                ("sesion_privada", &f.private_session),
                ("comparacion", &f.comparison),
            ],
            StepFields::NonComplianceNote(f) => vec![
                ("comportamiento", &f.behavior),
                ("observaciones", &f.observations),
            ],
            StepFields::AdministrativeRecord(f) => vec![
                ("colaborador", &f.collaborator),
                ("historial", &f.history),
            ],
        }
    }

    /// Build typed fields for `step` from an object keyed by wire names.
    ///
    /// Unknown keys are ignored and missing keys default to empty, so a
    /// partially filled form still parses and is rejected by validation.
    pub fn from_wire(step: Step, object: Value) -> Result<StepFields> {
        fn parse<T: serde::de::DeserializeOwned>(step: Step, object: Value) -> Result<T> {
            serde_json::from_value(object)
                .map_err(|e| CaseError::InvalidJson(format!("Invalid fields for {}: {}", step, e)))
        }

        match step {
            Step::ReportProblem => Err(CaseError::Precondition(
                "step 1 data lives on the case, not in a step record".to_string(),
            )),
            Step::DetermineCause => Ok(StepFields::DetermineCause(parse(step, object)?)),
            Step::ActionPlan => Ok(StepFields::ActionPlan(parse(step, object)?)),
            Step::EvaluateResults => Ok(StepFields::EvaluateResults(parse(step, object)?)),
            Step::NonComplianceNote => Ok(StepFields::NonComplianceNote(parse(step, object)?)),
            Step::AdministrativeRecord => {
                Ok(StepFields::AdministrativeRecord(parse(step, object)?))
            }
        }
    }

    /// Serialize the fields as an object keyed by wire names
    pub fn to_wire(&self) -> Map<String, Value> {
        let value = match self {
            StepFields::DetermineCause(f) => serde_json::to_value(f),
            StepFields::ActionPlan(f) => serde_json::to_value(f),
            StepFields::EvaluateResults(f) => serde_json::to_value(f),
            StepFields::NonComplianceNote(f) => serde_json::to_value(f),
            StepFields::AdministrativeRecord(f) => serde_json::to_value(f),
        };
        match value {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

/// The saved detail payload of one step (2..=6) of a case
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    /// Backend id (`id_paso2` .. `id_paso6`)
    pub record_id: u64,

    pub case_id: u64,

    pub fields: StepFields,

    pub status: RecordStatus,

    #[serde(default)]
    pub registered_by: Option<u64>,

    /// ISO 8601 timestamp as reported by the backend
    #[serde(default)]
    pub registered_at: Option<String>,

    /// Uploaded files, step 2 only
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evidence: Vec<Evidence>,
}

impl StepRecord {
    pub fn step(&self) -> Step {
        self.fields.step()
    }

    pub fn is_active(&self) -> bool {
        self.status == RecordStatus::Active
    }

    /// Return a new StepRecord with the given status
    pub fn with_status(mut self, status: RecordStatus) -> Self {
        self.status = status;
        self
    }

    /// Return a new StepRecord with the fields replaced
    pub fn with_fields(mut self, fields: StepFields) -> Self {
        self.fields = fields;
        self
    }
}
