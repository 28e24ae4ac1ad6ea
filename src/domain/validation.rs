//! Validation rules for saves and step transitions

use crate::errors::{CaseError, Result};
use crate::schemas::{Case, CaseDraft, Config, EvidenceUpload, RecordStatus, Step, StepFields};

/// What is known about the step record a transition acts on
#[derive(Debug, Clone, Default)]
pub struct ValidationContext {
    /// Status of the step record, None when nothing has been saved for the step.
    /// Ignored for step 1, whose data lives on the case.
    pub record_status: Option<RecordStatus>,
}

impl ValidationContext {
    /// Context for a step whose record exists with the given status
    pub fn with_record(status: RecordStatus) -> Self {
        ValidationContext {
            record_status: Some(status),
        }
    }
}

/// Result of a validation check
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Whether the validation passed
    pub valid: bool,

    /// Reason for failure (if valid is false)
    pub reason: Option<String>,
}

impl ValidationResult {
    /// Create a successful validation result
    pub fn success() -> Self {
        ValidationResult {
            valid: true,
            reason: None,
        }
    }

    /// Create a failed validation result
    pub fn failure(reason: impl Into<String>) -> Self {
        ValidationResult {
            valid: false,
            reason: Some(reason.into()),
        }
    }

    /// Convert into a `Result`, building the error from the failure reason
    pub fn or_error(self, make: fn(String) -> CaseError) -> Result<()> {
        if self.valid {
            Ok(())
        } else {
            Err(make(
                self.reason
                    .unwrap_or_else(|| "validation failed".to_string()),
            ))
        }
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn missing_message(step: Step, missing: &[&str]) -> String {
    format!("{} is missing required fields: {}", step, missing.join(", "))
}

/// Required fields of a step 2..=6 form that are blank
pub fn missing_fields(fields: &StepFields) -> Vec<&'static str> {
    fields
        .required()
        .into_iter()
        .filter(|(_, value)| is_blank(value))
        .map(|(key, _)| key)
        .collect()
}

/// Validate a step 2..=6 form
pub fn validate_fields(fields: &StepFields) -> ValidationResult {
    let missing = missing_fields(fields);
    if !missing.is_empty() {
        return ValidationResult::failure(missing_message(fields.step(), &missing));
    }
    ValidationResult::success()
}

/// Validate the step-1 form
pub fn validate_draft(draft: &CaseDraft) -> ValidationResult {
    let mut missing = Vec::new();
    if draft.affected_user_id == 0 {
        missing.push("id_usuario");
    }
    if draft.category_id == 0 {
        missing.push("id_categoria");
    }
    if is_blank(&draft.description) {
        missing.push("descripcion");
    }
    if is_blank(&draft.impact) {
        missing.push("impacto");
    }
    if is_blank(&draft.observed_conduct) {
        missing.push("conducta");
    }
    if !missing.is_empty() {
        return ValidationResult::failure(missing_message(Step::ReportProblem, &missing));
    }
    ValidationResult::success()
}

/// A closing justification must contain text
pub fn validate_justification(justification: &str) -> ValidationResult {
    if is_blank(justification) {
        return ValidationResult::failure("a justification is required to close the case");
    }
    ValidationResult::success()
}

/// Size, type and name checks applied before an evidence upload
pub fn validate_evidence(upload: &EvidenceUpload, config: &Config) -> ValidationResult {
    if is_blank(&upload.original_name) {
        return ValidationResult::failure("evidence file has no name");
    }
    if upload.size() == 0 {
        return ValidationResult::failure(format!("{} is empty", upload.original_name));
    }
    if upload.size() > config.max_evidence_bytes {
        return ValidationResult::failure(format!(
            "{} exceeds the maximum size of {} bytes",
            upload.original_name, config.max_evidence_bytes
        ));
    }
    let mime = upload.mime_type.to_ascii_lowercase();
    if !config
        .allowed_evidence_types
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(&mime))
    {
        return ValidationResult::failure(format!(
            "{} has type {}; allowed types are {}",
            upload.original_name,
            upload.mime_type,
            config.allowed_evidence_types.join(", ")
        ));
    }
    ValidationResult::success()
}

/// Closed cases accept no further writes
pub fn can_modify(case: &Case) -> ValidationResult {
    if case.is_closed() {
        return ValidationResult::failure(format!("case {} is closed", case.id));
    }
    ValidationResult::success()
}

/// Validate saving data for `step` on `case`
pub fn can_save(case: &Case, step: Step) -> ValidationResult {
    let modifiable = can_modify(case);
    if !modifiable.valid {
        return modifiable;
    }
    if case.current_step < step {
        return ValidationResult::failure(format!(
            "case {} has not reached {}; it is at {}",
            case.id, step, case.current_step
        ));
    }
    ValidationResult::success()
}

/// Validate completing `step` and advancing past it
pub fn can_complete(case: &Case, step: Step, ctx: &ValidationContext) -> ValidationResult {
    let modifiable = can_modify(case);
    if !modifiable.valid {
        return modifiable;
    }
    if case.current_step != step {
        return ValidationResult::failure(format!(
            "case {} is at {}, not {}",
            case.id, case.current_step, step
        ));
    }
    if step.has_record() {
        match ctx.record_status {
            None => {
                return ValidationResult::failure(format!(
                    "must save {} before continuing",
                    step
                ))
            }
            Some(RecordStatus::Completed) => {
                return ValidationResult::failure(format!("{} is already completed", step))
            }
            Some(RecordStatus::Active) => {}
        }
    } else if case.is_new() {
        return ValidationResult::failure("must save step 1 before continuing");
    }
    ValidationResult::success()
}

/// Validate closing `case` from `step`. Already-closed cases pass.
pub fn can_close(case: &Case, step: Step, ctx: &ValidationContext) -> ValidationResult {
    if case.is_closed() {
        return ValidationResult::success();
    }
    if step.has_record() && ctx.record_status.is_none() {
        return ValidationResult::failure(format!("must save {} before closing", step));
    }
    if case.is_new() {
        return ValidationResult::failure("must save step 1 before closing");
    }
    ValidationResult::success()
}
