//! Save, advance and close commands - Steps 2 to 6 and case closing

use std::io::Write;

use tracing::debug;

use crate::cli::fields_object;
use crate::errors::{CaseError, Result};
use crate::machine::StepMachine;
use crate::normalize::{fold_key, Resolver};
use crate::repository::CaseRepository;
use crate::schemas::{Step, StepFields};

/// Build typed step fields from `key=value` pairs.
///
/// Keys may be spelled in any casing; unknown keys are rejected.
pub fn parse_fields(step: Step, pairs: &[(String, String)]) -> Result<StepFields> {
    let known = StepFields::keys(step);
    let raw = fields_object(pairs);
    for (key, _) in pairs {
        let folded = fold_key(key);
        if !known.iter().any(|k| fold_key(k) == folded) {
            return Err(CaseError::Validation(format!(
                "unknown field '{}' for {}; expected one of: {}",
                key,
                step,
                known.join(", ")
            )));
        }
    }
    StepFields::from_wire(step, Resolver::new(&raw).canonical(known))
}

pub async fn save<R: CaseRepository>(
    machine: &StepMachine<R>,
    case_id: u64,
    step: Step,
    pairs: &[(String, String)],
    out: &mut impl Write,
) -> Result<()> {
    if !step.has_record() {
        return Err(CaseError::Precondition(
            "step 1 is saved with `casetrack edit`".to_string(),
        ));
    }
    let fields = parse_fields(step, pairs)?;
    let record = machine.save_step(case_id, fields).await?;
    writeln!(
        out,
        "Saved {} of case {} (record #{})",
        step, case_id, record.record_id
    )?;
    Ok(())
}

pub async fn advance<R, F>(
    machine: &StepMachine<R>,
    case_id: u64,
    step: Step,
    mut confirm: F,
    out: &mut impl Write,
) -> Result<()>
where
    R: CaseRepository,
    F: FnMut(&str) -> Result<bool>,
{
    let pending = machine.request_advance(case_id, step).await?;
    if !confirm(&pending.prompt())? {
        debug!(case_id, step = %step, "advance declined");
        writeln!(out, "Nothing changed")?;
        return Ok(());
    }
    let outcome = machine.confirm_advance(pending).await?;
    if outcome.closed {
        writeln!(out, "Completed {}; case {} is closed", step, case_id)?;
    } else {
        writeln!(
            out,
            "Completed {}; case {} is now at {}",
            step, case_id, outcome.case.current_step
        )?;
    }
    Ok(())
}

pub async fn close<R, F>(
    machine: &StepMachine<R>,
    case_id: u64,
    step: Step,
    justification: &str,
    mut confirm: F,
    out: &mut impl Write,
) -> Result<()>
where
    R: CaseRepository,
    F: FnMut(&str) -> Result<bool>,
{
    let pending = machine.request_close(case_id, step, justification).await?;
    if !pending.already_closed() && !confirm(&pending.prompt())? {
        debug!(case_id, "close declined");
        writeln!(out, "Nothing changed")?;
        return Ok(());
    }
    let outcome = machine.confirm_close(pending).await?;
    if outcome.already_closed {
        writeln!(out, "Case {} was already closed", case_id)?;
    } else {
        writeln!(out, "Closed case {}", case_id)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::fixtures::{case_at, cause, machine, output, repo};
    use crate::schemas::{Closure, RecordStatus};

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_fields_any_casing() {
        let fields = parse_fields(
            Step::ActionPlan,
            &pairs(&[("MetasClaras", "Llegar 8:00"), ("capacitacionSesion", "Sesión 1")]),
        )
        .unwrap();
        match fields {
            StepFields::ActionPlan(f) => {
                assert_eq!(f.clear_goals, "Llegar 8:00");
                assert_eq!(f.training_session, "Sesión 1");
            }
            other => panic!("unexpected fields: {:?}", other),
        }
    }

    #[test]
    fn test_parse_fields_unknown_key() {
        let err = parse_fields(Step::DetermineCause, &pairs(&[("color", "azul")])).unwrap_err();
        assert_eq!(err.code(), "VALIDATION");
        assert!(err.to_string().contains("causas_identificadas"));
    }

    #[tokio::test]
    async fn test_save_then_advance() {
        let m = machine(repo().with_case(case_at(80, Step::DetermineCause)));
        let mut out = Vec::new();
        save(
            &m,
            80,
            Step::DetermineCause,
            &pairs(&[("causas_identificadas", "Transporte")]),
            &mut out,
        )
        .await
        .unwrap();
        advance(&m, 80, Step::DetermineCause, |_| Ok(true), &mut out)
            .await
            .unwrap();
        let text = output(out);
        assert!(text.contains("Saved step 2"));
        assert!(text.contains("is now at step 3"));
    }

    #[tokio::test]
    async fn test_save_missing_required_field() {
        let m = machine(repo().with_case(case_at(80, Step::DetermineCause)));
        let err = save(&m, 80, Step::DetermineCause, &[], &mut Vec::new())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "VALIDATION");
        assert_eq!(m.repository().write_count().await, 0);
    }

    #[tokio::test]
    async fn test_declined_advance_writes_nothing() {
        let m = machine(
            repo()
                .with_case(case_at(80, Step::DetermineCause))
                .with_record(80, cause(), RecordStatus::Active),
        );
        let mut out = Vec::new();
        advance(&m, 80, Step::DetermineCause, |_| Ok(false), &mut out)
            .await
            .unwrap();
        assert!(output(out).contains("Nothing changed"));
        assert_eq!(m.repository().write_count().await, 0);
    }

    #[tokio::test]
    async fn test_close_and_close_again() {
        let m = machine(
            repo()
                .with_case(case_at(90, Step::DetermineCause))
                .with_record(90, cause(), RecordStatus::Active),
        );
        let mut out = Vec::new();
        close(&m, 90, Step::DetermineCause, "Renuncia", |_| Ok(true), &mut out)
            .await
            .unwrap();
        close(&m, 90, Step::DetermineCause, "Otra", |_| Ok(true), &mut out)
            .await
            .unwrap();
        let text = output(out);
        assert!(text.contains("Closed case 90"));
        assert!(text.contains("already closed"));
        let case = m.repository().peek_case(90).await.unwrap();
        assert_eq!(case.closure.unwrap().justification, "Renuncia");
    }

    #[tokio::test]
    async fn test_close_already_closed_does_not_prompt() {
        let closed = case_at(91, Step::ActionPlan).with_closure(Closure::now("fin", Some(12)));
        let m = machine(repo().with_case(closed));
        let mut out = Vec::new();
        close(
            &m,
            91,
            Step::ActionPlan,
            "otra vez",
            |_| panic!("should not prompt"),
            &mut out,
        )
        .await
        .unwrap();
        assert!(output(out).contains("already closed"));
    }
}
