//! Open command - Load a step screen and repair pointer drift on request

use std::io::Write;

use crate::errors::Result;
use crate::machine::StepMachine;
use crate::repository::CaseRepository;
use crate::schemas::Step;
use crate::sync::StepView;

pub async fn run<R, F>(
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
    match machine.open_step(case_id, step).await? {
        StepView::Ready { case, record } => {
            match record {
                Some(record) => writeln!(
                    out,
                    "Case {} is at {}; editing saved record #{} of {}",
                    case.id, case.current_step, record.record_id, step
                )?,
                None if step.has_record() => writeln!(
                    out,
                    "Case {} is at {}; nothing saved for {} yet",
                    case.id, case.current_step, step
                )?,
                None => writeln!(out, "Case {} is at {}", case.id, case.current_step)?,
            }
            Ok(())
        }
        StepView::Closed { case, .. } => {
            writeln!(out, "Case {} is closed; {} is read-only", case.id, step)?;
            Ok(())
        }
        StepView::Behind { repair, .. } => {
            if !confirm(&repair.prompt())? {
                writeln!(out, "Left case {} at {}", case_id, repair.current())?;
                return Ok(());
            }
            let outcome = machine.confirm_repair(repair).await?;
            writeln!(
                out,
                "Completed {} step(s); case {} is now at {}",
                outcome.completed.len(),
                case_id,
                outcome.case.current_step
            )?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::fixtures::{case_at, cause, machine, output, repo};
    use crate::schemas::RecordStatus;

    #[tokio::test]
    async fn test_open_current_step() {
        let m = machine(repo().with_case(case_at(80, Step::DetermineCause)));
        let mut out = Vec::new();
        run(&m, 80, Step::DetermineCause, |_| Ok(true), &mut out)
            .await
            .unwrap();
        assert!(output(out).contains("nothing saved"));
        assert_eq!(m.repository().write_count().await, 0);
    }

    #[tokio::test]
    async fn test_declined_repair_writes_nothing() {
        let m = machine(
            repo()
                .with_case(case_at(80, Step::DetermineCause))
                .with_record(80, cause(), RecordStatus::Active),
        );
        let mut out = Vec::new();
        run(&m, 80, Step::ActionPlan, |_| Ok(false), &mut out)
            .await
            .unwrap();
        assert!(output(out).contains("Left case 80"));
        assert_eq!(m.repository().write_count().await, 0);
    }

    #[tokio::test]
    async fn test_confirmed_repair_advances() {
        let m = machine(
            repo()
                .with_case(case_at(80, Step::DetermineCause))
                .with_record(80, cause(), RecordStatus::Active),
        );
        let mut asked = Vec::new();
        let mut out = Vec::new();
        run(
            &m,
            80,
            Step::ActionPlan,
            |prompt| {
                asked.push(prompt.to_string());
                Ok(true)
            },
            &mut out,
        )
        .await
        .unwrap();
        assert_eq!(asked.len(), 1);
        assert!(output(out).contains("Completed 1 step(s)"));
        let case = m.repository().peek_case(80).await.unwrap();
        assert_eq!(case.current_step, Step::ActionPlan);
    }
}
