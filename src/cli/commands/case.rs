//! Create and edit commands - Step-1 data

use std::io::Write;

use crate::errors::Result;
use crate::machine::StepMachine;
use crate::repository::CaseRepository;
use crate::schemas::CaseDraft;

pub async fn create<R: CaseRepository>(
    machine: &StepMachine<R>,
    draft: CaseDraft,
    out: &mut impl Write,
) -> Result<()> {
    let case = machine.create_case(draft).await?;
    writeln!(out, "Created case {} at {}", case.id, case.current_step)?;
    Ok(())
}

pub async fn edit<R: CaseRepository>(
    machine: &StepMachine<R>,
    case_id: u64,
    draft: CaseDraft,
    out: &mut impl Write,
) -> Result<()> {
    let case = machine.edit_in_place(case_id, draft).await?;
    writeln!(
        out,
        "Updated step 1 of case {}; case remains at {}",
        case.id, case.current_step
    )?;
    Ok(())
}
