//! Show command - A case and its step records

use std::io::Write;

use crate::cli::print_json;
use crate::domain::CASE_STEPS;
use crate::errors::Result;
use crate::machine::StepMachine;
use crate::repository::CaseRepository;
use crate::schemas::RecordStatus;

/// Show a case with every step record saved so far
pub async fn run<R: CaseRepository>(
    machine: &StepMachine<R>,
    case_id: u64,
    json: bool,
    out: &mut impl Write,
) -> Result<()> {
    let overview = machine.overview(case_id).await?;
    if json {
        return print_json(out, &overview);
    }

    let case = &overview.case;
    writeln!(out, "Case {} ({})", case.id, case.status)?;
    writeln!(out, "  Employee:    {}", case.affected_user_id)?;
    writeln!(out, "  Raised by:   {}", case.supervisor_user_id)?;
    writeln!(out, "  Category:    {}", case.category_id)?;
    writeln!(out, "  Description: {}", case.description)?;
    writeln!(out, "  Impact:      {}", case.impact)?;
    writeln!(out, "  Conduct:     {}", case.observed_conduct)?;
    writeln!(out, "  Current:     {}", case.current_step)?;
    if let Some(created) = &case.created_at {
        writeln!(out, "  Registered:  {}", created)?;
    }
    if let Some(closure) = &case.closure {
        writeln!(out, "  Closed:      {} ({})", closure.justification, closure.closed_at)?;
    } else {
        writeln!(out, "  Next:        {}", case.next_step())?;
    }

    writeln!(out)?;
    for step in CASE_STEPS.iter().filter(|s| s.has_record()) {
        let state = match overview.record(*step) {
            Some(record) => match record.status {
                RecordStatus::Active => format!("saved (#{})", record.record_id),
                RecordStatus::Completed => format!("completed (#{})", record.record_id),
            },
            None => "-".to_string(),
        };
        writeln!(out, "  {:<28} {}", step.to_string(), state)?;
        if let Some(record) = overview.record(*step) {
            for (key, value) in record.fields.to_wire() {
                if let Some(text) = value.as_str().filter(|t| !t.is_empty()) {
                    writeln!(out, "      {}: {}", key, text)?;
                }
            }
            for evidence in &record.evidence {
                writeln!(
                    out,
                    "      evidence #{}: {} ({} bytes)",
                    evidence.evidence_id, evidence.original_name, evidence.size_bytes
                )?;
            }
        }
    }
    Ok(())
}
