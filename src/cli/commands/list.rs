//! List and counts commands - Case list projections

use std::io::Write;

use crate::cli::print_json;
use crate::domain::CASE_STEPS;
use crate::errors::Result;
use crate::machine::{ListScope, StepMachine};
use crate::repository::CaseRepository;
use crate::view::{count_by_step, filter, to_csv, StepFilter};

/// How the list is printed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListFormat {
    Table,
    Json,
    Csv,
}

impl ListFormat {
    pub fn from_flags(json: bool, csv: bool) -> Self {
        if json {
            ListFormat::Json
        } else if csv {
            ListFormat::Csv
        } else {
            ListFormat::Table
        }
    }
}

pub fn scope(employee: bool) -> ListScope {
    if employee {
        ListScope::Employee
    } else {
        ListScope::Supervisor
    }
}

/// List cases for the session user, filtered by step and search text
pub async fn run<R: CaseRepository>(
    machine: &StepMachine<R>,
    scope: ListScope,
    step: StepFilter,
    search: &str,
    format: ListFormat,
    out: &mut impl Write,
) -> Result<()> {
    let cases = machine.case_list(scope).await?;
    let shown = filter(&cases, step, search);

    match format {
        ListFormat::Json => print_json(out, &shown)?,
        ListFormat::Csv => writeln!(out, "{}", to_csv(&shown))?,
        ListFormat::Table => {
            if shown.is_empty() {
                writeln!(out, "No cases found")?;
                return Ok(());
            }
            writeln!(
                out,
                "{:>6}  {:<24} {:<18} {:<24} {:<4} {}",
                "ID", "EMPLOYEE", "CATEGORY", "RAISED BY", "STEP", "STATUS"
            )?;
            for case in &shown {
                writeln!(
                    out,
                    "{:>6}  {:<24} {:<18} {:<24} {:<4} {}",
                    case.id,
                    case.employee,
                    case.category,
                    case.raised_by,
                    case.current_step.number(),
                    case.status
                )?;
            }
            writeln!(out, "{} of {} case(s)", shown.len(), cases.len())?;
        }
    }
    Ok(())
}

/// Print the number of cases at each step
pub async fn counts<R: CaseRepository>(
    machine: &StepMachine<R>,
    scope: ListScope,
    json: bool,
    out: &mut impl Write,
) -> Result<()> {
    let cases = machine.case_list(scope).await?;
    let counts = count_by_step(&cases);

    if json {
        return print_json(out, &counts);
    }
    for step in CASE_STEPS {
        writeln!(
            out,
            "{}  {:<24} {}",
            step.number(),
            step.label(),
            counts.get(*step)
        )?;
    }
    writeln!(out, "   {:<24} {}", "Total", counts.total)?;
    Ok(())
}
