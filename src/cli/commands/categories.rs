//! Categories command - Reference data

use std::io::Write;

use crate::cli::print_json;
use crate::errors::Result;
use crate::machine::StepMachine;
use crate::repository::CaseRepository;

pub async fn run<R: CaseRepository>(
    machine: &StepMachine<R>,
    json: bool,
    out: &mut impl Write,
) -> Result<()> {
    let categories = machine.categories().await?;
    if json {
        return print_json(out, &categories);
    }
    for category in &categories {
        if category.description.is_empty() {
            writeln!(out, "{:>4}  {}", category.category_id, category.name)?;
        } else {
            writeln!(
                out,
                "{:>4}  {} - {}",
                category.category_id, category.name, category.description
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::fixtures::{machine, output, repo};

    #[tokio::test]
    async fn test_categories_table() {
        let m = machine(repo());
        let mut out = Vec::new();
        run(&m, false, &mut out).await.unwrap();
        let text = output(out);
        assert!(text.contains("1  Puntualidad"));
        assert!(text.contains("2  Conducta"));
    }
}
