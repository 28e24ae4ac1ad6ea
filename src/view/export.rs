//! CSV export of a case list

use super::CaseUi;

const HEADERS: [&str; 6] = [
    "ID",
    "Empleado",
    "Motivo",
    "Levantado Por",
    "Paso Actual",
    "Fecha",
];

/// Quote a field, doubling embedded quotes
fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

fn row(fields: &[String]) -> String {
    fields
        .iter()
        .map(|f| quote(f))
        .collect::<Vec<_>>()
        .join(",")
}

/// Render cases as CSV, one header line then one line per case.
///
/// Every field is quoted; the date column keeps only the date part of the
/// registration timestamp.
pub fn to_csv(cases: &[CaseUi]) -> String {
    let mut lines = Vec::with_capacity(cases.len() + 1);
    lines.push(row(&HEADERS.map(String::from)));
    for case in cases {
        let date = case
            .registered_at
            .split('T')
            .next()
            .unwrap_or_default()
            .to_string();
        lines.push(row(&[
            case.id.to_string(),
            case.employee.clone(),
            case.category.clone(),
            case.raised_by.clone(),
            case.step_label.clone(),
            date,
        ]));
    }
    lines.join("\n")
}
