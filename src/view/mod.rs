//! Case list view-model
//!
//! Pure projections over raw case rows: mapping to [`CaseUi`], per-step
//! counts, filtering and CSV export. Nothing here talks to the backend.

mod export;
mod filter;

pub use export::to_csv;
pub use filter::{count_by_step, filter, StepCounts, StepFilter};

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::normalize::{case_from_raw, Resolver};
use crate::schemas::{CaseStatus, Session, Step};

pub const UNKNOWN_CATEGORY: &str = "Sin categoría";
pub const UNKNOWN_USER: &str = "Usuario desconocido";

/// Which list endpoint to read cases from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListScope {
    /// Cases the session user raised
    Supervisor,
    /// Cases raised against the session user
    Employee,
}

/// One case as shown in the list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseUi {
    pub id: u64,
    pub affected_user_id: u64,
    pub supervisor_user_id: u64,
    /// Affected employee display name
    pub employee: String,
    /// Category display name
    pub category: String,
    /// Supervisor display name
    pub raised_by: String,
    pub current_step: Step,
    pub step_label: String,
    pub registered_at: String,
    pub description: String,
    pub impact: String,
    pub conduct: String,
    pub status: CaseStatus,
}

impl CaseUi {
    pub fn is_closed(&self) -> bool {
        self.status == CaseStatus::Closed
    }
}

fn user_name(r: &Resolver<'_>, keys: &[&str], user_id: u64, known: Option<&str>) -> String {
    r.first_text(keys)
        .or_else(|| known.map(str::to_string))
        .unwrap_or_else(|| {
            if user_id > 0 {
                format!("Usuario {}", user_id)
            } else {
                UNKNOWN_USER.to_string()
            }
        })
}

/// Map one raw backend row. Returns `None` for rows without an id.
pub fn map_case(raw: &Value) -> Option<CaseUi> {
    project(raw, None)
}

/// Map one row of a `scope` list read on behalf of `session`.
///
/// Supervisor rows carry only the employee name, so the session's display
/// name fills in the side of the case the session user is on. A row that
/// omits that side's user id is taken to belong to the session user.
pub fn map_case_for(raw: &Value, session: &Session, scope: ListScope) -> Option<CaseUi> {
    project(raw, Some((session, scope)))
}

fn project(raw: &Value, viewer: Option<(&Session, ListScope)>) -> Option<CaseUi> {
    let mut case = case_from_raw(raw).ok()?;
    if let Some((session, scope)) = viewer {
        let own = match scope {
            ListScope::Supervisor => &mut case.supervisor_user_id,
            ListScope::Employee => &mut case.affected_user_id,
        };
        if *own == 0 {
            *own = session.user_id;
        }
    }
    let known = |user_id: u64| {
        viewer
            .map(|(session, _)| session)
            .filter(|s| s.user_id == user_id)
            .and_then(|s| s.display_name.as_deref())
            .map(str::trim)
            .filter(|name| !name.is_empty())
    };
    let r = Resolver::new(raw);

    let employee = user_name(
        &r,
        &["nombre_empleado", "empleado", "nombre_usuario"],
        case.affected_user_id,
        known(case.affected_user_id),
    );
    let raised_by = user_name(
        &r,
        &["nombre_jefe", "levantado_por", "nombre_usuario_jefe"],
        case.supervisor_user_id,
        known(case.supervisor_user_id),
    );
    let category = r
        .first_text(&["categoria", "nombre_categoria"])
        .unwrap_or_else(|| UNKNOWN_CATEGORY.to_string());

    Some(CaseUi {
        id: case.id,
        affected_user_id: case.affected_user_id,
        supervisor_user_id: case.supervisor_user_id,
        employee,
        category,
        raised_by,
        current_step: case.current_step,
        step_label: case.current_step.label().to_string(),
        registered_at: case.created_at.unwrap_or_default(),
        description: case.description,
        impact: case.impact,
        conduct: case.observed_conduct,
        status: case.status,
    })
}

/// Map a list of raw rows, dropping malformed ones
pub fn map_cases(rows: &[Value]) -> Vec<CaseUi> {
    project_all(rows, None)
}

/// Map a `scope` list read on behalf of `session`, dropping malformed rows
pub fn map_cases_for(rows: &[Value], session: &Session, scope: ListScope) -> Vec<CaseUi> {
    project_all(rows, Some((session, scope)))
}

fn project_all(rows: &[Value], viewer: Option<(&Session, ListScope)>) -> Vec<CaseUi> {
    let mapped: Vec<CaseUi> = rows.iter().filter_map(|raw| project(raw, viewer)).collect();
    let dropped = rows.len() - mapped.len();
    if dropped > 0 {
        warn!(dropped, total = rows.len(), "dropped case rows without an id");
    }
    mapped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{to_camel, to_pascal};
    use proptest::prelude::*;
    use serde_json::{json, Map};

    fn row() -> Value {
        json!({
            "id_caso": 5,
            "id_usuario": 101,
            "id_usuario_jefe": 12,
            "nombre_empleado": "Ana López",
            "nombre_jefe": "Carlos Ruiz",
            "categoria": "Puntualidad",
            "descripcion": "Retardo",
            "impacto": "Entrega tarde",
            "conducta": "Llegó 9:30",
            "id_paso": 3,
            "estatus": 1,
            "fecha_registro": "2024-03-01T09:00:00"
        })
    }

    fn respell(raw: &Value, spell: fn(&str) -> String) -> Value {
        let mut out = Map::new();
        if let Some(object) = raw.as_object() {
            for (k, v) in object {
                out.insert(spell(k), v.clone());
            }
        }
        Value::Object(out)
    }

    #[test]
    fn test_map_case_full_row() {
        let ui = map_case(&row()).unwrap();
        assert_eq!(ui.id, 5);
        assert_eq!(ui.employee, "Ana López");
        assert_eq!(ui.raised_by, "Carlos Ruiz");
        assert_eq!(ui.category, "Puntualidad");
        assert_eq!(ui.current_step, Step::ActionPlan);
        assert_eq!(ui.step_label, "Plan de Acción");
        assert_eq!(ui.registered_at, "2024-03-01T09:00:00");
        assert!(!ui.is_closed());
    }

    #[test]
    fn test_map_case_fallback_names() {
        let ui = map_case(&json!({ "IdCaso": 7, "IdUsuario": 33 })).unwrap();
        assert_eq!(ui.employee, "Usuario 33");
        assert_eq!(ui.raised_by, UNKNOWN_USER);
        assert_eq!(ui.category, UNKNOWN_CATEGORY);
        assert_eq!(ui.current_step, Step::ReportProblem);
    }

    #[test]
    fn test_map_case_closed_status() {
        let ui = map_case(&json!({ "id": 9, "estatus": 0 })).unwrap();
        assert!(ui.is_closed());
    }

    #[test]
    fn test_map_case_without_id_is_none() {
        assert!(map_case(&json!({ "nombre_empleado": "Ana" })).is_none());
        assert!(map_case(&json!({ "id_caso": 0 })).is_none());
        assert!(map_case(&json!("not an object")).is_none());
    }

    #[test]
    fn test_snake_and_pascal_rows_map_identically() {
        let snake = map_case(&row()).unwrap();
        let pascal = map_case(&respell(&row(), to_pascal)).unwrap();
        assert_eq!(snake, pascal);
    }

    #[test]
    fn test_map_cases_drops_malformed() {
        let rows = vec![row(), json!({ "descripcion": "sin id" }), json!({ "idCaso": 6 })];
        let ids: Vec<u64> = map_cases(&rows).iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![5, 6]);
    }

    #[test]
    fn test_map_case_for_fills_supervisor_from_session() {
        let raw = json!({
            "id_caso": 5,
            "id_usuario": 101,
            "nombre_empleado": "Ana López",
            "categoria": "Puntualidad",
            "id_paso": 2,
            "estatus": 1
        });
        let session = Session::new(12, "jefe").with_display_name("Carlos Ruiz");

        assert_eq!(map_case(&raw).unwrap().raised_by, UNKNOWN_USER);
        let ui = map_case_for(&raw, &session, ListScope::Supervisor).unwrap();
        assert_eq!(ui.supervisor_user_id, 12);
        assert_eq!(ui.raised_by, "Carlos Ruiz");
        assert_eq!(ui.employee, "Ana López");

        let cases = map_cases_for(&[raw], &session, ListScope::Supervisor);
        assert_eq!(filter(&cases, StepFilter::All, "carlos").len(), 1);
    }

    #[test]
    fn test_map_case_for_only_names_the_session_user() {
        let session = Session::new(40, "jefe").with_display_name("Otra Persona");
        let raw = json!({ "id_caso": 5, "id_usuario": 101, "id_usuario_jefe": 12 });
        let ui = map_case_for(&raw, &session, ListScope::Supervisor).unwrap();
        assert_eq!(ui.raised_by, "Usuario 12");
        assert_eq!(ui.employee, "Usuario 101");

        let own = Session::new(12, "jefe").with_display_name("Otro");
        let named = map_case_for(&row(), &own, ListScope::Supervisor).unwrap();
        assert_eq!(named.raised_by, "Carlos Ruiz");
    }

    #[test]
    fn test_map_case_for_employee_scope() {
        let session = Session::new(101, "empleado").with_display_name("Ana López");
        let raw = json!({ "id_caso": 5, "id_usuario_jefe": 12, "nombre_jefe": "Carlos Ruiz" });
        let ui = map_case_for(&raw, &session, ListScope::Employee).unwrap();
        assert_eq!(ui.affected_user_id, 101);
        assert_eq!(ui.employee, "Ana López");
        assert_eq!(ui.raised_by, "Carlos Ruiz");
    }

    proptest! {
        /// Property: every casing variant of a row maps to the same CaseUi
        #[test]
        fn test_casing_variants_map_identically(
            id in 1u64..100_000,
            step in 1u8..=6,
            employee in "[A-Za-z ]{1,20}",
            variant in 0usize..3
        ) {
            let mut base = row();
            base["id_caso"] = json!(id);
            base["id_paso"] = json!(step);
            base["nombre_empleado"] = json!(employee);
            let spelled = match variant {
                0 => base.clone(),
                1 => respell(&base, to_pascal),
                _ => respell(&base, to_camel),
            };
            prop_assert_eq!(map_case(&base), map_case(&spelled));
        }
    }
}
