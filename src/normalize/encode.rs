//! Typed schemas to backend request bodies

use serde_json::{json, Map, Value};

use crate::schemas::{Case, StepFields};

/// Body for `POST /Casos/crear` and `PUT /Casos/{id}`.
///
/// The backend DTO mixes casings; these are the exact names it binds.
pub fn case_to_wire(case: &Case) -> Value {
    json!({
        "IdUsuario": case.affected_user_id,
        "id_categoria": case.category_id,
        "descripcion": case.description,
        "impacto": case.impact,
        "conducta": case.observed_conduct,
        "id_usuario_jefe": case.supervisor_user_id,
        "estatus": case.status.code(),
        "id_paso": case.current_step.number(),
    })
}

/// A full case row as the list endpoints return it
pub fn case_to_row(case: &Case) -> Map<String, Value> {
    let mut row = Map::new();
    row.insert("id_caso".to_string(), json!(case.id));
    row.insert("id_usuario".to_string(), json!(case.affected_user_id));
    row.insert("id_usuario_jefe".to_string(), json!(case.supervisor_user_id));
    row.insert("id_categoria".to_string(), json!(case.category_id));
    row.insert("descripcion".to_string(), json!(case.description));
    row.insert("impacto".to_string(), json!(case.impact));
    row.insert("conducta".to_string(), json!(case.observed_conduct));
    row.insert("id_paso".to_string(), json!(case.current_step.number()));
    row.insert("estatus".to_string(), json!(case.status.code()));
    if let Some(created_at) = &case.created_at {
        row.insert("fecha_registro".to_string(), json!(created_at));
    }
    if let Some(closure) = &case.closure {
        row.insert("justificacion_cierre".to_string(), json!(closure.justification));
        row.insert("id_usuario_cierre".to_string(), json!(closure.closed_by));
        row.insert("fecha_cierre".to_string(), json!(closure.closed_at));
    }
    row
}

/// Body for `POST /{Step}` (upsert of a step record)
pub fn record_to_wire(case_id: u64, fields: &StepFields, registered_by: u64) -> Value {
    let mut body = fields.to_wire();
    body.insert("id_caso".to_string(), json!(case_id));
    body.insert("id_usuario_registro".to_string(), json!(registered_by));
    Value::Object(body)
}

/// Body for the `/cerrar` endpoints
pub fn closure_to_wire(justification: &str, actor_id: u64) -> Value {
    let actor = if actor_id == 0 {
        Value::Null
    } else {
        json!(actor_id)
    };
    json!({
        "justificacion_cierre": justification,
        "id_usuario_cierre": actor,
    })
}
