//! Raw backend objects to typed schemas

use serde_json::Value;

use crate::errors::{CaseError, Result};
use crate::schemas::{
    Case, CaseStatus, Category, Closure, Evidence, RecordStatus, Step, StepFields, StepRecord,
};

use super::Resolver;

/// Decode a case row.
///
/// A missing or invalid step pointer defaults to step 1; a missing status
/// defaults to active. Rows without an id are rejected.
pub fn case_from_raw(raw: &Value) -> Result<Case> {
    let r = Resolver::new(raw);
    let id = r
        .u64("id_caso")
        .or_else(|| r.u64("id"))
        .filter(|id| *id > 0)
        .ok_or_else(|| CaseError::InvalidJson("case record has no id".to_string()))?;

    let current_step = r
        .u64("id_paso")
        .and_then(|n| u8::try_from(n).ok())
        .and_then(Step::from_number)
        .unwrap_or(Step::ReportProblem);

    let status = r
        .i64("estatus")
        .map(CaseStatus::from_code)
        .unwrap_or_default();

    let closure = r.non_empty_text("justificacion_cierre").map(|justification| Closure {
        justification,
        closed_by: r.u64("id_usuario_cierre"),
        closed_at: r.text("fecha_cierre").unwrap_or_default(),
    });

    Ok(Case {
        id,
        affected_user_id: r.u64("id_usuario").unwrap_or(0),
        supervisor_user_id: r.u64("id_usuario_jefe").unwrap_or(0),
        category_id: r.u64("id_categoria").unwrap_or(0),
        description: r.text("descripcion").unwrap_or_default(),
        impact: r.text("impacto").unwrap_or_default(),
        observed_conduct: r.text("conducta").unwrap_or_default(),
        current_step,
        status,
        created_at: r.text("fecha_registro"),
        closure,
    })
}

/// Decode a step record row for `step`.
///
/// Returns `Ok(None)` when the row carries no record id, which the backend
/// uses for "nothing saved yet".
pub fn record_from_raw(step: Step, raw: &Value) -> Result<Option<StepRecord>> {
    if !step.has_record() {
        return Err(CaseError::Precondition(
            "step 1 has no step record".to_string(),
        ));
    }
    let r = Resolver::new(raw);
    let id_key = format!("id_paso{}", step.number());
    let record_id = match r.u64(&id_key).filter(|id| *id > 0) {
        Some(id) => id,
        None => return Ok(None),
    };

    let fields = StepFields::from_wire(step, r.canonical(StepFields::keys(step)))?;
    let evidence = match r.get("evidencias") {
        Some(Value::Array(items)) if step == Step::DetermineCause => {
            items.iter().filter_map(evidence_from_raw).collect()
        }
        _ => Vec::new(),
    };

    Ok(Some(StepRecord {
        record_id,
        case_id: r.u64("id_caso").unwrap_or(0),
        fields,
        status: r
            .i64("estatus")
            .map(RecordStatus::from_code)
            .unwrap_or_default(),
        registered_by: r.u64("id_usuario_registro"),
        registered_at: r.text("fecha_registro"),
        evidence,
    }))
}

/// Decode an evidence row; rows without an id are dropped
pub fn evidence_from_raw(raw: &Value) -> Option<Evidence> {
    let r = Resolver::new(raw);
    let evidence_id = r.u64("id_evidencia").filter(|id| *id > 0)?;
    Some(Evidence {
        evidence_id,
        step_record_id: r.u64("id_paso2").unwrap_or(0),
        case_id: r.u64("id_caso").unwrap_or(0),
        stored_name: r.text("nombre_archivo").unwrap_or_default(),
        original_name: r.text("nombre_original").unwrap_or_default(),
        extension: r.text("extension").unwrap_or_default(),
        mime_type: r.text("tipo_mime").unwrap_or_default(),
        size_bytes: r.u64("tamano_bytes").unwrap_or(0),
        path: r.text("ruta_archivo").unwrap_or_default(),
        description: r.non_empty_text("descripcion"),
        uploaded_at: r.text("fecha_carga"),
    })
}

/// Decode a category row; rows without an id are dropped
pub fn category_from_raw(raw: &Value) -> Option<Category> {
    let r = Resolver::new(raw);
    let category_id = r.u64("id_categoria").filter(|id| *id > 0)?;
    Some(Category {
        category_id,
        name: r.text("nombre").unwrap_or_default(),
        description: r.text("descripcion").unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_case_from_raw_snake_case() {
        let raw = json!({
            "id_caso": 75,
            "id_usuario": 101,
            "id_usuario_jefe": 12,
            "id_categoria": 3,
            "descripcion": "Retardo",
            "impacto": "Entrega tarde",
            "conducta": "Llegó 9:30",
            "id_paso": 4,
            "estatus": 1,
            "fecha_registro": "2026-01-23T14:30:00"
        });
        let case = case_from_raw(&raw).unwrap();
        assert_eq!(case.id, 75);
        assert_eq!(case.affected_user_id, 101);
        assert_eq!(case.supervisor_user_id, 12);
        assert_eq!(case.current_step, Step::EvaluateResults);
        assert_eq!(case.status, CaseStatus::Active);
        assert_eq!(case.created_at.as_deref(), Some("2026-01-23T14:30:00"));
        assert!(case.closure.is_none());
    }

    #[test]
    fn test_case_from_raw_defaults() {
        let case = case_from_raw(&json!({ "IdCaso": 9, "IdPaso": 17 })).unwrap();
        assert_eq!(case.current_step, Step::ReportProblem);
        assert_eq!(case.status, CaseStatus::Active);

        let case = case_from_raw(&json!({ "id": 10 })).unwrap();
        assert_eq!(case.id, 10);
    }

    #[test]
    fn test_case_from_raw_closed_with_justification() {
        let raw = json!({
            "idCaso": 90,
            "Estatus": 0,
            "justificacionCierre": "Renuncia",
            "IdUsuarioCierre": 12,
            "fecha_cierre": "2026-02-01T10:00:00"
        });
        let case = case_from_raw(&raw).unwrap();
        assert!(case.is_closed());
        let closure = case.closure.unwrap();
        assert_eq!(closure.justification, "Renuncia");
        assert_eq!(closure.closed_by, Some(12));
    }

    #[test]
    fn test_case_from_raw_requires_id() {
        let err = case_from_raw(&json!({ "descripcion": "sin id" })).unwrap_err();
        assert_eq!(err.code(), "INVALID_JSON");
        assert!(case_from_raw(&json!({ "id_caso": 0 })).is_err());
    }

    #[test]
    fn test_record_from_raw_with_evidence() {
        let raw = json!({
            "id_paso2": 31,
            "id_caso": 80,
            "causas_identificadas": "Transporte",
            "estatus": 1,
            "id_usuario_registro": 12,
            "Evidencias": [
                {
                    "id_evidencia": 1,
                    "id_paso2": 31,
                    "id_caso": 80,
                    "nombre_archivo": "a1b2.pdf",
                    "nombre_original": "acta.pdf",
                    "extension": ".pdf",
                    "tipo_mime": "application/pdf",
                    "tamano_bytes": 2048,
                    "ruta_archivo": "uploads/casos/80/paso2/a1b2.pdf"
                },
                { "nombre_archivo": "sin-id.pdf" }
            ]
        });
        let record = record_from_raw(Step::DetermineCause, &raw).unwrap().unwrap();
        assert_eq!(record.record_id, 31);
        assert_eq!(record.case_id, 80);
        assert!(record.is_active());
        assert_eq!(record.registered_by, Some(12));
        assert_eq!(record.evidence.len(), 1);
        assert_eq!(record.evidence[0].original_name, "acta.pdf");
    }

    #[test]
    fn test_record_from_raw_without_id_is_none() {
        let raw = json!({ "id_caso": 80 });
        assert!(record_from_raw(Step::ActionPlan, &raw).unwrap().is_none());
    }

    #[test]
    fn test_record_from_raw_completed_pascal_case() {
        let raw = json!({
            "IdPaso4": 44,
            "IdCaso": 75,
            "SesionPrivada": "Hecha",
            "Comparacion": "Mejoró",
            "Estatus": 0
        });
        let record = record_from_raw(Step::EvaluateResults, &raw).unwrap().unwrap();
        assert_eq!(record.status, RecordStatus::Completed);
        assert_eq!(record.step(), Step::EvaluateResults);
        assert!(record.fields.required().iter().all(|(_, v)| !v.is_empty()));
    }

    #[test]
    fn test_category_from_raw_mixed_casing() {
        let raw = json!({ "id_Categoria": 1, "nombre": "Retardo", "descripcion": "Llegadas tardías" });
        let category = category_from_raw(&raw).unwrap();
        assert_eq!(category.category_id, 1);
        assert_eq!(category.name, "Retardo");
        assert!(category_from_raw(&json!({ "nombre": "x" })).is_none());
    }
}
