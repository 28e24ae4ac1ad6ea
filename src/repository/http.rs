//! REST repository
//!
//! Talks to the case backend over HTTP with a blocking `ureq` agent. Each
//! request runs on tokio's blocking pool so callers stay async.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::errors::{CaseError, Result};
use crate::normalize::{
    case_from_raw, case_to_wire, category_from_raw, closure_to_wire, evidence_from_raw,
    record_from_raw, record_to_wire, Resolver,
};
use crate::schemas::{
    Case, Category, Config, Evidence, EvidenceUpload, Session, Step, StepFields, StepRecord,
};

use super::CaseRepository;

/// Why a request did not produce a body
#[derive(Debug)]
enum Failure {
    /// The backend answered with a non-2xx status
    Status(u16, String),
    /// The request never completed
    Transport(String),
}

impl From<Failure> for CaseError {
    fn from(failure: Failure) -> Self {
        match failure {
            Failure::Status(_, message) | Failure::Transport(message) => {
                CaseError::Transport(message)
            }
        }
    }
}

/// Pull a human message out of an error body: plain text, or the
/// `error`/`message`/`title` field of a JSON object.
fn backend_message(status: u16, body: &str) -> String {
    let trimmed = body.trim();
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        match &value {
            Value::String(s) if !s.trim().is_empty() => return s.clone(),
            Value::Object(_) => {
                if let Some(message) = Resolver::new(&value).first_text(&["error", "message", "title"])
                {
                    return message;
                }
            }
            _ => {}
        }
    } else if !trimmed.is_empty() {
        return trimmed.to_string();
    }
    format!("backend returned HTTP {}", status)
}

#[derive(Clone)]
struct Client {
    agent: ureq::Agent,
    base_url: String,
    token: Option<String>,
}

impl Client {
    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn request(&self, method: &str, path: &str) -> ureq::Request {
        let mut req = self
            .agent
            .request(method, &self.url(path))
            .set("Accept", "application/json");
        if let Some(token) = self.token.as_ref() {
            req = req.set("Authorization", &format!("Bearer {}", token));
        }
        req
    }

    fn finish(
        &self,
        method: &str,
        path: &str,
        outcome: std::result::Result<ureq::Response, ureq::Error>,
    ) -> std::result::Result<Value, Failure> {
        match outcome {
            Ok(resp) => {
                let text = resp
                    .into_string()
                    .map_err(|e| Failure::Transport(format!("failed to read response: {}", e)))?;
                if text.trim().is_empty() {
                    return Ok(Value::Null);
                }
                serde_json::from_str(&text).map_err(|e| {
                    Failure::Transport(format!("{} {} returned invalid JSON: {}", method, path, e))
                })
            }
            Err(ureq::Error::Status(code, resp)) => {
                let body = resp.into_string().unwrap_or_default();
                debug!(method, path, code, "backend returned error status");
                Err(Failure::Status(code, backend_message(code, &body)))
            }
            Err(ureq::Error::Transport(transport)) => {
                warn!(method, path, error = %transport, "backend unreachable");
                Err(Failure::Transport(format!("backend unreachable: {}", transport)))
            }
        }
    }

    fn call(
        &self,
        method: &str,
        path: &str,
        body: Option<&Value>,
    ) -> std::result::Result<Value, Failure> {
        debug!(method, path, "backend request");
        let req = self.request(method, path);
        let outcome = match body {
            Some(body) => req.send_json(body.clone()),
            None => req.call(),
        };
        self.finish(method, path, outcome)
    }

    fn multipart(
        &self,
        path: &str,
        boundary: &str,
        body: &[u8],
    ) -> std::result::Result<Value, Failure> {
        debug!(path, bytes = body.len(), "backend multipart upload");
        let outcome = self
            .request("POST", path)
            .set(
                "Content-Type",
                &format!("multipart/form-data; boundary={}", boundary),
            )
            .send_bytes(body);
        self.finish("POST", path, outcome)
    }

    /// GET a case list, falling back to the active-only endpoint on 404
    fn list_cases(&self, query: &str) -> Result<CaseListing> {
        let primary = format!("admin/casos{}", query);
        let (value, active_only) = match self.call("GET", &primary, None) {
            Err(Failure::Status(404, _)) => {
                debug!(query, "admin/casos missing, falling back to admin/casos-activos");
                (
                    self.call("GET", &format!("admin/casos-activos{}", query), None)?,
                    true,
                )
            }
            other => (other?, false),
        };
        let rows = match value {
            Value::Array(rows) => rows,
            Value::Null => Vec::new(),
            _ => {
                return Err(CaseError::InvalidJson(
                    "case list endpoint did not return an array".to_string(),
                ))
            }
        };
        Ok(CaseListing { rows, active_only })
    }
}

/// Raw case rows and whether they came from the active-only endpoint
struct CaseListing {
    rows: Vec<Value>,
    active_only: bool,
}

impl CaseListing {
    /// Select one case. A miss in an active-only listing is `Inactive`,
    /// since closed cases never appear there.
    fn find(&self, case_id: u64) -> Result<Case> {
        match self
            .rows
            .iter()
            .filter_map(|row| case_from_raw(row).ok())
            .find(|case| case.id == case_id)
        {
            Some(case) => Ok(case),
            None if self.active_only => Err(CaseError::Inactive(format!(
                "case {} (the backend only lists active cases; it may be closed)",
                case_id
            ))),
            None => Err(CaseError::NotFound(format!("case {}", case_id))),
        }
    }
}

/// Build a `multipart/form-data` body with the fields the evidence endpoint binds
fn evidence_form(
    boundary: &str,
    upload: &EvidenceUpload,
    description: &str,
    uploaded_by: u64,
) -> Vec<u8> {
    let mut body = Vec::with_capacity(upload.bytes.len() + 512);
    let file_name = upload.original_name.replace('"', "");
    body.extend_from_slice(
        format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"archivo\"; filename=\"{f}\"\r\nContent-Type: {m}\r\n\r\n",
            b = boundary,
            f = file_name,
            m = upload.mime_type
        )
        .as_bytes(),
    );
    body.extend_from_slice(&upload.bytes);
    body.extend_from_slice(b"\r\n");
    for (name, value) in [
        ("descripcion", description.to_string()),
        ("idUsuario", uploaded_by.to_string()),
    ] {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                boundary, name, value
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());
    body
}

fn record_path(step: Step) -> Result<&'static str> {
    step.resource().ok_or_else(|| {
        CaseError::Precondition("step 1 data lives on the case, not in a step record".to_string())
    })
}

async fn blocking<T, F>(task: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| CaseError::wrap(e, "backend request task failed"))?
}

/// Repository backed by the REST API
#[derive(Clone)]
pub struct HttpRepository {
    client: Client,
}

impl HttpRepository {
    /// Build a repository for `config.api_url`, authenticating as `session`
    pub fn new(config: &Config, session: &Session) -> Self {
        let timeout = Duration::from_millis(config.timeout_ms.max(100));
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(timeout)
            .timeout_read(timeout)
            .timeout_write(timeout)
            .user_agent(concat!("casetrack/", env!("CARGO_PKG_VERSION")))
            .build();
        HttpRepository {
            client: Client {
                agent,
                base_url: config.api_url.clone(),
                token: session.token.clone(),
            },
        }
    }

    pub fn base_url(&self) -> &str {
        &self.client.base_url
    }
}

#[async_trait]
impl CaseRepository for HttpRepository {
    async fn get_case(&self, case_id: u64) -> Result<Case> {
        // No direct endpoint: list and select by canonical id.
        let client = self.client.clone();
        blocking(move || client.list_cases("")?.find(case_id)).await
    }

    async fn upsert_case(&self, case: &Case) -> Result<Case> {
        let client = self.client.clone();
        let case = case.clone();
        blocking(move || {
            let body = case_to_wire(&case);
            if !case.is_new() {
                client.call("PUT", &format!("Casos/{}", case.id), Some(&body))?;
                return Ok(case);
            }
            let resp = client.call("POST", "Casos/crear", Some(&body))?;
            let r = Resolver::new(&resp);
            let id = r
                .u64("id_caso")
                .or_else(|| r.u64("id"))
                .filter(|id| *id > 0)
                .ok_or_else(|| {
                    CaseError::InvalidJson("create response carried no case id".to_string())
                })?;
            let mut created = case;
            created.id = id;
            created.created_at = r.text("fecha_registro");
            Ok(created)
        })
        .await
    }

    async fn get_step_record(&self, case_id: u64, step: Step) -> Result<Option<StepRecord>> {
        let resource = record_path(step)?;
        let client = self.client.clone();
        blocking(move || match client.call("GET", &format!("{}/{}", resource, case_id), None) {
            Err(Failure::Status(404, _)) => Ok(None),
            other => record_from_raw(step, &other?),
        })
        .await
    }

    async fn upsert_step_record(
        &self,
        case_id: u64,
        fields: &StepFields,
        registered_by: u64,
    ) -> Result<StepRecord> {
        let step = fields.step();
        let resource = record_path(step)?;
        let body = record_to_wire(case_id, fields, registered_by);
        let client = self.client.clone();
        blocking(move || {
            let resp = client.call("POST", resource, Some(&body))?;
            record_from_raw(step, &resp)?.ok_or_else(|| {
                CaseError::InvalidJson(format!("saving {} returned no record id", step))
            })
        })
        .await
    }

    async fn complete_step(&self, step: Step, record_id: u64) -> Result<Step> {
        let resource = record_path(step)?;
        let client = self.client.clone();
        blocking(move || {
            let resp = client.call(
                "PUT",
                &format!("{}/{}/completar", resource, record_id),
                Some(&json!({})),
            )?;
            Resolver::new(&resp)
                .u64("id_paso_actual")
                .and_then(|n| u8::try_from(n).ok())
                .and_then(Step::from_number)
                .ok_or_else(|| {
                    CaseError::InvalidJson(format!(
                        "completing {} returned no valid id_paso_actual",
                        step
                    ))
                })
        })
        .await
    }

    async fn close_case(&self, case_id: u64, justification: &str, actor_id: u64) -> Result<()> {
        let body = closure_to_wire(justification, actor_id);
        let client = self.client.clone();
        blocking(move || {
            client.call("PUT", &format!("Casos/{}/cerrar", case_id), Some(&body))?;
            Ok(())
        })
        .await
    }

    async fn close_step(
        &self,
        step: Step,
        record_id: u64,
        justification: &str,
        actor_id: u64,
    ) -> Result<()> {
        let resource = record_path(step)?;
        let body = closure_to_wire(justification, actor_id);
        let client = self.client.clone();
        blocking(move || {
            match client.call(
                "PUT",
                &format!("{}/{}/cerrar", resource, record_id),
                Some(&body),
            ) {
                Err(Failure::Status(404, _)) => Err(CaseError::NotSupported(format!(
                    "closing from {}",
                    step
                ))),
                other => other.map(|_| ()).map_err(CaseError::from),
            }
        })
        .await
    }

    async fn list_cases_for_supervisor(&self, supervisor_id: u64) -> Result<Vec<Value>> {
        let client = self.client.clone();
        blocking(move || Ok(client.list_cases(&format!("?idJefe={}", supervisor_id))?.rows)).await
    }

    async fn list_cases_for_employee(&self, employee_id: u64) -> Result<Vec<Value>> {
        let client = self.client.clone();
        blocking(move || Ok(client.list_cases(&format!("?idUsuario={}", employee_id))?.rows)).await
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let client = self.client.clone();
        blocking(move || match client.call("GET", "Categorias", None)? {
            Value::Array(rows) => Ok(rows.iter().filter_map(category_from_raw).collect()),
            Value::Null => Ok(Vec::new()),
            _ => Err(CaseError::InvalidJson(
                "category endpoint did not return an array".to_string(),
            )),
        })
        .await
    }

    async fn upload_evidence(
        &self,
        record_id: u64,
        upload: &EvidenceUpload,
        description: Option<&str>,
        uploaded_by: u64,
    ) -> Result<Evidence> {
        let boundary = format!(
            "casetrack-{:x}",
            chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
        );
        let body = evidence_form(&boundary, upload, description.unwrap_or(""), uploaded_by);
        let client = self.client.clone();
        blocking(move || {
            let path = format!("DeterminarCausa/{}/evidencias", record_id);
            let resp = client.multipart(&path, &boundary, &body)?;
            evidence_from_raw(&resp).ok_or_else(|| {
                CaseError::InvalidJson("evidence upload returned no evidence id".to_string())
            })
        })
        .await
    }

    async fn delete_evidence(&self, evidence_id: u64) -> Result<()> {
        let client = self.client.clone();
        blocking(move || match client.call("DELETE", &format!("Evidencias/{}", evidence_id), None) {
            Err(Failure::Status(404, _)) => {
                Err(CaseError::NotFound(format!("evidence {}", evidence_id)))
            }
            other => other.map(|_| ()).map_err(CaseError::from),
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_message_prefers_json_fields() {
        assert_eq!(
            backend_message(400, r#"{"message": "Categoría no existe"}"#),
            "Categoría no existe"
        );
        assert_eq!(backend_message(400, r#"{"title": "Bad Request"}"#), "Bad Request");
        assert_eq!(backend_message(500, "\"boom\""), "boom");
        assert_eq!(backend_message(500, "Internal failure"), "Internal failure");
        assert_eq!(backend_message(502, ""), "backend returned HTTP 502");
        assert_eq!(backend_message(502, "{}"), "backend returned HTTP 502");
    }

    #[test]
    fn test_url_joins_slashes() {
        let repo = HttpRepository::new(
            &Config {
                api_url: "http://localhost:5269/api/".to_string(),
                ..Config::default()
            },
            &Session::new(12, "jefe"),
        );
        assert_eq!(repo.client.url("/Casos/crear"), "http://localhost:5269/api/Casos/crear");
        assert_eq!(repo.base_url(), "http://localhost:5269/api/");
    }

    #[test]
    fn test_evidence_form_layout() {
        let upload = EvidenceUpload::new("acta.pdf", "application/pdf", b"%PDF".to_vec());
        let body = evidence_form("XYZ", &upload, "firmada", 12);
        let text = String::from_utf8_lossy(&body);
        assert!(text.starts_with("--XYZ\r\n"));
        assert!(text.contains("name=\"archivo\"; filename=\"acta.pdf\""));
        assert!(text.contains("Content-Type: application/pdf\r\n\r\n%PDF\r\n"));
        assert!(text.contains("name=\"descripcion\"\r\n\r\nfirmada\r\n"));
        assert!(text.contains("name=\"idUsuario\"\r\n\r\n12\r\n"));
        assert!(text.ends_with("--XYZ--\r\n"));
    }

    #[test]
    fn test_case_listing_find() {
        let rows = vec![
            json!({ "id_caso": 80, "id_paso": 2, "estatus": 1 }),
            json!({ "IdCaso": 81, "IdPaso": 4, "Estatus": 1 }),
        ];
        let full = CaseListing {
            rows: rows.clone(),
            active_only: false,
        };
        assert_eq!(full.find(81).unwrap().current_step, Step::EvaluateResults);
        assert_eq!(full.find(90).unwrap_err().code(), "NOT_FOUND");

        // Closed case 90 is left out of the active-only fallback listing
        let active = CaseListing {
            rows,
            active_only: true,
        };
        assert_eq!(active.find(80).unwrap().id, 80);
        let err = active.find(90).unwrap_err();
        assert_eq!(err.code(), "INACTIVE");
        assert!(err.to_string().contains("case 90"));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_transport_error() {
        let repo = HttpRepository::new(
            &Config {
                api_url: "http://127.0.0.1:9/api".to_string(),
                timeout_ms: 500,
                ..Config::default()
            },
            &Session::new(12, "jefe"),
        );
        let err = repo.list_categories().await.unwrap_err();
        assert_eq!(err.code(), "TRANSPORT");
    }

    #[tokio::test]
    async fn test_step_one_has_no_record_endpoint() {
        let repo = HttpRepository::new(&Config::default(), &Session::new(12, "jefe"));
        let err = repo
            .get_step_record(5, Step::ReportProblem)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "PRECONDITION");
    }
}
