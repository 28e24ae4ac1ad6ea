//! In-process repository
//!
//! Keeps cases, step records and evidence in memory. It can be told to act
//! like a backend whose step completion leaves the case pointer behind, or
//! that lacks the per-step close endpoints.

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::debug;

use crate::errors::{CaseError, Result};
use crate::normalize::case_to_row;
use crate::schemas::{
    Case, Category, Closure, Evidence, EvidenceUpload, RecordStatus, Step, StepFields, StepRecord,
};

use super::CaseRepository;

/// One call made against a [`MemoryRepository`], in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryCall {
    GetCase(u64),
    UpsertCase(u64),
    GetStepRecord(u64, Step),
    UpsertStepRecord(u64, Step),
    CompleteStep(Step, u64),
    CloseCase(u64),
    CloseStep(Step, u64),
    ListCasesForSupervisor(u64),
    ListCasesForEmployee(u64),
    ListCategories,
    UploadEvidence(u64),
    DeleteEvidence(u64),
}

impl RepositoryCall {
    /// Whether the call changes backend state
    pub fn is_write(&self) -> bool {
        !matches!(
            self,
            RepositoryCall::GetCase(_)
                | RepositoryCall::GetStepRecord(..)
                | RepositoryCall::ListCasesForSupervisor(_)
                | RepositoryCall::ListCasesForEmployee(_)
                | RepositoryCall::ListCategories
        )
    }

    fn name(&self) -> &'static str {
        match self {
            RepositoryCall::GetCase(_) => "get_case",
            RepositoryCall::UpsertCase(_) => "upsert_case",
            RepositoryCall::GetStepRecord(..) => "get_step_record",
            RepositoryCall::UpsertStepRecord(..) => "upsert_step_record",
            RepositoryCall::CompleteStep(..) => "complete_step",
            RepositoryCall::CloseCase(_) => "close_case",
            RepositoryCall::CloseStep(..) => "close_step",
            RepositoryCall::ListCasesForSupervisor(_) => "list_cases_for_supervisor",
            RepositoryCall::ListCasesForEmployee(_) => "list_cases_for_employee",
            RepositoryCall::ListCategories => "list_categories",
            RepositoryCall::UploadEvidence(_) => "upload_evidence",
            RepositoryCall::DeleteEvidence(_) => "delete_evidence",
        }
    }
}

#[derive(Debug, Default)]
struct State {
    cases: BTreeMap<u64, Case>,
    records: HashMap<(u64, Step), StepRecord>,
    categories: Vec<Category>,
    user_names: HashMap<u64, String>,
    next_case_id: u64,
    next_record_id: u64,
    next_evidence_id: u64,
    /// Completions that mark the record but leave the case pointer behind
    pointer_lag: u32,
    close_step_supported: bool,
    failing: HashSet<&'static str>,
    calls: Vec<RepositoryCall>,
}

impl State {
    fn record(&mut self, call: RepositoryCall) -> Result<()> {
        debug!(?call, "memory repository call");
        let name = call.name();
        self.calls.push(call);
        if self.failing.contains(name) {
            return Err(CaseError::Transport(format!(
                "simulated backend failure in {}",
                name
            )));
        }
        Ok(())
    }

    fn case_mut(&mut self, case_id: u64) -> Result<&mut Case> {
        self.cases
            .get_mut(&case_id)
            .ok_or_else(|| CaseError::NotFound(format!("case {}", case_id)))
    }

    fn record_by_id(&mut self, step: Step, record_id: u64) -> Result<&mut StepRecord> {
        self.records
            .iter_mut()
            .find(|((_, s), r)| *s == step && r.record_id == record_id)
            .map(|(_, r)| r)
            .ok_or_else(|| CaseError::NotFound(format!("{} record {}", step, record_id)))
    }

    fn row(&self, case: &Case) -> Value {
        let mut row = case_to_row(case);
        if let Some(name) = self.user_names.get(&case.affected_user_id) {
            row.insert("nombre_empleado".to_string(), json!(name));
        }
        if let Some(name) = self.user_names.get(&case.supervisor_user_id) {
            row.insert("nombre_jefe".to_string(), json!(name));
        }
        if let Some(category) = self
            .categories
            .iter()
            .find(|c| c.category_id == case.category_id)
        {
            row.insert("categoria".to_string(), json!(category.name));
        }
        Value::Object(row)
    }
}

/// Repository backed by in-process maps
#[derive(Debug)]
pub struct MemoryRepository {
    state: Mutex<State>,
}

impl Default for MemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRepository {
    pub fn new() -> Self {
        MemoryRepository {
            state: Mutex::new(State {
                next_case_id: 1,
                next_record_id: 1,
                next_evidence_id: 1,
                close_step_supported: true,
                ..State::default()
            }),
        }
    }

    // ===== SEEDING =====

    /// Add a category
    pub fn with_category(mut self, category_id: u64, name: &str) -> Self {
        self.state.get_mut().categories.push(Category {
            category_id,
            name: name.to_string(),
            description: String::new(),
        });
        self
    }

    /// Register a display name for a user id
    pub fn with_user(mut self, user_id: u64, name: &str) -> Self {
        self.state
            .get_mut()
            .user_names
            .insert(user_id, name.to_string());
        self
    }

    /// Store a case as-is, keeping its id
    pub fn with_case(mut self, case: Case) -> Self {
        let state = self.state.get_mut();
        state.next_case_id = state.next_case_id.max(case.id + 1);
        state.cases.insert(case.id, case);
        self
    }

    /// Store a step record for an existing case, assigning its id
    pub fn with_record(mut self, case_id: u64, fields: StepFields, status: RecordStatus) -> Self {
        let state = self.state.get_mut();
        let record_id = state.next_record_id;
        state.next_record_id += 1;
        let step = fields.step();
        state.records.insert(
            (case_id, step),
            StepRecord {
                record_id,
                case_id,
                fields,
                status,
                registered_by: None,
                registered_at: None,
                evidence: Vec::new(),
            },
        );
        self
    }

    // ===== BEHAVIOUR SWITCHES =====

    /// The next `count` step completions leave the case pointer where it is
    pub fn with_pointer_lag(mut self, count: u32) -> Self {
        self.state.get_mut().pointer_lag = count;
        self
    }

    /// Answer every `close_step` with `NotSupported`
    pub fn without_close_step(mut self) -> Self {
        self.state.get_mut().close_step_supported = false;
        self
    }

    /// Fail every call to the named trait method with a transport error
    pub async fn fail_on(&self, method: &'static str) {
        self.state.lock().await.failing.insert(method);
    }

    // ===== INSPECTION =====

    /// Every call made so far, in order
    pub async fn calls(&self) -> Vec<RepositoryCall> {
        self.state.lock().await.calls.clone()
    }

    /// Number of calls that changed state
    pub async fn write_count(&self) -> usize {
        self.state
            .lock()
            .await
            .calls
            .iter()
            .filter(|c| c.is_write())
            .count()
    }

    /// Forget the call log
    pub async fn clear_calls(&self) {
        self.state.lock().await.calls.clear();
    }

    /// Current stored case, bypassing the call log
    pub async fn peek_case(&self, case_id: u64) -> Option<Case> {
        self.state.lock().await.cases.get(&case_id).cloned()
    }

    /// Current stored record, bypassing the call log
    pub async fn peek_record(&self, case_id: u64, step: Step) -> Option<StepRecord> {
        self.state.lock().await.records.get(&(case_id, step)).cloned()
    }
}

#[async_trait]
impl CaseRepository for MemoryRepository {
    async fn get_case(&self, case_id: u64) -> Result<Case> {
        let mut state = self.state.lock().await;
        state.record(RepositoryCall::GetCase(case_id))?;
        state
            .cases
            .get(&case_id)
            .cloned()
            .ok_or_else(|| CaseError::NotFound(format!("case {}", case_id)))
    }

    async fn upsert_case(&self, case: &Case) -> Result<Case> {
        let mut state = self.state.lock().await;
        state.record(RepositoryCall::UpsertCase(case.id))?;

        if case.is_new() {
            let id = state.next_case_id;
            state.next_case_id += 1;
            let mut created = case.clone();
            created.id = id;
            created.created_at = Some(chrono::Utc::now().to_rfc3339());
            state.cases.insert(id, created.clone());
            return Ok(created);
        }

        let stored = state.case_mut(case.id)?;
        let created_at = stored.created_at.clone();
        *stored = case.clone();
        stored.created_at = created_at;
        Ok(stored.clone())
    }

    async fn get_step_record(&self, case_id: u64, step: Step) -> Result<Option<StepRecord>> {
        let mut state = self.state.lock().await;
        state.record(RepositoryCall::GetStepRecord(case_id, step))?;
        if !step.has_record() {
            return Err(CaseError::Precondition(
                "step 1 has no step record".to_string(),
            ));
        }
        Ok(state.records.get(&(case_id, step)).cloned())
    }

    async fn upsert_step_record(
        &self,
        case_id: u64,
        fields: &StepFields,
        registered_by: u64,
    ) -> Result<StepRecord> {
        let step = fields.step();
        let mut state = self.state.lock().await;
        state.record(RepositoryCall::UpsertStepRecord(case_id, step))?;
        state.case_mut(case_id)?;

        if let Some(existing) = state.records.get_mut(&(case_id, step)) {
            existing.fields = fields.clone();
            return Ok(existing.clone());
        }

        let record_id = state.next_record_id;
        state.next_record_id += 1;
        let record = StepRecord {
            record_id,
            case_id,
            fields: fields.clone(),
            status: RecordStatus::Active,
            registered_by: Some(registered_by),
            registered_at: Some(chrono::Utc::now().to_rfc3339()),
            evidence: Vec::new(),
        };
        state.records.insert((case_id, step), record.clone());
        Ok(record)
    }

    async fn complete_step(&self, step: Step, record_id: u64) -> Result<Step> {
        let mut state = self.state.lock().await;
        state.record(RepositoryCall::CompleteStep(step, record_id))?;

        let record = state.record_by_id(step, record_id)?;
        record.status = RecordStatus::Completed;
        let case_id = record.case_id;

        let lagging = state.pointer_lag > 0;
        if lagging {
            state.pointer_lag -= 1;
        }
        let case = state.case_mut(case_id)?;
        if !lagging {
            let target = step.next().unwrap_or(step);
            case.current_step = case.current_step.max(target);
        }
        Ok(case.current_step)
    }

    async fn close_case(&self, case_id: u64, justification: &str, actor_id: u64) -> Result<()> {
        let mut state = self.state.lock().await;
        state.record(RepositoryCall::CloseCase(case_id))?;
        let case = state.case_mut(case_id)?;
        if !case.is_closed() {
            let actor = (actor_id != 0).then_some(actor_id);
            *case = case.clone().with_closure(Closure::now(justification, actor));
        }
        Ok(())
    }

    async fn close_step(
        &self,
        step: Step,
        record_id: u64,
        justification: &str,
        actor_id: u64,
    ) -> Result<()> {
        let mut state = self.state.lock().await;
        state.record(RepositoryCall::CloseStep(step, record_id))?;
        if !state.close_step_supported {
            return Err(CaseError::NotSupported(format!("closing from {}", step)));
        }
        let record = state.record_by_id(step, record_id)?;
        record.status = RecordStatus::Completed;
        let case_id = record.case_id;
        let case = state.case_mut(case_id)?;
        if !case.is_closed() {
            let actor = (actor_id != 0).then_some(actor_id);
            *case = case.clone().with_closure(Closure::now(justification, actor));
        }
        Ok(())
    }

    async fn list_cases_for_supervisor(&self, supervisor_id: u64) -> Result<Vec<Value>> {
        let mut state = self.state.lock().await;
        state.record(RepositoryCall::ListCasesForSupervisor(supervisor_id))?;
        Ok(state
            .cases
            .values()
            .filter(|c| c.supervisor_user_id == supervisor_id)
            .map(|c| state.row(c))
            .collect())
    }

    async fn list_cases_for_employee(&self, employee_id: u64) -> Result<Vec<Value>> {
        let mut state = self.state.lock().await;
        state.record(RepositoryCall::ListCasesForEmployee(employee_id))?;
        Ok(state
            .cases
            .values()
            .filter(|c| c.affected_user_id == employee_id)
            .map(|c| state.row(c))
            .collect())
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let mut state = self.state.lock().await;
        state.record(RepositoryCall::ListCategories)?;
        Ok(state.categories.clone())
    }

    async fn upload_evidence(
        &self,
        record_id: u64,
        upload: &EvidenceUpload,
        description: Option<&str>,
        _uploaded_by: u64,
    ) -> Result<Evidence> {
        let mut state = self.state.lock().await;
        state.record(RepositoryCall::UploadEvidence(record_id))?;

        let evidence_id = state.next_evidence_id;
        let record = state.record_by_id(Step::DetermineCause, record_id)?;
        let extension = upload.extension();
        let stored_name = format!("{:012x}{}", evidence_id, extension);
        let evidence = Evidence {
            evidence_id,
            step_record_id: record_id,
            case_id: record.case_id,
            path: format!("uploads/casos/{}/paso2/{}", record.case_id, stored_name),
            stored_name,
            original_name: upload.original_name.clone(),
            extension,
            mime_type: upload.mime_type.clone(),
            size_bytes: upload.size(),
            description: description
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string),
            uploaded_at: Some(chrono::Utc::now().to_rfc3339()),
        };
        record.evidence.push(evidence.clone());
        state.next_evidence_id += 1;
        Ok(evidence)
    }

    async fn delete_evidence(&self, evidence_id: u64) -> Result<()> {
        let mut state = self.state.lock().await;
        state.record(RepositoryCall::DeleteEvidence(evidence_id))?;
        for record in state.records.values_mut() {
            if let Some(index) = record
                .evidence
                .iter()
                .position(|e| e.evidence_id == evidence_id)
            {
                record.evidence.remove(index);
                return Ok(());
            }
        }
        Err(CaseError::NotFound(format!("evidence {}", evidence_id)))
    }
}
