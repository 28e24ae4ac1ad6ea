//! Case repository - the backend collaborator the state machine talks to
//!
//! The machine only depends on [`CaseRepository`]. [`HttpRepository`] talks to
//! the REST backend; [`MemoryRepository`] keeps everything in process.

mod http;
mod memory;

pub use http::HttpRepository;
pub use memory::{MemoryRepository, RepositoryCall};

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::{CaseError, Result};
use crate::schemas::{Case, Category, Evidence, EvidenceUpload, Step, StepFields, StepRecord};

/// CRUD over cases, step records and evidence.
///
/// Implementations report missing GET targets as `Ok(None)` for step records
/// and `CaseError::NotFound` for cases. Transport failures come back as
/// `CaseError::Transport` with the backend message.
#[async_trait]
pub trait CaseRepository: Send + Sync {
    /// Fetch one case by id
    async fn get_case(&self, case_id: u64) -> Result<Case>;

    /// Create (id 0) or update a case's step-1 data, pointer and status
    async fn upsert_case(&self, case: &Case) -> Result<Case>;

    /// Fetch the record for a step 2..=6, `None` when nothing was saved yet
    async fn get_step_record(&self, case_id: u64, step: Step) -> Result<Option<StepRecord>>;

    /// Create the step record if absent, update it otherwise
    async fn upsert_step_record(
        &self,
        case_id: u64,
        fields: &StepFields,
        registered_by: u64,
    ) -> Result<StepRecord>;

    /// Mark a step record completed; returns the case's new current step
    async fn complete_step(&self, step: Step, record_id: u64) -> Result<Step>;

    /// Close a case with a justification
    async fn close_case(&self, case_id: u64, justification: &str, actor_id: u64) -> Result<()>;

    /// Close a case through its step record endpoint.
    ///
    /// Optional; backends without it return `CaseError::NotSupported`.
    async fn close_step(
        &self,
        step: Step,
        _record_id: u64,
        _justification: &str,
        _actor_id: u64,
    ) -> Result<()> {
        Err(CaseError::NotSupported(format!("closing from {}", step)))
    }

    /// Raw case rows raised by a supervisor, for the list view
    async fn list_cases_for_supervisor(&self, supervisor_id: u64) -> Result<Vec<Value>>;

    /// Raw case rows raised against an employee, for the list view
    async fn list_cases_for_employee(&self, employee_id: u64) -> Result<Vec<Value>>;

    async fn list_categories(&self) -> Result<Vec<Category>>;

    /// Store a file against a step-2 record
    async fn upload_evidence(
        &self,
        record_id: u64,
        upload: &EvidenceUpload,
        description: Option<&str>,
        uploaded_by: u64,
    ) -> Result<Evidence>;

    async fn delete_evidence(&self, evidence_id: u64) -> Result<()>;
}
