//! Step state machine
//!
//! [`StepMachine`] mediates every change to a case: step-1 create and edit,
//! step 2..=6 saves, complete-and-advance, close and evidence. It validates
//! with the pure `domain` rules, persists through a [`CaseRepository`], and
//! always re-reads the case before deciding on a step transition.

mod guard;
mod pending;

pub use pending::{AdvanceOutcome, CaseOverview, CloseOutcome, PendingAdvance, PendingClose};

use tracing::{debug, info, warn};

use crate::domain::{
    apply_advance, apply_close, apply_step_one_save, can_modify, can_save, pointer_after_step_one_save,
    validate_draft, validate_evidence, validate_fields, validate_justification, TransitionResult,
    ValidationContext, CASE_STEPS,
};
use crate::errors::{CaseError, Result};
use crate::repository::CaseRepository;
use crate::schemas::{
    Case, CaseDraft, Category, Config, Evidence, EvidenceUpload, Session, Step, StepFields,
    StepRecord,
};
pub use crate::view::ListScope;

use crate::view::{map_cases_for, CaseUi};

pub(crate) use guard::InFlight;

/// Justification recorded when completing step 6 closes the case
pub const AUTO_CLOSE_JUSTIFICATION: &str =
    "Closed automatically on completion of step 6 (Acta Administrativa)";

/// Orchestrates case transitions on behalf of one session
pub struct StepMachine<R> {
    repo: R,
    session: Session,
    config: Config,
    in_flight: InFlight,
}

impl<R: CaseRepository> StepMachine<R> {
    /// Build a machine acting as `session`. Sessions without a user id are rejected.
    pub fn new(repo: R, session: Session, config: Config) -> Result<Self> {
        session.validate()?;
        Ok(StepMachine {
            repo,
            session,
            config,
            in_flight: InFlight::default(),
        })
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub(crate) fn in_flight(&self) -> &InFlight {
        &self.in_flight
    }

    // ===== READS =====

    pub async fn categories(&self) -> Result<Vec<Category>> {
        self.repo.list_categories().await
    }

    /// Cases visible to the session user, projected for display
    pub async fn case_list(&self, scope: ListScope) -> Result<Vec<CaseUi>> {
        let rows = match scope {
            ListScope::Supervisor => {
                self.repo
                    .list_cases_for_supervisor(self.session.user_id)
                    .await?
            }
            ListScope::Employee => {
                self.repo
                    .list_cases_for_employee(self.session.user_id)
                    .await?
            }
        };
        Ok(map_cases_for(&rows, &self.session, scope))
    }

    /// The case and every step record saved for it
    pub async fn overview(&self, case_id: u64) -> Result<CaseOverview> {
        let case = self.repo.get_case(case_id).await?;
        let mut records = Vec::new();
        for step in CASE_STEPS.iter().copied().filter(|s| s.has_record()) {
            if let Some(record) = self.repo.get_step_record(case_id, step).await? {
                records.push(record);
            }
        }
        Ok(CaseOverview { case, records })
    }

    // ===== STEP 1 =====

    /// Create a case from the step-1 form
    pub async fn create_case(&self, draft: CaseDraft) -> Result<Case> {
        validate_draft(&draft).or_error(CaseError::Validation)?;
        if !self.session.is_supervisor() {
            return Err(CaseError::Precondition(format!(
                "role '{}' cannot raise cases",
                self.session.role
            )));
        }
        self.ensure_category(draft.category_id).await?;

        let start = pointer_after_step_one_save(Step::ReportProblem, self.config.step_one_policy);
        let case = Case::from_draft(draft, self.session.user_id).with_step(start);
        let created = self.repo.upsert_case(&case).await?;
        info!(case_id = created.id, step = %created.current_step, "case created");
        Ok(created)
    }

    /// Correct the step-1 data of an existing case.
    ///
    /// Allowed after the case has moved on; the step pointer never goes back.
    pub async fn edit_in_place(&self, case_id: u64, draft: CaseDraft) -> Result<Case> {
        validate_draft(&draft).or_error(CaseError::Validation)?;
        let _guard = self.in_flight.acquire(case_id)?;

        let current = self.repo.get_case(case_id).await?;
        can_save(&current, Step::ReportProblem).or_error(CaseError::Precondition)?;
        if draft.category_id != current.category_id {
            self.ensure_category(draft.category_id).await?;
        }

        let edited = apply_step_one_save(&current.clone().with_draft(draft), self.config.step_one_policy);
        let saved = self.repo.upsert_case(&edited).await?;
        info!(case_id, step = %saved.current_step, "step 1 edited in place");
        Ok(saved)
    }

    async fn ensure_category(&self, category_id: u64) -> Result<()> {
        let categories = self.repo.list_categories().await?;
        if categories.iter().any(|c| c.category_id == category_id) {
            Ok(())
        } else {
            Err(CaseError::NotFound(format!("category {}", category_id)))
        }
    }

    // ===== STEPS 2..=6 =====

    /// Create or update the record for the step `fields` belong to.
    ///
    /// Never moves the step pointer.
    pub async fn save_step(&self, case_id: u64, fields: StepFields) -> Result<StepRecord> {
        validate_fields(&fields).or_error(CaseError::Validation)?;
        let step = fields.step();
        let _guard = self.in_flight.acquire(case_id)?;

        let case = self.repo.get_case(case_id).await?;
        can_save(&case, step).or_error(CaseError::Precondition)?;

        let record = self
            .repo
            .upsert_step_record(case_id, &fields, self.session.user_id)
            .await?;
        info!(case_id, step = %step, record_id = record.record_id, "step saved");
        Ok(record)
    }

    // ===== COMPLETE AND ADVANCE =====

    /// Check that `step` can be completed and return a token to confirm it
    pub async fn request_advance(&self, case_id: u64, step: Step) -> Result<PendingAdvance> {
        let case = self.repo.get_case(case_id).await?;
        let record = self.load_record(case_id, step).await?;
        let ctx = ValidationContext {
            record_status: record.as_ref().map(|r| r.status),
        };
        if let TransitionResult::Error { error } = apply_advance(&case, step, &ctx) {
            return Err(CaseError::Precondition(error));
        }
        Ok(PendingAdvance {
            case_id,
            step,
            record_id: record.map(|r| r.record_id),
        })
    }

    /// Apply a confirmed advance. Completing step 6 also closes the case.
    pub async fn confirm_advance(&self, pending: PendingAdvance) -> Result<AdvanceOutcome> {
        let PendingAdvance { case_id, step, .. } = pending;
        let _guard = self.in_flight.acquire(case_id)?;

        // Re-read: the token may be stale.
        let case = self.repo.get_case(case_id).await?;
        let record = self.load_record(case_id, step).await?;
        let advanced = self.complete_and_advance(&case, step, record.as_ref()).await?;

        if step.next().is_some() {
            return Ok(AdvanceOutcome {
                case: advanced,
                completed: step,
                closed: false,
            });
        }

        self.close_with(
            case_id,
            record.map(|r| r.record_id).map(|id| (step, id)),
            AUTO_CLOSE_JUSTIFICATION,
        )
        .await?;
        let closed = self.repo.get_case(case_id).await?;
        info!(case_id, "final step completed, case closed");
        Ok(AdvanceOutcome {
            case: closed,
            completed: step,
            closed: true,
        })
    }

    async fn load_record(&self, case_id: u64, step: Step) -> Result<Option<StepRecord>> {
        if step.has_record() {
            self.repo.get_step_record(case_id, step).await
        } else {
            Ok(None)
        }
    }

    /// Complete `step` on a freshly read `case` and bring the pointer to the next step
    pub(crate) async fn complete_and_advance(
        &self,
        case: &Case,
        step: Step,
        record: Option<&StepRecord>,
    ) -> Result<Case> {
        let ctx = ValidationContext {
            record_status: record.map(|r| r.status),
        };
        let next = match apply_advance(case, step, &ctx) {
            TransitionResult::Success { next_case } => next_case,
            TransitionResult::Error { error } => return Err(CaseError::Precondition(error)),
        };

        match record {
            None => {
                let saved = self.repo.upsert_case(&next).await?;
                info!(case_id = case.id, step = %saved.current_step, "step 1 completed");
                Ok(saved)
            }
            Some(record) => {
                let reported = self.repo.complete_step(step, record.record_id).await?;
                debug!(case_id = case.id, reported = %reported, "step record completed");
                let advanced = self.reconcile_pointer(case.id, next.current_step).await?;
                info!(case_id = case.id, step = %advanced.current_step, "step completed");
                Ok(advanced)
            }
        }
    }

    /// Re-read the case and, if its pointer is behind `target`, write it
    /// forward until it matches or the attempt budget runs out.
    pub(crate) async fn reconcile_pointer(&self, case_id: u64, target: Step) -> Result<Case> {
        let mut case = self.repo.get_case(case_id).await?;
        let mut attempts = 0;
        while case.current_step < target {
            if attempts >= self.config.max_reconcile_attempts {
                return Err(CaseError::Sync(format!(
                    "case {} is still at {} after {} pointer writes; expected {}",
                    case_id, case.current_step, attempts, target
                )));
            }
            attempts += 1;
            warn!(
                case_id,
                at = %case.current_step,
                target = %target,
                attempt = attempts,
                "case pointer behind completed step, writing it forward"
            );
            self.repo
                .upsert_case(&case.clone().with_step(target))
                .await?;
            case = self.repo.get_case(case_id).await?;
        }
        Ok(case)
    }

    // ===== CLOSE =====

    /// Validate a close from `step` and return a token to confirm it.
    ///
    /// A blank justification fails before any backend call.
    pub async fn request_close(
        &self,
        case_id: u64,
        step: Step,
        justification: &str,
    ) -> Result<PendingClose> {
        validate_justification(justification).or_error(CaseError::Validation)?;

        let case = self.repo.get_case(case_id).await?;
        let record = if case.is_closed() {
            None
        } else {
            self.load_record(case_id, step).await?
        };
        let ctx = ValidationContext {
            record_status: record.as_ref().map(|r| r.status),
        };
        if let TransitionResult::Error { error } =
            apply_close(&case, step, justification, Some(self.session.user_id), &ctx)
        {
            return Err(CaseError::Precondition(error));
        }

        Ok(PendingClose {
            case_id,
            step,
            record_id: record.map(|r| r.record_id),
            justification: justification.trim().to_string(),
            already_closed: case.is_closed(),
        })
    }

    /// Apply a confirmed close. Closing a closed case succeeds without writes.
    pub async fn confirm_close(&self, pending: PendingClose) -> Result<CloseOutcome> {
        let PendingClose {
            case_id,
            step,
            record_id,
            justification,
            ..
        } = pending;
        let _guard = self.in_flight.acquire(case_id)?;

        let case = self.repo.get_case(case_id).await?;
        if case.is_closed() {
            debug!(case_id, "close requested on a closed case");
            return Ok(CloseOutcome {
                case,
                already_closed: true,
            });
        }

        self.close_with(case_id, record_id.map(|id| (step, id)), &justification)
            .await?;
        let closed = self.repo.get_case(case_id).await?;
        info!(case_id, step = %step, "case closed");
        Ok(CloseOutcome {
            case: closed,
            already_closed: false,
        })
    }

    /// Close through the step endpoint when there is one, then the case
    async fn close_with(
        &self,
        case_id: u64,
        step_record: Option<(Step, u64)>,
        justification: &str,
    ) -> Result<()> {
        let actor = self.session.user_id;
        if let Some((step, record_id)) = step_record {
            match self
                .repo
                .close_step(step, record_id, justification, actor)
                .await
            {
                Ok(()) => {}
                Err(CaseError::NotSupported(reason)) => {
                    debug!(case_id, %reason, "step close unavailable, closing the case only");
                }
                Err(e) => return Err(e),
            }
        }
        self.repo.close_case(case_id, justification, actor).await
    }

    // ===== EVIDENCE =====

    /// Upload a file to the case's step-2 record
    pub async fn attach_evidence(
        &self,
        case_id: u64,
        upload: EvidenceUpload,
        description: Option<&str>,
    ) -> Result<Evidence> {
        validate_evidence(&upload, &self.config).or_error(CaseError::Validation)?;
        let _guard = self.in_flight.acquire(case_id)?;

        let case = self.repo.get_case(case_id).await?;
        can_modify(&case).or_error(CaseError::Precondition)?;
        let record = self
            .repo
            .get_step_record(case_id, Step::DetermineCause)
            .await?
            .ok_or_else(|| {
                CaseError::Precondition(format!(
                    "must save {} before attaching evidence",
                    Step::DetermineCause
                ))
            })?;

        let evidence = self
            .repo
            .upload_evidence(record.record_id, &upload, description, self.session.user_id)
            .await?;
        info!(
            case_id,
            evidence_id = evidence.evidence_id,
            size = evidence.size_bytes,
            "evidence attached"
        );
        Ok(evidence)
    }

    /// Delete one evidence file of an open case.
    ///
    /// The file must belong to this case's step-2 record.
    pub async fn delete_evidence(&self, case_id: u64, evidence_id: u64) -> Result<()> {
        let _guard = self.in_flight.acquire(case_id)?;
        let case = self.repo.get_case(case_id).await?;
        can_modify(&case).or_error(CaseError::Precondition)?;
        let owned = self
            .repo
            .get_step_record(case_id, Step::DetermineCause)
            .await?
            .is_some_and(|record| record.evidence.iter().any(|e| e.evidence_id == evidence_id));
        if !owned {
            return Err(CaseError::NotFound(format!(
                "evidence {} in case {}",
                evidence_id, case_id
            )));
        }
        self.repo.delete_evidence(evidence_id).await?;
        info!(case_id, evidence_id, "evidence deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{MemoryRepository, RepositoryCall};
    use crate::schemas::{CauseFields, NonComplianceFields, RecordStatus, StepOnePolicy};

    fn draft() -> CaseDraft {
        CaseDraft {
            affected_user_id: 101,
            category_id: 1,
            description: "Llegó 30 minutos tarde".to_string(),
            impact: "Retraso en entrega".to_string(),
            observed_conduct: "Llegó a las 9:30".to_string(),
        }
    }

    fn case_at(id: u64, step: Step) -> Case {
        let mut case = Case::from_draft(draft(), 12).with_step(step);
        case.id = id;
        case
    }

    fn cause() -> StepFields {
        StepFields::DetermineCause(CauseFields {
            identified_causes: "Transporte".to_string(),
            additional_comments: None,
        })
    }

    fn machine(repo: MemoryRepository) -> StepMachine<MemoryRepository> {
        StepMachine::new(repo, Session::new(12, "jefe"), Config::default()).unwrap()
    }

    #[test]
    fn test_new_rejects_anonymous_session() {
        let result = StepMachine::new(
            MemoryRepository::new(),
            Session::new(0, "jefe"),
            Config::default(),
        );
        assert_eq!(result.err().unwrap().code(), "VALIDATION");
    }

    #[tokio::test]
    async fn test_create_case_holds_at_step_one() {
        let m = machine(MemoryRepository::new().with_category(1, "Retardo"));
        let case = m.create_case(draft()).await.unwrap();
        assert_eq!(case.current_step, Step::ReportProblem);
        assert_eq!(case.supervisor_user_id, 12);
    }

    #[tokio::test]
    async fn test_create_case_advance_policy() {
        let config = Config {
            step_one_policy: StepOnePolicy::Advance,
            ..Config::default()
        };
        let m = StepMachine::new(
            MemoryRepository::new().with_category(1, "Retardo"),
            Session::new(12, "jefe"),
            config,
        )
        .unwrap();
        let case = m.create_case(draft()).await.unwrap();
        assert_eq!(case.current_step, Step::DetermineCause);
    }

    #[tokio::test]
    async fn test_create_case_unknown_category() {
        let m = machine(MemoryRepository::new().with_category(2, "Ausencia"));
        let err = m.create_case(draft()).await.unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_create_case_requires_supervisor_role() {
        let m = StepMachine::new(
            MemoryRepository::new().with_category(1, "Retardo"),
            Session::new(101, "empleado"),
            Config::default(),
        )
        .unwrap();
        let err = m.create_case(draft()).await.unwrap_err();
        assert_eq!(err.code(), "PRECONDITION");
    }

    #[tokio::test]
    async fn test_create_case_validation_happens_first() {
        let m = machine(MemoryRepository::new());
        let err = m.create_case(CaseDraft::default()).await.unwrap_err();
        assert_eq!(err.code(), "VALIDATION");
        assert!(m.repository().calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_edit_in_place_keeps_pointer() {
        let m = machine(
            MemoryRepository::new()
                .with_category(1, "Retardo")
                .with_case(case_at(75, Step::EvaluateResults)),
        );
        let mut edited = draft();
        edited.description = "Llegó 45 minutos tarde".to_string();
        let case = m.edit_in_place(75, edited).await.unwrap();
        assert_eq!(case.current_step, Step::EvaluateResults);
        assert_eq!(case.description, "Llegó 45 minutos tarde");
    }

    #[tokio::test]
    async fn test_save_step_does_not_advance() {
        let m = machine(MemoryRepository::new().with_case(case_at(80, Step::DetermineCause)));
        let record = m.save_step(80, cause()).await.unwrap();
        assert!(record.is_active());
        let case = m.repository().peek_case(80).await.unwrap();
        assert_eq!(case.current_step, Step::DetermineCause);
    }

    #[tokio::test]
    async fn test_save_step_ahead_of_case_fails() {
        let m = machine(MemoryRepository::new().with_case(case_at(80, Step::DetermineCause)));
        let fields = StepFields::NonComplianceNote(NonComplianceFields {
            behavior: "x".to_string(),
            observations: "y".to_string(),
        });
        let err = m.save_step(80, fields).await.unwrap_err();
        assert_eq!(err.code(), "PRECONDITION");
    }

    #[tokio::test]
    async fn test_advance_requires_saved_record() {
        let m = machine(MemoryRepository::new().with_case(case_at(80, Step::DetermineCause)));
        let err = m
            .request_advance(80, Step::DetermineCause)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "PRECONDITION");
        assert!(err.to_string().contains("must save"));
    }

    #[tokio::test]
    async fn test_advance_step_one() {
        let m = machine(MemoryRepository::new().with_case(case_at(5, Step::ReportProblem)));
        let pending = m.request_advance(5, Step::ReportProblem).await.unwrap();
        let outcome = m.confirm_advance(pending).await.unwrap();
        assert_eq!(outcome.case.current_step, Step::DetermineCause);
        assert!(!outcome.closed);
    }

    #[tokio::test]
    async fn test_advance_compensates_lagging_pointer() {
        let repo = MemoryRepository::new()
            .with_case(case_at(80, Step::DetermineCause))
            .with_record(80, cause(), RecordStatus::Active)
            .with_pointer_lag(1);
        let m = machine(repo);
        let pending = m.request_advance(80, Step::DetermineCause).await.unwrap();
        let outcome = m.confirm_advance(pending).await.unwrap();
        assert_eq!(outcome.case.current_step, Step::ActionPlan);
        let upserts = m
            .repository()
            .calls()
            .await
            .into_iter()
            .filter(|c| matches!(c, RepositoryCall::UpsertCase(80)))
            .count();
        assert_eq!(upserts, 1);
    }

    #[tokio::test]
    async fn test_advance_without_reconcile_budget_is_sync_error() {
        let repo = MemoryRepository::new()
            .with_case(case_at(80, Step::DetermineCause))
            .with_record(80, cause(), RecordStatus::Active)
            .with_pointer_lag(1);
        let config = Config {
            max_reconcile_attempts: 0,
            ..Config::default()
        };
        let m = StepMachine::new(repo, Session::new(12, "jefe"), config).unwrap();
        let pending = m.request_advance(80, Step::DetermineCause).await.unwrap();
        let err = m.confirm_advance(pending).await.unwrap_err();
        assert_eq!(err.code(), "SYNC");
    }

    #[tokio::test]
    async fn test_stale_advance_token_is_rejected() {
        let m = machine(
            MemoryRepository::new()
                .with_case(case_at(80, Step::DetermineCause))
                .with_record(80, cause(), RecordStatus::Active),
        );
        let first = m.request_advance(80, Step::DetermineCause).await.unwrap();
        let second = m.request_advance(80, Step::DetermineCause).await.unwrap();
        m.confirm_advance(first).await.unwrap();
        let err = m.confirm_advance(second).await.unwrap_err();
        assert_eq!(err.code(), "PRECONDITION");
    }

    #[tokio::test]
    async fn test_operation_in_flight_is_rejected() {
        let m = machine(MemoryRepository::new().with_case(case_at(80, Step::DetermineCause)));
        let _held = m.in_flight().acquire(80).unwrap();
        let err = m.save_step(80, cause()).await.unwrap_err();
        assert!(err.to_string().contains("in progress"));
    }

    #[tokio::test]
    async fn test_close_falls_back_when_step_close_unsupported() {
        let m = machine(
            MemoryRepository::new()
                .with_case(case_at(90, Step::DetermineCause))
                .with_record(90, cause(), RecordStatus::Active)
                .without_close_step(),
        );
        let pending = m
            .request_close(90, Step::DetermineCause, "Renuncia voluntaria")
            .await
            .unwrap();
        let outcome = m.confirm_close(pending).await.unwrap();
        assert!(outcome.case.is_closed());
        assert!(!outcome.already_closed);
        let calls = m.repository().calls().await;
        assert!(calls.contains(&RepositoryCall::CloseStep(Step::DetermineCause, 1)));
        assert!(calls.contains(&RepositoryCall::CloseCase(90)));
    }

    #[tokio::test]
    async fn test_close_transport_error_is_not_retried() {
        let repo = MemoryRepository::new()
            .with_case(case_at(90, Step::DetermineCause))
            .with_record(90, cause(), RecordStatus::Active);
        repo.fail_on("close_step").await;
        let m = machine(repo);
        let pending = m
            .request_close(90, Step::DetermineCause, "Renuncia")
            .await
            .unwrap();
        let err = m.confirm_close(pending).await.unwrap_err();
        assert_eq!(err.code(), "TRANSPORT");
        let calls = m.repository().calls().await;
        assert!(!calls.contains(&RepositoryCall::CloseCase(90)));
        assert!(!m.repository().peek_case(90).await.unwrap().is_closed());
    }

    #[tokio::test]
    async fn test_closed_case_is_read_only() {
        let closed = case_at(90, Step::ActionPlan)
            .with_closure(crate::schemas::Closure::now("fin", Some(12)));
        let m = machine(MemoryRepository::new().with_case(closed));
        assert_eq!(m.save_step(90, cause()).await.unwrap_err().code(), "PRECONDITION");
        assert_eq!(m.edit_in_place(90, draft()).await.unwrap_err().code(), "PRECONDITION");
        assert_eq!(
            m.request_advance(90, Step::ActionPlan).await.unwrap_err().code(),
            "PRECONDITION"
        );
    }

    #[tokio::test]
    async fn test_attach_evidence_requires_step_two_record() {
        let m = machine(MemoryRepository::new().with_case(case_at(80, Step::DetermineCause)));
        let upload = EvidenceUpload::new("foto.png", "image/png", vec![1; 32]);
        let err = m.attach_evidence(80, upload, None).await.unwrap_err();
        assert_eq!(err.code(), "PRECONDITION");
    }

    #[tokio::test]
    async fn test_attach_evidence_rejects_wrong_type_before_backend() {
        let m = machine(MemoryRepository::new().with_case(case_at(80, Step::DetermineCause)));
        let upload = EvidenceUpload::new("nota.txt", "text/plain", vec![1; 32]);
        let err = m.attach_evidence(80, upload, None).await.unwrap_err();
        assert_eq!(err.code(), "VALIDATION");
        assert!(m.repository().calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_delete_evidence_of_another_case_is_rejected() {
        let m = machine(
            MemoryRepository::new()
                .with_case(case_at(80, Step::DetermineCause))
                .with_record(80, cause(), RecordStatus::Active)
                .with_case(case_at(90, Step::DetermineCause))
                .with_record(90, cause(), RecordStatus::Active),
        );
        let upload = EvidenceUpload::new("acta.pdf", "application/pdf", vec![1; 32]);
        let evidence = m.attach_evidence(90, upload, None).await.unwrap();
        let pending = m
            .request_close(90, Step::DetermineCause, "Renuncia")
            .await
            .unwrap();
        m.confirm_close(pending).await.unwrap();
        m.repository().clear_calls().await;

        let err = m.delete_evidence(80, evidence.evidence_id).await.unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
        assert_eq!(m.repository().write_count().await, 0);
        let record = m.repository().peek_record(90, Step::DetermineCause).await.unwrap();
        assert_eq!(record.evidence.len(), 1);

        let err = m.delete_evidence(90, evidence.evidence_id).await.unwrap_err();
        assert_eq!(err.code(), "PRECONDITION");
    }

    #[tokio::test]
    async fn test_delete_evidence_of_own_record() {
        let m = machine(
            MemoryRepository::new()
                .with_case(case_at(80, Step::DetermineCause))
                .with_record(80, cause(), RecordStatus::Active),
        );
        let upload = EvidenceUpload::new("foto.png", "image/png", vec![1; 32]);
        let evidence = m.attach_evidence(80, upload, None).await.unwrap();
        m.delete_evidence(80, evidence.evidence_id).await.unwrap();
        let record = m.repository().peek_record(80, Step::DetermineCause).await.unwrap();
        assert!(record.evidence.is_empty());
    }

    #[tokio::test]
    async fn test_overview_lists_saved_records() {
        let m = machine(
            MemoryRepository::new()
                .with_case(case_at(80, Step::ActionPlan))
                .with_record(80, cause(), RecordStatus::Completed),
        );
        let overview = m.overview(80).await.unwrap();
        assert_eq!(overview.records.len(), 1);
        assert!(overview.record(Step::DetermineCause).is_some());
        assert!(overview.record(Step::ActionPlan).is_none());
    }
}
