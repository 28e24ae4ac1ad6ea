//! Schema types for casetrack
//!
//! Domain types use descriptive names; backend wire names are handled by
//! serde renames and by the `normalize` module.

mod case;
mod category;
mod config;
mod evidence;
mod record;
mod session;
mod step;

pub use case::{Case, CaseDraft, CaseStatus, Closure};
pub use category::Category;
pub use config::{Config, StepOnePolicy};
pub use evidence::{Evidence, EvidenceUpload};
pub use record::{
    ActionPlanFields, AdministrativeRecordFields, CauseFields, EvaluationFields,
    NonComplianceFields, RecordStatus, StepFields, StepRecord,
};
pub use session::Session;
pub use step::Step;
