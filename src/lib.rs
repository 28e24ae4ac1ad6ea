//! Casetrack - Disciplinary case tracking through six sequential steps
//!
//! This library provides the core functionality for the casetrack CLI, including:
//! - Schema definitions for cases, step records, evidence and categories
//! - A canonical field resolver for the backend's mixed key casing
//! - Domain logic for the step table, validation and transitions
//! - The step state machine with two-phase confirmation
//! - Step record synchronization and pointer repair
//! - The case list view-model (mapping, counts, filter, CSV)
//! - Repository implementations over HTTP and in memory

pub mod cli;
pub mod config;
pub mod domain;
pub mod errors;
pub mod fs;
pub mod machine;
pub mod normalize;
pub mod repository;
pub mod schemas;
pub mod sync;
pub mod view;

// Re-export commonly used types
pub use errors::{CaseError, Result};
pub use machine::{ListScope, StepMachine};
pub use repository::{CaseRepository, HttpRepository, MemoryRepository};
pub use schemas::{Case, CaseDraft, Config, Session, Step, StepFields, StepRecord};
pub use sync::StepView;
pub use view::{CaseUi, StepFilter};
