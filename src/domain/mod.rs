//! Domain logic for case steps and transitions

mod states;
mod transitions;
mod validation;


pub use states::{get_next_step, steps_between, CASE_STEPS};
pub use transitions::{
    apply_advance, apply_close, apply_step_one_save, pointer_after_step_one_save,
    TransitionResult,
};
pub use validation::{
    can_close, can_complete, can_modify, can_save, validate_draft, validate_evidence,
    validate_fields, validate_justification, ValidationContext, ValidationResult,
};
