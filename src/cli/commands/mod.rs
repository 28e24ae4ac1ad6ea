//! CLI command implementations
//!
//! Every command takes the machine and an output sink so it can run against
//! any repository.

pub mod case;
pub mod categories;
pub mod evidence;
pub mod list;
pub mod open;
pub mod show;
pub mod step;
