//! Scheduling core.
//!
//! Pure algorithms shared by every storage backend: request validation, candidate
//! sets, teacher/room conflict detection and the auto-generation planner. Nothing in
//! this module performs I/O.

pub mod candidate;
pub mod conflicts;
pub mod error;
pub mod generator;
pub mod validation;

pub use candidate::CandidateSet;
pub use conflicts::detect_conflicts;
pub use error::{FieldError, ScheduleError, ScheduleResult};
pub use generator::{plan_allocation, AllocationPlan, AllocationSummary, PlannerDefaults};
pub use validation::{apply_update, check_days, validate_create};

#[cfg(test)]
mod tests;
