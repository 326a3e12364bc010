//! Service layer for business logic and orchestration.
//!
//! Services sit between the HTTP handlers and the repository traits: they validate
//! requests, run the pure planners from `crate::scheduler`, and hand atomic writes
//! to the storage backend.

pub mod schedule_service;

pub use schedule_service::ScheduleService;
