//! Repository trait definitions for schedule storage.
//!
//! Responsibilities are split across focused traits:
//!
//! - [`error`]: Error types for repository operations
//! - [`schedule`]: Schedule block reads and atomic block writes
//! - [`catalog`]: Read-only course offering and slot catalog lookups
//!
//! # Trait Composition
//!
//! For code that needs every capability, use the [`FullRepository`] bound:
//!
//! ```ignore
//! async fn preview<R: FullRepository + ?Sized>(repo: &R, id: OfferingId) -> RepositoryResult<()> {
//!     let offering = repo.get_offering(id).await?;
//!     let slots = repo.list_slots().await?;
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod error;
pub mod schedule;

pub use catalog::CatalogRepository;
pub use error::{ErrorContext, RepositoryError, RepositoryResult};
pub use schedule::{merge_patch, ScheduleRepository};

/// Composite trait bound for a complete repository implementation.
///
/// Automatically implemented for any type implementing both repository traits.
pub trait FullRepository: ScheduleRepository + CatalogRepository {}

impl<T> FullRepository for T where T: ScheduleRepository + CatalogRepository {}
