//! Read-only catalog lookups.
//!
//! Course offerings and the slot catalog are owned by other parts of the system; the
//! schedule engine only reads them.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{CourseOffering, OfferingId, SlotDefinition};

#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Look up an offering's teacher, room and credits.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If the offering doesn't exist
    async fn get_offering(&self, offering_id: OfferingId) -> RepositoryResult<CourseOffering>;

    /// The slot catalog ordered by slot number.
    async fn list_slots(&self) -> RepositoryResult<Vec<SlotDefinition>>;
}
