//! Schedule block repository trait.
//!
//! Writes are atomic units: the offering lookup, conflict detection and the
//! block/day/slot rows all happen inside one lock or transaction, so two racing
//! writes for the same teacher or room cannot both pass detection.

use async_trait::async_trait;

use super::error::{RepositoryError, RepositoryResult};
use crate::api::UpdateBlockRequest;
use crate::db::models::{BlockQuery, Page};
use crate::models::{BlockDraft, BlockId, BlockUpdate, ConflictRecord, DayPlan, OfferingId, ScheduleBlock};
use crate::scheduler::{apply_update, ScheduleError};

/// Merges `patch` onto the stored block. Backends call this while they hold the
/// block, so the read, the merge and the write form one unit.
pub fn merge_patch(existing: &ScheduleBlock, patch: &UpdateBlockRequest) -> RepositoryResult<BlockUpdate> {
    apply_update(existing, patch).map_err(|err| match err {
        ScheduleError::Validation(errors) => {
            RepositoryError::invalid_input(errors).with_operation("update_block")
        }
        other => RepositoryError::internal(other.to_string()),
    })
}

/// Repository trait for schedule block storage.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    // ==================== Health & Connection ====================

    /// Check if the storage backend is healthy.
    ///
    /// # Returns
    /// - `Ok(true)` if healthy
    /// - `Ok(false)` if unhealthy but no error occurred
    /// - `Err(RepositoryError)` if an error occurred during the check
    async fn health_check(&self) -> RepositoryResult<bool>;

    // ==================== Reads ====================

    /// List blocks matching `query`, newest first, with nested days and slots.
    async fn list_blocks(&self, query: &BlockQuery) -> RepositoryResult<Page<ScheduleBlock>>;

    /// Get a single block with its nested days and slots.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If the block doesn't exist
    async fn get_block(&self, block_id: BlockId) -> RepositoryResult<ScheduleBlock>;

    /// Find every collision between `days` and blocks of offerings sharing a teacher
    /// or room with `offering_id`. Read-only.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If the offering doesn't exist
    async fn find_conflicts(
        &self,
        offering_id: OfferingId,
        days: &[DayPlan],
        ignore_block_id: Option<BlockId>,
    ) -> RepositoryResult<Vec<ConflictRecord>>;

    // ==================== Atomic Writes ====================

    /// Persist a new block after re-checking conflicts in the same atomic unit.
    ///
    /// # Returns
    /// * `Ok(ScheduleBlock)` - The stored block with assigned ids
    /// * `Err(RepositoryError::NotFound)` - If the offering doesn't exist
    /// * `Err(RepositoryError::ScheduleConflict)` - If any slot collides; nothing is written
    async fn create_block(&self, draft: &BlockDraft) -> RepositoryResult<ScheduleBlock>;

    /// Apply a partial update. The patch is merged with [`merge_patch`] onto the
    /// block as it stands inside the write unit, so concurrent patches touching
    /// different fields all survive. Supplied days replace the whole hierarchy and
    /// are re-checked for conflicts, ignoring the block's own prior state.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If the block or new offering doesn't exist
    /// * `Err(RepositoryError::InvalidInput)` - If the merged state is invalid
    /// * `Err(RepositoryError::ScheduleConflict)` - If any new slot collides
    async fn update_block(
        &self,
        block_id: BlockId,
        patch: &UpdateBlockRequest,
    ) -> RepositoryResult<ScheduleBlock>;

    /// Delete a block with its days and slots.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If the block doesn't exist
    async fn delete_block(&self, block_id: BlockId) -> RepositoryResult<()>;
}
