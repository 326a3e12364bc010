//! In-memory local repository implementation.
//!
//! Suitable for unit testing and local development. Blocks live in a `BTreeMap`
//! keyed by id. Every write holds the single write lock from the first read of the
//! block or offering through conflict detection to the commit, so racing writes are
//! serialized and a rejected write leaves no trace.

use async_trait::async_trait;
use chrono::Utc;
use log::{info, warn};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::api::UpdateBlockRequest;
use crate::db::models::{BlockQuery, Page};
use crate::db::repository::*;
use crate::models::{
    default_slot_catalog, BlockDraft, BlockFields, BlockId, ConflictRecord,
    CourseOffering, DayId, DayPlan, OfferingId, ScheduleBlock, ScheduleDay, ScheduleSlot,
    ScheduleSlotId, SlotDefinition,
};
use crate::scheduler::{detect_conflicts, CandidateSet};

/// In-memory local repository.
///
/// # Example
/// ```
/// use course_schedule::db::repositories::LocalRepository;
/// use course_schedule::models::CourseOffering;
///
/// let repo = LocalRepository::new();
/// repo.insert_offering(CourseOffering::new(1).with_teacher(10).with_room(100));
/// assert_eq!(repo.block_count(), 0);
/// ```
#[derive(Clone)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

struct LocalData {
    blocks: BTreeMap<BlockId, ScheduleBlock>,
    offerings: HashMap<OfferingId, CourseOffering>,
    slots: Vec<SlotDefinition>,

    // ID counters
    next_block_id: i64,
    next_day_id: i64,
    next_slot_id: i64,

    // Connection health
    is_healthy: bool,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            blocks: BTreeMap::new(),
            offerings: HashMap::new(),
            slots: default_slot_catalog(),
            next_block_id: 1,
            next_day_id: 1,
            next_slot_id: 1,
            is_healthy: true,
        }
    }
}

impl LocalData {
    fn ensure_healthy(&self) -> RepositoryResult<()> {
        if !self.is_healthy {
            return Err(RepositoryError::connection("Database is not healthy"));
        }
        Ok(())
    }

    fn offering(&self, offering_id: OfferingId, operation: &str) -> RepositoryResult<CourseOffering> {
        self.offerings.get(&offering_id).cloned().ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("Course offering {} not found", offering_id),
                ErrorContext::new(operation)
                    .with_entity("CourseOffering")
                    .with_entity_id(offering_id),
            )
        })
    }

    fn block(&self, block_id: BlockId, operation: &str) -> RepositoryResult<&ScheduleBlock> {
        self.blocks.get(&block_id).ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("Schedule block {} not found", block_id),
                ErrorContext::new(operation)
                    .with_entity("ScheduleBlock")
                    .with_entity_id(block_id),
            )
        })
    }

    fn conflicts(
        &self,
        offering: &CourseOffering,
        days: &[DayPlan],
        ignore_block_id: Option<BlockId>,
    ) -> Vec<ConflictRecord> {
        let existing = self.blocks.values().filter_map(|block| {
            self.offerings
                .get(&block.course_offering_id)
                .map(|owner| (owner, block))
        });
        detect_conflicts(
            offering,
            &CandidateSet::from_days(days),
            existing,
            ignore_block_id,
        )
    }

    /// Assigns row ids and catalog references to validated plans.
    fn materialize_days(&mut self, plans: &[DayPlan]) -> Vec<ScheduleDay> {
        let mut days = Vec::with_capacity(plans.len());
        for plan in plans {
            let day_id = DayId::new(self.next_day_id);
            self.next_day_id += 1;

            let mut slots = Vec::with_capacity(plan.slots.len());
            for slot_number in &plan.slots {
                let slot_ref_id = self
                    .slots
                    .iter()
                    .find(|s| s.slot_number == *slot_number)
                    .map(|s| s.slot_ref_id);
                slots.push(ScheduleSlot {
                    id: ScheduleSlotId::new(self.next_slot_id),
                    slot_number: *slot_number,
                    slot_ref_id,
                });
                self.next_slot_id += 1;
            }
            days.push(ScheduleDay {
                id: day_id,
                weekday: plan.weekday,
                slots,
            });
        }
        days
    }
}

fn apply_fields(block: &mut ScheduleBlock, fields: &BlockFields) {
    block.course_offering_id = fields.course_offering_id;
    block.kind = fields.kind;
    block.group_label = fields.group_label.clone();
    block.start_date = fields.start_date;
    block.end_date = fields.end_date;
    block.repeat_policy = fields.repeat_policy;
    block.repeat_weeks = fields.repeat_weeks;
}

fn reject_conflicts(conflicts: Vec<ConflictRecord>, operation: &str) -> RepositoryError {
    warn!(
        "{} rejected: {} conflicting slot(s), first: {}",
        operation,
        conflicts.len(),
        conflicts
            .first()
            .map(ToString::to_string)
            .unwrap_or_default()
    );
    RepositoryError::schedule_conflict(conflicts).with_operation(operation)
}

impl LocalRepository {
    /// Create an empty repository with the default slot catalog and no offerings.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData::default())),
        }
    }

    /// Create a repository seeded with the given offerings.
    pub fn with_offerings(offerings: impl IntoIterator<Item = CourseOffering>) -> Self {
        let repo = Self::new();
        for offering in offerings {
            repo.insert_offering(offering);
        }
        repo
    }

    /// Add or replace a course offering.
    pub fn insert_offering(&self, offering: CourseOffering) {
        self.data.write().offerings.insert(offering.id, offering);
    }

    /// Replace the slot catalog used for `slot_ref_id` resolution.
    pub fn set_slot_catalog(&self, slots: Vec<SlotDefinition>) {
        self.data.write().slots = slots;
    }

    /// Set the health status for testing connection failures.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Remove all blocks, keeping offerings and the slot catalog.
    pub fn clear(&self) {
        let mut data = self.data.write();
        data.blocks.clear();
        data.next_block_id = 1;
        data.next_day_id = 1;
        data.next_slot_id = 1;
    }

    /// Number of stored blocks.
    pub fn block_count(&self) -> usize {
        self.data.read().blocks.len()
    }

    /// Number of stored day rows across all blocks.
    pub fn day_count(&self) -> usize {
        self.data.read().blocks.values().map(|b| b.days.len()).sum()
    }

    /// Number of stored slot rows across all blocks.
    pub fn slot_count(&self) -> usize {
        self.data
            .read()
            .blocks
            .values()
            .map(ScheduleBlock::periods_per_week)
            .sum()
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ScheduleRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().is_healthy)
    }

    async fn list_blocks(&self, query: &BlockQuery) -> RepositoryResult<Page<ScheduleBlock>> {
        let data = self.data.read();
        data.ensure_healthy()?;

        let matching: Vec<&ScheduleBlock> = data
            .blocks
            .values()
            .rev()
            .filter(|b| query.offering_id.map_or(true, |id| b.course_offering_id == id))
            .filter(|b| query.kind.map_or(true, |kind| b.kind == kind))
            .collect();

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(usize::try_from(query.offset()).unwrap_or(usize::MAX))
            .take(query.limit as usize)
            .cloned()
            .collect();
        Ok(Page::new(items, total, query.page, query.limit))
    }

    async fn get_block(&self, block_id: BlockId) -> RepositoryResult<ScheduleBlock> {
        let data = self.data.read();
        data.ensure_healthy()?;
        data.block(block_id, "get_block").cloned()
    }

    async fn find_conflicts(
        &self,
        offering_id: OfferingId,
        days: &[DayPlan],
        ignore_block_id: Option<BlockId>,
    ) -> RepositoryResult<Vec<ConflictRecord>> {
        let data = self.data.read();
        data.ensure_healthy()?;
        let offering = data.offering(offering_id, "find_conflicts")?;
        Ok(data.conflicts(&offering, days, ignore_block_id))
    }

    async fn create_block(&self, draft: &BlockDraft) -> RepositoryResult<ScheduleBlock> {
        let mut data = self.data.write();
        data.ensure_healthy()?;

        let offering = data.offering(draft.fields.course_offering_id, "create_block")?;
        let conflicts = data.conflicts(&offering, &draft.days, None);
        if !conflicts.is_empty() {
            return Err(reject_conflicts(conflicts, "create_block"));
        }

        let id = BlockId::new(data.next_block_id);
        data.next_block_id += 1;
        let days = data.materialize_days(&draft.days);
        let now = Utc::now();
        let fields = draft.fields.clone();
        let block = ScheduleBlock {
            id,
            course_offering_id: fields.course_offering_id,
            kind: fields.kind,
            group_label: fields.group_label,
            start_date: fields.start_date,
            end_date: fields.end_date,
            repeat_policy: fields.repeat_policy,
            repeat_weeks: fields.repeat_weeks,
            days,
            created_at: now,
            updated_at: now,
        };
        data.blocks.insert(id, block.clone());

        info!(
            "Created schedule block {} for offering {} ({} day(s), {} slot(s))",
            id,
            block.course_offering_id,
            block.days.len(),
            block.periods_per_week()
        );
        Ok(block)
    }

    async fn update_block(
        &self,
        block_id: BlockId,
        patch: &UpdateBlockRequest,
    ) -> RepositoryResult<ScheduleBlock> {
        let mut data = self.data.write();
        data.ensure_healthy()?;

        let existing = data.block(block_id, "update_block")?;
        let current_offering = existing.course_offering_id;
        let update = merge_patch(existing, patch)?;

        let offering_changed = current_offering != update.fields.course_offering_id;
        if offering_changed || update.days.is_some() {
            let offering = data.offering(update.fields.course_offering_id, "update_block")?;
            if let Some(days) = &update.days {
                let conflicts = data.conflicts(&offering, days, Some(block_id));
                if !conflicts.is_empty() {
                    return Err(reject_conflicts(conflicts, "update_block"));
                }
            }
        }

        let new_days = update
            .days
            .as_deref()
            .map(|plans| data.materialize_days(plans));
        let block = data
            .blocks
            .get_mut(&block_id)
            .ok_or_else(|| RepositoryError::internal(format!("Block {} vanished under lock", block_id)))?;
        apply_fields(block, &update.fields);
        if let Some(days) = new_days {
            block.days = days;
        }
        block.updated_at = Utc::now();

        info!(
            "Updated schedule block {} ({})",
            block_id,
            if update.days.is_some() {
                "fields and days"
            } else {
                "fields only"
            }
        );
        Ok(block.clone())
    }

    async fn delete_block(&self, block_id: BlockId) -> RepositoryResult<()> {
        let mut data = self.data.write();
        data.ensure_healthy()?;
        data.block(block_id, "delete_block")?;
        data.blocks.remove(&block_id);
        info!("Deleted schedule block {}", block_id);
        Ok(())
    }
}

#[async_trait]
impl CatalogRepository for LocalRepository {
    async fn get_offering(&self, offering_id: OfferingId) -> RepositoryResult<CourseOffering> {
        let data = self.data.read();
        data.ensure_healthy()?;
        data.offering(offering_id, "get_offering")
    }

    async fn list_slots(&self) -> RepositoryResult<Vec<SlotDefinition>> {
        let data = self.data.read();
        data.ensure_healthy()?;
        let mut slots = data.slots.clone();
        slots.sort_by_key(|s| s.slot_number);
        Ok(slots)
    }
}
