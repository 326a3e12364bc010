//! Schedule block orchestration.
//!
//! Every operation is one validate → detect → commit-or-abort pipeline. Validation
//! and planning are pure (`crate::scheduler`); the repository owns the atomic
//! re-check and write.

use std::sync::Arc;

use log::{debug, info};

use crate::api::{
    AutoGenerateOutcome, AutoGenerateRequest, ConflictCheckRequest, ConflictCheckResponse,
    CreateBlockRequest, DaySpec, DeleteBlockResponse, ListBlocksQuery, UpdateBlockRequest,
    WeekdayInfo,
};
use crate::db::models::{BlockQuery, Page};
use crate::db::repo_config::SchedulingSettings;
use crate::db::repository::FullRepository;
use crate::models::{
    BlockId, ConflictRecord, DayPlan, OfferingId, RepeatPolicy, ScheduleBlock, SlotDefinition,
    Weekday,
};
use crate::scheduler::validation::check_offering_id;
use crate::scheduler::{
    check_days, plan_allocation, validate_create, FieldError, ScheduleError, ScheduleResult,
};

/// Schedule operations over any [`FullRepository`].
#[derive(Clone)]
pub struct ScheduleService {
    repository: Arc<dyn FullRepository>,
    settings: SchedulingSettings,
}

impl ScheduleService {
    pub fn new(repository: Arc<dyn FullRepository>) -> Self {
        Self::with_settings(repository, SchedulingSettings::default())
    }

    pub fn with_settings(repository: Arc<dyn FullRepository>, settings: SchedulingSettings) -> Self {
        Self {
            repository,
            settings,
        }
    }

    pub fn repository(&self) -> &Arc<dyn FullRepository> {
        &self.repository
    }

    pub fn settings(&self) -> &SchedulingSettings {
        &self.settings
    }

    /// `true` when the storage backend answers.
    pub async fn health_check(&self) -> ScheduleResult<bool> {
        Ok(self.repository.health_check().await?)
    }

    /// Paginated block listing, newest first. Paging input is clamped, never rejected.
    pub async fn list_blocks(&self, query: &ListBlocksQuery) -> ScheduleResult<Page<ScheduleBlock>> {
        let offering_id = match query.offering_id {
            Some(raw) => {
                let mut errors = Vec::new();
                let id = check_offering_id(raw, "offering_id", &mut errors);
                if !errors.is_empty() {
                    return Err(ScheduleError::Validation(errors));
                }
                Some(id)
            }
            None => None,
        };
        let (page, limit) = self.settings.clamp_paging(query.page, query.limit);
        let block_query = BlockQuery {
            offering_id,
            kind: query.kind,
            page,
            limit,
        };
        Ok(self.repository.list_blocks(&block_query).await?)
    }

    pub async fn get_block(&self, block_id: BlockId) -> ScheduleResult<ScheduleBlock> {
        Ok(self.repository.get_block(block_id).await?)
    }

    /// Read-only conflict detection for already validated days.
    pub async fn detect_conflicts(
        &self,
        offering_id: OfferingId,
        days: &[DayPlan],
        ignore_block_id: Option<BlockId>,
    ) -> ScheduleResult<Vec<ConflictRecord>> {
        let conflicts = self
            .repository
            .find_conflicts(offering_id, days, ignore_block_id)
            .await?;
        debug!(
            "Offering {} has {} conflicting slot(s) across {} proposed day(s)",
            offering_id,
            conflicts.len(),
            days.len()
        );
        Ok(conflicts)
    }

    /// Validates a proposed day list and reports its conflicts without writing.
    pub async fn check_conflicts(
        &self,
        req: &ConflictCheckRequest,
    ) -> ScheduleResult<ConflictCheckResponse> {
        let mut errors = Vec::new();
        let offering_id = check_offering_id(req.course_offering_id, "course_offering_id", &mut errors);
        let ignore = req.ignore_block_id.map(|raw| {
            if raw < 1 {
                errors.push(FieldError::new("ignore_block_id", "must be a positive integer"));
            }
            BlockId::new(raw)
        });
        let days = check_days(&req.days, &mut errors);
        if !errors.is_empty() {
            return Err(ScheduleError::Validation(errors));
        }

        let conflicts = self.detect_conflicts(offering_id, &days, ignore).await?;
        Ok(ConflictCheckResponse { conflicts })
    }

    /// Manual create. Conflicts abort the write with the full conflict list.
    pub async fn create_block(&self, req: &CreateBlockRequest) -> ScheduleResult<ScheduleBlock> {
        let draft = validate_create(req)?;
        let block = self.repository.create_block(&draft).await?;
        info!(
            "Created schedule block {} for offering {} ({} periods/week)",
            block.id,
            block.course_offering_id,
            block.periods_per_week()
        );
        Ok(block)
    }

    /// Partial update. Supplied `days` replace the hierarchy and are re-checked for
    /// conflicts against everything but this block. The merge onto the stored block
    /// happens inside the repository's write unit.
    pub async fn update_block(
        &self,
        block_id: BlockId,
        req: &UpdateBlockRequest,
    ) -> ScheduleResult<ScheduleBlock> {
        let block = self.repository.update_block(block_id, req).await?;
        info!(
            "Updated schedule block {} (days replaced: {})",
            block.id,
            req.days.is_some()
        );
        Ok(block)
    }

    /// Cascading delete. A second delete of the same id is NotFound.
    pub async fn delete_block(&self, block_id: BlockId) -> ScheduleResult<DeleteBlockResponse> {
        self.repository.delete_block(block_id).await?;
        info!("Deleted schedule block {}", block_id);
        Ok(DeleteBlockResponse {
            deleted_block_id: block_id,
        })
    }

    /// Plans days from coarse load parameters, then creates the block as `custom_weeks`
    /// repeating for `weeks`. Nothing is written when planning or detection fails.
    pub async fn auto_generate(&self, req: &AutoGenerateRequest) -> ScheduleResult<AutoGenerateOutcome> {
        let mut errors = Vec::new();
        let offering_id = check_offering_id(req.course_offering_id, "course_offering_id", &mut errors);
        if !errors.is_empty() {
            return Err(ScheduleError::Validation(errors));
        }

        let offering = self.repository.get_offering(offering_id).await?;
        let catalog = self.repository.list_slots().await?;
        let plan = plan_allocation(req, &offering, &catalog, &self.settings.planner_defaults())?;

        let conflicts = self.detect_conflicts(offering_id, &plan.days, None).await?;
        if !conflicts.is_empty() {
            return Err(ScheduleError::Conflict(conflicts));
        }

        let create = CreateBlockRequest {
            course_offering_id: req.course_offering_id,
            kind: req.kind,
            group_label: req.group_label.clone(),
            start_date: req.start_date,
            end_date: req.end_date,
            repeat_policy: RepeatPolicy::CustomWeeks,
            repeat_weeks: Some(i64::from(plan.summary.weeks)),
            days: plan.days.iter().map(DaySpec::from).collect(),
        };
        let block = self.create_block(&create).await?;

        Ok(AutoGenerateOutcome {
            block,
            summary: plan.summary,
        })
    }

    /// The slot catalog ordered by slot number.
    pub async fn list_slots(&self) -> ScheduleResult<Vec<SlotDefinition>> {
        Ok(self.repository.list_slots().await?)
    }

    /// The fixed weekday catalog, Monday first.
    pub fn weekdays(&self) -> Vec<WeekdayInfo> {
        Weekday::all().map(WeekdayInfo::from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::LocalRepository;
    use crate::models::{CourseOffering, ScheduleKind};

    fn service() -> ScheduleService {
        let repo = LocalRepository::with_offerings([
            CourseOffering::new(1).with_teacher(10).with_room(100).with_credits(3),
            CourseOffering::new(2).with_teacher(10).with_room(200),
            CourseOffering::new(3).with_teacher(30).with_room(300),
        ]);
        ScheduleService::new(Arc::new(repo))
    }

    #[tokio::test]
    async fn test_list_rejects_non_positive_offering_filter() {
        let svc = service();
        let query = ListBlocksQuery {
            offering_id: Some(0),
            ..Default::default()
        };
        let err = svc.list_blocks(&query).await.unwrap_err();
        assert_eq!(err.code(), "ValidationError");
    }

    #[tokio::test]
    async fn test_list_clamps_paging() {
        let svc = service();
        let query = ListBlocksQuery {
            page: Some(-1),
            limit: Some(5000),
            ..Default::default()
        };
        let page = svc.list_blocks(&query).await.unwrap();
        assert_eq!(page.page, 1);
        assert_eq!(page.limit, 100);
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn test_check_conflicts_is_read_only() {
        let svc = service();
        svc.create_block(&CreateBlockRequest::new(1, vec![DaySpec::new(2, vec![3])]))
            .await
            .unwrap();

        let req = ConflictCheckRequest {
            course_offering_id: 2,
            days: vec![DaySpec::new(2, vec![3, 4])],
            ignore_block_id: None,
        };
        let response = svc.check_conflicts(&req).await.unwrap();
        assert_eq!(response.conflicts.len(), 1);
        assert_eq!(svc.list_blocks(&ListBlocksQuery::default()).await.unwrap().total, 1);
    }

    #[tokio::test]
    async fn test_check_conflicts_unknown_offering_is_not_found() {
        let svc = service();
        let req = ConflictCheckRequest {
            course_offering_id: 99,
            days: vec![DaySpec::new(1, vec![1])],
            ignore_block_id: None,
        };
        match svc.check_conflicts(&req).await.unwrap_err() {
            ScheduleError::NotFound { entity, id } => {
                assert_eq!(entity, "CourseOffering");
                assert_eq!(id, "99");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_check_conflicts_validates_days() {
        let svc = service();
        let req = ConflictCheckRequest {
            course_offering_id: 1,
            days: vec![DaySpec::new(9, vec![14])],
            ignore_block_id: None,
        };
        match svc.check_conflicts(&req).await.unwrap_err() {
            ScheduleError::Validation(errors) => assert_eq!(errors.len(), 1),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_auto_generate_uses_offering_credits() {
        let svc = service();
        let outcome = svc.auto_generate(&AutoGenerateRequest::new(1, 8)).await.unwrap();
        assert_eq!(outcome.summary.requested_total_periods, 45);
        assert_eq!(outcome.summary.periods_per_week, 6);
        assert_eq!(outcome.summary.allocated_periods_per_week, 6);
        assert_eq!(outcome.block.repeat_policy, RepeatPolicy::CustomWeeks);
        assert_eq!(outcome.block.repeat_weeks, Some(8));
        assert_eq!(outcome.block.kind, ScheduleKind::Study);
    }

    #[tokio::test]
    async fn test_auto_generate_without_credits_is_rejected() {
        let svc = service();
        let err = svc.auto_generate(&AutoGenerateRequest::new(3, 8)).await.unwrap_err();
        assert_eq!(err.code(), "ValidationError");
    }

    #[tokio::test]
    async fn test_auto_generate_unknown_offering() {
        let svc = service();
        let err = svc.auto_generate(&AutoGenerateRequest::new(99, 8)).await.unwrap_err();
        assert_eq!(err.code(), "NotFound");
    }

    #[test]
    fn test_weekdays_catalog() {
        let weekdays = service().weekdays();
        assert_eq!(weekdays.len(), 7);
        assert_eq!(weekdays[0].weekday.value(), 1);
    }
}
