//! Atomicity and concurrency of the in-memory repository.

mod support;

use std::sync::Arc;

use course_schedule::api::{AutoGenerateRequest, CreateBlockRequest, DaySpec};
use course_schedule::db::repository::{CatalogRepository, RepositoryError, ScheduleRepository};
use course_schedule::db::BlockQuery;
use course_schedule::models::{
    BlockDraft, BlockFields, DayPlan, OfferingId, RepeatPolicy, ScheduleKind, SlotNumber, Weekday,
};
use course_schedule::services::ScheduleService;

fn draft(offering: i64, weekday: i64, slots: &[i64]) -> BlockDraft {
    BlockDraft {
        fields: BlockFields {
            course_offering_id: OfferingId::new(offering),
            kind: ScheduleKind::Study,
            group_label: None,
            start_date: None,
            end_date: None,
            repeat_policy: RepeatPolicy::Weekly,
            repeat_weeks: None,
        },
        days: vec![DayPlan::new(
            Weekday::new(weekday).unwrap(),
            slots.iter().map(|&s| SlotNumber::new(s).unwrap()).collect(),
        )],
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_creates_for_shared_teacher_commit_once() {
    let repo = support::seeded_repository();

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let repo = Arc::clone(&repo);
            // Offerings 1 and 2 share teacher 10.
            let offering = if i % 2 == 0 { 1 } else { 2 };
            tokio::spawn(async move { repo.create_block(&draft(offering, 3, &[4])).await })
        })
        .collect();

    let mut created = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(RepositoryError::ScheduleConflict { conflicts: list, .. }) => {
                assert_eq!(list.len(), 1);
                conflicts += 1;
            }
            Err(other) => panic!("unexpected error: {}", other),
        }
    }
    assert_eq!(created, 1);
    assert_eq!(conflicts, 15);
    assert_eq!(repo.block_count(), 1);
    assert_eq!(repo.slot_count(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_auto_generation_never_overlaps() {
    let repo = support::seeded_repository();
    let svc = ScheduleService::new(repo.clone());

    let handles: Vec<_> = [1_i64, 2, 1, 2, 1, 2]
        .into_iter()
        .map(|offering| {
            let svc = svc.clone();
            tokio::spawn(async move {
                let mut req = AutoGenerateRequest::new(offering, 1);
                req.credits = Some(1);
                req.periods_per_credit = Some(5);
                req.weekdays = vec![1];
                svc.auto_generate(&req).await
            })
        })
        .collect();

    let mut successes = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            successes += 1;
        }
    }
    // Offerings 1 and 2 share teacher 10 and all requests want Monday slots 1..5.
    assert_eq!(successes, 1);

    let query = BlockQuery {
        offering_id: None,
        kind: None,
        page: 1,
        limit: 20,
    };
    let page = repo.list_blocks(&query).await.unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].periods_per_week(), 5);
}

#[tokio::test]
async fn test_independent_resources_all_commit() {
    let repo = support::seeded_repository();
    repo.create_block(&draft(1, 1, &[1, 2])).await.unwrap();
    repo.create_block(&draft(4, 1, &[1, 2])).await.unwrap();
    repo.create_block(&draft(5, 1, &[1, 2])).await.unwrap();
    assert_eq!(repo.block_count(), 3);
    assert_eq!(repo.slot_count(), 6);
}

#[tokio::test]
async fn test_unhealthy_repository_rejects_reads_and_writes() {
    let repo = support::seeded_repository();
    repo.set_healthy(false);

    assert!(!repo.health_check().await.unwrap());
    assert!(repo.list_slots().await.is_err());
    let err = repo.create_block(&draft(1, 1, &[1])).await.unwrap_err();
    assert!(matches!(err, RepositoryError::ConnectionError { .. }));
    assert_eq!(repo.block_count(), 0);

    repo.set_healthy(true);
    repo.create_block(&draft(1, 1, &[1])).await.unwrap();
}

#[tokio::test]
async fn test_missing_catalog_entry_leaves_slot_ref_empty() {
    let repo = support::seeded_repository();
    let mut catalog = course_schedule::models::default_slot_catalog();
    catalog.retain(|s| s.slot_number.value() != 13);
    repo.set_slot_catalog(catalog);

    let svc = ScheduleService::new(repo.clone());
    let block = svc
        .create_block(&CreateBlockRequest::new(1, vec![DaySpec::new(1, vec![12, 13])]))
        .await
        .unwrap();
    let refs: Vec<Option<i64>> = block.days[0].slots.iter().map(|s| s.slot_ref_id).collect();
    assert_eq!(refs, vec![Some(12), None]);
}

#[tokio::test]
async fn test_clear_resets_rows_but_keeps_offerings() {
    let repo = support::seeded_repository();
    repo.create_block(&draft(1, 1, &[1])).await.unwrap();
    repo.clear();
    assert_eq!(repo.block_count(), 0);
    assert!(repo.get_offering(OfferingId::new(1)).await.is_ok());
}
