//! Input validation for manual block writes.
//!
//! Every check appends to a shared error list so a rejected request reports all of
//! its problems at once. Nothing here touches storage: offering existence is checked
//! by the repository inside the write.

use std::collections::HashSet;

use super::error::{FieldError, ScheduleError, ScheduleResult};
use crate::api::{CreateBlockRequest, DaySpec, UpdateBlockRequest};
use crate::models::{
    BlockDraft, BlockFields, BlockUpdate, DayPlan, OfferingId, RepeatPolicy, ScheduleBlock,
    SlotNumber, Weekday, SLOT_COUNT, WEEKDAY_COUNT,
};

fn finish<T>(value: T, errors: Vec<FieldError>) -> ScheduleResult<T> {
    if errors.is_empty() {
        Ok(value)
    } else {
        Err(ScheduleError::Validation(errors))
    }
}

/// Validates a positive id, recording an error under `field` otherwise.
pub fn check_offering_id(raw: i64, field: &str, errors: &mut Vec<FieldError>) -> OfferingId {
    if raw < 1 {
        errors.push(FieldError::new(field, "must be a positive integer"));
    }
    OfferingId::new(raw)
}

/// Validates a day list: weekdays in range and unique, slots in range and unique per day.
///
/// Returns the plans that passed; callers must consult `errors` before using them.
pub fn check_days(days: &[DaySpec], errors: &mut Vec<FieldError>) -> Vec<DayPlan> {
    let mut plans = Vec::with_capacity(days.len());
    let mut seen_weekdays = HashSet::new();

    for (i, day) in days.iter().enumerate() {
        let weekday = match Weekday::new(day.weekday) {
            Some(w) => w,
            None => {
                errors.push(FieldError::new(
                    format!("days[{}].weekday", i),
                    format!("weekday must be 1..{}, got {}", WEEKDAY_COUNT, day.weekday),
                ));
                continue;
            }
        };
        if !seen_weekdays.insert(weekday) {
            errors.push(FieldError::new(
                format!("days[{}].weekday", i),
                format!("duplicate weekday {}", weekday),
            ));
        }

        let mut seen_slots = HashSet::new();
        let mut slots = Vec::with_capacity(day.slots.len());
        for (j, &raw) in day.slots.iter().enumerate() {
            match SlotNumber::new(raw) {
                Some(slot) if seen_slots.insert(slot) => slots.push(slot),
                Some(slot) => errors.push(FieldError::new(
                    format!("days[{}].slots[{}]", i, j),
                    format!("duplicate slot {} in one day", slot),
                )),
                None => errors.push(FieldError::new(
                    format!("days[{}].slots[{}]", i, j),
                    format!("slot must be 1..{}, got {}", SLOT_COUNT, raw),
                )),
            }
        }
        plans.push(DayPlan::new(weekday, slots));
    }
    plans
}

/// Enforces `repeat_weeks` present and positive iff the policy is `custom_weeks`.
fn check_repeat(
    policy: RepeatPolicy,
    repeat_weeks: Option<i64>,
    errors: &mut Vec<FieldError>,
) -> Option<u32> {
    match (policy, repeat_weeks) {
        (RepeatPolicy::CustomWeeks, None) => {
            errors.push(FieldError::new(
                "repeat_weeks",
                "required when repeat_policy is custom_weeks",
            ));
            None
        }
        (RepeatPolicy::CustomWeeks, Some(weeks)) => match u32::try_from(weeks) {
            Ok(w) if w > 0 => Some(w),
            _ => {
                errors.push(FieldError::new(
                    "repeat_weeks",
                    format!("must be a positive integer, got {}", weeks),
                ));
                None
            }
        },
        (_, Some(_)) => {
            errors.push(FieldError::new(
                "repeat_weeks",
                format!("must be null when repeat_policy is {}", policy),
            ));
            None
        }
        (_, None) => None,
    }
}

fn check_dates(fields: &BlockFields, errors: &mut Vec<FieldError>) {
    if let (Some(start), Some(end)) = (fields.start_date, fields.end_date) {
        if start > end {
            errors.push(FieldError::new(
                "start_date",
                format!("start_date {} is after end_date {}", start, end),
            ));
        }
    }
}

/// Validates a manual create request.
pub fn validate_create(req: &CreateBlockRequest) -> ScheduleResult<BlockDraft> {
    let mut errors = Vec::new();

    let course_offering_id = check_offering_id(req.course_offering_id, "course_offering_id", &mut errors);
    let repeat_weeks = check_repeat(req.repeat_policy, req.repeat_weeks, &mut errors);
    let fields = BlockFields {
        course_offering_id,
        kind: req.kind,
        group_label: req.group_label.clone(),
        start_date: req.start_date,
        end_date: req.end_date,
        repeat_policy: req.repeat_policy,
        repeat_weeks,
    };
    check_dates(&fields, &mut errors);

    if req.days.is_empty() {
        errors.push(FieldError::new("days", "at least one day is required"));
    }
    let days = check_days(&req.days, &mut errors);

    finish(BlockDraft { fields, days }, errors)
}

/// Merges a partial update onto `existing` and validates the merged state.
///
/// Switching `repeat_policy` away from `custom_weeks` without mentioning
/// `repeat_weeks` clears the stored week count.
pub fn apply_update(existing: &ScheduleBlock, req: &UpdateBlockRequest) -> ScheduleResult<BlockUpdate> {
    let mut errors = Vec::new();

    let course_offering_id = match req.course_offering_id {
        Some(raw) => check_offering_id(raw, "course_offering_id", &mut errors),
        None => existing.course_offering_id,
    };
    let repeat_policy = req.repeat_policy.unwrap_or(existing.repeat_policy);
    let requested_weeks = match req.repeat_weeks {
        Some(explicit) => explicit,
        None if repeat_policy == RepeatPolicy::CustomWeeks => existing.repeat_weeks.map(i64::from),
        None => None,
    };
    let repeat_weeks = check_repeat(repeat_policy, requested_weeks, &mut errors);

    let fields = BlockFields {
        course_offering_id,
        kind: req.kind.unwrap_or(existing.kind),
        group_label: req
            .group_label
            .clone()
            .unwrap_or_else(|| existing.group_label.clone()),
        start_date: req.start_date.unwrap_or(existing.start_date),
        end_date: req.end_date.unwrap_or(existing.end_date),
        repeat_policy,
        repeat_weeks,
    };
    check_dates(&fields, &mut errors);

    let days = req.days.as_deref().map(|days| check_days(days, &mut errors));

    finish(BlockUpdate { fields, days }, errors)
}
