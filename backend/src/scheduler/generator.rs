//! Auto-generation of a weekly day/slot allocation from coarse load parameters.
//!
//! The planner turns `credits × periods_per_credit` spread over `weeks` into a
//! concrete list of [`DayPlan`]s. It is pure: the caller runs conflict detection and
//! persistence on the result.

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::error::{FieldError, ScheduleError, ScheduleResult};
use crate::api::AutoGenerateRequest;
use crate::models::{CourseOffering, DayPlan, SlotDefinition, SlotNumber, Weekday};

/// Fallbacks used when a request leaves a parameter unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannerDefaults {
    pub periods_per_credit: u32,
    /// Raw weekday numbers, normalized exactly like request weekdays
    pub weekdays: Vec<i64>,
    /// How many leading catalog slots to prefer when the request names none
    pub preferred_slot_count: usize,
}

impl Default for PlannerDefaults {
    fn default() -> Self {
        Self {
            periods_per_credit: 15,
            weekdays: vec![1, 2, 3, 4, 5],
            preferred_slot_count: 5,
        }
    }
}

/// What was asked for and what was placed, per week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationSummary {
    pub requested_total_periods: u32,
    pub weeks: u32,
    pub periods_per_week: u32,
    /// Slots actually placed per week; lower than `periods_per_week` only on under-allocation
    pub allocated_periods_per_week: u32,
}

/// A complete allocation ready for conflict detection and commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationPlan {
    pub days: Vec<DayPlan>,
    pub summary: AllocationSummary,
}

fn positive_u32(raw: i64, field: &str, errors: &mut Vec<FieldError>) -> Option<u32> {
    match u32::try_from(raw) {
        Ok(v) if v > 0 => Some(v),
        _ => {
            errors.push(FieldError::new(
                field,
                format!("must be a positive integer, got {}", raw),
            ));
            None
        }
    }
}

/// Credits from the request, else from the offering.
pub fn resolve_credits(explicit: Option<u32>, offering: &CourseOffering) -> ScheduleResult<u32> {
    explicit
        .or(offering.credits)
        .filter(|c| *c > 0)
        .ok_or_else(|| {
            ScheduleError::validation(
                "credits",
                format!(
                    "no positive credit value given and offering {} has none",
                    offering.id
                ),
            )
        })
}

/// Drops out-of-range and repeated weekdays and sorts the rest ascending.
pub fn normalize_weekdays(raw: &[i64]) -> Vec<Weekday> {
    let mut weekdays: Vec<Weekday> = raw.iter().filter_map(|&w| Weekday::new(w)).collect();
    weekdays.sort();
    weekdays.dedup();
    weekdays
}

/// Keeps preferred slots present in the catalog, in request order, first occurrence wins.
///
/// An empty result falls back to the first `fallback_count` catalog slots.
pub fn normalize_preferred_slots(
    raw: &[i64],
    catalog: &[SlotNumber],
    fallback_count: usize,
) -> Vec<SlotNumber> {
    let mut seen = HashSet::new();
    let preferred: Vec<SlotNumber> = raw
        .iter()
        .filter_map(|&s| SlotNumber::new(s))
        .filter(|s| catalog.contains(s) && seen.insert(*s))
        .collect();

    if preferred.is_empty() {
        catalog.iter().take(fallback_count).copied().collect()
    } else {
        preferred
    }
}

/// Splits `periods_per_week` over `weekdays` as evenly as possible.
///
/// The first `periods_per_week % n` weekdays get one extra period. Weekdays left with
/// zero periods are omitted.
pub fn distribute(periods_per_week: u32, weekdays: &[Weekday]) -> Vec<(Weekday, u32)> {
    if weekdays.is_empty() {
        return Vec::new();
    }
    let n = weekdays.len() as u32;
    let base = periods_per_week / n;
    let remainder = (periods_per_week % n) as usize;

    weekdays
        .iter()
        .enumerate()
        .map(|(i, w)| (*w, if i < remainder { base + 1 } else { base }))
        .filter(|(_, k)| *k > 0)
        .collect()
}

/// Picks `count` distinct slots: preferred ones first, in order, then the catalog ascending.
pub fn pick_slots(count: usize, preferred: &[SlotNumber], catalog: &[SlotNumber]) -> Vec<SlotNumber> {
    let mut chosen: Vec<SlotNumber> = Vec::with_capacity(count);
    for slot in preferred.iter().chain(catalog.iter()) {
        if chosen.len() == count {
            break;
        }
        if !chosen.contains(slot) {
            chosen.push(*slot);
        }
    }
    chosen
}

/// Plans the weekly allocation for an auto-generate request.
///
/// Fails with `Validation` on bad parameters, `Capacity` when the weekly load exceeds
/// every slot of every weekday, and `Build` if a day cannot be filled.
pub fn plan_allocation(
    req: &AutoGenerateRequest,
    offering: &CourseOffering,
    catalog: &[SlotDefinition],
    defaults: &PlannerDefaults,
) -> ScheduleResult<AllocationPlan> {
    let mut errors = Vec::new();
    let weeks = positive_u32(req.weeks, "weeks", &mut errors);
    let explicit_credits = req
        .credits
        .and_then(|c| positive_u32(c, "credits", &mut errors));
    let periods_per_credit = match req.periods_per_credit {
        Some(raw) => positive_u32(raw, "periods_per_credit", &mut errors),
        None => Some(defaults.periods_per_credit),
    };

    let weekday_source = if req.weekdays.is_empty() {
        &defaults.weekdays
    } else {
        &req.weekdays
    };
    let weekdays = normalize_weekdays(weekday_source);
    if weekdays.is_empty() {
        errors.push(FieldError::new(
            "weekdays",
            "no weekday in 1..7 remains after filtering",
        ));
    }

    if !errors.is_empty() {
        return Err(ScheduleError::Validation(errors));
    }
    let (weeks, periods_per_credit) = match (weeks, periods_per_credit) {
        (Some(w), Some(p)) => (w, p),
        _ => return Err(ScheduleError::Build("parameter validation inconsistent".into())),
    };

    let credits = resolve_credits(explicit_credits, offering)?;
    let total_periods = credits.checked_mul(periods_per_credit).ok_or_else(|| {
        ScheduleError::validation(
            "periods_per_credit",
            format!("{} credits × {} periods overflows", credits, periods_per_credit),
        )
    })?;

    let mut all_slots: Vec<SlotNumber> = catalog.iter().map(|s| s.slot_number).collect();
    all_slots.sort();
    all_slots.dedup();
    let preferred = normalize_preferred_slots(
        &req.preferred_slots,
        &all_slots,
        defaults.preferred_slot_count,
    );

    let periods_per_week = total_periods.div_ceil(weeks);
    let available = (weekdays.len() * all_slots.len()) as u32;
    if periods_per_week > available {
        return Err(ScheduleError::Capacity {
            required: periods_per_week,
            available,
        });
    }

    let mut days = Vec::new();
    for (weekday, count) in distribute(periods_per_week, &weekdays) {
        let slots = pick_slots(count as usize, &preferred, &all_slots);
        if slots.len() < count as usize {
            return Err(ScheduleError::Build(format!(
                "weekday {} needs {} slots but only {} could be placed",
                weekday,
                count,
                slots.len()
            )));
        }
        days.push(DayPlan::new(weekday, slots));
    }
    if days.is_empty() {
        return Err(ScheduleError::Build("allocation produced no days".into()));
    }

    let allocated: usize = days.iter().map(|d| d.slots.len()).sum();
    let summary = AllocationSummary {
        requested_total_periods: total_periods,
        weeks,
        periods_per_week,
        allocated_periods_per_week: allocated as u32,
    };
    debug!(
        "Planned offering {}: {} periods over {} weeks -> {}/week on {} day(s)",
        offering.id,
        total_periods,
        weeks,
        periods_per_week,
        days.len()
    );

    Ok(AllocationPlan { days, summary })
}
