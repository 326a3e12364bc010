//! Public API surface for the schedule engine.
//!
//! Request and response types shared by the service layer and the HTTP layer.
//! Requests carry raw integers so that out-of-range values reach the validator and
//! come back as field-level errors instead of opaque deserialization failures.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

pub use crate::db::models::Page;
pub use crate::models::{
    BlockId, ConflictRecord, CourseOffering, DayPlan, OfferingId, RepeatPolicy, ScheduleBlock,
    ScheduleDay, ScheduleKind, ScheduleSlot, SlotDefinition, SlotNumber, Weekday,
};
pub use crate::scheduler::error::FieldError;
pub use crate::scheduler::generator::AllocationSummary;

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// One proposed weekday and the slot numbers it should occupy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySpec {
    pub weekday: i64,
    #[serde(default)]
    pub slots: Vec<i64>,
}

impl DaySpec {
    pub fn new(weekday: i64, slots: Vec<i64>) -> Self {
        Self { weekday, slots }
    }
}

impl From<&DayPlan> for DaySpec {
    fn from(plan: &DayPlan) -> Self {
        Self {
            weekday: plan.weekday.value() as i64,
            slots: plan.slots.iter().map(|s| s.value() as i64).collect(),
        }
    }
}

/// Request body for creating a block by hand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBlockRequest {
    pub course_offering_id: i64,
    #[serde(default)]
    pub kind: ScheduleKind,
    #[serde(default)]
    pub group_label: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub repeat_policy: RepeatPolicy,
    #[serde(default)]
    pub repeat_weeks: Option<i64>,
    #[serde(default)]
    pub days: Vec<DaySpec>,
}

impl CreateBlockRequest {
    /// A study block repeating weekly with the given days.
    pub fn new(course_offering_id: i64, days: Vec<DaySpec>) -> Self {
        Self {
            course_offering_id,
            kind: ScheduleKind::Study,
            group_label: None,
            start_date: None,
            end_date: None,
            repeat_policy: RepeatPolicy::Weekly,
            repeat_weeks: None,
            days,
        }
    }
}

/// Partial update of a block.
///
/// Absent fields keep their stored value. `group_label`, `start_date`, `end_date` and
/// `repeat_weeks` accept an explicit `null` to clear. `days`, when present, replaces
/// the whole day/slot hierarchy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateBlockRequest {
    #[serde(default)]
    pub course_offering_id: Option<i64>,
    #[serde(default)]
    pub kind: Option<ScheduleKind>,
    #[serde(default, deserialize_with = "double_option")]
    pub group_label: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub start_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    pub end_date: Option<Option<NaiveDate>>,
    #[serde(default)]
    pub repeat_policy: Option<RepeatPolicy>,
    #[serde(default, deserialize_with = "double_option")]
    pub repeat_weeks: Option<Option<i64>>,
    #[serde(default)]
    pub days: Option<Vec<DaySpec>>,
}

/// Request body for generating a block from coarse load parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoGenerateRequest {
    pub course_offering_id: i64,
    pub weeks: i64,
    /// Falls back to the offering's own credit value
    #[serde(default)]
    pub credits: Option<i64>,
    /// Falls back to the configured default (15)
    #[serde(default)]
    pub periods_per_credit: Option<i64>,
    /// Empty means the configured default weekdays
    #[serde(default)]
    pub weekdays: Vec<i64>,
    /// Empty means the first catalog slots
    #[serde(default)]
    pub preferred_slots: Vec<i64>,
    #[serde(default)]
    pub kind: ScheduleKind,
    #[serde(default)]
    pub group_label: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

impl AutoGenerateRequest {
    pub fn new(course_offering_id: i64, weeks: i64) -> Self {
        Self {
            course_offering_id,
            weeks,
            credits: None,
            periods_per_credit: None,
            weekdays: Vec::new(),
            preferred_slots: Vec::new(),
            kind: ScheduleKind::Study,
            group_label: None,
            start_date: None,
            end_date: None,
        }
    }
}

/// Created block plus the allocation summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoGenerateOutcome {
    pub block: ScheduleBlock,
    pub summary: AllocationSummary,
}

/// Dry-run conflict check for a proposed day list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictCheckRequest {
    pub course_offering_id: i64,
    #[serde(default)]
    pub days: Vec<DaySpec>,
    #[serde(default)]
    pub ignore_block_id: Option<i64>,
}

/// Conflict check result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictCheckResponse {
    pub conflicts: Vec<ConflictRecord>,
}

/// Query parameters for listing blocks. Out-of-range paging values are clamped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListBlocksQuery {
    #[serde(default)]
    pub offering_id: Option<i64>,
    #[serde(default)]
    pub kind: Option<ScheduleKind>,
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
}

/// Response for block deletion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteBlockResponse {
    pub deleted_block_id: BlockId,
}

/// Weekday catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeekdayInfo {
    pub weekday: Weekday,
    pub name: String,
    pub short_name: String,
}

impl From<Weekday> for WeekdayInfo {
    fn from(weekday: Weekday) -> Self {
        Self {
            weekday,
            name: weekday.name().to_string(),
            short_name: weekday.short_name().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_request_distinguishes_null_from_absent() {
        let req: UpdateBlockRequest =
            serde_json::from_str(r#"{"group_label": null, "kind": "exam"}"#).unwrap();
        assert_eq!(req.group_label, Some(None));
        assert_eq!(req.start_date, None);
        assert_eq!(req.kind, Some(ScheduleKind::Exam));
        assert!(req.days.is_none());
    }

    #[test]
    fn test_create_request_defaults() {
        let req: CreateBlockRequest = serde_json::from_str(
            r#"{"course_offering_id": 3, "days": [{"weekday": 1, "slots": [1, 2]}]}"#,
        )
        .unwrap();
        assert_eq!(req.kind, ScheduleKind::Study);
        assert_eq!(req.repeat_policy, RepeatPolicy::Once);
        assert_eq!(req.days[0], DaySpec::new(1, vec![1, 2]));
    }

    #[test]
    fn test_auto_request_parses_dates() {
        let req: AutoGenerateRequest = serde_json::from_str(
            r#"{"course_offering_id": 3, "weeks": 8, "start_date": "2025-09-01"}"#,
        )
        .unwrap();
        assert_eq!(req.start_date, NaiveDate::from_ymd_opt(2025, 9, 1));
        assert!(req.weekdays.is_empty());
    }
}
