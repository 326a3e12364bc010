//! Schedule block model.
//!
//! A block is an owned tree: the block embeds its weekdays, and every weekday embeds
//! the numbered slots it occupies. Storage backends may keep relational rows, but
//! everything above the repository sees this tree.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::catalog::{OfferingId, RoomId, SlotNumber, TeacherId, Weekday};
use crate::define_id_type;

define_id_type!(i64, BlockId);
define_id_type!(i64, DayId);
define_id_type!(i64, ScheduleSlotId);

/// What a block is booked for.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleKind {
    #[default]
    Study,
    Exam,
}

impl ScheduleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleKind::Study => "study",
            ScheduleKind::Exam => "exam",
        }
    }
}

impl FromStr for ScheduleKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "study" => Ok(Self::Study),
            "exam" => Ok(Self::Exam),
            other => Err(format!("Unknown schedule kind: {}", other)),
        }
    }
}

impl fmt::Display for ScheduleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a block recurs.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RepeatPolicy {
    /// A single occurrence
    #[default]
    #[serde(rename = "none")]
    Once,
    /// Every week, without an end
    #[serde(rename = "weekly")]
    Weekly,
    /// A bounded number of weeks, given by `repeat_weeks`
    #[serde(rename = "custom_weeks")]
    CustomWeeks,
}

impl RepeatPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepeatPolicy::Once => "none",
            RepeatPolicy::Weekly => "weekly",
            RepeatPolicy::CustomWeeks => "custom_weeks",
        }
    }
}

impl FromStr for RepeatPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::Once),
            "weekly" => Ok(Self::Weekly),
            "custom_weeks" => Ok(Self::CustomWeeks),
            other => Err(format!("Unknown repeat policy: {}", other)),
        }
    }
}

impl fmt::Display for RepeatPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored slot occurrence within a day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSlot {
    pub id: ScheduleSlotId,
    pub slot_number: SlotNumber,
    /// Catalog entry for this slot number, `None` when the catalog has no match
    pub slot_ref_id: Option<i64>,
}

/// A stored weekday occurrence within a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleDay {
    pub id: DayId,
    pub weekday: Weekday,
    pub slots: Vec<ScheduleSlot>,
}

/// One schedule commitment for a course offering, with its nested days and slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleBlock {
    pub id: BlockId,
    pub course_offering_id: OfferingId,
    pub kind: ScheduleKind,
    pub group_label: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub repeat_policy: RepeatPolicy,
    pub repeat_weeks: Option<u32>,
    pub days: Vec<ScheduleDay>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ScheduleBlock {
    /// Every `(weekday, slot)` pair the block occupies.
    pub fn slot_pairs(&self) -> impl Iterator<Item = (Weekday, SlotNumber)> + '_ {
        self.days
            .iter()
            .flat_map(|d| d.slots.iter().map(move |s| (d.weekday, s.slot_number)))
    }

    /// Number of slots booked per week.
    pub fn periods_per_week(&self) -> usize {
        self.days.iter().map(|d| d.slots.len()).sum()
    }

    /// Scalar fields of the block, detached from its identity and hierarchy.
    pub fn fields(&self) -> BlockFields {
        BlockFields {
            course_offering_id: self.course_offering_id,
            kind: self.kind,
            group_label: self.group_label.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
            repeat_policy: self.repeat_policy,
            repeat_weeks: self.repeat_weeks,
        }
    }

    /// The day/slot hierarchy as plain plans, dropping row ids.
    pub fn day_plans(&self) -> Vec<DayPlan> {
        self.days
            .iter()
            .map(|d| DayPlan {
                weekday: d.weekday,
                slots: d.slots.iter().map(|s| s.slot_number).collect(),
            })
            .collect()
    }
}

/// A validated weekday with the slot numbers it should occupy.
///
/// Invariant (enforced by `scheduler::validation`): `slots` holds no duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayPlan {
    pub weekday: Weekday,
    pub slots: Vec<SlotNumber>,
}

impl DayPlan {
    pub fn new(weekday: Weekday, slots: Vec<SlotNumber>) -> Self {
        Self { weekday, slots }
    }
}

/// Validated scalar fields of a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockFields {
    pub course_offering_id: OfferingId,
    pub kind: ScheduleKind,
    pub group_label: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub repeat_policy: RepeatPolicy,
    pub repeat_weeks: Option<u32>,
}

/// A validated block ready to be committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockDraft {
    pub fields: BlockFields,
    pub days: Vec<DayPlan>,
}

/// A validated replacement of a stored block's state.
///
/// `days: None` keeps the stored hierarchy untouched; `Some` replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockUpdate {
    pub fields: BlockFields,
    pub days: Option<Vec<DayPlan>>,
}

/// One colliding `(weekday, slot)` occurrence in an existing block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictRecord {
    pub block_id: BlockId,
    pub offering_id: OfferingId,
    pub teacher_id: Option<TeacherId>,
    pub room_id: Option<RoomId>,
    pub weekday: Weekday,
    pub slot_number: SlotNumber,
}

impl fmt::Display for ConflictRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "block {} (offering {}) at weekday {} slot {}",
            self.block_id, self.offering_id, self.weekday, self.slot_number
        )
    }
}
