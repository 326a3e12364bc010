//! Read-only reference data consumed by the schedule engine.
//!
//! The weekday and slot grids are fixed: seven weekdays numbered 1..=7 starting on
//! Monday, and thirteen numbered teaching periods per day. Course offerings are owned
//! by the course catalog; the engine only reads their teacher, room and credit values.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::define_id_type;

define_id_type!(i64, OfferingId);
define_id_type!(i64, TeacherId);
define_id_type!(i64, RoomId);

/// Number of weekdays in the weekday catalog.
pub const WEEKDAY_COUNT: u8 = 7;

/// Number of numbered time-of-day slots in the slot catalog.
pub const SLOT_COUNT: u8 = 13;

const WEEKDAY_NAMES: [(&str, &str); WEEKDAY_COUNT as usize] = [
    ("Monday", "Mon"),
    ("Tuesday", "Tue"),
    ("Wednesday", "Wed"),
    ("Thursday", "Thu"),
    ("Friday", "Fri"),
    ("Saturday", "Sat"),
    ("Sunday", "Sun"),
];

/// A day of the week, 1 (Monday) through 7 (Sunday).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Weekday(u8);

impl Weekday {
    /// Returns `None` when `value` is outside 1..=7.
    pub fn new(value: i64) -> Option<Self> {
        if (1..=WEEKDAY_COUNT as i64).contains(&value) {
            Some(Weekday(value as u8))
        } else {
            None
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn name(&self) -> &'static str {
        WEEKDAY_NAMES[(self.0 - 1) as usize].0
    }

    pub fn short_name(&self) -> &'static str {
        WEEKDAY_NAMES[(self.0 - 1) as usize].1
    }

    /// All weekdays in ascending order.
    pub fn all() -> impl Iterator<Item = Weekday> {
        (1..=WEEKDAY_COUNT).map(Weekday)
    }
}

impl TryFrom<i64> for Weekday {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Weekday::new(value).ok_or_else(|| format!("weekday must be 1..{}, got {}", WEEKDAY_COUNT, value))
    }
}

impl From<Weekday> for u8 {
    fn from(w: Weekday) -> Self {
        w.0
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A numbered teaching period within a day, 1 through 13.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct SlotNumber(u8);

impl SlotNumber {
    /// Returns `None` when `value` is outside 1..=13.
    pub fn new(value: i64) -> Option<Self> {
        if (1..=SLOT_COUNT as i64).contains(&value) {
            Some(SlotNumber(value as u8))
        } else {
            None
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for SlotNumber {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        SlotNumber::new(value).ok_or_else(|| format!("slot must be 1..{}, got {}", SLOT_COUNT, value))
    }
}

impl From<SlotNumber> for u8 {
    fn from(s: SlotNumber) -> Self {
        s.0
    }
}

impl fmt::Display for SlotNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One entry of the canonical slot catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotDefinition {
    /// Catalog row id, referenced by stored slots as `slot_ref_id`
    pub slot_ref_id: i64,
    pub slot_number: SlotNumber,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

/// Wall-clock layout of the default thirteen-period day.
const DEFAULT_SLOT_TIMES: [((u32, u32), (u32, u32)); SLOT_COUNT as usize] = [
    ((7, 0), (7, 45)),
    ((7, 50), (8, 35)),
    ((8, 40), (9, 25)),
    ((9, 35), (10, 20)),
    ((10, 25), (11, 10)),
    ((13, 0), (13, 45)),
    ((13, 50), (14, 35)),
    ((14, 40), (15, 25)),
    ((15, 35), (16, 20)),
    ((16, 25), (17, 10)),
    ((18, 0), (18, 45)),
    ((18, 50), (19, 35)),
    ((19, 40), (20, 25)),
];

/// The default slot catalog, ordered by slot number.
pub fn default_slot_catalog() -> Vec<SlotDefinition> {
    DEFAULT_SLOT_TIMES
        .iter()
        .enumerate()
        .filter_map(|(idx, ((sh, sm), (eh, em)))| {
            let number = idx as i64 + 1;
            Some(SlotDefinition {
                slot_ref_id: number,
                slot_number: SlotNumber::new(number)?,
                start_time: NaiveTime::from_hms_opt(*sh, *sm, 0)?,
                end_time: NaiveTime::from_hms_opt(*eh, *em, 0)?,
            })
        })
        .collect()
}

/// The slice of a course offering the engine depends on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseOffering {
    pub id: OfferingId,
    pub teacher_id: Option<TeacherId>,
    pub room_id: Option<RoomId>,
    pub credits: Option<u32>,
}

impl CourseOffering {
    pub fn new(id: i64) -> Self {
        Self {
            id: OfferingId::new(id),
            teacher_id: None,
            room_id: None,
            credits: None,
        }
    }

    pub fn with_teacher(mut self, teacher_id: i64) -> Self {
        self.teacher_id = Some(TeacherId::new(teacher_id));
        self
    }

    pub fn with_room(mut self, room_id: i64) -> Self {
        self.room_id = Some(RoomId::new(room_id));
        self
    }

    pub fn with_credits(mut self, credits: u32) -> Self {
        self.credits = Some(credits);
        self
    }

    /// True when this offering shares a teacher or a room with `other`.
    pub fn shares_resource_with(&self, other: &CourseOffering) -> bool {
        let same_teacher = self.teacher_id.is_some() && self.teacher_id == other.teacher_id;
        let same_room = self.room_id.is_some() && self.room_id == other.room_id;
        same_teacher || same_room
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weekday_range() {
        assert!(Weekday::new(0).is_none());
        assert!(Weekday::new(8).is_none());
        assert_eq!(Weekday::new(1).unwrap().name(), "Monday");
        assert_eq!(Weekday::new(7).unwrap().short_name(), "Sun");
        assert_eq!(Weekday::all().count(), 7);
    }

    #[test]
    fn test_slot_number_range() {
        assert!(SlotNumber::new(0).is_none());
        assert!(SlotNumber::new(14).is_none());
        assert_eq!(SlotNumber::new(13).unwrap().value(), 13);
    }

    #[test]
    fn test_weekday_deserialize_rejects_out_of_range() {
        assert!(serde_json::from_str::<Weekday>("9").is_err());
        let w: Weekday = serde_json::from_str("3").unwrap();
        assert_eq!(w.value(), 3);
        assert_eq!(serde_json::to_string(&w).unwrap(), "3");
    }

    #[test]
    fn test_default_catalog_is_ordered_and_complete() {
        let catalog = default_slot_catalog();
        assert_eq!(catalog.len(), SLOT_COUNT as usize);
        for (idx, slot) in catalog.iter().enumerate() {
            assert_eq!(slot.slot_number.value() as usize, idx + 1);
            assert!(slot.start_time < slot.end_time);
        }
        assert_eq!(catalog[0].start_time, NaiveTime::from_hms_opt(7, 0, 0).unwrap());
        assert_eq!(catalog[12].end_time, NaiveTime::from_hms_opt(20, 25, 0).unwrap());
    }

    #[test]
    fn test_shares_resource_with() {
        let a = CourseOffering::new(1).with_teacher(10).with_room(100);
        let same_teacher = CourseOffering::new(2).with_teacher(10).with_room(200);
        let same_room = CourseOffering::new(3).with_teacher(11).with_room(100);
        let unrelated = CourseOffering::new(4).with_teacher(12).with_room(300);
        let bare = CourseOffering::new(5);

        assert!(a.shares_resource_with(&same_teacher));
        assert!(a.shares_resource_with(&same_room));
        assert!(!a.shares_resource_with(&unrelated));
        assert!(!bare.shares_resource_with(&CourseOffering::new(6)));
    }
}
