//! Transient set of `(weekday, slot)` pairs implied by a proposed day list.

use std::collections::BTreeSet;

use crate::models::{DayPlan, SlotNumber, Weekday};

/// The occupied grid cells of a proposal. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateSet {
    pairs: BTreeSet<(Weekday, SlotNumber)>,
}

impl CandidateSet {
    pub fn from_days(days: &[DayPlan]) -> Self {
        days.iter()
            .flat_map(|d| d.slots.iter().map(move |s| (d.weekday, *s)))
            .collect()
    }

    pub fn contains(&self, weekday: Weekday, slot: SlotNumber) -> bool {
        self.pairs.contains(&(weekday, slot))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Pairs in ascending `(weekday, slot)` order.
    pub fn iter(&self) -> impl Iterator<Item = &(Weekday, SlotNumber)> {
        self.pairs.iter()
    }
}

impl FromIterator<(Weekday, SlotNumber)> for CandidateSet {
    fn from_iter<I: IntoIterator<Item = (Weekday, SlotNumber)>>(iter: I) -> Self {
        Self {
            pairs: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(weekday: i64, slots: &[i64]) -> DayPlan {
        DayPlan::new(
            Weekday::new(weekday).unwrap(),
            slots.iter().map(|&s| SlotNumber::new(s).unwrap()).collect(),
        )
    }

    #[test]
    fn test_from_days_flattens_pairs() {
        let set = CandidateSet::from_days(&[plan(1, &[1, 2]), plan(3, &[5])]);
        assert_eq!(set.len(), 3);
        assert!(set.contains(Weekday::new(1).unwrap(), SlotNumber::new(2).unwrap()));
        assert!(set.contains(Weekday::new(3).unwrap(), SlotNumber::new(5).unwrap()));
        assert!(!set.contains(Weekday::new(3).unwrap(), SlotNumber::new(1).unwrap()));
    }

    #[test]
    fn test_day_without_slots_adds_nothing() {
        let set = CandidateSet::from_days(&[plan(2, &[])]);
        assert!(set.is_empty());
    }
}
