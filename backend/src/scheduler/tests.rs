//! Property tests for the allocation planner.

use proptest::prelude::*;

use super::generator::{distribute, pick_slots, plan_allocation, PlannerDefaults};
use crate::api::AutoGenerateRequest;
use crate::models::{default_slot_catalog, CourseOffering, SlotNumber, Weekday};

fn weekdays(mask: u8) -> Vec<Weekday> {
    Weekday::all()
        .filter(|w| mask & (1 << (w.value() - 1)) != 0)
        .collect()
}

fn catalog_numbers() -> Vec<SlotNumber> {
    default_slot_catalog().iter().map(|s| s.slot_number).collect()
}

proptest! {
    #[test]
    fn prop_distribution_is_even_and_complete(ppw in 0u32..=91, mask in 1u8..128) {
        let days = weekdays(mask);
        let split = distribute(ppw, &days);

        let total: u32 = split.iter().map(|(_, k)| *k).sum();
        prop_assert_eq!(total, ppw);

        let max = split.iter().map(|(_, k)| *k).max().unwrap_or(0);
        let min = split.iter().map(|(_, k)| *k).min().unwrap_or(0);
        prop_assert!(max - min <= 1);

        // extra periods go to the earliest weekdays
        for pair in split.windows(2) {
            prop_assert!(pair[0].0 < pair[1].0);
            prop_assert!(pair[0].1 >= pair[1].1);
        }
    }

    #[test]
    fn prop_picked_slots_are_distinct_and_preferred_first(
        count in 0usize..=13,
        preferred in proptest::collection::vec(1i64..=13, 0..8),
    ) {
        let catalog = catalog_numbers();
        let mut seen = Vec::new();
        let preferred: Vec<SlotNumber> = preferred
            .into_iter()
            .filter_map(SlotNumber::new)
            .filter(|s| if seen.contains(s) { false } else { seen.push(*s); true })
            .collect();

        let chosen = pick_slots(count, &preferred, &catalog);
        prop_assert_eq!(chosen.len(), count);

        let mut dedup = chosen.clone();
        dedup.sort();
        dedup.dedup();
        prop_assert_eq!(dedup.len(), chosen.len());

        let head = count.min(preferred.len());
        prop_assert_eq!(&chosen[..head], &preferred[..head]);
    }

    #[test]
    fn prop_plan_fills_every_week_or_reports_capacity(
        weeks in 1i64..=20,
        credits in 1i64..=10,
        ppc in 1i64..=30,
        mask in 1u8..128,
    ) {
        let mut req = AutoGenerateRequest::new(1, weeks);
        req.credits = Some(credits);
        req.periods_per_credit = Some(ppc);
        req.weekdays = weekdays(mask).iter().map(|w| w.value() as i64).collect();

        let result = plan_allocation(
            &req,
            &CourseOffering::new(1),
            &default_slot_catalog(),
            &PlannerDefaults::default(),
        );
        let total = (credits * ppc) as u32;
        let ppw = total.div_ceil(weeks as u32);
        let available = req.weekdays.len() as u32 * 13;

        match result {
            Ok(plan) => {
                prop_assert!(ppw <= available);
                prop_assert_eq!(plan.summary.periods_per_week, ppw);
                prop_assert_eq!(plan.summary.allocated_periods_per_week, ppw);
                for day in &plan.days {
                    let mut slots = day.slots.clone();
                    slots.sort();
                    slots.dedup();
                    prop_assert_eq!(slots.len(), day.slots.len());
                }
            }
            Err(err) => {
                prop_assert_eq!(err.code(), "CapacityError");
                prop_assert!(ppw > available);
            }
        }
    }
}
