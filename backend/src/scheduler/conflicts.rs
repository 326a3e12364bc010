//! Teacher/room double-booking detection.
//!
//! The detector is a pure function over data the caller has already loaded, so a
//! storage backend can run it inside the same lock or transaction as the write that
//! follows it.

use log::debug;

use super::candidate::CandidateSet;
use crate::models::{BlockId, ConflictRecord, CourseOffering, ScheduleBlock};

/// Collects every `(weekday, slot)` collision between `candidate` and the blocks in
/// `existing`, considering only blocks whose offering shares a teacher or a room
/// with `offering`.
///
/// `existing` pairs each stored block with the offering that owns it. Blocks of
/// `offering` itself are included; pass `ignore_block_id` to exclude the block being
/// updated. All collisions are returned, in block, day, slot order.
pub fn detect_conflicts<'a, I>(
    offering: &CourseOffering,
    candidate: &CandidateSet,
    existing: I,
    ignore_block_id: Option<BlockId>,
) -> Vec<ConflictRecord>
where
    I: IntoIterator<Item = (&'a CourseOffering, &'a ScheduleBlock)>,
{
    if candidate.is_empty() {
        return Vec::new();
    }
    if offering.teacher_id.is_none() && offering.room_id.is_none() {
        debug!(
            "Offering {} has no teacher or room, skipping conflict detection",
            offering.id
        );
        return Vec::new();
    }

    let mut conflicts = Vec::new();
    for (owner, block) in existing {
        if Some(block.id) == ignore_block_id || !offering.shares_resource_with(owner) {
            continue;
        }
        for day in &block.days {
            for slot in &day.slots {
                if candidate.contains(day.weekday, slot.slot_number) {
                    conflicts.push(ConflictRecord {
                        block_id: block.id,
                        offering_id: owner.id,
                        teacher_id: owner.teacher_id,
                        room_id: owner.room_id,
                        weekday: day.weekday,
                        slot_number: slot.slot_number,
                    });
                }
            }
        }
    }

    debug!(
        "Conflict detection for offering {}: {} candidate pair(s), {} conflict(s)",
        offering.id,
        candidate.len(),
        conflicts.len()
    );
    conflicts
}
