//! Slot generation
//!
//! Slots are laid out by elapsed time from the window start, so on a
//! clock-change night the local labels shift with the offset instead of
//! skipping or repeating an hour.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::models::Slot;

/// Default slot length in minutes
pub const DEFAULT_SLOT_MINUTES: u32 = 30;

/// Default number of slots per window
pub const MAX_SLOTS_PER_WINDOW: usize = 4;

/// Split `[start, end)` into consecutive slots of `slot_len`
///
/// Stops when the next slot would run past `end` or `max_slots` slots exist.
/// Every call produces fresh slot ids.
pub fn generate_slots(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    slot_len: Duration,
    max_slots: usize,
) -> Vec<Slot> {
    let mut slots = Vec::with_capacity(max_slots);
    if slot_len <= Duration::zero() {
        return slots;
    }

    let mut cursor = start;
    while cursor < end && slots.len() < max_slots {
        let slot_end = cursor + slot_len;
        if slot_end > end {
            break;
        }
        slots.push(Slot {
            id: Uuid::new_v4(),
            start: cursor,
            end: slot_end,
        });
        cursor = slot_end;
    }

    slots
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashSet;

    fn generate_default_slots(start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<Slot> {
        generate_slots(
            start,
            end,
            Duration::minutes(i64::from(DEFAULT_SLOT_MINUTES)),
            MAX_SLOTS_PER_WINDOW,
        )
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 5, 22, 0, 0).unwrap()
    }

    #[test]
    fn test_two_hour_window_yields_four_slots() {
        let s = start();
        let slots = generate_default_slots(s, s + Duration::hours(2));

        assert_eq!(slots.len(), 4);
        assert_eq!(slots[0].start, s);
        assert_eq!(slots[0].end, s + Duration::minutes(30));
        assert_eq!(slots[3].end, s + Duration::hours(2));
        for pair in slots.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
    }

    #[test]
    fn test_slot_count_capped() {
        let s = start();
        let slots = generate_default_slots(s, s + Duration::hours(3));
        assert_eq!(slots.len(), 4);
        assert_eq!(slots[3].end, s + Duration::hours(2));
    }

    #[test]
    fn test_partial_slot_dropped() {
        let s = start();
        let slots = generate_default_slots(s, s + Duration::minutes(75));
        assert_eq!(slots.len(), 2);
    }

    #[test]
    fn test_empty_and_degenerate_intervals() {
        let s = start();
        assert!(generate_default_slots(s, s).is_empty());
        assert!(generate_default_slots(s, s - Duration::hours(1)).is_empty());
        assert!(generate_slots(s, s + Duration::hours(1), Duration::zero(), 4).is_empty());
    }

    #[test]
    fn test_fresh_ids_each_call() {
        let s = start();
        let a = generate_default_slots(s, s + Duration::hours(2));
        let b = generate_default_slots(s, s + Duration::hours(2));

        let ids: HashSet<_> = a.iter().chain(b.iter()).map(|slot| slot.id).collect();
        assert_eq!(ids.len(), 8);
        assert_eq!(a[0].start, b[0].start);
    }
}
