//! Integration tests for the night scheduler
//!
//! These tests walk whole nights through the store:
//! - Signups, the two automatic draws and cross-window uniqueness
//! - Staff draws and the automatic-draw guard
//! - Clock-change nights
//! - Night rollover

mod common;

use chrono::Duration;
use common::{london, mixed_lineup, test_store, PIN};
use opendecks::models::{Category, WindowId};
use opendecks::scheduler::{cap_for, NightError};
use opendecks::store::StoreEvent;
use std::collections::HashSet;

// ============================================================================
// Full Night
// ============================================================================

#[tokio::test]
async fn test_full_night_two_automatic_draws() {
    let (store, clock) = test_store(london(2025, 9, 5, 19, 30), 11);
    for (name, category) in mixed_lineup() {
        store.submit_signup(name, Some(category)).await.unwrap();
    }

    clock.set(london(2025, 9, 5, 22, 45));
    let outcomes = store.auto_draw_due().await;
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].result, Ok(4));

    clock.set(london(2025, 9, 6, 0, 45));
    let outcomes = store.auto_draw_due().await;
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].window, WindowId::Second);
    assert_eq!(outcomes[0].result, Ok(4));

    let state = store.snapshot().await;
    let names: Vec<_> = state
        .assignments
        .iter_all()
        .map(|a| a.normalized_name())
        .collect();
    let unique: HashSet<_> = names.iter().collect();
    assert_eq!(names.len(), 8);
    assert_eq!(unique.len(), 8, "Each artist plays at most once per night");

    for window in WindowId::all() {
        let assigned = state.assignments.get(window);
        let maleish = assigned.iter().filter(|a| a.is_maleish()).count();
        assert!(maleish <= cap_for(assigned.len()));
    }
    assert_eq!(store.remaining_count().await, 0);
}

#[tokio::test]
async fn test_slots_follow_plan_order() {
    let (store, clock) = test_store(london(2025, 9, 5, 20, 0), 3);
    for (name, category) in mixed_lineup() {
        store.submit_signup(name, Some(category)).await.unwrap();
    }
    clock.set(london(2025, 9, 5, 22, 50));

    let drawn = store.run_draw_now(WindowId::First, PIN).await.unwrap();
    let plan = store.plan().await;
    let slots = &plan.window(WindowId::First).slots;

    assert_eq!(drawn.len(), slots.len());
    for (assignment, slot) in drawn.iter().zip(slots) {
        assert_eq!(assignment.slot_id, slot.id);
        assert_eq!(assignment.start, slot.start);
        assert_eq!(assignment.end, slot.end);
    }
    assert_eq!(plan.local_hhmm(drawn[0].start), "23:00");
    assert_eq!(plan.local_hhmm(drawn[3].end), "01:00");
}

#[tokio::test]
async fn test_staff_draw_suppresses_automatic_draw() {
    let (store, clock) = test_store(london(2025, 9, 5, 22, 30), 5);
    store.submit_signup("Echo", Some(Category::Female)).await.unwrap();
    store.submit_signup("Alpha", Some(Category::Male)).await.unwrap();

    let staff = store.run_draw_now(WindowId::First, PIN).await.unwrap();

    clock.set(london(2025, 9, 5, 22, 45));
    assert!(store.auto_draw_due().await.is_empty());
    assert_eq!(store.snapshot().await.assignments.first, staff);
}

#[tokio::test]
async fn test_automatic_draw_with_no_signups_reports_empty_pool() {
    let (store, clock) = test_store(london(2025, 9, 5, 22, 45), 5);
    let mut events = store.subscribe();

    let outcomes = store.auto_draw_due().await;
    assert_eq!(
        outcomes[0].result,
        Err(NightError::EmptyPool {
            window: WindowId::First
        })
    );
    match events.try_recv().unwrap() {
        StoreEvent::Status { pulse } => assert_eq!(pulse.message, "No sign-ups yet."),
        other => panic!("Unexpected event: {other:?}"),
    }

    // Late signups do not re-arm a missed trigger once the grace period is over
    store.submit_signup("Late", Some(Category::Female)).await.unwrap();
    clock.advance(Duration::minutes(2));
    assert!(store.auto_draw_due().await.is_empty());
}

#[tokio::test]
async fn test_second_window_draws_only_leftovers() {
    let (store, clock) = test_store(london(2025, 9, 5, 20, 0), 21);
    for (name, category) in [
        ("A", Category::Female),
        ("B", Category::Male),
        ("C", Category::NonBinary),
        ("D", Category::Female),
        ("E", Category::Duo),
    ] {
        store.submit_signup(name, Some(category)).await.unwrap();
    }
    clock.set(london(2025, 9, 5, 22, 45));
    store.auto_draw_due().await;

    clock.set(london(2025, 9, 6, 0, 45));
    let outcomes = store.auto_draw_due().await;
    assert_eq!(outcomes[0].result, Ok(1));

    let state = store.snapshot().await;
    let first: HashSet<_> = state.assigned_names(WindowId::First).into_iter().collect();
    let second = state.assigned_names(WindowId::Second);
    assert!(!first.contains(&second[0]));
}

// ============================================================================
// Admin Flows
// ============================================================================

#[tokio::test]
async fn test_removed_signup_keeps_its_slot() {
    let (store, _) = test_store(london(2025, 9, 5, 22, 0), 8);
    let solo = store.submit_signup("Solo", Some(Category::Female)).await.unwrap();
    store.run_draw_now(WindowId::First, PIN).await.unwrap();

    let removed = store.remove_signup(solo.id, PIN).await.unwrap();
    assert_eq!(removed.map(|p| p.id), Some(solo.id));

    let state = store.snapshot().await;
    assert!(state.signups.is_empty());
    assert_eq!(state.assignments.first[0].participant_name, "Solo");
}

#[tokio::test]
async fn test_manual_replace_rejects_name_playing_other_window() {
    let (store, clock) = test_store(london(2025, 9, 5, 22, 0), 8);
    for (name, category) in mixed_lineup() {
        store.submit_signup(name, Some(category)).await.unwrap();
    }
    let first = store.run_draw_now(WindowId::First, PIN).await.unwrap();
    clock.set(london(2025, 9, 6, 0, 40));
    let second = store.run_draw_now(WindowId::Second, PIN).await.unwrap();

    let err = store
        .manual_replace(
            WindowId::Second,
            second[0].slot_id,
            &first[0].participant_name.to_uppercase(),
            PIN,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, NightError::Duplicate { .. }));

    let err = store
        .reroll_slot(WindowId::Second, second[0].slot_id, PIN)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        NightError::NoCandidates {
            window: WindowId::Second
        }
    );
}

#[tokio::test]
async fn test_export_lists_signups_in_order() {
    let (store, clock) = test_store(london(2025, 9, 5, 20, 0), 1);
    store.submit_signup("First", Some(Category::Male)).await.unwrap();
    clock.advance(Duration::minutes(5));
    store.submit_signup("Second", Some(Category::Undisclosed)).await.unwrap();

    let export = store.export_signups_csv(PIN).await.unwrap();
    let lines: Vec<_> = export.content.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[1], "\"First\",\"Male\",\"2025-09-05 20:00\"");
    assert_eq!(lines[2], "\"Second\",\"Prefer not to say\",\"2025-09-05 20:05\"");
    assert_eq!(export.filename, "open-decks-signups-20250905-2005.csv");
}

// ============================================================================
// Clock Changes and Rollover
// ============================================================================

#[tokio::test]
async fn test_spring_forward_night_has_short_second_window() {
    let (store, _) = test_store(london(2025, 3, 29, 21, 0), 2);
    let plan = store.plan().await;

    assert_eq!(plan.window(WindowId::First).slots.len(), 4);
    assert_eq!(plan.window(WindowId::Second).slots.len(), 2);
    assert_eq!(plan.title(WindowId::Second), "02:00 – 03:00");
}

#[tokio::test]
async fn test_fall_back_night_keeps_four_slots() {
    let (store, _) = test_store(london(2025, 10, 25, 21, 0), 2);
    let plan = store.plan().await;

    for window in plan.windows() {
        assert_eq!(window.slots.len(), 4);
    }
    assert_eq!(plan.title(WindowId::First), "23:00 – 01:00");
}

#[tokio::test]
async fn test_rollover_keeps_state_but_new_plan() {
    let (store, clock) = test_store(london(2025, 9, 5, 20, 0), 4);
    store.submit_signup("Echo", Some(Category::Female)).await.unwrap();
    let before = store.plan().await;

    clock.set(london(2025, 9, 6, 4, 59));
    store.tick().await;
    assert_eq!(store.plan().await.base_date(), before.base_date());

    clock.set(london(2025, 9, 6, 5, 0));
    store.tick().await;
    let after = store.plan().await;
    assert_ne!(after.base_date(), before.base_date());
    assert_eq!(store.snapshot().await.signups.len(), 1);

    store.reset_night(PIN).await.unwrap();
    assert!(store.snapshot().await.signups.is_empty());
}
