//! Fair draw engine
//!
//! Picks signups for a window's slots so that male and duo sets take at most
//! half of the window, while never leaving a slot empty when enough people
//! signed up. An artist plays at most once per night: a draw only considers
//! names not already placed in the other window.
//!
//! Every operation takes the current [`NightState`] and a random source and
//! returns a new state. Nothing here reads the wall clock; the draw time is
//! passed in by the caller.

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;
use uuid::Uuid;

use super::error::{DuplicateScope, NightError, NightResult};
use super::window::Window;
use crate::models::{Assignment, Category, NightState, Participant, WindowId};
use crate::utils::{normalize_name, normalize_whitespace};

// ============================================================================
// Cap Arithmetic
// ============================================================================

/// Anything that can be counted against the window cap
pub trait CapTagged {
    fn is_maleish(&self) -> bool;
}

impl CapTagged for Category {
    fn is_maleish(&self) -> bool {
        Category::is_maleish(self)
    }
}

impl CapTagged for Participant {
    fn is_maleish(&self) -> bool {
        self.category.is_maleish()
    }
}

impl CapTagged for Assignment {
    fn is_maleish(&self) -> bool {
        Assignment::is_maleish(self)
    }
}

/// Maximum male-ish slots for a window holding `size` sets
pub fn cap_for(size: usize) -> usize {
    size / 2
}

/// How many to take from each pool: `(maleish, other)`
///
/// The cap only gives way when the other pool cannot fill the window.
pub fn split_counts(
    maleish_available: usize,
    other_available: usize,
    count: usize,
) -> (usize, usize) {
    let cap = cap_for(count);
    let mut male_take = cap.min(maleish_available);
    let mut other_take = (count - male_take).min(other_available);

    let mut shortfall = count.saturating_sub(male_take + other_take);
    if shortfall > 0 {
        let extra = shortfall.min(maleish_available - male_take);
        male_take += extra;
        shortfall -= extra;
    }
    if shortfall > 0 {
        let extra = shortfall.min(other_available - other_take);
        other_take += extra;
    }

    (male_take, other_take)
}

/// Randomly pick up to `count` entries from `pool` under the male-ish cap
///
/// Each side is drawn uniformly without replacement, and the combined picks
/// are shuffled so slot order carries no category pattern.
pub fn pick_with_cap<T, R>(pool: &[T], count: usize, rng: &mut R) -> Vec<T>
where
    T: CapTagged + Clone,
    R: Rng + ?Sized,
{
    let (mut maleish, mut other): (Vec<&T>, Vec<&T>) = pool.iter().partition(|c| c.is_maleish());
    let (male_take, other_take) = split_counts(maleish.len(), other.len(), count);

    maleish.shuffle(rng);
    other.shuffle(rng);

    let mut picked: Vec<T> = maleish
        .into_iter()
        .take(male_take)
        .chain(other.into_iter().take(other_take))
        .cloned()
        .collect();
    picked.shuffle(rng);

    tracing::debug!(
        requested = count,
        maleish = male_take,
        other = other_take,
        "Picked with cap"
    );

    picked
}

// ============================================================================
// Pools
// ============================================================================

fn names_in(state: &NightState, window: WindowId) -> HashSet<String> {
    state.assigned_names(window).into_iter().collect()
}

fn names_anywhere(state: &NightState) -> HashSet<String> {
    state
        .assignments
        .iter_all()
        .map(Assignment::normalized_name)
        .collect()
}

/// Signups eligible for a full draw of `window`
pub fn draw_pool(state: &NightState, window: WindowId) -> Vec<Participant> {
    let taken = names_in(state, window.other());
    state
        .signups
        .iter()
        .filter(|p| !taken.contains(&p.normalized_name()))
        .cloned()
        .collect()
}

/// Signups holding no slot in either window
pub fn remaining_signups(state: &NightState) -> Vec<&Participant> {
    let taken = names_anywhere(state);
    state
        .signups
        .iter()
        .filter(|p| !taken.contains(&p.normalized_name()))
        .collect()
}

/// Signups not holding a slot in `window`
pub fn unassigned_count(state: &NightState, window: WindowId) -> usize {
    let taken = names_in(state, window);
    state
        .signups
        .iter()
        .filter(|p| !taken.contains(&p.normalized_name()))
        .count()
}

fn slot_index(state: &NightState, window: WindowId, slot_id: Uuid) -> NightResult<usize> {
    state
        .assignments
        .get(window)
        .iter()
        .position(|a| a.slot_id == slot_id)
        .ok_or(NightError::SlotNotFound { window, slot_id })
}

/// Male-ish count in a window ignoring one slot, and the window's cap
fn cap_usage(state: &NightState, window: WindowId, except_slot: Uuid) -> (usize, usize) {
    let assignments = state.assignments.get(window);
    let used = assignments
        .iter()
        .filter(|a| a.slot_id != except_slot && a.is_maleish())
        .count();
    (used, cap_for(assignments.len()))
}

// ============================================================================
// Draw Operations
// ============================================================================

fn draw_window<R: Rng + ?Sized>(
    state: &NightState,
    window: &Window,
    now: DateTime<Utc>,
    rng: &mut R,
) -> NightResult<NightState> {
    if state.signups.is_empty() {
        return Err(NightError::EmptyPool { window: window.id });
    }

    let pool = draw_pool(state, window.id);
    let count = pool.len().min(window.slots.len());
    if count == 0 {
        return Err(NightError::NoCandidates { window: window.id });
    }

    let picks = pick_with_cap(&pool, count, rng);
    let assignments: Vec<Assignment> = window
        .slots
        .iter()
        .zip(picks)
        .map(|(slot, p)| Assignment::new(slot, p.display_name, Some(p.category)))
        .collect();

    tracing::info!(
        window = %window.id,
        pool = pool.len(),
        assigned = assignments.len(),
        "Window drawn"
    );

    let mut next = state.clone();
    *next.assignments.get_mut(window.id) = assignments;
    next.last_draw_at = Some(now);
    Ok(next)
}

/// Fill a window from signups not playing in the other window
///
/// Callers decide whether a populated window may be drawn again; the
/// automatic trigger skips windows that already have assignments.
pub fn run_draw<R: Rng + ?Sized>(
    state: &NightState,
    window: &Window,
    now: DateTime<Utc>,
    rng: &mut R,
) -> NightResult<NightState> {
    draw_window(state, window, now, rng)
}

/// Replace every assignment of a window with a fresh draw
pub fn redraw_window<R: Rng + ?Sized>(
    state: &NightState,
    window: &Window,
    now: DateTime<Utc>,
    rng: &mut R,
) -> NightResult<NightState> {
    tracing::debug!(
        window = %window.id,
        previous = state.assignments.get(window.id).len(),
        "Redrawing window"
    );
    draw_window(state, window, now, rng)
}

/// Swap one slot's artist for a random signup holding no slot tonight
pub fn reroll_slot<R: Rng + ?Sized>(
    state: &NightState,
    window: WindowId,
    slot_id: Uuid,
    rng: &mut R,
) -> NightResult<NightState> {
    let idx = slot_index(state, window, slot_id)?;
    let (used, cap) = cap_usage(state, window, slot_id);
    let maleish_allowed = used < cap;

    let pool: Vec<&Participant> = remaining_signups(state)
        .into_iter()
        .filter(|p| maleish_allowed || !p.category.is_maleish())
        .collect();

    let pick = pool
        .choose(rng)
        .ok_or(NightError::NoCandidates { window })?;

    tracing::info!(
        window = %window,
        slot = %slot_id,
        eligible = pool.len(),
        maleish_allowed,
        "Slot rerolled"
    );

    let mut next = state.clone();
    let entry = &mut next.assignments.get_mut(window)[idx];
    entry.participant_name = pick.display_name.clone();
    entry.category = Some(pick.category);
    Ok(next)
}

/// Put a staff-typed name into a slot
///
/// The name need not be a signup. When it matches one, the signup's category
/// counts toward the cap; otherwise the slot is uncapped.
pub fn manual_replace(
    state: &NightState,
    window: WindowId,
    slot_id: Uuid,
    raw_name: &str,
) -> NightResult<NightState> {
    let name = normalize_whitespace(raw_name);
    if name.is_empty() {
        return Err(NightError::validation("name", "Enter a name to replace with."));
    }
    let idx = slot_index(state, window, slot_id)?;

    let key = normalize_name(&name);
    let occupied_elsewhere = WindowId::all().iter().any(|&w| {
        state
            .assignments
            .get(w)
            .iter()
            .any(|a| a.normalized_name() == key && !(w == window && a.slot_id == slot_id))
    });
    if occupied_elsewhere {
        return Err(NightError::duplicate(name, DuplicateScope::Assignments));
    }

    let signup = state.find_signup_by_name(&name);
    let category = signup.map(|p| p.category);
    if category.is_some_and(|c| c.is_maleish()) {
        let (used, cap) = cap_usage(state, window, slot_id);
        if used >= cap {
            return Err(NightError::CapExceeded { window, cap });
        }
    }

    let display = signup.map_or(name, |p| p.display_name.clone());
    tracing::info!(
        window = %window,
        slot = %slot_id,
        matched_signup = signup.is_some(),
        "Slot replaced"
    );

    let mut next = state.clone();
    let entry = &mut next.assignments.get_mut(window)[idx];
    entry.participant_name = display;
    entry.category = category;
    Ok(next)
}
