//! Signup registry
//!
//! Pure operations over [`NightState`]: each returns a new state and leaves
//! the input untouched, so a rejected signup never half-applies.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use super::error::{DuplicateScope, NightError, NightResult};
use crate::models::{Category, NightState, Participant, SignupRecord};
use crate::utils::{normalize_name, normalize_whitespace};

/// Add a signup
///
/// `cooldown` is `None` when throttling is switched off.
pub fn submit(
    state: &NightState,
    display_name: &str,
    category: Option<Category>,
    now: DateTime<Utc>,
    cooldown: Option<Duration>,
) -> NightResult<(NightState, Participant)> {
    let name = normalize_whitespace(display_name);
    if name.is_empty() {
        return Err(NightError::validation("name", "Name cannot be empty"));
    }
    let category =
        category.ok_or_else(|| NightError::validation("category", "Category is required"))?;

    if let (Some(cooldown), Some(last)) = (cooldown, state.last_signup_at) {
        let ready_at = last
            .checked_add_signed(cooldown)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        if now < ready_at {
            let remaining = ready_at - now;
            let retry_after_secs = (remaining.num_milliseconds() + 999) / 1000;
            return Err(NightError::Throttled { retry_after_secs });
        }
    }

    let key = normalize_name(&name);
    if state.signups.iter().any(|p| p.normalized_name() == key) {
        return Err(NightError::duplicate(name, DuplicateScope::Signups));
    }

    let participant = Participant::new(name, category, now);
    let mut next = state.clone();
    next.signups.push(participant.clone());
    next.last_signup_at = Some(now);

    tracing::debug!(
        id = %participant.id,
        category = %participant.category,
        total = next.signups.len(),
        "Signup accepted"
    );

    Ok((next, participant))
}

/// Remove a signup by id
///
/// Slots already holding the name keep it; staff reroll or replace them.
pub fn remove(state: &NightState, participant_id: Uuid) -> (NightState, Option<Participant>) {
    let mut next = state.clone();
    let removed = next
        .signups
        .iter()
        .position(|p| p.id == participant_id)
        .map(|idx| next.signups.remove(idx));

    if let Some(ref participant) = removed {
        let still_assigned = next
            .assignments
            .iter_all()
            .any(|a| a.normalized_name() == participant.normalized_name());
        if still_assigned {
            tracing::warn!(
                name = %participant.display_name,
                "Removed signup still holds a slot"
            );
        }
    }

    (next, removed)
}

/// Signups ordered by signup time, oldest first
pub fn export_records(state: &NightState) -> Vec<SignupRecord> {
    let mut records: Vec<SignupRecord> = state
        .signups
        .iter()
        .map(|p| SignupRecord {
            name: p.display_name.clone(),
            category: p.category,
            signed_up_at: p.signed_up_at,
        })
        .collect();
    records.sort_by_key(|r| r.signed_up_at);
    records
}

/// Signups ordered newest first, for the public board
pub fn recent_first(state: &NightState) -> Vec<&Participant> {
    let mut list: Vec<&Participant> = state.signups.iter().collect();
    list.sort_by(|a, b| b.signed_up_at.cmp(&a.signed_up_at));
    list
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 5, 19, 0, 0).unwrap()
    }

    fn cooldown() -> Option<Duration> {
        Some(Duration::seconds(60))
    }

    #[test]
    fn test_submit_normalizes_display_name() {
        let (state, p) =
            submit(&NightState::new(), "  DJ   Name ", Some(Category::Female), t0(), cooldown())
                .unwrap();

        assert_eq!(p.display_name, "DJ Name");
        assert_eq!(state.signups.len(), 1);
        assert_eq!(state.last_signup_at, Some(t0()));
    }

    #[test]
    fn test_submit_rejects_empty_name_and_missing_category() {
        let state = NightState::new();

        let err = submit(&state, "   ", Some(Category::Male), t0(), None).unwrap_err();
        assert!(matches!(err, NightError::Validation { ref field, .. } if field == "name"));

        let err = submit(&state, "DJ", None, t0(), None).unwrap_err();
        assert!(matches!(err, NightError::Validation { ref field, .. } if field == "category"));
    }

    #[test]
    fn test_duplicate_is_case_and_space_insensitive() {
        let (state, _) =
            submit(&NightState::new(), "  DJ  NAME ", Some(Category::Male), t0(), None).unwrap();
        let err = submit(&state, "dj name", Some(Category::Female), t0(), None).unwrap_err();

        assert!(matches!(
            err,
            NightError::Duplicate {
                scope: DuplicateScope::Signups,
                ..
            }
        ));
        assert_eq!(state.signups.len(), 1);
    }

    #[test]
    fn test_throttle_window() {
        let (state, _) = submit(&NightState::new(), "A", Some(Category::Male), t0(), cooldown())
            .unwrap();

        let early = t0() + Duration::seconds(45);
        let err = submit(&state, "B", Some(Category::Male), early, cooldown()).unwrap_err();
        assert_eq!(err, NightError::Throttled { retry_after_secs: 15 });

        let later = t0() + Duration::seconds(60);
        let ok = submit(&state, "B", Some(Category::Male), later, cooldown());
        assert!(ok.is_ok());
    }

    #[test]
    fn test_throttle_ignored_when_cooldown_off() {
        let (state, _) =
            submit(&NightState::new(), "A", Some(Category::Male), t0(), None).unwrap();
        assert!(submit(&state, "B", Some(Category::Duo), t0(), None).is_ok());
    }

    #[test]
    fn test_remove_keeps_assignments() {
        let (state, p) =
            submit(&NightState::new(), "A", Some(Category::Male), t0(), None).unwrap();
        let (next, removed) = remove(&state, p.id);

        assert_eq!(removed.map(|r| r.id), Some(p.id));
        assert!(next.signups.is_empty());

        let (same, none) = remove(&next, Uuid::new_v4());
        assert!(none.is_none());
        assert_eq!(same, next);
    }

    #[test]
    fn test_export_and_recent_ordering() {
        let mut state = NightState::new();
        for (i, name) in ["first", "second", "third"].iter().enumerate() {
            let at = t0() + Duration::minutes(i as i64 * 5);
            state = submit(&state, name, Some(Category::Undisclosed), at, cooldown())
                .unwrap()
                .0;
        }

        let exported: Vec<_> = export_records(&state).into_iter().map(|r| r.name).collect();
        assert_eq!(exported, vec!["first", "second", "third"]);

        let recent: Vec<_> = recent_first(&state)
            .into_iter()
            .map(|p| p.display_name.as_str())
            .collect();
        assert_eq!(recent, vec!["third", "second", "first"]);
    }
}
