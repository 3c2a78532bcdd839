//! Common test utilities

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Europe::London;
use chrono_tz::Tz;
use opendecks::config::Config;
use opendecks::models::{Category, NightState, Participant};
use opendecks::scheduler::{registry, resolve_local, ManualClock};
use opendecks::store::NightStore;
use std::sync::Arc;

#[allow(dead_code)]
pub const PIN: &str = "1796";

/// London local time as a UTC instant
pub fn london(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
    let naive = NaiveDate::from_ymd_opt(y, mo, d)
        .unwrap()
        .and_hms_opt(h, mi, 0)
        .unwrap();
    resolve_local(London, naive).with_timezone(&Utc)
}

/// London local time in the zone
#[allow(dead_code)]
pub fn london_local(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Tz> {
    london(y, mo, d, h, mi).with_timezone(&London)
}

/// Seeded config with the cooldown off
pub fn test_config(seed: u64) -> Config {
    let mut config = Config::default();
    config.schedule.rng_seed = Some(seed);
    config.kiosk.cooldown_enabled = false;
    config
}

/// Store on a manual clock starting at `at`
#[allow(dead_code)]
pub fn test_store(at: DateTime<Utc>, seed: u64) -> (NightStore, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(London, at));
    (NightStore::new(test_config(seed), clock.clone()), clock)
}

/// State holding the given signups, one minute apart
#[allow(dead_code)]
pub fn state_with(entries: &[(&str, Category)]) -> NightState {
    let mut state = NightState::new();
    let start = london(2025, 9, 5, 20, 0);
    for (i, (name, category)) in entries.iter().enumerate() {
        let at = start + chrono::Duration::minutes(i as i64);
        let (next, _) = registry::submit(&state, name, Some(*category), at, None).unwrap();
        state = next;
    }
    state
}

/// A mixed lineup: four male-ish, four other
#[allow(dead_code)]
pub fn mixed_lineup() -> Vec<(&'static str, Category)> {
    vec![
        ("Alpha", Category::Male),
        ("Bravo", Category::Duo),
        ("Charlie", Category::Male),
        ("Delta", Category::Duo),
        ("Echo", Category::Female),
        ("Foxtrot", Category::NonBinary),
        ("Golf", Category::Undisclosed),
        ("Hotel", Category::Female),
    ]
}

#[allow(dead_code)]
pub fn participant(name: &str, category: Category) -> Participant {
    Participant::new(name.to_string(), category, london(2025, 9, 5, 20, 0))
}
