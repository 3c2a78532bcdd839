//! Wall-clock source in the kiosk's civil timezone
//!
//! The engine never calls `Utc::now()` directly; it asks a [`Clock`] so that
//! tests and the `--at` CLI flag can pin time.

use chrono::{DateTime, Duration, LocalResult, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::sync::Mutex;

/// Source of the current instant, expressed in a fixed civil zone
pub trait Clock: Send + Sync {
    /// Zone every local computation happens in
    fn zone(&self) -> Tz;

    /// Current instant in [`Clock::zone`]
    fn now(&self) -> DateTime<Tz>;
}

/// System clock converted to a named zone
#[derive(Debug, Clone, Copy)]
pub struct ZoneClock {
    zone: Tz,
}

impl ZoneClock {
    pub fn new(zone: Tz) -> Self {
        Self { zone }
    }
}

impl Default for ZoneClock {
    fn default() -> Self {
        Self::new(chrono_tz::Europe::London)
    }
}

impl Clock for ZoneClock {
    fn zone(&self) -> Tz {
        self.zone
    }

    fn now(&self) -> DateTime<Tz> {
        Utc::now().with_timezone(&self.zone)
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    zone: Tz,
    instant: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(zone: Tz, instant: DateTime<Utc>) -> Self {
        Self {
            zone,
            instant: Mutex::new(instant),
        }
    }

    /// Pin the clock at a local wall-clock time
    pub fn at_local(zone: Tz, local: NaiveDateTime) -> Self {
        Self::new(zone, resolve_local(zone, local).with_timezone(&Utc))
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        if let Ok(mut guard) = self.instant.lock() {
            *guard = instant;
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut guard) = self.instant.lock() {
            *guard += by;
        }
    }
}

impl Clock for ManualClock {
    fn zone(&self) -> Tz {
        self.zone
    }

    fn now(&self) -> DateTime<Tz> {
        let instant = match self.instant.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        };
        instant.with_timezone(&self.zone)
    }
}

/// Map a local wall-clock time to an instant
///
/// Ambiguous times (clocks going back) resolve to the earlier instant. Times
/// skipped by clocks going forward resolve to the first valid instant after
/// the gap.
pub fn resolve_local(zone: Tz, local: NaiveDateTime) -> DateTime<Tz> {
    match zone.from_local_datetime(&local) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => {
            // Gaps are at most a few hours in any real zone
            let mut probe = local;
            for _ in 0..(24 * 60) {
                probe += Duration::minutes(1);
                match zone.from_local_datetime(&probe) {
                    LocalResult::Single(dt) => return dt,
                    LocalResult::Ambiguous(earliest, _) => return earliest,
                    LocalResult::None => continue,
                }
            }
            zone.from_utc_datetime(&local)
        }
    }
}
