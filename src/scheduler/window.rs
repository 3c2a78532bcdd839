//! Night windows and draw times
//!
//! A night is anchored on its base midnight. Instants before 05:00 local
//! belong to the previous day's night, so a 02:00 signup still counts for the
//! draw that started the evening before.
//!
//! All offsets from the base are wall-clock targets in the kiosk zone, not
//! elapsed durations: "23:00" is 23:00 local even on a clock-change night.
//!
//! | Event | Local time |
//! |-------|------------|
//! | First draw | 22:45 |
//! | First window | 23:00 – 01:00 (+1 day) |
//! | Second draw | 00:45 (+1 day) |
//! | Second window | 01:00 – 03:00 (+1 day) |

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Timelike, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use super::clock::resolve_local;
use super::slots::generate_slots;
use crate::config::ScheduleConfig;
use crate::models::{Slot, WindowId};

/// Local hour before which an instant belongs to the previous night
pub const NIGHT_CUTOVER_HOUR: u32 = 5;

/// A wall-clock target relative to the base midnight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CivilOffset {
    days: u64,
    hour: u32,
    minute: u32,
}

const FIRST_DRAW: CivilOffset = CivilOffset { days: 0, hour: 22, minute: 45 };
const FIRST_START: CivilOffset = CivilOffset { days: 0, hour: 23, minute: 0 };
const SECOND_DRAW: CivilOffset = CivilOffset { days: 1, hour: 0, minute: 45 };
const SECOND_START: CivilOffset = CivilOffset { days: 1, hour: 1, minute: 0 };
const SECOND_END: CivilOffset = CivilOffset { days: 1, hour: 3, minute: 0 };

fn at_offset(zone: Tz, base_date: NaiveDate, offset: CivilOffset) -> DateTime<Utc> {
    let date = base_date
        .checked_add_days(chrono::Days::new(offset.days))
        .unwrap_or(base_date);
    let time = NaiveTime::from_hms_opt(offset.hour, offset.minute, 0).unwrap_or(NaiveTime::MIN);
    resolve_local(zone, date.and_time(time)).with_timezone(&Utc)
}

/// Civil midnight that begins the night `instant` belongs to
pub fn logical_night_base(instant: &DateTime<Tz>) -> DateTime<Tz> {
    let zone = instant.timezone();
    let local_date = instant.date_naive();
    let date = if instant.hour() < NIGHT_CUTOVER_HOUR {
        local_date.pred_opt().unwrap_or(local_date)
    } else {
        local_date
    };
    resolve_local(zone, date.and_time(NaiveTime::MIN))
}

/// Draw times and playing intervals of one night, before slot generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NightTimes {
    pub first_draw: DateTime<Utc>,
    pub second_draw: DateTime<Utc>,
    pub first_window: (DateTime<Utc>, DateTime<Utc>),
    pub second_window: (DateTime<Utc>, DateTime<Utc>),
}

/// Compute draw triggers and windows for the night starting at `base`
pub fn windows_for(base: &DateTime<Tz>) -> NightTimes {
    let zone = base.timezone();
    let date = base.date_naive();

    let boundary = at_offset(zone, date, SECOND_START);
    NightTimes {
        first_draw: at_offset(zone, date, FIRST_DRAW),
        second_draw: at_offset(zone, date, SECOND_DRAW),
        first_window: (at_offset(zone, date, FIRST_START), boundary),
        second_window: (boundary, at_offset(zone, date, SECOND_END)),
    }
}

// ============================================================================
// Window
// ============================================================================

/// One playing window with its slots
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Window {
    pub id: WindowId,
    /// Inclusive start
    pub start: DateTime<Utc>,
    /// Exclusive end
    pub end: DateTime<Utc>,
    pub draw_trigger: DateTime<Utc>,
    pub slots: Vec<Slot>,
}

impl Window {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }

    /// Elapsed length of the window
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

// ============================================================================
// Night Plan
// ============================================================================

/// Windows and slots for one logical night
///
/// Slots get fresh ids whenever a plan is built, so a plan is built once per
/// night and kept until the base changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NightPlan {
    zone: Tz,
    base: DateTime<Tz>,
    windows: [Window; 2],
}

impl NightPlan {
    /// Build the plan for the night `now` belongs to
    pub fn for_instant(now: &DateTime<Tz>, schedule: &ScheduleConfig) -> Self {
        Self::for_base(logical_night_base(now), schedule)
    }

    /// Build the plan for a given base midnight
    pub fn for_base(base: DateTime<Tz>, schedule: &ScheduleConfig) -> Self {
        let times = windows_for(&base);
        let slot_len = Duration::minutes(i64::from(schedule.slot_minutes));
        let max = schedule.max_slots_per_window;

        let build = |id: WindowId, (start, end): (DateTime<Utc>, DateTime<Utc>), trigger| Window {
            id,
            start,
            end,
            draw_trigger: trigger,
            slots: generate_slots(start, end, slot_len, max),
        };

        Self {
            zone: base.timezone(),
            windows: [
                build(WindowId::First, times.first_window, times.first_draw),
                build(WindowId::Second, times.second_window, times.second_draw),
            ],
            base,
        }
    }

    pub fn zone(&self) -> Tz {
        self.zone
    }

    pub fn base_date(&self) -> NaiveDate {
        self.base.date_naive()
    }

    pub fn window(&self, id: WindowId) -> &Window {
        &self.windows[id.index()]
    }

    pub fn windows(&self) -> &[Window; 2] {
        &self.windows
    }

    /// Whether `now` has moved on to a different logical night
    pub fn is_stale(&self, now: &DateTime<Tz>) -> bool {
        logical_night_base(now).date_naive() != self.base_date()
    }

    /// Format an instant as local `HH:MM`
    pub fn local_hhmm(&self, instant: DateTime<Utc>) -> String {
        instant.with_timezone(&self.zone).format("%H:%M").to_string()
    }

    /// Window heading such as `23:00 – 01:00`
    pub fn title(&self, id: WindowId) -> String {
        let window = self.window(id);
        format!(
            "{} – {}",
            self.local_hhmm(window.start),
            self.local_hhmm(window.end)
        )
    }
}

/// Time left until `target` as `HH:MM:SS`, `00:00:00` once reached
pub fn countdown_to(target: DateTime<Utc>, now: DateTime<Utc>) -> String {
    if target <= now {
        return "00:00:00".to_string();
    }
    let secs = (target - now).num_seconds();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}
