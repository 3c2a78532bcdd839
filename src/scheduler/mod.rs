//! Night scheduling and fair draw
//!
//! This module turns the wall clock into a night plan (two playing windows
//! of four 30-minute slots) and fills those slots from the signup list.
//!
//! # Overview
//!
//! The night is anchored on a base midnight. Anything before 05:00 local
//! belongs to the previous evening, so the whole night (22:45 draw through
//! the 03:00 close) shares one plan.
//!
//! # Architecture
//!
//! ```text
//! ┌────────┐   ┌──────────┐   ┌────────┐
//! │ Clock  │──▶│  Window  │──▶│ Slots  │
//! └───┬────┘   └──────────┘   └───┬────┘
//!     │                           │
//!     │        ┌──────────┐   ┌───▼────┐
//!     │        │ Registry │──▶│  Draw  │
//!     │        └──────────┘   └───▲────┘
//!     │                           │
//!     │        ┌──────────┐       │
//!     └───────▶│ Trigger  │───────┘
//!              └──────────┘
//! ```
//!
//! # Modules
//!
//! - [`clock`] - Current instant in the kiosk zone, local time resolution
//! - [`window`] - Logical night base, draw times, windows, the night plan
//! - [`slots`] - Slot generation inside a window
//! - [`registry`] - Signup submission, removal and export
//! - [`draw`] - Capped random draw, redraw, reroll and manual replace
//! - [`trigger`] - Background task firing the draws at 22:45 and 00:45
//! - [`error`] - Night engine errors
//!
//! # Quick Start
//!
//! ```ignore
//! use opendecks::scheduler::{NightPlan, ZoneClock, Clock};
//! use opendecks::config::ScheduleConfig;
//!
//! let clock = ZoneClock::new(chrono_tz::Europe::London);
//! let plan = NightPlan::for_instant(&clock.now(), &ScheduleConfig::default());
//! for window in plan.windows() {
//!     println!("{} ({} slots)", plan.title(window.id), window.slots.len());
//! }
//! ```
//!
//! # Fairness Rule
//!
//! | Rule | Value |
//! |------|-------|
//! | Cap | `floor(window size / 2)` male or duo sets |
//! | Backfill | Cap yields only when other signups run out |
//! | Uniqueness | One set per artist per night |

pub mod clock;
pub mod draw;
pub mod error;
pub mod registry;
pub mod slots;
pub mod trigger;
pub mod window;

// Re-export main types
pub use clock::{resolve_local, Clock, ManualClock, ZoneClock};
pub use draw::{
    cap_for, manual_replace, pick_with_cap, redraw_window, remaining_signups, reroll_slot,
    run_draw, split_counts, unassigned_count, CapTagged,
};
pub use error::{DuplicateScope, NightError, NightResult};
pub use registry::{export_records, recent_first};
pub use slots::{generate_slots, DEFAULT_SLOT_MINUTES, MAX_SLOTS_PER_WINDOW};
pub use trigger::{due_windows, AutoTrigger, TriggerHandle};
pub use window::{countdown_to, logical_night_base, windows_for, NightPlan, NightTimes, Window};
