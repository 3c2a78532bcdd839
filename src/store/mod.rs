//! Session state container
//!
//! [`NightStore`] owns everything that changes during a night: the signup
//! list, both windows' assignments, the cooldown switch, the draw RNG and the
//! status line. It is a cheap handle; clones share the same session.
//!
//! Every mutation holds the session write lock from validation through the
//! swap of the new [`NightState`], so the auto-trigger and kiosk input never
//! observe each other half-way. Observers subscribe to [`StoreEvent`]s.
//!
//! # Admin Gate
//!
//! Draws, rerolls, replacements, removals, reset, the cooldown switch and the
//! export take the staff PIN. This is a deterrent for a shared screen, not
//! access control.

pub mod status;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use crate::config::Config;
use crate::export::{build_export, CsvExport};
use crate::models::{Assignment, Category, NightState, Participant, WindowId};
use crate::scheduler::clock::{Clock, ZoneClock};
use crate::scheduler::error::{NightError, NightResult};
use crate::scheduler::trigger::due_windows;
use crate::scheduler::window::NightPlan;
use crate::scheduler::{draw, registry};

pub use status::{PulseKind, StatusBoard, StatusPulse};

// ============================================================================
// Events
// ============================================================================

/// Changes broadcast to observers
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StoreEvent {
    SignupAdded {
        participant: Participant,
    },
    SignupRemoved {
        participant: Participant,
    },
    WindowDrawn {
        window: WindowId,
        assignments: Vec<Assignment>,
        automatic: bool,
    },
    SlotChanged {
        window: WindowId,
        assignment: Assignment,
    },
    NightReset,
    CooldownChanged {
        enabled: bool,
    },
    PlanRolledOver {
        base_date: NaiveDate,
    },
    Status {
        pulse: StatusPulse,
    },
    StatusCleared,
}

/// Result of one automatic draw attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoDrawOutcome {
    pub window: WindowId,
    pub result: NightResult<usize>,
}

// ============================================================================
// Session
// ============================================================================

struct Session {
    state: NightState,
    plan: NightPlan,
    cooldown_enabled: bool,
    rng: ChaCha8Rng,
    status: StatusBoard,
}

/// What a successful mutation hands back to [`NightStore::apply`]
struct Applied<T> {
    value: T,
    events: Vec<StoreEvent>,
    message: String,
}

impl<T> Applied<T> {
    fn new(value: T, message: impl Into<String>) -> Self {
        Self {
            value,
            events: Vec::new(),
            message: message.into(),
        }
    }

    fn event(mut self, event: StoreEvent) -> Self {
        self.events.push(event);
        self
    }
}

/// Shared handle to the night session
#[derive(Clone)]
pub struct NightStore {
    inner: Arc<RwLock<Session>>,
    clock: Arc<dyn Clock>,
    config: Arc<Config>,
    events: broadcast::Sender<StoreEvent>,
}

impl NightStore {
    /// Create a store reading time from `clock`
    pub fn new(config: Config, clock: Arc<dyn Clock>) -> Self {
        let rng = match config.schedule.rng_seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let plan = NightPlan::for_instant(&clock.now(), &config.schedule);
        let (events, _) = broadcast::channel(256);

        tracing::info!(
            zone = %clock.zone(),
            night = %plan.base_date(),
            seeded = config.schedule.rng_seed.is_some(),
            "Night store ready"
        );

        let session = Session {
            state: NightState::new(),
            plan,
            cooldown_enabled: config.kiosk.cooldown_enabled,
            rng,
            status: StatusBoard::new(config.status_pulse()),
        };

        Self {
            inner: Arc::new(RwLock::new(session)),
            clock,
            config: Arc::new(config),
            events,
        }
    }

    /// Create a store on the system clock in the configured zone
    pub fn with_zone_clock(config: Config) -> crate::error::Result<Self> {
        let zone = config
            .zone()
            .map_err(|e| crate::error::Error::config(e.to_string()))?;
        Ok(Self::new(config, Arc::new(ZoneClock::new(zone))))
    }

    /// Subscribe to store events
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn now(&self) -> DateTime<Tz> {
        self.clock.now()
    }

    // ------------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------------

    /// Copy of the current night state
    pub async fn snapshot(&self) -> NightState {
        self.inner.read().await.state.clone()
    }

    /// Copy of the current night plan
    pub async fn plan(&self) -> NightPlan {
        self.inner.read().await.plan.clone()
    }

    pub async fn cooldown_enabled(&self) -> bool {
        self.inner.read().await.cooldown_enabled
    }

    /// Status message still on screen, if any
    pub async fn status(&self) -> Option<StatusPulse> {
        let now = self.clock.now().with_timezone(&Utc);
        self.inner.read().await.status.current(now).cloned()
    }

    /// Signups holding no slot in either window
    pub async fn remaining_count(&self) -> usize {
        draw::remaining_signups(&self.inner.read().await.state).len()
    }

    /// Signups without a slot in `window`
    pub async fn unassigned_count(&self, window: WindowId) -> usize {
        draw::unassigned_count(&self.inner.read().await.state, window)
    }

    /// Public board listing, newest first
    pub async fn public_signups(&self) -> Vec<Participant> {
        let session = self.inner.read().await;
        registry::recent_first(&session.state)
            .into_iter()
            .cloned()
            .collect()
    }

    // ------------------------------------------------------------------------
    // Mutation plumbing
    // ------------------------------------------------------------------------

    fn check_pin(&self, pin: &str) -> NightResult<()> {
        if pin == self.config.kiosk.admin_pin {
            Ok(())
        } else {
            Err(NightError::Unauthorized)
        }
    }

    fn emit(&self, event: StoreEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    /// Run one mutation under the write lock and report its outcome
    async fn apply<T, F>(&self, operation: &'static str, f: F) -> NightResult<T>
    where
        F: FnOnce(&mut Session, DateTime<Tz>) -> NightResult<Applied<T>>,
    {
        let mut session = self.inner.write().await;
        let now = self.clock.now();
        let instant = now.with_timezone(&Utc);

        match f(&mut *session, now) {
            Ok(applied) => {
                let pulse = session
                    .status
                    .pulse(applied.message, PulseKind::Success, instant);
                drop(session);

                tracing::debug!(operation, "Operation applied");
                for event in applied.events {
                    self.emit(event);
                }
                self.emit(StoreEvent::Status { pulse });
                Ok(applied.value)
            }
            Err(err) => {
                let pulse = session
                    .status
                    .pulse(err.status_message(), PulseKind::Failure, instant);
                drop(session);

                if matches!(err, NightError::Unauthorized) {
                    tracing::warn!(operation, "Admin PIN rejected");
                } else {
                    tracing::info!(operation, error = %err, "Operation rejected");
                }
                self.emit(StoreEvent::Status { pulse });
                Err(err)
            }
        }
    }

    // ------------------------------------------------------------------------
    // Kiosk operations
    // ------------------------------------------------------------------------

    /// Add a signup from the public form
    pub async fn submit_signup(
        &self,
        name: &str,
        category: Option<Category>,
    ) -> NightResult<Participant> {
        let cooldown = self.config.signup_cooldown();
        self.apply("submit_signup", |session, now| {
            let active = session.cooldown_enabled.then_some(cooldown);
            let (next, participant) = registry::submit(
                &session.state,
                name,
                category,
                now.with_timezone(&Utc),
                active,
            )?;
            session.state = next;

            tracing::info!(id = %participant.id, category = %participant.category, "Signup added");
            Ok(Applied::new(participant.clone(), "Added! Good luck in the draw.")
                .event(StoreEvent::SignupAdded { participant }))
        })
        .await
    }

    /// Remove a signup; its slots, if any, are left for staff to fix
    pub async fn remove_signup(&self, id: Uuid, pin: &str) -> NightResult<Option<Participant>> {
        self.apply("remove_signup", |session, _| {
            self.check_pin(pin)?;
            let (next, removed) = registry::remove(&session.state, id);
            session.state = next;

            match removed {
                Some(participant) => Ok(Applied::new(Some(participant.clone()), "Sign-up removed.")
                    .event(StoreEvent::SignupRemoved { participant })),
                None => Ok(Applied::new(None, "Nothing to remove.")),
            }
        })
        .await
    }

    /// Clear signups, assignments and timestamps
    pub async fn reset_night(&self, pin: &str) -> NightResult<()> {
        self.apply("reset_night", |session, _| {
            self.check_pin(pin)?;
            session.state = NightState::new();

            tracing::info!("Night reset");
            Ok(Applied::new((), "Everything cleared.").event(StoreEvent::NightReset))
        })
        .await
    }

    /// Staff-confirmed draw for one window
    pub async fn run_draw_now(&self, window: WindowId, pin: &str) -> NightResult<Vec<Assignment>> {
        self.apply("run_draw_now", |session, now| {
            self.check_pin(pin)?;
            let Session {
                state, plan, rng, ..
            } = session;
            let next = draw::run_draw(state, plan.window(window), now.with_timezone(&Utc), rng)?;
            let assignments = next.assignments.get(window).to_vec();
            let message = format!("Draw complete for {}.", plan.title(window));
            *state = next;

            Ok(Applied::new(assignments.clone(), message).event(StoreEvent::WindowDrawn {
                window,
                assignments,
                automatic: false,
            }))
        })
        .await
    }

    /// Replace a window's assignments with a fresh draw
    pub async fn redraw_window(&self, window: WindowId, pin: &str) -> NightResult<Vec<Assignment>> {
        self.apply("redraw_window", |session, now| {
            self.check_pin(pin)?;
            let Session {
                state, plan, rng, ..
            } = session;
            let next =
                draw::redraw_window(state, plan.window(window), now.with_timezone(&Utc), rng)?;
            let assignments = next.assignments.get(window).to_vec();
            *state = next;

            Ok(Applied::new(assignments.clone(), "Window re-drawn.").event(
                StoreEvent::WindowDrawn {
                    window,
                    assignments,
                    automatic: false,
                },
            ))
        })
        .await
    }

    /// Re-pick one slot from signups holding no slot
    pub async fn reroll_slot(
        &self,
        window: WindowId,
        slot_id: Uuid,
        pin: &str,
    ) -> NightResult<Assignment> {
        self.apply("reroll_slot", |session, _| {
            self.check_pin(pin)?;
            let Session { state, rng, .. } = session;
            let next = draw::reroll_slot(state, window, slot_id, rng)?;
            let assignment = changed_slot(&next, window, slot_id)?;
            *state = next;

            Ok(Applied::new(assignment.clone(), "Slot re-rolled.")
                .event(StoreEvent::SlotChanged { window, assignment }))
        })
        .await
    }

    /// Put a staff-typed name into a slot
    pub async fn manual_replace(
        &self,
        window: WindowId,
        slot_id: Uuid,
        name: &str,
        pin: &str,
    ) -> NightResult<Assignment> {
        self.apply("manual_replace", |session, _| {
            self.check_pin(pin)?;
            let next = draw::manual_replace(&session.state, window, slot_id, name)?;
            let assignment = changed_slot(&next, window, slot_id)?;
            session.state = next;

            Ok(Applied::new(assignment.clone(), "Slot updated.")
                .event(StoreEvent::SlotChanged { window, assignment }))
        })
        .await
    }

    /// Switch the signup cooldown on or off
    pub async fn set_cooldown_enabled(&self, enabled: bool, pin: &str) -> NightResult<()> {
        self.apply("set_cooldown_enabled", |session, _| {
            self.check_pin(pin)?;
            session.cooldown_enabled = enabled;

            let message = if enabled {
                "Sign-up cooldown on."
            } else {
                "Sign-up cooldown off."
            };
            Ok(Applied::new((), message).event(StoreEvent::CooldownChanged { enabled }))
        })
        .await
    }

    /// Render the signup list as CSV
    pub async fn export_signups_csv(&self, pin: &str) -> NightResult<CsvExport> {
        self.apply("export_signups_csv", |session, now| {
            self.check_pin(pin)?;
            let records = registry::export_records(&session.state);
            let export = build_export(&records, &now);
            Ok(Applied::new(export, "Sign-ups exported."))
        })
        .await
    }

    // ------------------------------------------------------------------------
    // Scheduler entry points
    // ------------------------------------------------------------------------

    /// Draw every window whose trigger time just passed and which is still empty
    ///
    /// Windows already holding assignments are skipped without a status
    /// message, so repeated polls inside the grace period draw at most once.
    pub async fn auto_draw_due(&self) -> Vec<AutoDrawOutcome> {
        let grace = self.config.trigger_grace();
        let mut session = self.inner.write().await;
        let now = self.clock.now().with_timezone(&Utc);

        let due = due_windows(&session.plan, &session.state, now, grace);
        let mut outcomes = Vec::with_capacity(due.len());
        let mut events = Vec::new();

        for window in due {
            let Session {
                state,
                plan,
                rng,
                status,
                ..
            } = &mut *session;

            let result = draw::run_draw(state, plan.window(window), now, rng);
            let outcome = match result {
                Ok(next) => {
                    let assignments = next.assignments.get(window).to_vec();
                    *state = next;
                    tracing::info!(
                        window = %window,
                        assigned = assignments.len(),
                        "Automatic draw complete"
                    );

                    let message = format!("Draw complete for {}.", plan.title(window));
                    let pulse = status.pulse(message, PulseKind::Success, now);
                    let count = assignments.len();
                    events.push(StoreEvent::WindowDrawn {
                        window,
                        assignments,
                        automatic: true,
                    });
                    events.push(StoreEvent::Status { pulse });
                    Ok(count)
                }
                Err(err) => {
                    tracing::info!(window = %window, error = %err, "Automatic draw found nobody");
                    let pulse = status.pulse(err.status_message(), PulseKind::Failure, now);
                    events.push(StoreEvent::Status { pulse });
                    Err(err)
                }
            };
            outcomes.push(AutoDrawOutcome {
                window,
                result: outcome,
            });
        }
        drop(session);

        for event in events {
            self.emit(event);
        }
        outcomes
    }

    /// Housekeeping: expire the status line and roll the plan to a new night
    pub async fn tick(&self) {
        let now = self.clock.now();
        let instant = now.with_timezone(&Utc);
        let mut session = self.inner.write().await;
        let mut events = Vec::new();

        if session.status.expire(instant) {
            events.push(StoreEvent::StatusCleared);
        }

        if session.plan.is_stale(&now) {
            session.plan = NightPlan::for_instant(&now, &self.config.schedule);
            let base_date = session.plan.base_date();
            let leftover = session.state.assignments.iter_all().count();
            if leftover > 0 {
                tracing::warn!(
                    night = %base_date,
                    leftover,
                    "New night started with previous assignments still set; \
                     reset to re-arm automatic draws"
                );
            } else {
                tracing::info!(night = %base_date, "New night plan");
            }
            events.push(StoreEvent::PlanRolledOver { base_date });
        }
        drop(session);

        for event in events {
            self.emit(event);
        }
    }
}

fn changed_slot(state: &NightState, window: WindowId, slot_id: Uuid) -> NightResult<Assignment> {
    state
        .assignments
        .get(window)
        .iter()
        .find(|a| a.slot_id == slot_id)
        .cloned()
        .ok_or(NightError::SlotNotFound { window, slot_id })
}
