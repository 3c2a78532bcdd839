//! Automatic draw trigger
//!
//! Polls the clock and draws a window once its trigger time (22:45, 00:45
//! local) has passed, as long as the window is still empty and the grace
//! period has not run out. A second, faster ticker handles housekeeping:
//! expiring the status line and rolling the plan over at the night cutover.

use chrono::{DateTime, Duration, Utc};
use std::time::Duration as StdDuration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use super::window::NightPlan;
use crate::models::{NightState, WindowId};
use crate::store::NightStore;

/// Windows whose automatic draw should fire at `now`
///
/// A window is due when `trigger <= now < trigger + grace` and it holds no
/// assignments yet. Staff draws before the trigger time therefore suppress
/// the automatic one.
pub fn due_windows(
    plan: &NightPlan,
    state: &NightState,
    now: DateTime<Utc>,
    grace: Duration,
) -> Vec<WindowId> {
    plan.windows()
        .iter()
        .filter(|w| {
            let closes = w
                .draw_trigger
                .checked_add_signed(grace)
                .unwrap_or(DateTime::<Utc>::MAX_UTC);
            now >= w.draw_trigger && now < closes
        })
        .filter(|w| !state.is_window_drawn(w.id))
        .map(|w| w.id)
        .collect()
}

/// Background task driving automatic draws
pub struct AutoTrigger {
    store: NightStore,
    poll_interval: StdDuration,
    tick_interval: StdDuration,
}

impl AutoTrigger {
    /// Trigger driven by the store's own trigger settings
    pub fn new(store: NightStore) -> Self {
        let poll_interval = store.config().poll_interval();
        let tick_interval = store.config().tick_interval();
        Self {
            store,
            poll_interval,
            tick_interval,
        }
    }

    /// Start the loop on the runtime
    pub fn spawn(self) -> TriggerHandle {
        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let store = self.store;
        let poll_interval = self.poll_interval;
        let tick_interval = self.tick_interval;

        let task = tokio::spawn(async move {
            let mut poll = interval(poll_interval);
            poll.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut housekeeping = interval(tick_interval);
            housekeeping.set_missed_tick_behavior(MissedTickBehavior::Skip);

            tracing::info!(
                poll_secs = poll_interval.as_secs(),
                tick_ms = tick_interval.as_millis() as u64,
                "Automatic draw trigger started"
            );

            loop {
                tokio::select! {
                    _ = poll.tick() => {
                        for outcome in store.auto_draw_due().await {
                            match outcome.result {
                                Ok(assigned) => tracing::debug!(
                                    window = %outcome.window,
                                    assigned,
                                    "Trigger fired"
                                ),
                                Err(e) => tracing::debug!(
                                    window = %outcome.window,
                                    error = %e,
                                    "Trigger fired without a draw"
                                ),
                            }
                        }
                    }
                    _ = housekeeping.tick() => {
                        store.tick().await;
                    }
                    _ = shutdown_rx.changed() => {
                        tracing::info!("Automatic draw trigger shutting down");
                        break;
                    }
                }
            }
        });

        TriggerHandle { shutdown, task }
    }
}

/// Handle to a running [`AutoTrigger`]
pub struct TriggerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl TriggerHandle {
    /// Signal the loop and wait for it to exit
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            tracing::warn!("Trigger task ended abnormally: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, ScheduleConfig};
    use crate::models::{Assignment, Category, Participant};
    use crate::scheduler::clock::{resolve_local, ManualClock};
    use crate::scheduler::window::logical_night_base;
    use chrono::NaiveDate;
    use chrono_tz::Europe::London;
    use std::sync::Arc;

    fn local(d: u32, h: u32, m: u32, s: u32) -> DateTime<Utc> {
        let naive = NaiveDate::from_ymd_opt(2025, 9, d)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap();
        resolve_local(London, naive).with_timezone(&Utc)
    }

    fn plan() -> NightPlan {
        let now = local(5, 20, 0, 0).with_timezone(&London);
        NightPlan::for_base(logical_night_base(&now), &ScheduleConfig::default())
    }

    #[test]
    fn test_due_windows_boundaries() {
        let plan = plan();
        let state = NightState::new();
        let grace = Duration::seconds(60);

        assert!(due_windows(&plan, &state, local(5, 22, 44, 59), grace).is_empty());
        assert_eq!(due_windows(&plan, &state, local(5, 22, 45, 0), grace), vec![WindowId::First]);
        assert_eq!(due_windows(&plan, &state, local(5, 22, 45, 59), grace), vec![WindowId::First]);
        assert!(due_windows(&plan, &state, local(5, 22, 46, 0), grace).is_empty());
        assert_eq!(due_windows(&plan, &state, local(6, 0, 45, 30), grace), vec![WindowId::Second]);
    }

    #[test]
    fn test_drawn_window_not_due() {
        let plan = plan();
        let mut state = NightState::new();
        let p = Participant::new("A".into(), Category::Female, local(5, 20, 0, 0));
        let slot = &plan.window(WindowId::First).slots[0];
        state
            .assignments
            .first
            .push(Assignment::new(slot, p.display_name.clone(), Some(p.category)));
        state.signups.push(p);

        assert!(due_windows(&plan, &state, local(5, 22, 45, 0), Duration::seconds(60)).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_trigger_loop_draws_once() {
        let clock = Arc::new(ManualClock::new(London, local(5, 22, 44, 58)));
        let mut config = Config::default();
        config.schedule.rng_seed = Some(7);
        config.kiosk.cooldown_enabled = false;
        config.trigger.poll_interval_secs = 1;
        let store = NightStore::new(config, clock.clone());

        store.submit_signup("A", Some(Category::Female)).await.unwrap();
        store.submit_signup("B", Some(Category::Male)).await.unwrap();
        store.submit_signup("C", Some(Category::NonBinary)).await.unwrap();

        let handle = AutoTrigger::new(store.clone()).spawn();

        tokio::time::sleep(StdDuration::from_millis(1500)).await;
        assert!(store.snapshot().await.assignments.first.is_empty());

        clock.advance(Duration::seconds(3));
        tokio::time::sleep(StdDuration::from_millis(1500)).await;
        let first = store.snapshot().await.assignments.first;
        assert_eq!(first.len(), 3);

        clock.advance(Duration::seconds(5));
        tokio::time::sleep(StdDuration::from_millis(2500)).await;
        assert_eq!(store.snapshot().await.assignments.first, first);

        handle.stop().await;
    }
}
