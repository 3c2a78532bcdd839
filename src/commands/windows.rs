use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use opendecks::config::Config;
use opendecks::scheduler::{countdown_to, Clock, ManualClock, NightPlan, ZoneClock};

/// Print the night plan for now, or for the instant given with `--at`
pub fn windows(config: &Config, at: Option<&str>) -> Result<()> {
    let zone = config.zone()?;
    let clock: Box<dyn Clock> = match at {
        Some(raw) => {
            let instant = DateTime::parse_from_rfc3339(raw)
                .with_context(|| format!("Invalid --at instant: {raw}"))?
                .with_timezone(&Utc);
            Box::new(ManualClock::new(zone, instant))
        }
        None => Box::new(ZoneClock::new(zone)),
    };

    let now = clock.now();
    let plan = NightPlan::for_instant(&now, &config.schedule);
    let now_utc = now.with_timezone(&Utc);

    println!("Open Decks Night Plan");
    println!("=====================");
    println!("Zone:  {zone}");
    println!("Now:   {}", now.format("%Y-%m-%d %H:%M:%S %Z"));
    println!("Night: {}", plan.base_date());
    println!();

    for window in plan.windows() {
        println!("Window {}: {}", window.id, plan.title(window.id));
        println!(
            "  Draw at {} (in {})",
            plan.local_hhmm(window.draw_trigger),
            countdown_to(window.draw_trigger, now_utc)
        );
        if window.contains(now_utc) {
            println!("  Playing now");
        }
        for (i, slot) in window.slots.iter().enumerate() {
            println!(
                "  {}. {} – {}",
                i + 1,
                plan.local_hhmm(slot.start),
                plan.local_hhmm(slot.end)
            );
        }
        if window.slots.len() < config.schedule.max_slots_per_window {
            println!(
                "  Note: {} of {} slots fit tonight ({} minutes elapsed)",
                window.slots.len(),
                config.schedule.max_slots_per_window,
                window.duration().num_minutes()
            );
        }
        println!();
    }

    Ok(())
}
