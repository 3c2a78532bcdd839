use anyhow::{Context, Result};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};

use opendecks::config::Config;
use opendecks::models::{Category, WindowId};
use opendecks::scheduler::{countdown_to, AutoTrigger, NightError};
use opendecks::store::{NightStore, PulseKind, StoreEvent};

const HELP: &str = "\
Commands:
  signup <category> <name>                 sign up (male, female, nb, duo, undisclosed)
  list                                     sign-ups in order
  board                                    windows, countdowns and assignments
  status                                   current status message
  draw <window> <pin>                      run a window's draw now
  redraw <window> <pin>                    replace a window's draw
  reroll <window> <slot#> <pin>            re-pick one slot
  replace <window> <slot#> <pin> <name>    put a name into a slot
  remove <signup#> <pin>                   remove a sign-up
  cooldown <on|off> <pin>                  switch the sign-up cooldown
  export <pin> [dir]                       write the sign-ups CSV
  reset <pin>                              clear everything
  help
  quit";

/// One line of kiosk input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KioskCommand {
    Signup {
        category: Option<Category>,
        name: String,
    },
    List,
    Board,
    Status,
    Draw {
        window: WindowId,
        pin: String,
    },
    Redraw {
        window: WindowId,
        pin: String,
    },
    Reroll {
        window: WindowId,
        slot: usize,
        pin: String,
    },
    Replace {
        window: WindowId,
        slot: usize,
        pin: String,
        name: String,
    },
    Remove {
        index: usize,
        pin: String,
    },
    Cooldown {
        enabled: bool,
        pin: String,
    },
    Export {
        pin: String,
        dir: Option<PathBuf>,
    },
    Reset {
        pin: String,
    },
    Help,
    Quit,
}

fn window_arg(raw: Option<&str>) -> std::result::Result<WindowId, String> {
    raw.ok_or_else(|| "Which window? (1 or 2)".to_string())?
        .parse()
        .map_err(|_| "Window must be 1 or 2".to_string())
}

fn index_arg(raw: Option<&str>, what: &str) -> std::result::Result<usize, String> {
    raw.and_then(|s| s.parse::<usize>().ok())
        .filter(|&n| n > 0)
        .ok_or_else(|| format!("Give a {what} number"))
}

fn pin_arg(raw: Option<&str>) -> std::result::Result<String, String> {
    raw.map(str::to_string)
        .ok_or_else(|| "PIN required".to_string())
}

/// Parse one input line; `Ok(None)` for a blank line
pub fn parse_line(line: &str) -> std::result::Result<Option<KioskCommand>, String> {
    let mut parts = line.split_whitespace();
    let Some(verb) = parts.next() else {
        return Ok(None);
    };

    let command = match verb.to_lowercase().as_str() {
        "signup" | "add" => {
            let category = parts.next().and_then(Category::parse);
            let name = parts.collect::<Vec<_>>().join(" ");
            KioskCommand::Signup { category, name }
        }
        "list" | "ls" => KioskCommand::List,
        "board" => KioskCommand::Board,
        "status" => KioskCommand::Status,
        "draw" => KioskCommand::Draw {
            window: window_arg(parts.next())?,
            pin: pin_arg(parts.next())?,
        },
        "redraw" => KioskCommand::Redraw {
            window: window_arg(parts.next())?,
            pin: pin_arg(parts.next())?,
        },
        "reroll" => KioskCommand::Reroll {
            window: window_arg(parts.next())?,
            slot: index_arg(parts.next(), "slot")?,
            pin: pin_arg(parts.next())?,
        },
        "replace" => {
            let window = window_arg(parts.next())?;
            let slot = index_arg(parts.next(), "slot")?;
            let pin = pin_arg(parts.next())?;
            let name = parts.collect::<Vec<_>>().join(" ");
            KioskCommand::Replace {
                window,
                slot,
                pin,
                name,
            }
        }
        "remove" | "rm" => KioskCommand::Remove {
            index: index_arg(parts.next(), "sign-up")?,
            pin: pin_arg(parts.next())?,
        },
        "cooldown" => {
            let enabled = match parts.next() {
                Some("on") => true,
                Some("off") => false,
                _ => return Err("Use 'cooldown on <pin>' or 'cooldown off <pin>'".to_string()),
            };
            KioskCommand::Cooldown {
                enabled,
                pin: pin_arg(parts.next())?,
            }
        }
        "export" => KioskCommand::Export {
            pin: pin_arg(parts.next())?,
            dir: parts.next().map(PathBuf::from),
        },
        "reset" => KioskCommand::Reset {
            pin: pin_arg(parts.next())?,
        },
        "help" | "?" => KioskCommand::Help,
        "quit" | "exit" => KioskCommand::Quit,
        other => return Err(format!("Unknown command '{other}', try 'help'")),
    };

    Ok(Some(command))
}

/// Run the interactive kiosk until `quit`, end of input or Ctrl-C
pub async fn kiosk(config: Config) -> Result<()> {
    let trigger_enabled = config.trigger.enabled;
    let store = NightStore::with_zone_clock(config).context("Failed to start night store")?;

    let printer = spawn_event_printer(&store);
    let trigger = trigger_enabled.then(|| AutoTrigger::new(store.clone()).spawn());

    println!("Open Decks kiosk ready. Type 'help' for commands.");
    print_board(&store).await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read input")? else {
                    break;
                };
                match parse_line(&line) {
                    Ok(Some(KioskCommand::Quit)) => break,
                    Ok(Some(command)) => execute(&store, command).await?,
                    Ok(None) => {}
                    Err(message) => println!("{message}"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                break;
            }
        }
    }

    if let Some(handle) = trigger {
        handle.stop().await;
    }
    printer.abort();
    Ok(())
}

fn spawn_event_printer(store: &NightStore) -> tokio::task::JoinHandle<()> {
    let mut events = store.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(StoreEvent::Status { pulse }) => {
                    let mark = match pulse.kind {
                        PulseKind::Success => "ok",
                        PulseKind::Failure => "!!",
                    };
                    println!("[{mark}] {}", pulse.message);
                }
                Ok(StoreEvent::WindowDrawn {
                    window,
                    assignments,
                    automatic: true,
                }) => {
                    println!("Automatic draw for window {window}:");
                    for (i, a) in assignments.iter().enumerate() {
                        println!("  {}. {}", i + 1, a.participant_name);
                    }
                }
                Ok(StoreEvent::PlanRolledOver { base_date }) => {
                    println!("New night: {base_date}");
                }
                Ok(_) => {}
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Event printer lagged");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

async fn execute(store: &NightStore, command: KioskCommand) -> Result<()> {
    // Failures already reach the screen through the status pulse
    let report = |result: std::result::Result<(), NightError>| {
        if let Err(e) = result {
            tracing::debug!(error = %e, "Kiosk action failed");
        }
    };

    match command {
        KioskCommand::Signup { category, name } => {
            report(store.submit_signup(&name, category).await.map(|_| ()));
        }
        KioskCommand::List => print_signups(store).await,
        KioskCommand::Board => print_board(store).await,
        KioskCommand::Status => match store.status().await {
            Some(pulse) => println!("{}", pulse.message),
            None => println!("(no message)"),
        },
        KioskCommand::Draw { window, pin } => {
            let result = store.run_draw_now(window, &pin).await;
            if result.is_ok() {
                print_window(store, window).await;
            }
            report(result.map(|_| ()));
        }
        KioskCommand::Redraw { window, pin } => {
            let result = store.redraw_window(window, &pin).await;
            if result.is_ok() {
                print_window(store, window).await;
            }
            report(result.map(|_| ()));
        }
        KioskCommand::Reroll { window, slot, pin } => {
            let Some(slot_id) = slot_at(store, window, slot).await else {
                println!("Window {window} has no slot {slot} drawn");
                return Ok(());
            };
            let result = store.reroll_slot(window, slot_id, &pin).await;
            if let Ok(a) = &result {
                println!("  {slot}. {}", a.participant_name);
            }
            report(result.map(|_| ()));
        }
        KioskCommand::Replace {
            window,
            slot,
            pin,
            name,
        } => {
            let Some(slot_id) = slot_at(store, window, slot).await else {
                println!("Window {window} has no slot {slot} drawn");
                return Ok(());
            };
            report(
                store
                    .manual_replace(window, slot_id, &name, &pin)
                    .await
                    .map(|_| ()),
            );
        }
        KioskCommand::Remove { index, pin } => {
            let snapshot = store.snapshot().await;
            let Some(id) = snapshot.signups.get(index - 1).map(|p| p.id) else {
                println!("No sign-up number {index}");
                return Ok(());
            };
            report(store.remove_signup(id, &pin).await.map(|_| ()));
        }
        KioskCommand::Cooldown { enabled, pin } => {
            report(store.set_cooldown_enabled(enabled, &pin).await);
        }
        KioskCommand::Export { pin, dir } => match store.export_signups_csv(&pin).await {
            Ok(export) => {
                let dir = dir.unwrap_or_else(|| PathBuf::from("."));
                let path = export
                    .write_to_dir(&dir)
                    .await
                    .with_context(|| format!("Failed to write export into {}", dir.display()))?;
                println!("Wrote {} sign-ups to {}", export.rows, path.display());
            }
            Err(e) => report(Err(e)),
        },
        KioskCommand::Reset { pin } => report(store.reset_night(&pin).await),
        KioskCommand::Help => println!("{HELP}"),
        KioskCommand::Quit => {}
    }

    Ok(())
}

async fn slot_at(store: &NightStore, window: WindowId, slot: usize) -> Option<uuid::Uuid> {
    store
        .snapshot()
        .await
        .assignments
        .get(window)
        .get(slot - 1)
        .map(|a| a.slot_id)
}

async fn print_signups(store: &NightStore) {
    let state = store.snapshot().await;
    if state.signups.is_empty() {
        println!("No sign-ups yet.");
        return;
    }
    let zone = store.now().timezone();
    for (i, p) in state.signups.iter().enumerate() {
        println!(
            "  {:>2}. {} ({}) at {}",
            i + 1,
            p.display_name,
            p.category.label(),
            p.signed_up_at.with_timezone(&zone).format("%H:%M")
        );
    }
    println!("  {} waiting for a slot", store.remaining_count().await);
}

async fn print_window(store: &NightStore, window: WindowId) {
    let plan = store.plan().await;
    let state = store.snapshot().await;
    println!("Window {window}: {}", plan.title(window));
    for (i, a) in state.assignments.get(window).iter().enumerate() {
        println!(
            "  {}. {} {}",
            i + 1,
            plan.local_hhmm(a.start),
            a.participant_name
        );
    }
    println!(
        "  {} sign-ups not in this window",
        store.unassigned_count(window).await
    );
}

async fn print_board(store: &NightStore) {
    let plan = store.plan().await;
    let state = store.snapshot().await;
    let now = store.now().with_timezone(&chrono::Utc);

    for window in plan.windows() {
        println!(
            "Window {}: {} (draw {} in {})",
            window.id,
            plan.title(window.id),
            plan.local_hhmm(window.draw_trigger),
            countdown_to(window.draw_trigger, now)
        );
        let assigned = state.assignments.get(window.id);
        if assigned.is_empty() {
            println!("  not drawn yet");
        }
        for (i, a) in assigned.iter().enumerate() {
            println!(
                "  {}. {} {}",
                i + 1,
                plan.local_hhmm(a.start),
                a.participant_name
            );
        }
    }
    println!(
        "Cooldown {}",
        if store.cooldown_enabled().await { "on" } else { "off" }
    );
}
