//! Live dashboard: forwards console gestures to the bridge and renders
//! snapshot changes as they arrive.
//!
//! One line per gesture on stdin; the watch streams drive rendering, so
//! edits echo back through the same path a device update takes.

use serde_json::Value;
use titanium_core::{BridgeConfig, ControlBridge};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::util;

const HELP: &str = "commands: low <n>, high <n>, mode <tag>, set <name> <value>, \
                    history, refresh, help, quit";

pub async fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let session = util::require_session()?;
    let cfg = util::effective_config(global);
    let bus = util::bus_from(&cfg)?;

    let bridge = ControlBridge::new(BridgeConfig::default(), bus);
    bridge.connect(&session.thermostat_id).await?;

    if !global.quiet {
        eprintln!("Dashboard for thermostat {}", session.thermostat_id);
        eprintln!("{HELP}");
    }

    // Always tear the session down, whatever the loop returns.
    let result = event_loop(&bridge, global).await;
    bridge.disconnect().await;
    if !global.quiet {
        eprintln!("Disconnected");
    }
    result
}

async fn event_loop(bridge: &ControlBridge, global: &GlobalOpts) -> Result<(), CliError> {
    let mut temperatures = bridge.temperatures();
    let mut status = bridge.status();
    let mut settings = bridge.settings();
    let mut history = bridge.history();
    let mut online = bridge.online();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let quiet = global.quiet;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,

            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_gesture(&line) {
                    Ok(Some(Gesture::Quit)) => break,
                    Ok(Some(gesture)) => apply(bridge, gesture, quiet).await,
                    Ok(None) => {}
                    Err(reason) => eprintln!("? {reason} ({HELP})"),
                }
            }

            Some(_) = temperatures.changed() => render_status(bridge, quiet),
            Some(_) = status.changed() => render_status(bridge, quiet),
            Some(settings) = settings.changed() => {
                output::print_output(&output::settings_list(&settings), quiet);
            }
            Some(history) = history.changed() => {
                output::print_output(&output::history_grid(&history), quiet);
            }
            Some(online) = online.changed() => {
                output::print_output(&output::online_indicator(online), quiet);
            }
        }
    }
    Ok(())
}

fn render_status(bridge: &ControlBridge, quiet: bool) {
    let table = output::status_table(
        &bridge.temperatures().current(),
        &bridge.status().current(),
    );
    output::print_output(&table, quiet);
}

// ── Gestures ─────────────────────────────────────────────────────────

#[derive(Debug, PartialEq)]
enum Gesture {
    Low(i32),
    High(i32),
    Mode(String),
    Set(String, Value),
    History,
    Refresh,
    Help,
    Quit,
}

/// Parse one console line. Blank lines are ignored; malformed input
/// yields a message for the prompt, never an error that ends the loop.
fn parse_gesture(line: &str) -> Result<Option<Gesture>, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };

    match verb {
        "low" | "high" => {
            let value: i32 = words
                .next()
                .ok_or_else(|| format!("{verb} expects a temperature"))?
                .parse()
                .map_err(|_| format!("{verb} expects a whole number"))?;
            Ok(Some(if verb == "low" {
                Gesture::Low(value)
            } else {
                Gesture::High(value)
            }))
        }

        "mode" => {
            let mode = words.next().ok_or("mode expects a tag")?;
            Ok(Some(Gesture::Mode(mode.into())))
        }

        "set" => {
            let name = words.next().ok_or("set expects a setting name")?;
            let raw = words.collect::<Vec<_>>().join(" ");
            if raw.is_empty() {
                return Err("set expects a value".into());
            }
            // Numbers and booleans pass through typed; anything else
            // travels as a plain string.
            let value = serde_json::from_str(&raw).unwrap_or(Value::String(raw));
            Ok(Some(Gesture::Set(name.into(), value)))
        }

        "history" => Ok(Some(Gesture::History)),
        "refresh" => Ok(Some(Gesture::Refresh)),
        "help" => Ok(Some(Gesture::Help)),
        "quit" | "exit" => Ok(Some(Gesture::Quit)),

        other => Err(format!("unknown command '{other}'")),
    }
}

async fn apply(bridge: &ControlBridge, gesture: Gesture, quiet: bool) {
    match gesture {
        Gesture::Low(value) => {
            let (low, high) = bridge.set_temperature_low(value);
            if !quiet {
                eprintln!("setpoints {low}..{high} (write pending)");
            }
        }
        Gesture::High(value) => {
            let (low, high) = bridge.set_temperature_high(value);
            if !quiet {
                eprintln!("setpoints {low}..{high} (write pending)");
            }
        }
        Gesture::Mode(mode) => bridge.set_mode(&mode).await,
        Gesture::Set(name, value) => bridge.set_setting(&name, value).await,
        Gesture::History => bridge.request_history().await,
        Gesture::Refresh => bridge.refresh().await,
        Gesture::Help => eprintln!("{HELP}"),
        Gesture::Quit => {}
    }
}
