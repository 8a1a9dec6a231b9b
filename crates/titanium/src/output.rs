//! Terminal rendering for snapshots: status table, settings listing,
//! history grid. Table output uses `tabled`, accents use `owo-colors`.

use std::io::{self, IsTerminal, Write};
use std::sync::Arc;

use owo_colors::OwoColorize;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use titanium_core::protocol::{HistorySample, Status, Temperatures};
use titanium_core::Settings;

/// Color only when stdout is an interactive terminal.
fn should_color() -> bool {
    io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err()
}

/// `● online` / `○ offline` indicator.
pub fn online_indicator(online: bool) -> String {
    match (online, should_color()) {
        (true, true) => format!("{} online", "●".green()),
        (true, false) => "● online".into(),
        (false, true) => format!("{} offline", "○".red()),
        (false, false) => "○ offline".into(),
    }
}

// ── Status table ─────────────────────────────────────────────────────

#[derive(Tabled)]
struct StatusRow {
    #[tabled(rename = "Current")]
    current: String,
    #[tabled(rename = "Low")]
    low: String,
    #[tabled(rename = "High")]
    high: String,
    #[tabled(rename = "Mode")]
    mode: String,
    #[tabled(rename = "State")]
    state: String,
}

pub fn status_table(temperatures: &Temperatures, status: &Status) -> String {
    let row = StatusRow {
        current: format!("{}°", temperatures.current),
        low: format!("{}°", temperatures.low),
        high: format!("{}°", temperatures.high),
        mode: status.mode.clone(),
        state: status.state.clone(),
    };
    Table::new([row]).with(Style::rounded()).to_string()
}

// ── Settings ─────────────────────────────────────────────────────────

/// One `name = value` line per setting, sorted by name.
pub fn settings_list(settings: &Settings) -> String {
    let mut lines: Vec<String> = settings
        .iter()
        .map(|(name, value)| match value.as_str() {
            Some(s) => format!("{name} = {s}"),
            None => format!("{name} = {value}"),
        })
        .collect();
    lines.sort();
    lines.join("\n")
}

// ── History grid ─────────────────────────────────────────────────────

const DAY_NAMES: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Day-by-hour activity grid. Cells outside the reported samples stay
/// blank; values render as whole percentages.
pub fn history_grid(samples: &Arc<Vec<HistorySample>>) -> String {
    if samples.is_empty() {
        return "(no history reported)".into();
    }

    let mut grid = [[None::<f64>; 24]; 7];
    for sample in samples.iter() {
        let day = usize::from(sample.day);
        let hour = usize::from(sample.hour);
        if (1..=7).contains(&day) && (1..=24).contains(&hour) {
            grid[day - 1][hour - 1] = Some(sample.value);
        }
    }

    let mut out = String::new();
    let header: String = (1..=24).map(|h| format!("{h:>4}")).collect();
    out.push_str(&format!("    {header}\n"));
    for (day, row) in grid.iter().enumerate() {
        out.push_str(DAY_NAMES[day]);
        out.push(' ');
        for cell in row {
            match cell {
                Some(value) => out.push_str(&format!("{:>4}", format!("{value:.0}"))),
                None => out.push_str("   ."),
            }
        }
        out.push('\n');
    }
    out
}

/// Print to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}
