//! One-shot thermostat snapshot.

use std::time::Duration;

use titanium_core::{BridgeConfig, ControlBridge};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::util;

/// How long to let the refresh responses trickle in before rendering.
const SETTLE: Duration = Duration::from_secs(2);

pub async fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let session = util::require_session()?;
    let cfg = util::effective_config(global);
    let bus = util::bus_from(&cfg)?;

    let bridge = ControlBridge::new(BridgeConfig::default(), bus);
    bridge.connect(&session.thermostat_id).await?;
    tokio::time::sleep(SETTLE).await;

    let online = bridge.online().current();
    let temperatures = bridge.temperatures().current();
    let status = bridge.status().current();
    let settings = bridge.settings().current();

    bridge.disconnect().await;

    let mut out = format!(
        "{}  {}\n{}",
        session.thermostat_id,
        output::online_indicator(online),
        output::status_table(&temperatures, &status)
    );
    if !settings.is_empty() {
        out.push('\n');
        out.push_str(&output::settings_list(&settings));
    }
    output::print_output(&out, global.quiet);
    Ok(())
}
