//! Portal reachability probe.

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::util;

pub async fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let portal = util::portal(global)?;
    let server_time = portal.ping().await?;
    output::print_output(&format!("Portal is up (server time {server_time})"), global.quiet);
    Ok(())
}
