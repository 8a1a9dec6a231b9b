//! Session commands: login and logout.

use titanium_config::SessionCache;

use crate::cli::{GlobalOpts, LoginArgs};
use crate::error::CliError;

use super::util;

pub async fn login(args: LoginArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let portal = util::portal(global)?;
    let password = util::resolve_password(args.password, false)?;

    let session = portal.authenticate(&args.email, &password).await?;
    SessionCache::new().store(&session)?;

    if !global.quiet {
        eprintln!(
            "Signed in as {} (thermostat {})",
            session.email, session.thermostat_id
        );
    }
    Ok(())
}

pub fn logout(global: &GlobalOpts) -> Result<(), CliError> {
    SessionCache::new().clear()?;
    if !global.quiet {
        eprintln!("Signed out");
    }
    Ok(())
}
