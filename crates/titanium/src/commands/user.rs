//! User commands: registration and lookup.

use crate::cli::{GlobalOpts, RegisterArgs, UserArgs, UserCommand};
use crate::error::CliError;

use super::util;

pub async fn register(args: RegisterArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let portal = util::portal(global)?;
    let password = util::resolve_password(args.password, true)?;

    let user = portal
        .create_user(&args.email, &password, &args.thermostat_id)
        .await
        .map_err(|e| match e {
            // The portal answers 400 for an id that was never provisioned.
            titanium_api::Error::Api { message, .. } if message.contains("Invalid thermostat") => {
                CliError::NotFound {
                    resource: "thermostat".into(),
                    identifier: args.thermostat_id.clone(),
                }
            }
            other => other.into(),
        })?;

    if !global.quiet {
        eprintln!(
            "Account {} created and bound to thermostat {}",
            user.email, args.thermostat_id
        );
        eprintln!("Sign in with: titanium login {}", user.email);
    }
    Ok(())
}

pub async fn handle(args: UserArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        UserCommand::Show { email } => {
            let email = match email {
                Some(email) => email,
                None => util::require_session()?.email,
            };

            let portal = util::portal(global)?;
            let user = portal
                .get_user(&email)
                .await
                .map_err(|e| CliError::for_lookup(e, "user", &email))?;

            crate::output::print_output(&user.email, global.quiet);
            Ok(())
        }
    }
}
