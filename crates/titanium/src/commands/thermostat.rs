//! Thermostat provisioning commands.

use tabled::{Table, Tabled, settings::Style};

use crate::cli::{GlobalOpts, ThermostatArgs, ThermostatCommand};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct ThermostatRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Registered")]
    registered: &'static str,
}

impl From<&titanium_api::Thermostat> for ThermostatRow {
    fn from(t: &titanium_api::Thermostat) -> Self {
        Self {
            id: t.id.clone(),
            registered: if t.registered { "yes" } else { "no" },
        }
    }
}

pub async fn handle(args: ThermostatArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let portal = util::portal(global)?;

    match args.command {
        ThermostatCommand::Add { id } => {
            let thermostat = portal.create_thermostat(&id).await?;
            if !global.quiet {
                eprintln!("Thermostat {} provisioned", thermostat.id);
            }
            Ok(())
        }

        ThermostatCommand::Show { id } => {
            let thermostat = portal
                .get_thermostat(&id)
                .await
                .map_err(|e| CliError::for_lookup(e, "thermostat", &id))?;

            let table = Table::new([ThermostatRow::from(&thermostat)])
                .with(Style::rounded())
                .to_string();
            output::print_output(&table, global.quiet);
            Ok(())
        }
    }
}
