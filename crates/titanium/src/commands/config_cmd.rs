//! Configuration inspection commands.

use titanium_config::config_path;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            output::print_output(&config_path().display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = util::effective_config(global);
            let rendered = toml::to_string_pretty(&cfg)
                .map_err(titanium_config::ConfigError::Serialization)?;
            output::print_output(rendered.trim_end(), global.quiet);
            Ok(())
        }
    }
}
