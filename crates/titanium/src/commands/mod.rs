//! Command dispatch: bridges CLI args -> portal/bridge calls -> output.

pub mod auth;
pub mod config_cmd;
pub mod dashboard;
pub mod ping;
pub mod status;
pub mod thermostat;
pub mod user;
pub mod util;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Login(args) => auth::login(args, global).await,
        Command::Logout => auth::logout(global),
        Command::Register(args) => user::register(args, global).await,
        Command::User(args) => user::handle(args, global).await,
        Command::Thermostat(args) => thermostat::handle(args, global).await,
        Command::Ping => ping::handle(global).await,
        Command::Status => status::handle(global).await,
        Command::Dashboard => dashboard::handle(global).await,
        Command::Config(args) => config_cmd::handle(args, global),
    }
}
