//! Clap derive structures for the `titanium` CLI.

use clap::{Args, Parser, Subcommand};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// titanium -- command-line client for the titanium thermostat
#[derive(Debug, Parser)]
#[command(
    name = "titanium",
    version,
    about = "Control a cloud-connected thermostat from the command line",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Portal URL (overrides the config file)
    #[arg(long, short = 's', env = "TITANIUM_SERVER", global = true)]
    pub server: Option<String>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in and cache the session
    Login(LoginArgs),

    /// Drop the cached session
    Logout,

    /// Create an account bound to a provisioned thermostat
    Register(RegisterArgs),

    /// Inspect user accounts
    #[command(alias = "u")]
    User(UserArgs),

    /// Provision and inspect thermostats
    #[command(alias = "t")]
    Thermostat(ThermostatArgs),

    /// Check that the portal is reachable
    Ping,

    /// One-shot snapshot of the signed-in thermostat
    #[command(alias = "st")]
    Status,

    /// Live interactive dashboard for the signed-in thermostat
    #[command(alias = "dash")]
    Dashboard,

    /// Inspect the CLI configuration
    Config(ConfigArgs),
}

// ── Per-command args ─────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Account email
    pub email: String,

    /// Password (prompted when omitted)
    #[arg(long, env = "TITANIUM_PASSWORD", hide_env = true)]
    pub password: Option<String>,
}

#[derive(Debug, Args)]
pub struct RegisterArgs {
    /// Account email
    pub email: String,

    /// Thermostat id printed on the device
    pub thermostat_id: String,

    /// Password (prompted twice when omitted)
    #[arg(long, env = "TITANIUM_PASSWORD", hide_env = true)]
    pub password: Option<String>,
}

#[derive(Debug, Args)]
pub struct UserArgs {
    #[command(subcommand)]
    pub command: UserCommand,
}

#[derive(Debug, Subcommand)]
pub enum UserCommand {
    /// Look up a user by email (defaults to the signed-in account)
    Show {
        /// Email to look up
        email: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct ThermostatArgs {
    #[command(subcommand)]
    pub command: ThermostatCommand,
}

#[derive(Debug, Subcommand)]
pub enum ThermostatCommand {
    /// Provision a new thermostat id
    Add {
        /// Id to provision
        id: String,
    },

    /// Show a thermostat's registration state
    Show {
        /// Id to look up
        id: String,
    },
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file path
    Path,

    /// Print the effective configuration
    Show,
}
