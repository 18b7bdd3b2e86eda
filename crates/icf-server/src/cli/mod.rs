use clap::{Args, Parser, Subcommand, ValueEnum};
use icf_core::enums::Role;

/// How batch commands print their report.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Raw,
}

/// Top-level CLI parser for the `icflog` binary.
#[derive(Debug, Parser)]
#[command(name = "icflog", version, about = "ICF Log - coaching hours backend")]
pub struct Cli {
    /// Defaults to `serve`.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Report format for one-shot commands
    #[arg(long, value_enum, default_value_t = OutputFormat::Json, global = true)]
    pub format: OutputFormat,
}

impl Cli {
    #[must_use]
    pub fn command_or_default(self) -> Commands {
        self.command
            .unwrap_or_else(|| Commands::Serve(ServeArgs::default()))
    }
}

#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Run the HTTP API.
    Serve(ServeArgs),
    /// Run the logging reminder and trial ending pipeline once.
    CheckAndSend,
    /// Send scheduled emails that are due.
    SendScheduled,
    /// Open the database and apply migrations.
    Migrate,
    /// Grant or revoke the admin role for an existing profile.
    SetRole(SetRoleArgs),
}

#[derive(Clone, Debug, Args)]
pub struct SetRoleArgs {
    /// Profile user id.
    #[arg(long)]
    pub user: String,

    /// `admin` or `coach`.
    #[arg(long, value_parser = parse_role)]
    pub role: Role,
}

fn parse_role(value: &str) -> Result<Role, String> {
    match value.to_ascii_lowercase().as_str() {
        "admin" => Ok(Role::Admin),
        "coach" => Ok(Role::Coach),
        other => Err(format!("unknown role '{other}' (expected admin or coach)")),
    }
}

#[derive(Clone, Debug, Default, Args)]
pub struct ServeArgs {
    /// Overrides `server.host`.
    #[arg(long)]
    pub host: Option<String>,

    /// Overrides `server.port`.
    #[arg(long)]
    pub port: Option<u16>,
}
