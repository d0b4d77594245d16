use clap::{Args, Parser, Subcommand};

use torrelay_telemetry::DEFAULT_LOG_LEVEL;

/// Top-level flags.
#[derive(Debug, Parser)]
#[command(
    name = "torrelay",
    about = "Relay tracker links to a torrent daemon through a chat front-end"
)]
pub struct Cli {
    /// Log level or filter directive used when `RUST_LOG` is unset.
    #[arg(long, global = true, env = "TORRELAY_LOG_LEVEL", default_value = DEFAULT_LOG_LEVEL)]
    pub log_level: String,
    /// Log output format (`json` or `pretty`); inferred from the build when omitted.
    #[arg(long, global = true, env = "TORRELAY_LOG_FORMAT")]
    pub log_format: Option<String>,
    /// Mode to run in.
    #[command(subcommand)]
    pub command: Command,
}

/// Run modes.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Drive the bot from stdin, printing replies to stdout.
    Console(ConsoleArgs),
    /// Log in to the daemon and report how many torrents it holds.
    Check,
}

/// Flags for the console adapter.
#[derive(Debug, Args)]
pub struct ConsoleArgs {
    /// Requester identity attached to every line read from stdin.
    #[arg(long, env = "TORRELAY_CONSOLE_REQUESTER")]
    pub requester: i64,
}

impl Command {
    /// Span label for the run mode.
    #[must_use]
    pub const fn mode(&self) -> &'static str {
        match self {
            Self::Console(_) => "console",
            Self::Check => "check",
        }
    }
}
